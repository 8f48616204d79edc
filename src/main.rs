use clap::Parser;
use std::process::ExitCode;
use stentkit::{init_logging, run, Cli, RunOutcome};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("warning: {e:#}");
    }
    tracing::debug!("stentkit {}", stentkit::LONG_VERSION);

    match run(&cli) {
        Ok(outcome) => {
            match &outcome {
                RunOutcome::Template(path) => println!("{}", path.display()),
                RunOutcome::Derived { paths, faults } => {
                    println!("{}", paths.json.display());
                    println!("{}", paths.xlsx.display());
                    for fault in faults {
                        eprintln!(
                            "faulted cell: ring {} col {}: {}",
                            fault.ring, fault.col, fault.cause
                        );
                    }
                }
            }
            ExitCode::from(outcome.exit_code() as u8)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
