use std::fs::File;
use std::io::Read;
use stentkit_core::{FoldLockSpec, GapPolicy, InputDocument, LinkMatrix, StentParameters};
use stentkit_export::{write_outputs, ExportError, Workbook, CELL_HEADERS, SHEET_NAMES};
use stentkit_geometry::derive;
use tempfile::TempDir;
use zip::ZipArchive;

fn input() -> InputDocument {
    let params = StentParameters {
        diameter_mm: 1.8,
        length_mm: 8.0,
        num_rings: 6,
        crowns_per_ring: 8,
        strut_width_mm_by_ring: vec![0.05; 6],
        height_factors: vec![1.2, 1.0, 1.0, 1.0, 1.0, 1.1],
        r_factor: 2.5,
        x_keepout_min_mm: 0.01,
    };
    let links = LinkMatrix::unlinked(5, 8)
        .with_link(0, 0)
        .with_link(2, 3)
        .with_link(4, 7);
    InputDocument::new(params, links, GapPolicy::default())
}

fn read_part(path: &std::path::Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut text = String::new();
    part.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn test_write_outputs_pair() {
    let dir = TempDir::new().unwrap();
    let doc = input();
    let derived = derive(&doc).unwrap();
    let paths = write_outputs(&doc, &derived, dir.path()).unwrap();

    let json_name = paths.json.file_name().unwrap().to_string_lossy().to_string();
    assert!(json_name.starts_with("derived_"));
    assert!(json_name.ends_with(".json"));
    assert_eq!(json_name.len(), "derived_YYYYMMDD_HHMMSS.json".len());
    assert_eq!(paths.json.with_extension("xlsx"), paths.xlsx);
    assert!(paths.json.exists());
    assert!(paths.xlsx.exists());
}

#[test]
fn test_workbook_package() {
    let dir = TempDir::new().unwrap();
    let doc = input();
    let derived = derive(&doc).unwrap();
    let paths = write_outputs(&doc, &derived, dir.path()).unwrap();

    let workbook = read_part(&paths.xlsx, "xl/workbook.xml");
    let mut last = 0;
    for name in SHEET_NAMES {
        let pos = workbook.find(&format!("name=\"{name}\"")).unwrap();
        assert!(pos > last, "sheet {name} out of order");
        last = pos;
    }

    read_part(&paths.xlsx, "[Content_Types].xml");
    read_part(&paths.xlsx, "xl/styles.xml");

    let cells = read_part(&paths.xlsx, "xl/worksheets/sheet7.xml");
    assert!(cells.contains("<t>right_cl_x2</t>"));
    assert!(cells.contains("state=\"frozen\""));
    assert!(cells.contains("<row r=\"49\">"));
    assert!(!cells.contains("<row r=\"50\">"));

    let links = read_part(&paths.xlsx, "xl/worksheets/sheet3.xml");
    assert!(links.contains("<t>interface</t>"));
    assert!(links.contains("<t>col_7</t>"));
    assert!(links.contains("<t>3-4</t>"));
}

#[test]
fn test_workbook_tables() {
    let doc = input();
    let derived = derive(&doc).unwrap();
    let wb = Workbook::from_derivation(&doc, &derived);

    let names: Vec<&str> = wb.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, SHEET_NAMES);

    let cells = wb.sheet("Cells").unwrap();
    assert_eq!(cells.headers, CELL_HEADERS);
    assert_eq!(cells.rows.len(), 48);
    assert!(cells.rows.iter().all(|r| r.len() == CELL_HEADERS.len()));

    let scale = wb.sheet("ColumnScale").unwrap();
    assert_eq!(scale.headers, ["col", "sum_gaps_in_col_mm", "scale_mm_per_factor"]);
    assert_eq!(scale.rows.len(), 8);

    let heights = wb.sheet("RingHeights").unwrap();
    assert_eq!(heights.rows.len(), 6);
    assert_eq!(heights.headers.len(), 9);

    let gaps = wb.sheet("GapsMatrix").unwrap();
    assert_eq!(gaps.rows.len(), 5);
    assert_eq!(gaps.headers[0], "interface");
    assert_eq!(gaps.headers[1], "col_0");

    let params = wb.sheet("Parameters").unwrap();
    assert_eq!(params.headers, ["Parameter", "Value", "Units", "Notes"]);
    assert_eq!(params.rows.len(), 8);
}

#[test]
fn test_fold_lock_rows_in_parameters() {
    let mut doc = input();
    doc.fold_lock = Some(FoldLockSpec {
        balloon_material: "PTFE".to_string(),
        balloon_wall_um: 14.0,
    });
    let derived = derive(&doc).unwrap();
    assert_eq!(derived.gaps_matrix.get(0, 0), 0.125);

    let wb = Workbook::from_derivation(&doc, &derived);
    assert_eq!(wb.sheet("Parameters").unwrap().rows.len(), 11);
}

#[test]
fn test_rederiving_output_is_bit_identical() {
    let dir = TempDir::new().unwrap();
    let doc = input();
    let derived = derive(&doc).unwrap();
    let paths = write_outputs(&doc, &derived, dir.path()).unwrap();

    let text = std::fs::read_to_string(&paths.json).unwrap();
    let reparsed = InputDocument::from_json_str(&text).unwrap();
    let again = derive(&reparsed).unwrap();
    assert_eq!(again, derived);

    let mut first: serde_json::Value = serde_json::from_str(&text).unwrap();
    let second_doc = stentkit_export::OutputDocument::new(&reparsed, &again);
    let mut second: serde_json::Value =
        serde_json::from_str(&second_doc.to_json_string().unwrap()).unwrap();
    first.as_object_mut().unwrap().remove("meta");
    second.as_object_mut().unwrap().remove("meta");
    assert_eq!(first, second);
}

#[test]
fn test_missing_directory_is_reported() {
    let dir = TempDir::new().unwrap();
    let doc = input();
    let derived = derive(&doc).unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        write_outputs(&doc, &derived, &missing),
        Err(ExportError::MissingDirectory(_))
    ));
}

#[test]
fn test_control_characters_in_labels_are_replaced() {
    let dir = TempDir::new().unwrap();
    let mut doc = input();
    doc.links.interfaces = (1..=5).map(|i| format!("if\u{1}{i}")).collect();
    let derived = derive(&doc).unwrap();
    let paths = write_outputs(&doc, &derived, dir.path()).unwrap();

    for sheet in ["sheet3", "sheet4"] {
        let xml = read_part(&paths.xlsx, &format!("xl/worksheets/{sheet}.xml"));
        assert!(!xml.contains('\u{1}'), "{sheet}");
        assert!(xml.contains("<t>if\u{FFFD}1</t>"), "{sheet}");
    }
}
