use proptest::prelude::*;
use stentkit_core::{GapPolicy, InputDocument, LinkMatrix, SpecError, StentParameters};
use stentkit_geometry::cells::keepout;
use stentkit_geometry::{
    column_scale, derive, gap_policy, ring_stack, solve_full_wave, CellFault, DerivationError,
    DeriveOptions, EdgePosition, FaultPolicy, KeepoutClamp, Phase, SolverSettings, StentDeriver,
};

const SCENARIO: &str = r#"{
    "parameters": {
        "diameter_mm": 1.8,
        "length_mm": 8.0,
        "num_rings": 6,
        "crowns_per_ring": 8,
        "strut_width_mm_by_ring": [0.05, 0.05, 0.05, 0.05, 0.05, 0.05],
        "height_factors": [1.2, 1.0, 1.0, 1.0, 1.0, 1.1],
        "R_factor": 2.5,
        "x_keepout_min_mm": 0.01
    },
    "links": {
        "matrix": [
            [0,0,0,0,0,0,0,0],
            [0,0,0,0,0,0,0,0],
            [0,0,0,0,0,0,0,0],
            [0,0,0,0,0,0,0,0],
            [0,0,0,0,0,0,0,0]
        ]
    },
    "gaps_policy": {
        "body_linked_mm": 0.16,
        "body_unlinked_mm": 0.16,
        "end_linked_mm": 0.095,
        "end_unlinked_prox_mm": 0.095,
        "end_unlinked_dist_mm": 0.10
    }
}"#;

fn scenario() -> InputDocument {
    InputDocument::from_json_str(SCENARIO).unwrap()
}

#[test]
fn test_concrete_scenario() {
    let doc = scenario();
    let d = derive(&doc).unwrap();
    let factors = &doc.parameters.height_factors;

    // Uniform gaps: every column gets the same scale.
    let s0 = d.scale_mm_per_factor_by_col[0];
    assert!((s0 - (8.0 - 0.675) / 6.3).abs() < 1e-12);
    for s in &d.scale_mm_per_factor_by_col {
        assert_eq!(*s, s0);
    }

    for col in 0..8 {
        for (ring, f) in factors.iter().enumerate() {
            let h = d.ring_heights_mm.get(ring, col);
            assert!((h / f - s0).abs() < 1e-12);
        }
    }

    assert_eq!(d.cells.len(), 48);
    assert!(!d.has_faults());
    for cell in &d.cells {
        let g = cell.geometry.as_ref().unwrap();
        assert!(g.solver_converged);
        assert!(
            g.theta_deg > 150.0 && g.theta_deg < 175.0,
            "theta {} at ring {} col {}",
            g.theta_deg,
            cell.ring,
            cell.col
        );
        assert_eq!(g.keepout_clamp, KeepoutClamp::None);
        assert!((g.rc_mm - 0.125).abs() < 1e-15);
    }

    // Taller rings open the crown further.
    let theta = |ring| d.cell(ring, 0).unwrap().geometry.as_ref().unwrap().theta_deg;
    assert!(theta(1) > theta(6));
    assert!(theta(6) > theta(2));
}

#[test]
fn test_cell_placement() {
    let doc = scenario();
    let d = derive(&doc).unwrap();
    let pitch = doc.parameters.pitch_mm();
    let length = doc.parameters.length_mm;

    for cell in &d.cells {
        let g = cell.geometry.as_ref().unwrap();
        assert!((cell.x_left_mm - cell.col as f64 * pitch).abs() < 1e-12);
        assert!((cell.x_right_mm - cell.x_left_mm - pitch).abs() < 1e-12);

        let stack = &d.stack_positions_by_column[cell.col];
        assert_eq!(cell.y_top_chord_mm, stack.ring_top_y_mm[cell.ring - 1]);
        assert_eq!(cell.y_bottom_chord_mm, stack.ring_bottom_y_mm[cell.ring - 1]);

        let margin = g.sagitta_center_mm + 0.025;
        assert!((g.m_mm - margin).abs() < 1e-15);
        assert!((g.y_top_edge_mm - (cell.y_top_chord_mm + margin).clamp(0.0, length)).abs() < 1e-12);
        assert!(g.y_top_edge_mm < g.y_bottom_edge_mm);

        assert!((g.left_cl.start()[0] - (cell.x_left_mm + g.x_keepout_mm)).abs() < 1e-12);
        assert!((g.left_cl.length() - g.chord_center_len_mm).abs() < 1e-12);
        assert!((g.right_cl.end()[0] - (cell.x_right_mm - g.x_keepout_mm)).abs() < 1e-12);
        assert!((g.right_cl.length() - g.chord_center_len_mm).abs() < 1e-12);

        let y_of = |pos: EdgePosition| match pos {
            EdgePosition::Top => cell.y_top_chord_mm,
            EdgePosition::Bottom => cell.y_bottom_chord_mm,
        };
        assert_eq!(g.left_cl.start()[1], y_of(cell.left_crown_pos));
        assert_eq!(g.right_cl.start()[1], y_of(cell.right_crown_pos));

        // Y grows downward through the stack: base cells step up toward the
        // top edge, flipped cells step down.
        match cell.phase() {
            Phase::Base => assert!(g.alpha_deg < 0.0 && g.alpha_deg > -90.0),
            Phase::Flipped => assert!(g.alpha_deg > 0.0 && g.alpha_deg < 90.0),
        }
    }
}

#[test]
fn test_shape_mismatch_aborts() {
    let mut doc = scenario();
    doc.links.matrix = LinkMatrix::unlinked(4, 8);
    doc.links.interfaces.clear();
    doc.links.fill_default_labels();
    match derive(&doc) {
        Err(DerivationError::Spec(SpecError::ShapeMismatch {
            expected_rows,
            expected_cols,
            actual_rows,
            actual_cols,
        })) => {
            assert_eq!((expected_rows, expected_cols), (5, 8));
            assert_eq!((actual_rows, actual_cols), (4, 8));
        }
        other => panic!("expected shape mismatch, got {other:?}"),
    }
}

#[test]
fn test_length_mismatch_aborts() {
    let mut doc = scenario();
    doc.parameters.height_factors.pop();
    assert!(matches!(
        derive(&doc),
        Err(DerivationError::Spec(SpecError::LengthMismatch { .. }))
    ));
}

#[test]
fn test_infeasible_column_reports_index() {
    let params = StentParameters {
        diameter_mm: 1.8,
        length_mm: 4.0,
        num_rings: 4,
        crowns_per_ring: 6,
        strut_width_mm_by_ring: vec![0.05; 4],
        height_factors: vec![1.0; 4],
        r_factor: 2.5,
        x_keepout_min_mm: 0.01,
    };
    let policy = GapPolicy {
        body_linked_mm: 4.0,
        ..GapPolicy::default()
    };
    let doc = InputDocument::new(params, LinkMatrix::unlinked(3, 6).with_link(1, 2), policy);

    match derive(&doc) {
        Err(DerivationError::InfeasibleColumn {
            column,
            remaining_mm,
            ..
        }) => {
            assert_eq!(column, 2);
            assert!(remaining_mm < 0.0);
        }
        other => panic!("expected infeasible column, got {other:?}"),
    }
}

/// Alternating thin and standard struts; the standard rings cannot fit a
/// 0.15 mm keep-out on both sides.
fn overlapping_doc() -> InputDocument {
    let mut doc = scenario();
    doc.parameters.strut_width_mm_by_ring = vec![0.02, 0.05, 0.02, 0.05, 0.02, 0.05];
    doc.parameters.x_keepout_min_mm = 0.15;
    doc
}

#[test]
fn test_isolate_records_faults_per_cell() {
    let d = derive(&overlapping_doc()).unwrap();
    assert!(d.has_faults());

    for cell in &d.cells {
        if cell.ring % 2 == 0 {
            assert!(cell.geometry.is_none());
            assert!(matches!(
                cell.fault,
                Some(CellFault::KeepoutOverlap { x_keepout_min_mm, .. }) if x_keepout_min_mm == 0.15
            ));
        } else {
            let g = cell.geometry.as_ref().unwrap();
            assert!(cell.fault.is_none());
            assert_eq!(g.keepout_clamp, KeepoutClamp::Minimum);
            assert_eq!(g.x_keepout_mm, 0.15);
        }
    }
    assert_eq!(d.faulted_cells().count(), 24);
}

#[test]
fn test_abort_stops_at_first_fault() {
    let deriver = StentDeriver::new(DeriveOptions {
        solver: SolverSettings::default(),
        fault_policy: FaultPolicy::Abort,
    });
    match deriver.derive(&overlapping_doc()) {
        Err(DerivationError::CellAborted { ring, col, fault }) => {
            assert_eq!((ring, col), (2, 0));
            assert!(matches!(fault, CellFault::KeepoutOverlap { .. }));
        }
        other => panic!("expected abort, got {other:?}"),
    }
}

fn assert_no_tangency(fault: &Option<CellFault>) {
    match fault {
        Some(CellFault::InfeasibleArc { message }) => {
            assert!(message.contains("No tangency"), "{message}")
        }
        other => panic!("expected infeasible arc, got {other:?}"),
    }
}

#[test]
fn test_arc_wider_than_pitch_faults_every_cell() {
    for r_factor in [4.0, 6.0] {
        let mut doc = scenario();
        doc.parameters.r_factor = r_factor;
        let d = derive(&doc).unwrap();
        assert_eq!(d.faulted_cells().count(), 48, "R_factor {r_factor}");
        for cell in &d.cells {
            assert!(cell.geometry.is_none());
            assert_no_tangency(&cell.fault);
        }
    }
}

#[test]
fn test_infeasible_rings_are_isolated() {
    let mut doc = scenario();
    // R = 2.5 * 0.08 = 0.2 mm: the arc is wider than half the pitch.
    doc.parameters.strut_width_mm_by_ring = vec![0.05, 0.08, 0.05, 0.05, 0.08, 0.05];
    let d = derive(&doc).unwrap();

    let faulted: Vec<(usize, usize)> = d.faulted_cells().map(|c| (c.ring, c.col)).collect();
    let expected: Vec<(usize, usize)> = [2, 5]
        .into_iter()
        .flat_map(|ring| (0..8).map(move |col| (ring, col)))
        .collect();
    assert_eq!(faulted, expected);

    for col in 0..8 {
        for ring in [2, 5] {
            assert_no_tangency(&d.cell(ring, col).unwrap().fault);
        }
        for ring in [1, 3, 4, 6] {
            let cell = d.cell(ring, col).unwrap();
            assert!(cell.fault.is_none());
            let g = cell.geometry.as_ref().unwrap();
            assert!(g.solver_converged);
            assert!(g.theta_deg > 150.0 && g.theta_deg < 175.0);
        }
    }

    let deriver = StentDeriver::new(DeriveOptions {
        solver: SolverSettings::default(),
        fault_policy: FaultPolicy::Abort,
    });
    match deriver.derive(&doc) {
        Err(DerivationError::CellAborted { ring, col, fault }) => {
            assert_eq!((ring, col), (2, 0));
            assert_no_tangency(&Some(fault));
        }
        other => panic!("expected abort, got {other:?}"),
    }
}

#[test]
fn test_unconverged_cells_keep_best_estimate() {
    let doc = scenario();
    let full = derive(&doc).unwrap();
    let capped = StentDeriver::new(DeriveOptions {
        solver: SolverSettings {
            max_iterations: 5,
            ..SolverSettings::default()
        },
        fault_policy: FaultPolicy::Isolate,
    })
    .derive(&doc)
    .unwrap();

    assert!(!capped.has_faults());
    for (cell, reference) in capped.cells.iter().zip(&full.cells) {
        let g = cell.geometry.as_ref().unwrap();
        let r = reference.geometry.as_ref().unwrap();
        assert!(!g.solver_converged);
        assert!(r.solver_converged);
        assert!((g.theta_deg - r.theta_deg).abs() < 0.05);
    }
}

#[test]
fn test_derivation_is_repeatable_through_json() {
    let doc = scenario();
    let first = derive(&doc).unwrap();
    let reparsed = InputDocument::from_json_str(&doc.to_json_string().unwrap()).unwrap();
    let second = derive(&reparsed).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_sagitta_monotonic_in_radius() {
    let settings = SolverSettings::default();
    let pitch = std::f64::consts::PI * 1.8 / 8.0;
    let mut previous: Option<(f64, f64)> = None;

    for step in 0..=24 {
        let radius = 0.05 + 0.005 * step as f64;
        let q = solve_full_wave(1.15, pitch, 0.05, radius, &settings).unwrap();
        assert!(q.converged(), "radius {radius}");
        if let Some((sagitta, theta)) = previous {
            assert!(q.sagitta_center_mm >= sagitta, "radius {radius}");
            assert!((q.theta_deg() - theta).abs() < 3.0, "jump at radius {radius}");
        }
        previous = Some((q.sagitta_center_mm, q.theta_deg()));
    }
}

fn link_matrix(rows: usize, cols: usize) -> impl Strategy<Value = LinkMatrix> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), cols), rows)
        .prop_map(|rows| LinkMatrix::from_rows(rows).unwrap())
}

fn layout() -> impl Strategy<Value = (LinkMatrix, Vec<f64>, f64)> {
    (2usize..9, 1usize..13).prop_flat_map(|(rings, crowns)| {
        (
            link_matrix(rings - 1, crowns),
            prop::collection::vec(0.5f64..2.0, rings),
            8.0f64..30.0,
        )
    })
}

proptest! {
    #[test]
    fn prop_every_column_closes_to_length((links, factors, length) in layout()) {
        let policy = GapPolicy::default();
        let cols = links.cols();
        let gaps = gap_policy::resolve(&links, &policy, links.shape()).unwrap();
        let scales = column_scale::scale(length, &factors, &gaps, cols).unwrap();
        let heights = ring_stack::ring_heights(&factors, &scales);
        let stacks = ring_stack::stack(&heights, &gaps, cols);

        for col in 0..cols {
            let rings: f64 = (0..factors.len()).map(|r| heights.get(r, col)).sum();
            let total = rings + gaps.column_sum(col);
            prop_assert!((total - length).abs() <= 1e-9 * length);
            prop_assert!((stacks[col].y_bottom_of_stent_mm - length).abs() <= 1e-9 * length);
        }
    }

    #[test]
    fn prop_adjacent_cells_have_opposite_phase(ring in 1usize..200, col in 0usize..200) {
        let here = Phase::for_cell(ring, col);
        prop_assert_ne!(here, Phase::for_cell(ring, col + 1));
        prop_assert_ne!(here, Phase::for_cell(ring + 1, col));
        prop_assert_eq!(here, Phase::for_cell(ring + 2, col));
        prop_assert_eq!(here, Phase::for_cell(ring, col + 2));
    }

    #[test]
    fn prop_keepout_stays_in_window(
        pitch in 0.3f64..1.5,
        chord_frac in 0.05f64..0.45,
        height in 0.2f64..2.0,
        delta_deg in 5.0f64..89.9,
        minimum in 0.0f64..0.1,
    ) {
        let chord = chord_frac * pitch;
        match keepout(pitch, chord, height, delta_deg.to_radians(), minimum) {
            Ok(k) => {
                prop_assert!(k.applied_mm >= minimum);
                prop_assert!(k.applied_mm <= k.max_mm);
                let expected = if k.raw_mm < minimum {
                    KeepoutClamp::Minimum
                } else if k.raw_mm > k.max_mm {
                    KeepoutClamp::Maximum
                } else {
                    KeepoutClamp::None
                };
                prop_assert_eq!(k.clamp, expected);
                if k.clamp == KeepoutClamp::None {
                    prop_assert_eq!(k.applied_mm, k.raw_mm);
                }
            }
            Err(CellFault::KeepoutOverlap { x_keepout_max_mm, .. }) => {
                prop_assert!(x_keepout_max_mm < minimum);
            }
            Err(other) => prop_assert!(false, "unexpected fault {}", other),
        }
    }

    #[test]
    fn prop_solver_reproduces_closed_form_theta(
        theta in 30.0f64..150.0,
        radius in 0.08f64..0.2,
        x_arm in 0.1f64..0.3,
    ) {
        use stentkit_geometry::CrownArc;
        let w = 0.05;
        let arc = CrownArc::new(radius, theta);
        let delta = 0.5 * theta.to_radians();
        let height = 0.5 * w + arc.sagitta_mm() + x_arm * delta.tan();
        let width = 2.0 * x_arm + arc.chord_mm();

        let q = solve_full_wave(2.0 * height, 2.0 * width, w, radius, &SolverSettings::default())
            .unwrap();
        prop_assert!(q.converged());
        prop_assert!((q.theta_deg() - theta).abs() < 1e-4);
        prop_assert!((q.sagitta_center_mm - arc.sagitta_mm()).abs() < 1e-9);
        prop_assert!((q.chord_center_mm - arc.chord_mm()).abs() < 1e-9);
    }
}
