use grid_kernels::Termination;
use grid_kernels::labeling::{
    ComponentLabeler, Decomposition, Labeling, LabelingConfig, OccupancyGrid, Schedule,
    ScheduleKind,
};
use rand::RngCore;
use rand::SeedableRng;

const DECOMPOSITIONS: [Decomposition; 8] = [
    Decomposition::Rows { block: 1 },
    Decomposition::Rows { block: 7 },
    Decomposition::Rows { block: 1024 },
    Decomposition::Columns { block: 1 },
    Decomposition::Columns { block: 13 },
    Decomposition::Tiles { height: 8, width: 8 },
    Decomposition::Tiles { height: 5, width: 17 },
    Decomposition::Tiles { height: 64, width: 3 },
];

fn random_grid(rows: usize, cols: usize, density: f64, seed: u64) -> OccupancyGrid {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density) as u64;
    OccupancyGrid::from_fn(rows, cols, |_, _| rng.next_u64() < threshold).unwrap()
}

fn run_to_fixed_point(grid: &OccupancyGrid, schedule: Schedule) -> (Vec<u32>, u64, u64) {
    let mut labeling = Labeling::new(grid);
    assert_eq!(labeling.run(schedule, 100_000), Termination::Converged);
    let sweeps = labeling.sweeps();
    let changing = labeling.changing_sweeps();
    (labeling.into_labels(), sweeps, changing)
}

fn run_parity_case(rows: usize, cols: usize, density: f64, seed: u64) {
    let grid = random_grid(rows, cols, density, seed);
    let (expected, expected_sweeps, expected_changing) =
        run_to_fixed_point(&grid, Schedule::Sequential);

    for decomposition in DECOMPOSITIONS {
        let (labels, sweeps, changing) =
            run_to_fixed_point(&grid, Schedule::Parallel(decomposition));
        assert_eq!(
            labels, expected,
            "label mismatch for {decomposition:?} on {rows}x{cols} density {density} seed {seed}"
        );
        assert_eq!(sweeps, expected_sweeps, "sweep count mismatch for {decomposition:?}");
        assert_eq!(changing, expected_changing, "changing sweeps mismatch for {decomposition:?}");
    }
}

#[test]
fn parity_sparse_mid_dense() {
    run_parity_case(96, 96, 0.10, 0xA1);
    run_parity_case(96, 96, 0.59, 0xB2);
    run_parity_case(96, 96, 0.90, 0xC3);
}

#[test]
fn parity_non_square_shapes() {
    run_parity_case(1, 200, 0.7, 0xD4);
    run_parity_case(200, 1, 0.7, 0xE5);
    run_parity_case(37, 151, 0.55, 0xF6);
    run_parity_case(151, 37, 0.55, 0x17);
}

#[test]
fn parity_after_every_single_sweep() {
    let grid = random_grid(64, 80, 0.6, 0x2468);
    let mut sequential = Labeling::new(&grid);
    let mut rows = Labeling::new(&grid);
    let mut tiles = Labeling::new(&grid);

    loop {
        let changed = sequential.sweep(Schedule::Sequential);
        assert_eq!(rows.sweep(Schedule::Parallel(Decomposition::Rows { block: 3 })), changed);
        assert_eq!(
            tiles.sweep(Schedule::Parallel(Decomposition::Tiles { height: 9, width: 11 })),
            changed
        );
        assert_eq!(rows.labels(), sequential.labels());
        assert_eq!(tiles.labels(), sequential.labels());
        if !changed {
            break;
        }
    }
}

#[test]
fn labeler_schedules_agree() {
    let grid = random_grid(160, 144, 0.6, 0x1357_9BDF);
    let mut reports = Vec::new();
    for kind in [
        ScheduleKind::Sequential,
        ScheduleKind::Rows,
        ScheduleKind::Columns,
        ScheduleKind::Tiles,
    ] {
        let labeler = ComponentLabeler::with_config(
            LabelingConfig::default().thread_count(4).schedule(kind),
        )
        .unwrap();
        reports.push(labeler.label(&grid));
    }

    let (first, rest) = reports.split_first().unwrap();
    assert!(first.is_fixed_point());
    for report in rest {
        assert_eq!(report.labels, first.labels, "{:?}", report.schedule);
        assert_eq!(report.sweeps, first.sweeps, "{:?}", report.schedule);
        assert_eq!(report.components, first.components, "{:?}", report.schedule);
    }
}

#[test]
fn deterministic_across_thread_counts() {
    let grid = random_grid(128, 128, 0.58, 0xCAFE);
    let mut baseline = None;

    for threads in [1usize, 2, 3, 8] {
        let labeler = ComponentLabeler::with_config(
            LabelingConfig::default()
                .thread_count(threads)
                .schedule(ScheduleKind::Tiles),
        )
        .unwrap();
        let report = labeler.label(&grid);
        assert_eq!(labeler.thread_count(), threads);
        match &baseline {
            None => baseline = Some((report.labels, report.sweeps)),
            Some((labels, sweeps)) => {
                assert_eq!(&report.labels, labels, "threads={threads}");
                assert_eq!(report.sweeps, *sweeps, "threads={threads}");
            }
        }
    }
}

#[test]
fn capped_runs_agree_between_schedules() {
    let grid = random_grid(90, 90, 0.62, 0x0BAD);
    let mut sequential = Labeling::new(&grid);
    let mut columns = Labeling::new(&grid);

    let seq_end = sequential.run(Schedule::Sequential, 2);
    let col_end = columns.run(Schedule::Parallel(Decomposition::Columns { block: 4 }), 2);
    assert_eq!(seq_end, col_end);
    assert_eq!(sequential.sweeps(), columns.sweeps());
    assert_eq!(sequential.labels(), columns.labels());
}
