//! Labeling throughput per schedule across grid sizes.
//!
//! Use with `--release` for meaningful results. Every schedule's label
//! buffer is compared against the sequential run.

use grid_kernels::labeling::{ComponentLabeler, LabelingConfig, OccupancyGrid, ScheduleKind};
use rand::RngCore;
use rand::SeedableRng;
use std::env;
use std::time::Instant;

const SCHEDULES: [ScheduleKind; 4] = [
    ScheduleKind::Sequential,
    ScheduleKind::Rows,
    ScheduleKind::Columns,
    ScheduleKind::Tiles,
];

#[derive(Clone, Debug)]
struct BenchConfig {
    density: f64,
    seed: u64,
    threads: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            density: 0.6,
            seed: 0x5EED_1234_ABCD_EF01,
            threads: None,
        }
    }
}

fn parse_args() -> BenchConfig {
    let mut cfg = BenchConfig::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--density" => {
                if let Some(v) = args.next() {
                    cfg.density = v.parse().expect("--density expects f64");
                }
            }
            "--seed" => {
                if let Some(v) = args.next() {
                    cfg.seed = if let Some(hex) = v.strip_prefix("0x") {
                        u64::from_str_radix(hex, 16).expect("--seed hex parse failed")
                    } else {
                        v.parse().expect("--seed expects u64")
                    };
                }
            }
            "--threads" => {
                if let Some(v) = args.next() {
                    cfg.threads = Some(v.parse().expect("--threads expects usize"));
                }
            }
            other => panic!("unknown arg: {other}"),
        }
    }
    cfg
}

fn random_grid(side: usize, density: f64, seed: u64) -> OccupancyGrid {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density) as u64;
    OccupancyGrid::from_fn(side, side, |_, _| rng.next_u64() < threshold)
        .expect("benchmark grid fits the label space")
}

fn main() {
    env_logger::init();
    let cfg = parse_args();
    let sides = [128usize, 256, 512, 1024];

    println!(
        "{:<10} {:<10} {:>8} {:>11} {:>12} {:>8}",
        "Grid", "Schedule", "Sweeps", "Components", "Total(ms)", "Parity"
    );
    println!("{}", "-".repeat(64));

    for side in sides {
        let grid = random_grid(side, cfg.density, cfg.seed);
        let mut reference = None;

        for kind in SCHEDULES {
            let mut config = LabelingConfig::default().schedule(kind);
            if let Some(t) = cfg.threads {
                config = config.thread_count(t);
            }
            let labeler = ComponentLabeler::with_config(config).expect("build labeler");

            let start = Instant::now();
            let report = labeler.label(&grid);
            let total_ms = start.elapsed().as_secs_f64() * 1000.0;

            let parity = match &reference {
                None => "-",
                Some(expected) if *expected == report.labels => "MATCH",
                Some(_) => "MISMATCH",
            };
            println!(
                "{:<10} {:<10} {:>8} {:>11} {:>12.2} {:>8}",
                format!("{side}x{side}"),
                report.schedule.name(),
                report.sweeps,
                report.components,
                total_ms,
                parity
            );
            if reference.is_none() {
                reference = Some(report.labels);
            }
        }
    }
}
