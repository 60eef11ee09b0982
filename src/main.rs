#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use grid_kernels::labeling::{ComponentLabeler, LabelingConfig, OccupancyGrid, ScheduleKind};
use grid_kernels::{Error, Result};
use rand::RngCore;
use rand::SeedableRng;
use std::time::Instant;

const DEFAULT_SIDE: usize = 256;
const DEFAULT_DENSITY: f64 = 0.3;
const DEFAULT_SEED: u64 = 0;

const USAGE: &str = "usage: grid-kernels [--rows N] [--cols N] [--density P] [--seed S] \
[--schedule sequential|rows|columns|tiles] [--threads N] [--max-sweeps N] [--check]";

struct MainArgs {
    rows: usize,
    cols: usize,
    density: f64,
    seed: u64,
    config: LabelingConfig,
    check: bool,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = MainArgs {
        rows: DEFAULT_SIDE,
        cols: DEFAULT_SIDE,
        density: DEFAULT_DENSITY,
        seed: DEFAULT_SEED,
        config: LabelingConfig::default(),
        check: false,
    };
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value\n{USAGE}"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rows" => {
                i += 1;
                parsed.rows = next_arg(i, "--rows")
                    .parse()
                    .expect("--rows requires a non-negative integer");
            }
            "--cols" => {
                i += 1;
                parsed.cols = next_arg(i, "--cols")
                    .parse()
                    .expect("--cols requires a non-negative integer");
            }
            "--density" => {
                i += 1;
                parsed.density = next_arg(i, "--density")
                    .parse()
                    .expect("--density requires a number in [0, 1]");
            }
            "--seed" => {
                i += 1;
                parsed.seed = next_arg(i, "--seed")
                    .parse()
                    .expect("--seed requires an unsigned integer");
            }
            "--schedule" => {
                i += 1;
                let kind: ScheduleKind = next_arg(i, "--schedule")
                    .parse()
                    .unwrap_or_else(|err| panic!("{err}\n{USAGE}"));
                parsed.config = parsed.config.schedule(kind);
            }
            "--threads" => {
                i += 1;
                let n: usize = next_arg(i, "--threads")
                    .parse()
                    .expect("--threads requires a positive integer");
                parsed.config = parsed.config.thread_count(n);
            }
            "--max-sweeps" => {
                i += 1;
                let cap: u64 = next_arg(i, "--max-sweeps")
                    .parse()
                    .expect("--max-sweeps requires an unsigned integer");
                parsed.config = parsed.config.max_sweeps(cap);
            }
            "--check" => {
                parsed.check = true;
            }
            other => panic!("unknown argument: {other}\n{USAGE}"),
        }
        i += 1;
    }
    parsed
}

fn seed_random_grid(rows: usize, cols: usize, density: f64, seed: u64) -> Result<OccupancyGrid> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimension {
            rows,
            cols,
            reason: "rows and cols must be positive",
        });
    }
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density.clamp(0.0, 1.0)) as u64;
    OccupancyGrid::from_fn(rows, cols, |_, _| rng.next_u64() < threshold)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args();
    let grid = seed_random_grid(args.rows, args.cols, args.density, args.seed)?;
    let labeler = ComponentLabeler::with_config(args.config.clone())?;

    let start = Instant::now();
    let report = labeler.label(&grid);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    println!(
        "R={} C={} iters={} components={} mode={} status={} threads={} time={elapsed_ms:.3}ms",
        report.rows,
        report.cols,
        report.sweeps,
        report.components,
        report.schedule.name(),
        report.termination.name(),
        labeler.thread_count(),
    );

    if args.check {
        let serial_config = args.config.thread_count(1).schedule(ScheduleKind::Sequential);
        let serial = ComponentLabeler::with_config(serial_config)?.label(&grid);
        let status = if serial.labels == report.labels && serial.sweeps == report.sweeps {
            "MATCH"
        } else {
            "MISMATCH"
        };
        println!(
            "check: serial iters={} components={} [{status}]",
            serial.sweeps, serial.components
        );
    }
    Ok(())
}
