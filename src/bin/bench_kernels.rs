//! Sequential vs parallel timing for the comparison kernels.

use grid_kernels::ExecutionMode;
use grid_kernels::kernels::{DenseMatrix, HotPlate, add_multiply_transpose, matvec};
use rand::Rng;
use rand::SeedableRng;
use std::time::Instant;

const MODES: [ExecutionMode; 2] = [ExecutionMode::Sequential, ExecutionMode::Parallel];

fn random_matrix(rng: &mut rand::rngs::StdRng, rows: usize, cols: usize) -> DenseMatrix {
    DenseMatrix::from_fn(rows, cols, |_, _| rng.random_range(-1.0..1.0))
}

fn time_ms<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed().as_secs_f64() * 1000.0)
}

fn main() {
    env_logger::init();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);

    let a = random_matrix(&mut rng, 2000, 2000);
    let x: Vec<f64> = (0..2000).map(|_| rng.random_range(-1.0..1.0)).collect();
    for mode in MODES {
        let (y, ms) = time_ms(|| matvec(&a, &x, mode).expect("shapes agree"));
        println!(
            "matvec    {:<8} {ms:>10.3} ms  y[0]={:.6} y[m-1]={:.6}",
            mode.name(),
            y[0],
            y[y.len() - 1]
        );
    }

    let a = random_matrix(&mut rng, 256, 256);
    let b = random_matrix(&mut rng, 256, 256);
    for mode in MODES {
        let (out, ms) = time_ms(|| add_multiply_transpose(&a, &b, mode).expect("shapes agree"));
        println!(
            "matops    {:<8} {ms:>10.3} ms  add[0,0]={:.6} mul[n-1,n-1]={:.6} t[0,1]={:.6}",
            mode.name(),
            out.sum.get(0, 0),
            out.product.get(255, 255),
            out.transpose.get(0, 1)
        );
    }

    for mode in MODES {
        let mut plate = HotPlate::from_fn(256, |i, _| if i == 0 { 100.0 } else { 0.0 });
        let (report, ms) = time_ms(|| plate.relax(0.1, 10_000, mode));
        println!(
            "hotplate  {:<8} {ms:>10.3} ms  iters={} maxdiff={:.6} hot_cells={} status={}",
            mode.name(),
            report.iterations,
            report.max_diff,
            plate.hot_cells(0.1, mode),
            report.termination.name()
        );
    }
}
