use sketchwire::math::Point2;
use sketchwire::sketch::Sketch;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn p(x: f64, y: f64) -> Point2 {
    Point2::new(x, y)
}

/// Closed chain of normal lines through `corners`.
pub fn closed_chain(sketch: &mut Sketch, corners: &[Point2]) -> Vec<usize> {
    (0..corners.len())
        .map(|i| sketch.push_line(corners[i], corners[(i + 1) % corners.len()], false))
        .collect()
}
