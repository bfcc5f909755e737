pub mod stubs;

use tracing_subscriber::EnvFilter;

/// Install the test tracing subscriber once; later calls are no-ops.
/// Run with `RUST_LOG=colloquy=debug` to see state transitions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
