use std::sync::Once;

static TRACING: Once = Once::new();

/// Route limiter logs through the test harness so they show up for failing tests.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}
