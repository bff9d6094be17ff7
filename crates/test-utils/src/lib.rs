//! Shared helpers for sitewatch's integration tests.

pub mod builders;
pub mod fake_backend;

use std::future::Future;
use std::sync::Once;
use std::thread;
use std::time::{Duration, Instant};

use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for any single async step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a test-captured tracing subscriber once per test binary.
///
/// Output only shows for failing tests unless run with `--nocapture`;
/// `RUST_LOG=sitewatch=debug` raises the level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .expect("test step timed out")
}

/// Poll `condition` from a plain thread until it holds or [`TEST_TIMEOUT`]
/// passes. Returns whether it ever held.
///
/// For the dev server, whose listeners live on OS threads rather than tasks.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TEST_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}
