use tracing::debug;

/// Receives human-readable status updates as a job progresses.
///
/// The binary plugs a Telegram status message in here. Updates are
/// best-effort by contract: implementations must swallow their own
/// delivery failures.
#[async_trait::async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn update(&self, text: &str);
}

#[derive(Debug, Default)]
pub struct NoopReporter;

#[async_trait::async_trait]
impl ProgressReporter for NoopReporter {
    async fn update(&self, text: &str) {
        debug!(text, "Progress update");
    }
}
