use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

/// A timer-driven callback running on its own tokio task.
///
/// The first tick fires one `period` after spawning. Once [`PeriodicTask::stop`] returns
/// the callback is not running and will never run again. Dropping the handle cancels the
/// task without waiting for it.
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F>(name: &'static str, period: Duration, tick: F) -> Result<Self, PipelineError>
    where
        F: FnMut() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;
        let token = CancellationToken::new();
        let handle = runtime.spawn(run_periodic(name, period, token.clone(), tick));

        tracing::debug!("Started periodic task {} every {:?}", name, period);

        Ok(Self {
            name,
            token,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Cancel the task and wait until its loop has exited.
    pub async fn stop(mut self) {
        self.token.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("Periodic task {} ended abnormally: {:?}", self.name, e);
            }
        }

        tracing::debug!("Stopped periodic task {}", self.name);
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[tracing::instrument(skip(token, tick), level = "trace", name = "PeriodicTask")]
async fn run_periodic<F>(name: &'static str, period: Duration, token: CancellationToken, mut tick: F)
where
    F: FnMut() + Send + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => tick(),
        }
    }
}
