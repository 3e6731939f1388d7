use std::sync::Arc;
use std::time::Duration;

use engine_logging::engine_debug;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::ResearchBackend;
use crate::push::StatusSink;
use crate::types::JobId;

/// Handle to a running poll loop. `stop` is idempotent; at most one
/// already-in-flight callback may land after it returns.
#[derive(Debug, Clone)]
pub struct PullHandle {
    cancel: CancellationToken,
}

impl PullHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Polling status source: one status request per tick, exactly one callback
/// per tick. A failed probe is reported and the loop keeps going; only the
/// caller decides when polling ends.
pub struct PullSource;

impl PullSource {
    pub fn start(
        backend: Arc<dyn ResearchBackend>,
        job_id: JobId,
        interval: Duration,
        sink: Arc<dyn StatusSink>,
    ) -> PullHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                let result = tokio::select! {
                    _ = token.cancelled() => return,
                    result = backend.job_status(&job_id) => result,
                };
                match result {
                    Ok(update) => sink.update(update),
                    Err(err) => {
                        engine_debug!("job {job_id}: poll tick failed: {err}");
                        sink.error(err);
                    }
                }
            }
        });
        PullHandle { cancel }
    }
}
