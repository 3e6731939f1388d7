use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ResearchBackend};
use crate::pull::{PullHandle, PullSource};
use crate::push::{PushHandle, PushSource, StatusSink};
use crate::types::{ApiError, JobId, JobState, ResearchSnippet, StatusUpdate, Subject, WatchEvent};

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Poll cadence after failing over to the pull channel.
    pub poll_interval: Duration,
    /// Grace period between the completed update and the result fetch, so a
    /// result row written moments after the job flips state is still seen.
    pub result_fetch_delay: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3000),
            result_fetch_delay: Duration::from_millis(1000),
        }
    }
}

/// Which status channel produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Push,
    Pull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Update(StatusUpdate),
    Error(ApiError),
}

/// What the watch driver must do in response to a source event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Forward a progress value to the consumer.
    Deliver { progress: u8 },
    /// Close the push source and start polling.
    Failover,
    /// Surface a transient poll failure; polling continues.
    PollErrored { message: String },
    /// Terminal success: stop the active source, run the result handshake.
    /// Carries the final progress value, delivered before completion.
    Complete { progress: u8 },
    /// Terminal failure: stop the active source, no result fetch.
    Fail,
    /// Stale channel, post-terminal event, or not started: drop it.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Push,
    Pull,
    Done,
}

/// Decides how one watch reacts to events from either status channel.
///
/// Watching starts on the push channel and falls back to polling if the
/// stream errors before a terminal update; never the reverse, never both at
/// once. The first terminal update latches `Done`; everything after that is
/// ignored, which is what makes the completion handshake fire exactly once
/// even when both channels race to report the same terminal state.
#[derive(Debug)]
pub struct FailoverController {
    phase: Phase,
}

impl FailoverController {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Push;
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn on_event(&mut self, channel: Channel, event: SourceEvent) -> Step {
        let current = match self.phase {
            Phase::Idle | Phase::Done => return Step::Ignore,
            Phase::Push => Channel::Push,
            Phase::Pull => Channel::Pull,
        };
        if channel != current {
            return Step::Ignore;
        }
        match event {
            SourceEvent::Update(update) => match update.state {
                JobState::Running => Step::Deliver {
                    progress: update.progress,
                },
                JobState::Completed => {
                    self.phase = Phase::Done;
                    Step::Complete {
                        progress: update.progress,
                    }
                }
                JobState::Failed => {
                    self.phase = Phase::Done;
                    Step::Fail
                }
            },
            SourceEvent::Error(error) => match current {
                Channel::Push => {
                    self.phase = Phase::Pull;
                    Step::Failover
                }
                // There is no third channel to fall back to.
                Channel::Pull => Step::PollErrored {
                    message: error.to_string(),
                },
            },
        }
    }
}

impl Default for FailoverController {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives the consumer-visible events of a watch.
pub trait WatchSink: Send + Sync {
    fn event(&self, job_id: &JobId, event: WatchEvent);
}

/// Handle to a running watch. `cancel` is idempotent, releases both status
/// sources, and guarantees no further sink callbacks.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    cancel: CancellationToken,
}

impl WatchHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Supervises one research job from subscription to completion.
pub struct JobWatcher;

impl JobWatcher {
    pub fn spawn(
        api: ApiClient,
        config: WatcherConfig,
        job_id: JobId,
        subject: Subject,
        sink: Arc<dyn WatchSink>,
    ) -> WatchHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(run_watch(api, config, job_id, subject, sink, token));
        WatchHandle { cancel }
    }
}

/// Funnels both sources into the watch task's single event queue, tagged by
/// channel so the controller can discard stale producers.
struct ChannelStatusSink {
    channel: Channel,
    tx: mpsc::UnboundedSender<(Channel, SourceEvent)>,
}

impl StatusSink for ChannelStatusSink {
    fn update(&self, update: StatusUpdate) {
        let _ = self.tx.send((self.channel, SourceEvent::Update(update)));
    }

    fn error(&self, error: ApiError) {
        let _ = self.tx.send((self.channel, SourceEvent::Error(error)));
    }
}

async fn run_watch(
    api: ApiClient,
    config: WatcherConfig,
    job_id: JobId,
    subject: Subject,
    sink: Arc<dyn WatchSink>,
    cancel: CancellationToken,
) {
    let backend: Arc<dyn ResearchBackend> = Arc::new(api.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = FailoverController::new();
    controller.start();

    let mut push = Some(PushSource::open(
        api,
        job_id.clone(),
        Arc::new(ChannelStatusSink {
            channel: Channel::Push,
            tx: tx.clone(),
        }),
    ));
    let mut pull: Option<PullHandle> = None;

    loop {
        let (channel, event) = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Some(pair) => pair,
                None => break,
            },
        };
        match controller.on_event(channel, event) {
            Step::Deliver { progress } => {
                sink.event(&job_id, WatchEvent::Progress { progress });
            }
            Step::Failover => {
                engine_warn!("job {job_id}: event stream failed, switching to polling");
                if let Some(handle) = push.take() {
                    handle.close();
                }
                pull = Some(PullSource::start(
                    backend.clone(),
                    job_id.clone(),
                    config.poll_interval,
                    Arc::new(ChannelStatusSink {
                        channel: Channel::Pull,
                        tx: tx.clone(),
                    }),
                ));
            }
            Step::PollErrored { message } => {
                sink.event(&job_id, WatchEvent::PollError { message });
            }
            Step::Complete { progress } => {
                close_sources(&mut push, &mut pull);
                sink.event(&job_id, WatchEvent::Progress { progress });
                match fetch_result(backend.as_ref(), &subject, &config, &cancel).await {
                    Some(Ok(result)) => {
                        engine_info!("job {job_id}: completed");
                        sink.event(&job_id, WatchEvent::Completed { result });
                    }
                    Some(Err(err)) => {
                        engine_warn!("job {job_id}: completed but result fetch failed: {err}");
                        sink.event(
                            &job_id,
                            WatchEvent::ResultFetchFailed {
                                message: err.to_string(),
                            },
                        );
                    }
                    // Cancelled mid-handshake: the consumer hears nothing.
                    None => {}
                }
                break;
            }
            Step::Fail => {
                close_sources(&mut push, &mut pull);
                engine_info!("job {job_id}: failed");
                sink.event(
                    &job_id,
                    WatchEvent::Failed {
                        message: "research job reported failure".into(),
                    },
                );
                break;
            }
            Step::Ignore => {
                engine_debug!("job {job_id}: dropping stale status event");
            }
        }
    }

    close_sources(&mut push, &mut pull);
}

/// The completion handshake: optional settle delay, then exactly one fetch.
/// Returns `None` when the watch was cancelled while waiting.
async fn fetch_result(
    backend: &dyn ResearchBackend,
    subject: &Subject,
    config: &WatcherConfig,
    cancel: &CancellationToken,
) -> Option<Result<Option<ResearchSnippet>, ApiError>> {
    if !config.result_fetch_delay.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(config.result_fetch_delay) => {}
        }
    }
    tokio::select! {
        _ = cancel.cancelled() => None,
        result = backend.latest_snippet(subject) => Some(result),
    }
}

fn close_sources(push: &mut Option<PushHandle>, pull: &mut Option<PullHandle>) {
    if let Some(handle) = push.take() {
        handle.close();
    }
    if let Some(handle) = pull.take() {
        handle.stop();
    }
}
