use prospect_engine::{
    ApiError, Channel, FailoverController, JobState, SourceEvent, Step, StatusUpdate,
};

fn running(progress: u8) -> SourceEvent {
    SourceEvent::Update(StatusUpdate {
        progress,
        state: JobState::Running,
    })
}

fn completed(progress: u8) -> SourceEvent {
    SourceEvent::Update(StatusUpdate {
        progress,
        state: JobState::Completed,
    })
}

fn failed() -> SourceEvent {
    SourceEvent::Update(StatusUpdate {
        progress: 0,
        state: JobState::Failed,
    })
}

fn broken_pipe() -> SourceEvent {
    SourceEvent::Error(ApiError::Network("connection reset".to_string()))
}

fn started() -> FailoverController {
    let mut controller = FailoverController::new();
    controller.start();
    controller
}

#[test]
fn events_before_start_are_ignored() {
    let mut controller = FailoverController::new();
    assert_eq!(controller.on_event(Channel::Push, running(10)), Step::Ignore);
    assert_eq!(controller.on_event(Channel::Push, completed(100)), Step::Ignore);
    assert!(!controller.is_done());
}

#[test]
fn push_progress_is_delivered_in_order() {
    let mut controller = started();
    assert_eq!(
        controller.on_event(Channel::Push, running(10)),
        Step::Deliver { progress: 10 }
    );
    assert_eq!(
        controller.on_event(Channel::Push, running(40)),
        Step::Deliver { progress: 40 }
    );
    assert!(!controller.is_done());
}

#[test]
fn completion_latches_exactly_once() {
    let mut controller = started();
    assert_eq!(
        controller.on_event(Channel::Push, completed(100)),
        Step::Complete { progress: 100 }
    );
    assert!(controller.is_done());

    // Duplicate terminal signals from any channel change nothing.
    assert_eq!(controller.on_event(Channel::Push, completed(100)), Step::Ignore);
    assert_eq!(controller.on_event(Channel::Pull, completed(100)), Step::Ignore);
    assert_eq!(controller.on_event(Channel::Push, running(10)), Step::Ignore);
    assert_eq!(controller.on_event(Channel::Push, broken_pipe()), Step::Ignore);
    assert!(controller.is_done());
}

#[test]
fn push_error_fails_over_and_push_becomes_stale() {
    let mut controller = started();
    assert_eq!(controller.on_event(Channel::Push, broken_pipe()), Step::Failover);

    // A late message from the dead stream is dropped.
    assert_eq!(controller.on_event(Channel::Push, running(50)), Step::Ignore);
    assert_eq!(controller.on_event(Channel::Push, completed(100)), Step::Ignore);
    assert!(!controller.is_done());

    // The pull channel now drives the watch.
    assert_eq!(
        controller.on_event(Channel::Pull, running(20)),
        Step::Deliver { progress: 20 }
    );
    assert_eq!(
        controller.on_event(Channel::Pull, completed(100)),
        Step::Complete { progress: 100 }
    );
    assert!(controller.is_done());
}

#[test]
fn late_push_terminal_after_failover_never_completes_twice() {
    let mut controller = started();
    assert_eq!(controller.on_event(Channel::Push, broken_pipe()), Step::Failover);
    // The stream flushed a final message just before dying.
    assert_eq!(controller.on_event(Channel::Push, completed(100)), Step::Ignore);
    // Only the pull channel's terminal counts, and only once.
    assert_eq!(
        controller.on_event(Channel::Pull, completed(100)),
        Step::Complete { progress: 100 }
    );
    assert_eq!(controller.on_event(Channel::Pull, completed(100)), Step::Ignore);
}

#[test]
fn pull_errors_are_transient() {
    let mut controller = started();
    controller.on_event(Channel::Push, broken_pipe());

    let step = controller.on_event(
        Channel::Pull,
        SourceEvent::Error(ApiError::Status(502)),
    );
    assert_eq!(
        step,
        Step::PollErrored {
            message: "http status 502".to_string(),
        }
    );
    assert!(!controller.is_done());

    // Polling continues and can still finish the watch.
    assert_eq!(
        controller.on_event(Channel::Pull, completed(100)),
        Step::Complete { progress: 100 }
    );
}

#[test]
fn failure_is_terminal_without_a_result_fetch() {
    let mut controller = started();
    assert_eq!(controller.on_event(Channel::Push, failed()), Step::Fail);
    assert!(controller.is_done());
    assert_eq!(controller.on_event(Channel::Pull, completed(100)), Step::Ignore);
}
