use prospect_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn tick_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::Tick);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn job_messages_for_unknown_jobs_are_ignored() {
    let state = AppState::new();

    let (next, effects) = update(
        state.clone(),
        Msg::JobProgress {
            job_id: "job-404".to_string(),
            progress: 50,
        },
    );
    assert_eq!(state, next);
    assert!(effects.is_empty());

    let (next, effects) = update(
        state.clone(),
        Msg::JobCompleted {
            job_id: "job-404".to_string(),
            result: None,
        },
    );
    assert_eq!(state, next);
    assert!(effects.is_empty());

    let (next, effects) = update(
        state.clone(),
        Msg::JobFailed {
            job_id: "job-404".to_string(),
            message: "boom".to_string(),
        },
    );
    assert_eq!(state, next);
    assert!(effects.is_empty());
}
