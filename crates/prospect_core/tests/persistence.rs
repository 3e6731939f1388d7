use prospect_core::{
    update, AppState, Msg, PersonRecord, ResearchResult, ResearchSnapshot, ResearchStatusView,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn person(id: i64) -> PersonRecord {
    PersonRecord {
        id,
        full_name: format!("Person {id}"),
        title: "Engineer".to_string(),
        company_id: 100 + id,
        company_name: None,
    }
}

fn sample_result() -> ResearchResult {
    ResearchResult {
        company_value_prop: "ships widgets faster".to_string(),
        product_names: vec!["Widget".to_string()],
        pricing_model: "per seat".to_string(),
        key_competitors: vec!["Globex".to_string()],
        company_domain: "acme.example".to_string(),
    }
}

fn status_of(state: &AppState, person_id: i64) -> ResearchStatusView {
    state
        .view()
        .people
        .into_iter()
        .find(|row| row.person_id == person_id)
        .expect("row")
        .status
}

#[test]
fn completed_research_can_be_restored_for_resume() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::PeopleLoaded(Ok(vec![person(1)])));
    let (state, _) = update(state, Msg::ResearchRequested { person_id: 1 });
    let (state, _) = update(
        state,
        Msg::ResearchStarted {
            person_id: 1,
            job_id: "job-1".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::JobCompleted {
            job_id: "job-1".to_string(),
            result: Some(sample_result()),
        },
    );

    let snapshot = state.completed_research_snapshot();
    assert_eq!(
        snapshot,
        vec![ResearchSnapshot {
            person_id: 1,
            result: sample_result(),
        }]
    );

    // A fresh session restores the snapshot onto the loaded directory.
    let (restored, _) = update(AppState::new(), Msg::PeopleLoaded(Ok(vec![person(1)])));
    let (restored, effects) = update(restored, Msg::RestoreResearch(snapshot));
    assert!(effects.is_empty());
    assert_eq!(
        status_of(&restored, 1),
        ResearchStatusView::Done {
            result: Some(sample_result()),
        }
    );
}

#[test]
fn restore_before_directory_load_is_applied_on_load() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::RestoreResearch(vec![ResearchSnapshot {
            person_id: 1,
            result: sample_result(),
        }]),
    );
    let (state, _) = update(state, Msg::PeopleLoaded(Ok(vec![person(1), person(2)])));

    assert_eq!(
        status_of(&state, 1),
        ResearchStatusView::Done {
            result: Some(sample_result()),
        }
    );
    assert_eq!(status_of(&state, 2), ResearchStatusView::Idle);
}

#[test]
fn restore_never_clobbers_a_session_in_flight() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::PeopleLoaded(Ok(vec![person(1)])));
    let (state, _) = update(state, Msg::ResearchRequested { person_id: 1 });
    let (state, _) = update(
        state,
        Msg::ResearchStarted {
            person_id: 1,
            job_id: "job-1".to_string(),
        },
    );

    let (state, _) = update(
        state,
        Msg::RestoreResearch(vec![ResearchSnapshot {
            person_id: 1,
            result: sample_result(),
        }]),
    );
    assert_eq!(
        status_of(&state, 1),
        ResearchStatusView::Researching {
            progress: 0,
            note: None,
        }
    );
}

#[test]
fn rows_without_results_are_not_snapshotted() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::PeopleLoaded(Ok(vec![person(1)])));
    let (state, _) = update(state, Msg::ResearchRequested { person_id: 1 });
    let (state, _) = update(
        state,
        Msg::ResearchStarted {
            person_id: 1,
            job_id: "job-1".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::JobCompleted {
            job_id: "job-1".to_string(),
            result: None,
        },
    );

    assert!(state.completed_research_snapshot().is_empty());
}
