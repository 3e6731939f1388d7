use std::time::Duration;

use prospect_engine::{
    ApiClient, ApiConfig, EngineCommand, EngineEvent, EngineHandle, JobId, Subject, WatchEvent,
    WatcherConfig,
};
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer) -> EngineHandle {
    let base = Url::parse(&server.uri()).expect("server url");
    let api = ApiClient::new(ApiConfig::new(base, "secret")).expect("client");
    let config = WatcherConfig {
        poll_interval: Duration::from_millis(25),
        result_fetch_delay: Duration::ZERO,
    };
    EngineHandle::new(api, config)
}

async fn next_engine_event(engine: &EngineHandle) -> EngineEvent {
    for _ in 0..200 {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("no engine event arrived");
}

async fn assert_engine_silent(engine: &EngineHandle) {
    tokio::time::sleep(Duration::from_millis(300)).await;
    if let Some(event) = engine.try_recv() {
        panic!("unexpected engine event: {event:?}");
    }
}

#[tokio::test]
async fn existing_research_short_circuits_without_a_watch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/enrich/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "isExisting": true,
            "data": {
                "companyId": 7,
                "companyValueProp": "ships widgets faster",
            },
        })))
        .mount(&server)
        .await;
    // No job means no status channel is ever opened.
    Mock::given(method("GET"))
        .and(path_regex("^/(events|research)/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::Research {
        person_id: 42,
        subject: Subject::Company(7),
    });

    match next_engine_event(&engine).await {
        EngineEvent::ResearchReady {
            person_id,
            result: Some(snippet),
        } => {
            assert_eq!(person_id, 42);
            assert_eq!(snippet.company_value_prop, "ships widgets faster");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_engine_silent(&engine).await;
}

#[tokio::test]
async fn research_spawns_a_watch_and_cancel_silences_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/enrich/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "isExisting": false,
            "jobId": "job-1",
        })))
        .mount(&server)
        .await;
    // A stream that produces nothing within the lifetime of the test.
    Mock::given(method("GET"))
        .and(path("/events/jobs/job-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(30))
                .set_body_raw("", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::Research {
        person_id: 42,
        subject: Subject::Company(7),
    });

    match next_engine_event(&engine).await {
        EngineEvent::ResearchStarted { person_id, job_id } => {
            assert_eq!(person_id, 42);
            assert_eq!(job_id, JobId::new("job-1"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    engine.send(EngineCommand::CancelWatch {
        job_id: JobId::new("job-1"),
    });
    assert_engine_silent(&engine).await;
}

#[tokio::test]
async fn enrich_failure_is_reported_to_the_consumer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/enrich/42"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::Research {
        person_id: 42,
        subject: Subject::Company(7),
    });

    match next_engine_event(&engine).await {
        EngineEvent::ResearchRequestFailed { person_id, message } => {
            assert_eq!(person_id, 42);
            assert_eq!(message, "http status 503");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn watch_events_reach_the_consumer_tagged_by_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/enrich/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "isExisting": false,
            "jobId": "job-2",
        })))
        .mount(&server)
        .await;
    let body = "data: {\"progress\":100,\"state\":\"completed\"}\n\n";
    Mock::given(method("GET"))
        .and(path("/events/jobs/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/snippets/company/7"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::Research {
        person_id: 42,
        subject: Subject::Company(7),
    });

    assert!(matches!(
        next_engine_event(&engine).await,
        EngineEvent::ResearchStarted { .. }
    ));
    assert_eq!(
        next_engine_event(&engine).await,
        EngineEvent::Watch {
            job_id: JobId::new("job-2"),
            event: WatchEvent::Progress { progress: 100 },
        }
    );
    assert_eq!(
        next_engine_event(&engine).await,
        EngineEvent::Watch {
            job_id: JobId::new("job-2"),
            event: WatchEvent::Completed { result: None },
        }
    );
}
