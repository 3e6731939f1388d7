use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use engine_logging::engine_info;

use crate::api::ApiClient;
use crate::types::{
    ApiError, Campaign, Company, EnrichOutcome, JobId, NewCampaign, NewCompany, NewPerson, Person,
    ResearchSnippet, Subject, WatchEvent,
};
use crate::watcher::{JobWatcher, WatchHandle, WatchSink, WatcherConfig};

pub enum EngineCommand {
    LoadPeople,
    LoadCompanies,
    LoadCampaigns,
    CreatePerson(NewPerson),
    CreateCompany(NewCompany),
    CreateCampaign(NewCampaign),
    Research { person_id: i64, subject: Subject },
    CancelWatch { job_id: JobId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PeopleLoaded(Result<Vec<Person>, ApiError>),
    CompaniesLoaded(Result<Vec<Company>, ApiError>),
    CampaignsLoaded(Result<Vec<Campaign>, ApiError>),
    PersonCreated(Result<Person, ApiError>),
    CompanyCreated(Result<Company, ApiError>),
    CampaignCreated(Result<Campaign, ApiError>),
    /// Enrich returned existing data; no job was started.
    ResearchReady {
        person_id: i64,
        result: Option<ResearchSnippet>,
    },
    ResearchStarted {
        person_id: i64,
        job_id: JobId,
    },
    ResearchRequestFailed {
        person_id: i64,
        message: String,
    },
    Watch {
        job_id: JobId,
        event: WatchEvent,
    },
}

type WatchRegistry = Arc<Mutex<HashMap<JobId, WatchHandle>>>;

/// Owns the I/O side of the dashboard: a command channel into a dedicated
/// runtime thread, an event channel back out, and the set of live watches.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(api: ApiClient, config: WatcherConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let watches: WatchRegistry = Arc::default();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let config = config.clone();
                let event_tx = event_tx.clone();
                let watches = watches.clone();
                runtime.spawn(async move {
                    handle_command(api, config, command, event_tx, watches).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    api: ApiClient,
    config: WatcherConfig,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
    watches: WatchRegistry,
) {
    match command {
        EngineCommand::LoadPeople => {
            let _ = event_tx.send(EngineEvent::PeopleLoaded(api.list_people().await));
        }
        EngineCommand::LoadCompanies => {
            let _ = event_tx.send(EngineEvent::CompaniesLoaded(api.list_companies().await));
        }
        EngineCommand::LoadCampaigns => {
            let _ = event_tx.send(EngineEvent::CampaignsLoaded(api.list_campaigns().await));
        }
        EngineCommand::CreatePerson(person) => {
            let _ = event_tx.send(EngineEvent::PersonCreated(api.create_person(&person).await));
        }
        EngineCommand::CreateCompany(company) => {
            let _ = event_tx.send(EngineEvent::CompanyCreated(
                api.create_company(&company).await,
            ));
        }
        EngineCommand::CreateCampaign(campaign) => {
            let _ = event_tx.send(EngineEvent::CampaignCreated(
                api.create_campaign(&campaign).await,
            ));
        }
        EngineCommand::Research { person_id, subject } => {
            match api.enrich(person_id).await {
                Ok(EnrichOutcome::Existing(result)) => {
                    engine_info!("person {person_id}: research already on file");
                    let _ = event_tx.send(EngineEvent::ResearchReady { person_id, result });
                }
                Ok(EnrichOutcome::Started(job_id)) => {
                    engine_info!("person {person_id}: research job {job_id} started");
                    // Announce before the watch can produce its first event.
                    let _ = event_tx.send(EngineEvent::ResearchStarted {
                        person_id,
                        job_id: job_id.clone(),
                    });
                    let sink = Arc::new(EngineWatchSink {
                        event_tx: event_tx.clone(),
                        watches: watches.clone(),
                    });
                    let handle =
                        JobWatcher::spawn(api.clone(), config, job_id.clone(), subject, sink);
                    watches.lock().expect("watch registry").insert(job_id, handle);
                }
                Err(err) => {
                    let _ = event_tx.send(EngineEvent::ResearchRequestFailed {
                        person_id,
                        message: err.to_string(),
                    });
                }
            }
        }
        EngineCommand::CancelWatch { job_id } => {
            let handle = watches.lock().expect("watch registry").remove(&job_id);
            if let Some(handle) = handle {
                engine_info!("job {job_id}: watch cancelled");
                handle.cancel();
            }
        }
    }
}

/// Forwards watch events to the UI channel and retires finished watches.
struct EngineWatchSink {
    event_tx: mpsc::Sender<EngineEvent>,
    watches: WatchRegistry,
}

impl WatchSink for EngineWatchSink {
    fn event(&self, job_id: &JobId, event: WatchEvent) {
        let finished = matches!(
            event,
            WatchEvent::Completed { .. }
                | WatchEvent::ResultFetchFailed { .. }
                | WatchEvent::Failed { .. }
        );
        if finished {
            if let Ok(mut registry) = self.watches.lock() {
                registry.remove(job_id);
            }
        }
        let _ = self.event_tx.send(EngineEvent::Watch {
            job_id: job_id.clone(),
            event,
        });
    }
}
