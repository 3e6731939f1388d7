//! Prospect engine: HTTP API client, job-status sources and the watch driver.
mod api;
mod engine;
mod pull;
mod push;
mod types;
mod watcher;

pub use api::{ApiClient, ApiConfig, ResearchBackend, API_KEY_HEADER};
pub use engine::{EngineCommand, EngineEvent, EngineHandle};
pub use pull::{PullHandle, PullSource};
pub use push::{PushHandle, PushSource, StatusSink};
pub use types::{
    ApiError, Campaign, Company, CompanyRef, EnrichOutcome, JobId, JobState, NewCampaign,
    NewCompany, NewPerson, Person, ResearchSnippet, StatusUpdate, Subject, WatchEvent,
};
pub use watcher::{
    Channel, FailoverController, JobWatcher, SourceEvent, Step, WatchHandle, WatchSink,
    WatcherConfig,
};
