use crate::{CampaignRecord, CompanyRecord, JobId, PersonRecord, ResearchResult, ResearchSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Directory fetch finished.
    PeopleLoaded(Result<Vec<PersonRecord>, String>),
    CompaniesLoaded(Result<Vec<CompanyRecord>, String>),
    CampaignsLoaded(Result<Vec<CampaignRecord>, String>),
    /// User submitted a new person record.
    CreatePersonRequested {
        full_name: String,
        title: String,
        company_id: i64,
    },
    /// User submitted a new company record.
    CreateCompanyRequested {
        name: String,
        website: String,
        campaign_id: Option<i64>,
    },
    /// User submitted a new campaign record.
    CreateCampaignRequested { name: String },
    PersonCreated(Result<PersonRecord, String>),
    CompanyCreated(Result<CompanyRecord, String>),
    CampaignCreated(Result<CampaignRecord, String>),
    /// User asked for research on a person row.
    ResearchRequested { person_id: i64 },
    /// Enrich call accepted; a job is now running.
    ResearchStarted { person_id: i64, job_id: JobId },
    /// Enrich call returned existing data; no job was started.
    ResearchReady {
        person_id: i64,
        result: Option<ResearchResult>,
    },
    /// Enrich call failed outright.
    ResearchRequestFailed { person_id: i64, message: String },
    /// Watcher progress for a running job.
    JobProgress { job_id: JobId, progress: u8 },
    /// One poll tick failed; the watch itself continues.
    JobPollError { job_id: JobId, message: String },
    /// Job finished; `result` is absent when the backend had no row yet.
    JobCompleted {
        job_id: JobId,
        result: Option<ResearchResult>,
    },
    /// Job finished but the result fetch failed.
    JobResultUnavailable { job_id: JobId, message: String },
    /// Job reported a terminal failure.
    JobFailed { job_id: JobId, message: String },
    /// User abandoned the research session on a row.
    ResearchCancelRequested { person_id: i64 },
    /// Restore previously completed research from persisted state.
    RestoreResearch(Vec<ResearchSnapshot>),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
