use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque backend-issued identifier for a research job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One status report for a job, from either channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub state: JobState,
}

impl StatusUpdate {
    /// Decodes a wire status payload.
    ///
    /// The backend is lenient territory: a missing progress reads as 0 and a
    /// state outside the known vocabulary reads as still running.
    pub fn from_json(payload: &[u8]) -> Result<Self, ApiError> {
        let raw: RawStatus =
            serde_json::from_slice(payload).map_err(|err| ApiError::Decode(err.to_string()))?;
        Ok(raw.into())
    }
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    state: Option<String>,
}

impl From<RawStatus> for StatusUpdate {
    fn from(raw: RawStatus) -> Self {
        let progress = match raw.progress {
            Some(value) if value.is_finite() => value.clamp(0.0, 100.0) as u8,
            _ => 0,
        };
        let state = match raw.state.as_deref() {
            Some("completed") => JobState::Completed,
            Some("failed") => JobState::Failed,
            _ => JobState::Running,
        };
        Self { progress, state }
    }
}

/// A research result row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSnippet {
    #[serde(default)]
    pub id: Option<i64>,
    pub company_id: i64,
    #[serde(default)]
    pub person_id: Option<i64>,
    #[serde(default)]
    pub company_value_prop: String,
    #[serde(default)]
    pub product_names: Vec<String>,
    #[serde(default)]
    pub pricing_model: String,
    #[serde(default)]
    pub key_competitors: Vec<String>,
    #[serde(default)]
    pub company_domain: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Which snippet collection a watch resolves its result from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Company(i64),
    Person(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub full_name: String,
    pub title: String,
    pub company_id: i64,
    #[serde(default)]
    pub company: Option<CompanyRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRef {
    pub name: String,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub website: String,
    #[serde(default)]
    pub campaign_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub full_name: String,
    pub title: String,
    pub company_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub name: String,
    pub website: String,
    pub campaign_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub name: String,
}

/// What `POST /enrich/{personId}` decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// Research already exists; no job was started.
    Existing(Option<ResearchSnippet>),
    /// A background job was scheduled.
    Started(JobId),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEnrich {
    #[serde(default)]
    pub(crate) is_existing: bool,
    #[serde(default)]
    pub(crate) job_id: Option<JobId>,
    #[serde(default)]
    pub(crate) data: Option<ResearchSnippet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Consumer-visible lifecycle of one job watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Progress {
        progress: u8,
    },
    /// One poll tick failed; polling continues.
    PollError {
        message: String,
    },
    /// The job completed; `None` means the backend had no result row yet.
    Completed {
        result: Option<ResearchSnippet>,
    },
    /// The job completed but the result fetch failed.
    ResultFetchFailed {
        message: String,
    },
    Failed {
        message: String,
    },
}
