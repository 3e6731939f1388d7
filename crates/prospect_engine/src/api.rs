use std::time::Duration;

use async_trait::async_trait;
use engine_logging::engine_trace;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::types::{
    ApiError, Campaign, Company, EnrichOutcome, JobId, NewCampaign, NewCompany, NewPerson, Person,
    RawEnrich, ResearchSnippet, StatusUpdate, Subject,
};

/// Header carrying the credential on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub api_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The calls a watch needs while it runs: status probes and the result fetch.
#[async_trait]
pub trait ResearchBackend: Send + Sync {
    async fn job_status(&self, job_id: &JobId) -> Result<StatusUpdate, ApiError>;
    async fn latest_snippet(&self, subject: &Subject) -> Result<Option<ResearchSnippet>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        // Endpoint paths are joined relative to the base; a missing trailing
        // slash would silently drop the last path segment.
        let mut base = config.base_url;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http,
            base,
            api_key: config.api_key,
            request_timeout: config.request_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path)?;
        engine_trace!("GET {url}");
        let response = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.get_bytes(path).await?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        engine_trace!("POST {url}");
        let payload =
            serde_json::to_vec(body).map_err(|err| ApiError::Decode(err.to_string()))?;
        let response = self
            .http
            .post(url)
            .timeout(self.request_timeout)
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Requests research for a person; either returns existing data or the
    /// id of a freshly scheduled job.
    pub async fn enrich(&self, person_id: i64) -> Result<EnrichOutcome, ApiError> {
        let url = self.endpoint(&format!("enrich/{person_id}"))?;
        engine_trace!("POST {url}");
        let response = self
            .http
            .post(url)
            .timeout(self.request_timeout)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let raw: RawEnrich =
            serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))?;
        if raw.is_existing {
            Ok(EnrichOutcome::Existing(raw.data))
        } else {
            match raw.job_id {
                Some(job_id) => Ok(EnrichOutcome::Started(job_id)),
                None => Err(ApiError::Decode("enrich response missing jobId".into())),
            }
        }
    }

    /// Opens the server-push status stream for a job.
    ///
    /// No overall request timeout is set here: the stream lives until the
    /// job settles or the caller drops it. Connection problems and non-2xx
    /// responses surface as errors for the push source to report.
    pub async fn open_events(&self, job_id: &JobId) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(&format!("events/jobs/{job_id}"))?;
        engine_trace!("GET {url} (event stream)");
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("text/event-stream") {
            return Err(ApiError::Decode(format!(
                "expected an event stream, got content type {content_type:?}"
            )));
        }
        Ok(response)
    }

    pub async fn list_people(&self) -> Result<Vec<Person>, ApiError> {
        self.get_json("people").await
    }

    pub async fn create_person(&self, person: &NewPerson) -> Result<Person, ApiError> {
        self.post_json("people", person).await
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.get_json("companies").await
    }

    pub async fn create_company(&self, company: &NewCompany) -> Result<Company, ApiError> {
        self.post_json("companies", company).await
    }

    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>, ApiError> {
        self.get_json("campaigns").await
    }

    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, ApiError> {
        self.post_json("campaigns", campaign).await
    }
}

#[async_trait]
impl ResearchBackend for ApiClient {
    async fn job_status(&self, job_id: &JobId) -> Result<StatusUpdate, ApiError> {
        let body = self.get_bytes(&format!("research/jobs/{job_id}")).await?;
        StatusUpdate::from_json(&body)
    }

    async fn latest_snippet(&self, subject: &Subject) -> Result<Option<ResearchSnippet>, ApiError> {
        let path = match subject {
            Subject::Company(id) => format!("snippets/company/{id}"),
            Subject::Person(id) => format!("snippets/person/{id}"),
        };
        let mut snippets: Vec<ResearchSnippet> = self.get_json(&path).await?;
        // The endpoint returns rows oldest-first; the most recent one wins.
        Ok(snippets.pop())
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Network(err.to_string())
}
