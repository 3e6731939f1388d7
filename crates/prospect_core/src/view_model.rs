use crate::{CampaignRecord, CompanyRecord, ResearchResult, ResearchState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardView {
    pub people: Vec<PersonRowView>,
    pub companies: Vec<CompanyRecord>,
    pub campaigns: Vec<CampaignRecord>,
    pub last_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRowView {
    pub person_id: i64,
    pub full_name: String,
    pub title: String,
    pub company_id: i64,
    pub company_name: Option<String>,
    pub status: ResearchStatusView,
}

/// Render-facing projection of a row's research session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResearchStatusView {
    Idle,
    Requesting,
    Researching {
        progress: u8,
        /// Last transient poll error, cleared by the next progress update.
        note: Option<String>,
    },
    Done {
        result: Option<ResearchResult>,
    },
    ResultUnavailable {
        message: String,
    },
    Failed {
        message: String,
    },
}

impl From<&ResearchState> for ResearchStatusView {
    fn from(state: &ResearchState) -> Self {
        match state {
            ResearchState::Idle => ResearchStatusView::Idle,
            ResearchState::Requesting => ResearchStatusView::Requesting,
            ResearchState::Watching {
                progress,
                last_poll_error,
                ..
            } => ResearchStatusView::Researching {
                progress: *progress,
                note: last_poll_error.clone(),
            },
            ResearchState::Done { result } => ResearchStatusView::Done {
                result: result.clone(),
            },
            ResearchState::ResultUnavailable { message } => ResearchStatusView::ResultUnavailable {
                message: message.clone(),
            },
            ResearchState::Failed { message } => ResearchStatusView::Failed {
                message: message.clone(),
            },
        }
    }
}
