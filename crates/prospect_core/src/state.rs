use std::collections::BTreeMap;

use crate::view_model::{DashboardView, PersonRowView};

/// Opaque backend-issued identifier for a research job.
pub type JobId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub id: i64,
    pub full_name: String,
    pub title: String,
    pub company_id: i64,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    pub id: Option<i64>,
    pub name: String,
    pub website: String,
    pub campaign_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignRecord {
    pub id: i64,
    pub name: String,
}

/// Display payload of a finished research job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResearchResult {
    pub company_value_prop: String,
    pub product_names: Vec<String>,
    pub pricing_model: String,
    pub key_competitors: Vec<String>,
    pub company_domain: String,
}

/// Persistable record of a research run that produced a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchSnapshot {
    pub person_id: i64,
    pub result: ResearchResult,
}

/// Lifecycle of one research session on a person row.
///
/// `Watching` is the only state that accepts job callbacks; every other
/// state discards them, so a completion can settle a row at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResearchState {
    #[default]
    Idle,
    /// Enrich request sent, no job id known yet.
    Requesting,
    /// A job is being watched; `progress` is the last delivered value.
    Watching {
        job_id: JobId,
        progress: u8,
        last_poll_error: Option<String>,
    },
    /// Job completed; `None` means the backend had no result row yet.
    Done { result: Option<ResearchResult> },
    /// Job completed but the result fetch failed; re-research is allowed.
    ResultUnavailable { message: String },
    Failed { message: String },
}

impl ResearchState {
    /// A settled row can start a new research run.
    pub fn is_settled(&self) -> bool {
        !matches!(
            self,
            ResearchState::Requesting | ResearchState::Watching { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PersonRow {
    pub(crate) person: PersonRecord,
    pub(crate) research: ResearchState,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    people: BTreeMap<i64, PersonRow>,
    companies: Vec<CompanyRecord>,
    campaigns: Vec<CampaignRecord>,
    // Snapshots restored before the people list arrived.
    pending_restore: BTreeMap<i64, ResearchResult>,
    last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            people: self
                .people
                .values()
                .map(|row| PersonRowView {
                    person_id: row.person.id,
                    full_name: row.person.full_name.clone(),
                    title: row.person.title.clone(),
                    company_id: row.person.company_id,
                    company_name: row.person.company_name.clone(),
                    status: (&row.research).into(),
                })
                .collect(),
            companies: self.companies.clone(),
            campaigns: self.campaigns.clone(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let dirty = self.dirty;
        self.dirty = false;
        dirty
    }

    /// True while any row has an unsettled research session.
    pub fn has_active_research(&self) -> bool {
        self.people.values().any(|row| !row.research.is_settled())
    }

    /// Person ids with an unsettled research session, in row order.
    pub fn active_research(&self) -> Vec<i64> {
        self.people
            .values()
            .filter(|row| !row.research.is_settled())
            .map(|row| row.person.id)
            .collect()
    }

    /// Snapshot of every row that finished with an actual result.
    pub fn completed_research_snapshot(&self) -> Vec<ResearchSnapshot> {
        self.people
            .values()
            .filter_map(|row| match &row.research {
                ResearchState::Done {
                    result: Some(result),
                } => Some(ResearchSnapshot {
                    person_id: row.person.id,
                    result: result.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_last_error(&mut self, message: Option<String>) {
        self.last_error = message;
        self.dirty = true;
    }

    pub(crate) fn set_people(&mut self, people: Vec<PersonRecord>) {
        let previous = std::mem::take(&mut self.people);
        for person in people {
            let id = person.id;
            let research = match previous.get(&id) {
                // A reload must not clobber a session in flight.
                Some(row) => row.research.clone(),
                None => match self.pending_restore.remove(&id) {
                    Some(result) => ResearchState::Done {
                        result: Some(result),
                    },
                    None => ResearchState::Idle,
                },
            };
            self.people.insert(id, PersonRow { person, research });
        }
        self.dirty = true;
    }

    pub(crate) fn set_companies(&mut self, companies: Vec<CompanyRecord>) {
        self.companies = companies;
        self.dirty = true;
    }

    pub(crate) fn set_campaigns(&mut self, campaigns: Vec<CampaignRecord>) {
        self.campaigns = campaigns;
        self.dirty = true;
    }

    pub(crate) fn stash_restore(&mut self, snapshots: Vec<ResearchSnapshot>) {
        for snapshot in snapshots {
            match self.people.get_mut(&snapshot.person_id) {
                Some(row) if row.research.is_settled() => {
                    row.research = ResearchState::Done {
                        result: Some(snapshot.result),
                    };
                }
                Some(_) => {}
                None => {
                    self.pending_restore
                        .insert(snapshot.person_id, snapshot.result);
                }
            }
        }
        self.dirty = true;
    }

    pub(crate) fn row_mut(&mut self, person_id: i64) -> Option<&mut PersonRow> {
        self.people.get_mut(&person_id)
    }

    pub(crate) fn row_mut_for_job(&mut self, job_id: &str) -> Option<&mut PersonRow> {
        self.people.values_mut().find(|row| {
            matches!(&row.research, ResearchState::Watching { job_id: id, .. } if id == job_id)
        })
    }

    pub(crate) fn row(&self, person_id: i64) -> Option<&PersonRow> {
        self.people.get(&person_id)
    }
}
