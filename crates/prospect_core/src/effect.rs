use crate::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadPeople,
    LoadCompanies,
    LoadCampaigns,
    CreatePerson {
        full_name: String,
        title: String,
        company_id: i64,
    },
    CreateCompany {
        name: String,
        website: String,
        campaign_id: Option<i64>,
    },
    CreateCampaign {
        name: String,
    },
    StartResearch {
        person_id: i64,
        company_id: i64,
    },
    CancelWatch {
        job_id: JobId,
    },
}
