use engine_logging::engine_info;
use prospect_core::{
    CampaignRecord, CompanyRecord, Effect, Msg, PersonRecord, ResearchResult,
};
use prospect_engine::{
    ApiClient, EngineCommand, EngineEvent, EngineHandle, JobId, NewCampaign, NewCompany,
    NewPerson, ResearchSnippet, Subject, WatchEvent, WatcherConfig,
};

/// Executes core effects against the engine and translates engine events
/// back into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(api: ApiClient, config: WatcherConfig) -> Self {
        Self {
            engine: EngineHandle::new(api, config),
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadPeople => self.engine.send(EngineCommand::LoadPeople),
                Effect::LoadCompanies => self.engine.send(EngineCommand::LoadCompanies),
                Effect::LoadCampaigns => self.engine.send(EngineCommand::LoadCampaigns),
                Effect::CreatePerson {
                    full_name,
                    title,
                    company_id,
                } => self.engine.send(EngineCommand::CreatePerson(NewPerson {
                    full_name,
                    title,
                    company_id,
                })),
                Effect::CreateCompany {
                    name,
                    website,
                    campaign_id,
                } => self.engine.send(EngineCommand::CreateCompany(NewCompany {
                    name,
                    website,
                    campaign_id,
                })),
                Effect::CreateCampaign { name } => self
                    .engine
                    .send(EngineCommand::CreateCampaign(NewCampaign { name })),
                Effect::StartResearch {
                    person_id,
                    company_id,
                } => {
                    engine_info!("StartResearch person_id={person_id} company_id={company_id}");
                    self.engine.send(EngineCommand::Research {
                        person_id,
                        subject: Subject::Company(company_id),
                    });
                }
                Effect::CancelWatch { job_id } => self.engine.send(EngineCommand::CancelWatch {
                    job_id: JobId::new(job_id),
                }),
            }
        }
    }

    pub fn try_next_msg(&self) -> Option<Msg> {
        self.engine.try_recv().map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PeopleLoaded(result) => Msg::PeopleLoaded(
            result
                .map(|people| people.into_iter().map(map_person).collect())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::CompaniesLoaded(result) => Msg::CompaniesLoaded(
            result
                .map(|companies| companies.into_iter().map(map_company).collect())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::CampaignsLoaded(result) => Msg::CampaignsLoaded(
            result
                .map(|campaigns| campaigns.into_iter().map(map_campaign).collect())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::PersonCreated(result) => {
            Msg::PersonCreated(result.map(map_person).map_err(|err| err.to_string()))
        }
        EngineEvent::CompanyCreated(result) => {
            Msg::CompanyCreated(result.map(map_company).map_err(|err| err.to_string()))
        }
        EngineEvent::CampaignCreated(result) => {
            Msg::CampaignCreated(result.map(map_campaign).map_err(|err| err.to_string()))
        }
        EngineEvent::ResearchReady { person_id, result } => Msg::ResearchReady {
            person_id,
            result: result.map(map_snippet),
        },
        EngineEvent::ResearchStarted { person_id, job_id } => Msg::ResearchStarted {
            person_id,
            job_id: job_id.to_string(),
        },
        EngineEvent::ResearchRequestFailed { person_id, message } => {
            Msg::ResearchRequestFailed { person_id, message }
        }
        EngineEvent::Watch { job_id, event } => map_watch_event(job_id.to_string(), event),
    }
}

fn map_watch_event(job_id: String, event: WatchEvent) -> Msg {
    match event {
        WatchEvent::Progress { progress } => Msg::JobProgress { job_id, progress },
        WatchEvent::PollError { message } => Msg::JobPollError { job_id, message },
        WatchEvent::Completed { result } => Msg::JobCompleted {
            job_id,
            result: result.map(map_snippet),
        },
        WatchEvent::ResultFetchFailed { message } => {
            Msg::JobResultUnavailable { job_id, message }
        }
        WatchEvent::Failed { message } => Msg::JobFailed { job_id, message },
    }
}

fn map_person(person: prospect_engine::Person) -> PersonRecord {
    PersonRecord {
        id: person.id,
        full_name: person.full_name,
        title: person.title,
        company_id: person.company_id,
        company_name: person.company.map(|company| company.name),
    }
}

fn map_company(company: prospect_engine::Company) -> CompanyRecord {
    CompanyRecord {
        id: company.id,
        name: company.name,
        website: company.website,
        campaign_id: company.campaign_id,
    }
}

fn map_campaign(campaign: prospect_engine::Campaign) -> CampaignRecord {
    CampaignRecord {
        id: campaign.id,
        name: campaign.name,
    }
}

fn map_snippet(snippet: ResearchSnippet) -> ResearchResult {
    ResearchResult {
        company_value_prop: snippet.company_value_prop,
        product_names: snippet.product_names,
        pricing_model: snippet.pricing_model,
        key_competitors: snippet.key_competitors,
        company_domain: snippet.company_domain,
    }
}
