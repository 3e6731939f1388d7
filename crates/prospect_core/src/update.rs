use crate::{AppState, Effect, Msg, ResearchState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PeopleLoaded(Ok(people)) => {
            state.set_people(people);
            Vec::new()
        }
        Msg::PeopleLoaded(Err(message)) => {
            state.set_last_error(Some(message));
            Vec::new()
        }
        Msg::CompaniesLoaded(Ok(companies)) => {
            state.set_companies(companies);
            Vec::new()
        }
        Msg::CompaniesLoaded(Err(message)) => {
            state.set_last_error(Some(message));
            Vec::new()
        }
        Msg::CampaignsLoaded(Ok(campaigns)) => {
            state.set_campaigns(campaigns);
            Vec::new()
        }
        Msg::CampaignsLoaded(Err(message)) => {
            state.set_last_error(Some(message));
            Vec::new()
        }
        Msg::CreatePersonRequested {
            full_name,
            title,
            company_id,
        } => vec![Effect::CreatePerson {
            full_name,
            title,
            company_id,
        }],
        Msg::CreateCompanyRequested {
            name,
            website,
            campaign_id,
        } => vec![Effect::CreateCompany {
            name,
            website,
            campaign_id,
        }],
        Msg::CreateCampaignRequested { name } => vec![Effect::CreateCampaign { name }],
        // The directory is refetched after a create, matching the form flows.
        Msg::PersonCreated(Ok(_)) => vec![Effect::LoadPeople],
        Msg::PersonCreated(Err(message)) => {
            state.set_last_error(Some(message));
            Vec::new()
        }
        Msg::CompanyCreated(Ok(_)) => vec![Effect::LoadPeople],
        Msg::CompanyCreated(Err(message)) => {
            state.set_last_error(Some(message));
            Vec::new()
        }
        Msg::CampaignCreated(Ok(_)) => vec![Effect::LoadCampaigns],
        Msg::CampaignCreated(Err(message)) => {
            state.set_last_error(Some(message));
            Vec::new()
        }
        Msg::ResearchRequested { person_id } => research_requested(&mut state, person_id),
        Msg::ResearchStarted { person_id, job_id } => research_started(&mut state, person_id, job_id),
        Msg::ResearchReady { person_id, result } => {
            let changed = match state.row_mut(person_id) {
                Some(row) if row.research == ResearchState::Requesting => {
                    row.research = ResearchState::Done { result };
                    true
                }
                _ => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ResearchRequestFailed { person_id, message } => {
            let changed = match state.row_mut(person_id) {
                Some(row) if row.research == ResearchState::Requesting => {
                    row.research = ResearchState::Failed { message };
                    true
                }
                _ => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobProgress { job_id, progress } => {
            let changed = match state.row_mut_for_job(&job_id) {
                Some(row) => {
                    if let ResearchState::Watching {
                        progress: current,
                        last_poll_error,
                        ..
                    } = &mut row.research
                    {
                        *current = progress;
                        *last_poll_error = None;
                    }
                    true
                }
                None => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobPollError { job_id, message } => {
            let changed = match state.row_mut_for_job(&job_id) {
                Some(row) => {
                    if let ResearchState::Watching {
                        last_poll_error, ..
                    } = &mut row.research
                    {
                        *last_poll_error = Some(message);
                    }
                    true
                }
                None => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobCompleted { job_id, result } => {
            let changed = match state.row_mut_for_job(&job_id) {
                Some(row) => {
                    row.research = ResearchState::Done { result };
                    true
                }
                None => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobResultUnavailable { job_id, message } => {
            let changed = match state.row_mut_for_job(&job_id) {
                Some(row) => {
                    row.research = ResearchState::ResultUnavailable { message };
                    true
                }
                None => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobFailed { job_id, message } => {
            let changed = match state.row_mut_for_job(&job_id) {
                Some(row) => {
                    row.research = ResearchState::Failed { message };
                    true
                }
                None => false,
            };
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ResearchCancelRequested { person_id } => research_cancelled(&mut state, person_id),
        Msg::RestoreResearch(snapshots) => {
            state.stash_restore(snapshots);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn research_requested(state: &mut AppState, person_id: i64) -> Vec<Effect> {
    let company_id = match state.row(person_id) {
        Some(row) if row.research.is_settled() => row.person.company_id,
        // Unknown row, or a session already in flight.
        _ => return Vec::new(),
    };
    if let Some(row) = state.row_mut(person_id) {
        row.research = ResearchState::Requesting;
    }
    state.mark_dirty();
    vec![Effect::StartResearch {
        person_id,
        company_id,
    }]
}

fn research_started(state: &mut AppState, person_id: i64, job_id: String) -> Vec<Effect> {
    let accepted = match state.row_mut(person_id) {
        Some(row) if row.research == ResearchState::Requesting => {
            row.research = ResearchState::Watching {
                job_id: job_id.clone(),
                progress: 0,
                last_poll_error: None,
            };
            true
        }
        _ => false,
    };
    if accepted {
        state.mark_dirty();
        Vec::new()
    } else {
        // The row was cancelled or vanished while enrich was in flight; the
        // spawned watch must not be left running.
        vec![Effect::CancelWatch { job_id }]
    }
}

fn research_cancelled(state: &mut AppState, person_id: i64) -> Vec<Effect> {
    let cancelled_job = match state.row_mut(person_id) {
        Some(row) => match std::mem::take(&mut row.research) {
            ResearchState::Watching { job_id, .. } => Some(Some(job_id)),
            // No job to cancel yet; a late ResearchStarted for this row is
            // rejected by `research_started`.
            ResearchState::Requesting => Some(None),
            settled => {
                row.research = settled;
                None
            }
        },
        None => None,
    };
    match cancelled_job {
        Some(Some(job_id)) => {
            state.mark_dirty();
            vec![Effect::CancelWatch { job_id }]
        }
        Some(None) => {
            state.mark_dirty();
            Vec::new()
        }
        None => Vec::new(),
    }
}
