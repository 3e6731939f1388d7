use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use prospect_core::{
    update, AppState, DashboardView, Effect, Msg, PersonRowView, ResearchResult,
    ResearchStatusView,
};
use prospect_engine::{ApiClient, ApiConfig, WatcherConfig};
use url::Url;

use crate::effects::EffectRunner;
use crate::persistence;
use crate::Command;

const PUMP_SLEEP: Duration = Duration::from_millis(20);

pub struct AppConfig {
    pub api: ApiConfig,
    pub watcher: WatcherConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PROSPECT_API_URL").context("PROSPECT_API_URL is not set")?;
        let base_url =
            Url::parse(&base_url).context("PROSPECT_API_URL is not a valid URL")?;
        let api_key = std::env::var("PROSPECT_API_KEY").context("PROSPECT_API_KEY is not set")?;

        let mut watcher = WatcherConfig::default();
        if let Ok(raw) = std::env::var("PROSPECT_POLL_INTERVAL_MS") {
            let millis: u64 = raw
                .parse()
                .context("PROSPECT_POLL_INTERVAL_MS must be an integer")?;
            watcher.poll_interval = Duration::from_millis(millis);
        }

        Ok(Self {
            api: ApiConfig::new(base_url, api_key),
            watcher,
        })
    }
}

pub fn run(config: AppConfig, command: Command) -> Result<()> {
    let api = ApiClient::new(config.api).context("failed to build API client")?;
    let runner = EffectRunner::new(api, config.watcher);
    let mut session = Session::new(runner)?;

    match command {
        Command::People => session.run_people(),
        Command::Companies => session.run_companies(),
        Command::Campaigns => session.run_campaigns(),
        Command::AddPerson {
            full_name,
            title,
            company_id,
        } => session.run_add_person(full_name, title, company_id),
        Command::AddCompany {
            name,
            website,
            campaign_id,
        } => session.run_add_company(name, website, campaign_id),
        Command::AddCampaign { name } => session.run_add_campaign(name),
        Command::Research { person_id } => session.run_research(person_id),
    }
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    interrupted: Arc<AtomicBool>,
}

impl Session {
    fn new(runner: EffectRunner) -> Result<Self> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = interrupted.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("failed to install interrupt handler")?;
        Ok(Self {
            state: AppState::new(),
            runner,
            interrupted,
        })
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn pump(&mut self) {
        while let Some(msg) = self.runner.try_next_msg() {
            self.dispatch(msg);
        }
    }

    /// Pumps until a message matching `pred` has been dispatched, returning
    /// a copy of it.
    fn pump_until(&mut self, pred: impl Fn(&Msg) -> bool) -> Result<Msg> {
        loop {
            while let Some(msg) = self.runner.try_next_msg() {
                let hit = pred(&msg);
                let copy = msg.clone();
                self.dispatch(msg);
                if hit {
                    return Ok(copy);
                }
            }
            if self.interrupted.load(Ordering::SeqCst) {
                bail!("interrupted");
            }
            thread::sleep(PUMP_SLEEP);
        }
    }

    fn load_directory(&mut self) -> Result<()> {
        let snapshots = persistence::load_research_snapshots(&state_dir());
        self.runner.enqueue(vec![Effect::LoadPeople]);
        self.pump_until(|msg| matches!(msg, Msg::PeopleLoaded(_)))?;
        if !snapshots.is_empty() {
            self.dispatch(Msg::RestoreResearch(snapshots));
        }
        if let Some(message) = self.state.view().last_error {
            bail!("failed to load people: {message}");
        }
        Ok(())
    }

    fn run_people(&mut self) -> Result<()> {
        self.load_directory()?;
        let view = self.state.view();
        if view.people.is_empty() {
            println!("No people found. Add some people to get started!");
            return Ok(());
        }
        for row in &view.people {
            println!(
                "{:>5}  {}  ({})  company {}  [{}]",
                row.person_id,
                row.full_name,
                row.title,
                row.company_name.as_deref().unwrap_or("-"),
                status_line(&row.status),
            );
        }
        Ok(())
    }

    fn run_companies(&mut self) -> Result<()> {
        self.runner.enqueue(vec![Effect::LoadCompanies]);
        if let Msg::CompaniesLoaded(Err(message)) =
            self.pump_until(|msg| matches!(msg, Msg::CompaniesLoaded(_)))?
        {
            bail!("failed to load companies: {message}");
        }
        for company in &self.state.view().companies {
            println!(
                "{:>5}  {}  {}",
                company.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                company.name,
                company.website,
            );
        }
        Ok(())
    }

    fn run_campaigns(&mut self) -> Result<()> {
        self.runner.enqueue(vec![Effect::LoadCampaigns]);
        if let Msg::CampaignsLoaded(Err(message)) =
            self.pump_until(|msg| matches!(msg, Msg::CampaignsLoaded(_)))?
        {
            bail!("failed to load campaigns: {message}");
        }
        for campaign in &self.state.view().campaigns {
            println!("{:>5}  {}", campaign.id, campaign.name);
        }
        Ok(())
    }

    fn run_add_person(&mut self, full_name: String, title: String, company_id: i64) -> Result<()> {
        self.dispatch(Msg::CreatePersonRequested {
            full_name,
            title,
            company_id,
        });
        match self.pump_until(|msg| matches!(msg, Msg::PersonCreated(_)))? {
            Msg::PersonCreated(Ok(person)) => {
                println!("Created person {} ({})", person.id, person.full_name);
                Ok(())
            }
            Msg::PersonCreated(Err(message)) => bail!("failed to create person: {message}"),
            _ => Ok(()),
        }
    }

    fn run_add_company(
        &mut self,
        name: String,
        website: String,
        campaign_id: Option<i64>,
    ) -> Result<()> {
        self.dispatch(Msg::CreateCompanyRequested {
            name,
            website,
            campaign_id,
        });
        match self.pump_until(|msg| matches!(msg, Msg::CompanyCreated(_)))? {
            Msg::CompanyCreated(Ok(company)) => {
                println!("Created company {}", company.name);
                Ok(())
            }
            Msg::CompanyCreated(Err(message)) => bail!("failed to create company: {message}"),
            _ => Ok(()),
        }
    }

    fn run_add_campaign(&mut self, name: String) -> Result<()> {
        self.dispatch(Msg::CreateCampaignRequested { name });
        match self.pump_until(|msg| matches!(msg, Msg::CampaignCreated(_)))? {
            Msg::CampaignCreated(Ok(campaign)) => {
                println!("Created campaign {} ({})", campaign.name, campaign.id);
                Ok(())
            }
            Msg::CampaignCreated(Err(message)) => bail!("failed to create campaign: {message}"),
            _ => Ok(()),
        }
    }

    fn run_research(&mut self, person_id: i64) -> Result<()> {
        self.load_directory()?;
        let row = match find_row(&self.state.view(), person_id) {
            Some(row) => row,
            None => bail!("person {person_id} not found"),
        };
        println!("Researching {} ({})", row.full_name, row.title);

        self.dispatch(Msg::ResearchRequested { person_id });
        self.state.consume_dirty();

        let mut last_line = String::new();
        loop {
            self.pump();
            if self.state.consume_dirty() {
                if let Some(row) = find_row(&self.state.view(), person_id) {
                    let line = status_line(&row.status);
                    if line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                }
            }
            if !self.state.has_active_research() {
                break;
            }
            if self.interrupted.swap(false, Ordering::SeqCst) {
                self.dispatch(Msg::ResearchCancelRequested { person_id });
                println!("Research cancelled.");
                return Ok(());
            }
            thread::sleep(PUMP_SLEEP);
        }

        let view = self.state.view();
        let outcome = match find_row(&view, person_id) {
            Some(row) => row.status,
            None => bail!("person {person_id} disappeared from the directory"),
        };
        match outcome {
            ResearchStatusView::Done {
                result: Some(result),
            } => {
                println!();
                render_result(&result);
                persistence::save_research_snapshots(
                    &state_dir(),
                    &self.state.completed_research_snapshot(),
                );
                Ok(())
            }
            ResearchStatusView::Done { result: None } => {
                println!("Job completed, but no research result is available yet.");
                Ok(())
            }
            ResearchStatusView::ResultUnavailable { message } => {
                bail!("job completed but fetching the result failed: {message}")
            }
            ResearchStatusView::Failed { message } => bail!("research failed: {message}"),
            _ => Ok(()),
        }
    }
}

fn find_row(view: &DashboardView, person_id: i64) -> Option<PersonRowView> {
    view.people
        .iter()
        .find(|row| row.person_id == person_id)
        .cloned()
}

fn status_line(status: &ResearchStatusView) -> String {
    match status {
        ResearchStatusView::Idle => "-".to_string(),
        ResearchStatusView::Requesting => "requesting research...".to_string(),
        ResearchStatusView::Researching {
            progress,
            note: Some(note),
        } => format!("researching {progress}% (poll error: {note})"),
        ResearchStatusView::Researching { progress, note: None } => {
            format!("researching {progress}%")
        }
        ResearchStatusView::Done { result: Some(_) } => "research complete".to_string(),
        ResearchStatusView::Done { result: None } => {
            "research complete (no result yet)".to_string()
        }
        ResearchStatusView::ResultUnavailable { message } => {
            format!("completed, result unavailable: {message}")
        }
        ResearchStatusView::Failed { message } => format!("failed: {message}"),
    }
}

fn render_result(result: &ResearchResult) {
    println!("Company Value Proposition");
    println!("  {}", not_available_if_empty(&result.company_value_prop));
    println!("Products / Services");
    if result.product_names.is_empty() {
        println!("  Not available");
    } else {
        for product in &result.product_names {
            println!("  - {product}");
        }
    }
    println!("Pricing Model");
    println!("  {}", not_available_if_empty(&result.pricing_model));
    println!("Key Competitors");
    if result.key_competitors.is_empty() {
        println!("  Not available");
    } else {
        for competitor in &result.key_competitors {
            println!("  - {competitor}");
        }
    }
    println!("Company Domain");
    println!("  {}", not_available_if_empty(&result.company_domain));
}

fn not_available_if_empty(text: &str) -> &str {
    if text.is_empty() {
        "Not available"
    } else {
        text
    }
}

fn state_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
