mod app;
mod effects;
mod logging;
mod persistence;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "prospect", version, about = "Research dashboard client")]
struct Cli {
    /// Where log output goes.
    #[arg(long, value_enum, default_value = "file")]
    log: LogArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogArg {
    File,
    Term,
    Both,
}

impl From<LogArg> for logging::LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::File => logging::LogDestination::File,
            LogArg::Term => logging::LogDestination::Terminal,
            LogArg::Both => logging::LogDestination::Both,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List people with their research status.
    People,
    /// List companies.
    Companies,
    /// List campaigns.
    Campaigns,
    /// Create a person record.
    AddPerson {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        company_id: i64,
    },
    /// Create a company record.
    AddCompany {
        #[arg(long)]
        name: String,
        #[arg(long)]
        website: String,
        #[arg(long)]
        campaign_id: Option<i64>,
    },
    /// Create a campaign record.
    AddCampaign {
        #[arg(long)]
        name: String,
    },
    /// Trigger research for a person and watch the job to completion.
    Research { person_id: i64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log.into());
    let config = app::AppConfig::from_env()?;
    app::run(config, cli.command)
}
