//! Command-line entry point
//!
//! Wires the real service implementations into the engine with dependency
//! injection. Credentials come from the environment (or a `.env` file);
//! missing required values fail fast before any network activity.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use prospector::core::{abtest, analyzer, gdpr};
use prospector::services::{
    ActiveCampaignClient, CrmEngagementSource, EmailNotifier, GoogleSearchClient, HunterClient,
    MemoryStore,
};
use prospector::traits::{AbTestStore, IcpStore, RecipientStore};
use prospector::types::IcpRow;
use prospector::{EngineConfig, EngineError, EngineResult, ProspectingEngine, RateGovernor, TriggeredBy};

/// ICP-weighted B2B lead prospecting pipeline
#[derive(Parser)]
#[command(name = "prospector")]
#[command(about = "Discovers, deduplicates, and publishes B2B leads from a weighted ICP table")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// JSON file with ICP rows: [{"attribute","value","weight"}]
    #[arg(long)]
    icp_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one prospecting run now
    Run {
        /// Number of leads to target
        #[arg(long, default_value = "100")]
        target_leads: u32,
    },
    /// Run the daily/weekly schedule loop
    Schedule,
    /// Analyze ICP performance against engagement scores
    Analyze {
        /// Apply suggested weights back to the ICP table
        #[arg(long)]
        apply: bool,
    },
    /// Delete rows past their retention windows
    Cleanup,
    /// Manage A/B tests over ICP weight sets
    AbTest {
        #[command(subcommand)]
        action: AbTestCommand,
    },
    /// Remove one contact's lead row (right-to-erasure)
    Erase {
        /// Contact email
        email: String,
    },
    /// Print one contact's recorded lead data (data-export request)
    Export {
        /// Contact email
        email: String,
    },
}

#[derive(Subcommand)]
enum AbTestCommand {
    /// Create a draft test with two variants snapshotting the current ICP table
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "A")]
        variant_a: String,
        #[arg(long, default_value = "B")]
        variant_b: String,
    },
    /// Start a draft test
    Start { id: u64 },
    /// Stop a running test and record the winning variant
    Stop { id: u64 },
    /// Cancel a test without picking a winner
    Cancel { id: u64 },
    /// List all tests
    List,
}

/// Row shape accepted in `--icp-file`.
#[derive(Deserialize)]
struct IcpRowInput {
    attribute: String,
    value: String,
    weight: String,
}

fn require_env(name: &str) -> EngineResult<String> {
    std::env::var(name).map_err(|_| EngineError::config(format!("{name} is not set")))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Environment variables take precedence over .env values.
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&args.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store = MemoryStore::new();
    gdpr::initialize_retention_policies(&store).await?;

    if let Some(path) = &args.icp_file {
        let raw = std::fs::read_to_string(path)?;
        let inputs: Vec<IcpRowInput> = serde_json::from_str(&raw)?;
        let rows: Vec<IcpRow> = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                IcpRow::new(index as u64 + 1, &input.attribute, &input.value, &input.weight)
            })
            .collect();
        info!(rows = rows.len(), "importing ICP rows from {path}");
        store.bulk_replace(rows).await?;
    }

    // Comma-separated report recipients, registered as active.
    if let Ok(raw) = std::env::var("REPORT_RECIPIENTS") {
        for email in raw.split(',').map(str::trim).filter(|email| !email.is_empty()) {
            store.upsert_recipient(email, true).await?;
        }
    }

    match args.command {
        Command::Run { target_leads } => {
            let engine = build_engine(&store).await?;
            let result = engine.run(target_leads, TriggeredBy::Manual).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Schedule => {
            let engine = build_engine(&store).await?;
            let sink = build_notifier(&store).await?;
            prospector::schedule::run_scheduler(&engine, &store, &store, &store, &sink).await?;
        }
        Command::Analyze { apply } => {
            let engagement =
                CrmEngagementSource::new(require_env("AC_API_URL")?, require_env("AC_API_TOKEN")?)?;
            let insights = analyzer::analyze_icp_performance(&store, &engagement).await?;
            println!("{}", serde_json::to_string_pretty(&insights)?);

            if apply {
                let applied = analyzer::apply_recommendations(&store, &insights).await?;
                info!(applied, "suggested weights applied to ICP table");
            }
        }
        Command::Cleanup => {
            let deleted = gdpr::cleanup_expired(&store, &store, &store).await?;
            println!("{}", serde_json::to_string_pretty(&deleted)?);
        }
        Command::AbTest { action } => run_abtest_command(&store, action).await?,
        Command::Erase { email } => {
            let existed = gdpr::erase_contact(&store, &store, &email).await?;
            println!("{}", if existed { "erased" } else { "no lead recorded" });
        }
        Command::Export { email } => match gdpr::export_contact(&store, &store, &email).await? {
            Some(lead) => println!("{}", serde_json::to_string_pretty(&lead)?),
            None => println!("no lead recorded"),
        },
    }

    Ok(())
}

async fn run_abtest_command(store: &MemoryStore, action: AbTestCommand) -> anyhow::Result<()> {
    match action {
        AbTestCommand::Create { name, description, variant_a, variant_b } => {
            let id = abtest::create_test(
                store,
                store,
                &name,
                description.as_deref(),
                &variant_a,
                &variant_b,
            )
            .await?;
            println!("{id}");
        }
        AbTestCommand::Start { id } => abtest::start_test(store, id).await?,
        AbTestCommand::Stop { id } => {
            let winner = abtest::stop_test(store, id).await?;
            match winner {
                Some(variant_id) => println!("winning variant: {variant_id}"),
                None => println!("no winner"),
            }
        }
        AbTestCommand::Cancel { id } => abtest::cancel_test(store, id).await?,
        AbTestCommand::List => {
            let tests = store.list_tests().await?;
            println!("{}", serde_json::to_string_pretty(&tests)?);
        }
    }
    Ok(())
}

async fn build_notifier(store: &MemoryStore) -> EngineResult<EmailNotifier> {
    // Notification credentials are optional; without them reports are logged.
    let recipients = store
        .active_recipients()
        .await?
        .into_iter()
        .map(|recipient| recipient.email)
        .collect();
    EmailNotifier::new(
        std::env::var("RESEND_API_KEY").ok(),
        std::env::var("FROM_EMAIL").unwrap_or_else(|_| "reports@prospector.local".to_string()),
        recipients,
    )
}

async fn build_engine(
    store: &MemoryStore,
) -> EngineResult<
    ProspectingEngine<
        GoogleSearchClient,
        HunterClient,
        ActiveCampaignClient,
        EmailNotifier,
        MemoryStore,
        MemoryStore,
        MemoryStore,
    >,
> {
    // Required credentials, validated fail-fast.
    let ac_api_url = require_env("AC_API_URL")?;
    let ac_api_token = require_env("AC_API_TOKEN")?;
    let google_api_key = require_env("GOOGLE_API_KEY")?;
    let search_engine_id = require_env("SEARCH_ENGINE_ID")?;
    let hunter_api_key = require_env("HUNTER_API_KEY")?;
    let list_id = std::env::var("AC_LIST_ID")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(4);

    let config = EngineConfig { crm_list_id: list_id, ..EngineConfig::default() };

    Ok(ProspectingEngine::new(
        config,
        RateGovernor::new(),
        GoogleSearchClient::new(google_api_key, search_engine_id)?,
        HunterClient::new(hunter_api_key)?,
        ActiveCampaignClient::new(ac_api_url, ac_api_token)?,
        build_notifier(store).await?,
        store.clone(),
        store.clone(),
        store.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_admin_verbs_parse() {
        let args = Args::parse_from([
            "prospector",
            "ab-test",
            "create",
            "tighter-icp",
            "--description",
            "narrower industry set",
        ]);
        assert!(matches!(args.command, Command::AbTest { .. }));

        let args = Args::parse_from(["prospector", "erase", "user@example.com"]);
        assert!(matches!(args.command, Command::Erase { email } if email == "user@example.com"));

        let args = Args::parse_from(["prospector", "export", "user@example.com"]);
        assert!(matches!(args.command, Command::Export { .. }));
    }
}
