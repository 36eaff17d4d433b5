use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{protocol::SkillRequest, session::SessionAttributes};
use skill_core::{
    config::{SkillConfig, UiTemplates, DEFAULT_GROUP_SIZE, DEFAULT_PRODUCT_GROUP_SIZE},
    handle_request, SkillContext,
};
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/catalog.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the demo catalog. Safe to run more than once.
    Seed,
    /// Run one conversational turn and print the response as JSON.
    Ask {
        intent: String,
        #[arg(long = "slot", value_parser = parse_slot)]
        slots: Vec<(String, String)>,
        /// Session attributes returned by a previous turn.
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Check that a templates file defines every response.
    CheckTemplates { path: PathBuf },
}

fn parse_slot(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    Ok((name.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Seed => {
            let storage = Storage::new(&cli.database_url).await?;
            let summary = storage.seed_demo_catalog().await?;
            println!(
                "seeded categories={} manufacturers={} products={}",
                summary.categories, summary.manufacturers, summary.products
            );
        }
        Command::Ask {
            intent,
            slots,
            session,
            templates,
        } => {
            let storage = Storage::new(&cli.database_url).await?;
            let templates = match templates {
                Some(path) => UiTemplates::load(&path)?,
                None => UiTemplates::default(),
            };
            let config = SkillConfig::new(
                env!("CARGO_PKG_VERSION"),
                DEFAULT_GROUP_SIZE,
                DEFAULT_PRODUCT_GROUP_SIZE,
                templates,
            )?;
            let ctx = SkillContext::new(Arc::new(storage), config);

            let session = session
                .map(|raw| serde_json::from_str::<SessionAttributes>(&raw))
                .transpose()
                .context("--session must be a JSON object")?;
            let request = SkillRequest::Intent {
                name: intent,
                slots: slots.into_iter().collect::<BTreeMap<_, _>>(),
            };

            let response = handle_request(&ctx, request, session).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::CheckTemplates { path } => {
            let templates = UiTemplates::load(&path)?;
            templates.validate()?;
            println!("{}: ok", path.display());
        }
    }

    Ok(())
}
