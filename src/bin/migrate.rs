// File: ./src/bin/migrate.rs
use anyhow::{Context, Result};
use bc2t_migrate::cli::{self, Args};
use bc2t_migrate::client::RustyClient;
use bc2t_migrate::config::Credentials;
use bc2t_migrate::export::parse_export;
use bc2t_migrate::lists::PromptDecider;
use bc2t_migrate::migrate::migrate;
use bc2t_migrate::store::MemoryStore;
use bc2t_migrate::transform::UuidGenerator;
use clap::Parser;
use std::fs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(args.log_level())?;

    // Credentials are checked before the export is touched.
    let client = if args.dry_run {
        None
    } else {
        let path = Credentials::resolve_path(args.credentials.as_deref())?;
        let creds = Credentials::load(&path)?;
        log::info!("Connecting to {} as {}", creds.url, creds.username);
        Some(RustyClient::from_credentials(&creds)?)
    };

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let export = parse_export(&raw)?;
    log::info!(
        "Loaded {} top-level tasks and {} reminders",
        export.tasks.len(),
        export.reminders.len()
    );

    let mut decider = PromptDecider::stdio();
    let ids = UuidGenerator;
    let options = args.options();

    let report = match &client {
        Some(client) => migrate(&export, client, &mut decider, &ids, options).await?,
        None => {
            let store = MemoryStore::new();
            migrate(&export, &store, &mut decider, &ids, options).await?
        }
    };

    cli::print_summary(&report, args.dry_run);
    Ok(())
}
