use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gift_registry::{
    claims::{BatchStatus, ClaimBatch, Registry},
    cli::{Cli, Commands},
    config::Config,
    error,
    notify::{ClaimNotice, NotificationHub},
    server::Server,
    storage, utils,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gift_registry=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { port, public_dir, skip_verify } => {
            run_server(config, port, public_dir, skip_verify).await
        }

        Commands::List { format, claimed_only } => list_claims(&config, &format, claimed_only),

        Commands::Claim { item, name, notify } => {
            info!("Claiming \"{}\" for \"{}\"", item, name);
            claim_item(&config, item, &name, notify).await
        }

        Commands::AddItem { items } => add_items(&config, &items),

        Commands::Init => initialize(&config),

        Commands::Import { path } => {
            info!("Importing claims from {}", path.display());
            import_legacy(&config, &path)
        }
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run_server(
    mut config: Config,
    port: Option<u16>,
    public_dir: Option<std::path::PathBuf>,
    skip_verify: bool,
) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if public_dir.is_some() {
        config.server.public_dir = public_dir;
    }

    let store = storage::open_with_fallback(&config.storage)?;
    let notifier = NotificationHub::from_config(&config)?;

    if !skip_verify {
        // Runs in the background so a slow SMTP server never delays startup
        let hub = notifier.clone();
        tokio::spawn(async move { hub.verify().await });
    }

    let channels: Vec<_> = notifier.channels().collect();
    info!(
        storage = store.backend(),
        durable = store.is_durable(),
        notifications = ?channels,
        "Starting gift registry"
    );

    Server::new(config, Registry::new(store, notifier)).run().await
}

fn list_claims(config: &Config, format: &str, claimed_only: bool) -> anyhow::Result<()> {
    let store = storage::open(&config.storage)?;
    let records: Vec<_> = store
        .records()?
        .into_iter()
        .filter(|r| !claimed_only || r.is_claimed())
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&storage::models::records_to_map(records))?);
        return Ok(());
    }

    let claimed = records.iter().filter(|r| r.is_claimed()).count();
    println!("{}", "=== Gift Registry Claims ===".cyan().bold());
    println!("Items:     {}", records.len());
    println!("Claimed:   {}", claimed.to_string().green());
    println!("Available: {}", (records.len() - claimed).to_string().yellow());

    if records.is_empty() {
        println!("\n{}", "Nothing claimed yet.".yellow());
        return Ok(());
    }

    println!();
    utils::print_table_border(84);
    utils::print_table_row(&["Item", "Claimed by", "When"], &[36, 24, 20]);
    utils::print_table_border(84);

    for record in &records {
        let when = record
            .claimed_at
            .as_ref()
            .map(utils::format_timestamp)
            .unwrap_or_default();
        utils::print_table_row(
            &[
                &utils::truncate(&record.item, 36),
                &utils::format_claimant(record.claimant.as_deref()),
                &when,
            ],
            &[36, 24, 20],
        );
    }
    utils::print_table_border(84);

    Ok(())
}

async fn claim_item(config: &Config, item: String, name: &str, notify: bool) -> anyhow::Result<()> {
    let store = storage::open(&config.storage)?;
    let registry = Registry::new(store, NotificationHub::disabled());

    let batch = ClaimBatch::from_pairs([(item, name)])?;
    let report = registry.submit(batch).await?;

    match report.status() {
        BatchStatus::Claimed => {
            for line in report.accepted_lines() {
                println!("{} {}", "✓ Claimed".green(), line);
            }
            if notify {
                let hub = NotificationHub::from_config(config)?;
                hub.deliver(&ClaimNotice::from_report(&report)).await;
            }
        }
        BatchStatus::NothingClaimed if report.rejected.is_empty() => {
            println!("{}", "Name is blank; nothing claimed".yellow());
        }
        BatchStatus::NothingClaimed => {
            println!("{} {}", "✗ Already claimed:".yellow(), report.rejected.join(", "));
        }
        BatchStatus::StorageFailure => {
            return Err(error::RegistryError::Other(anyhow::anyhow!(
                "failed to save claim for {}",
                report.failed.join(", ")
            ))
            .into());
        }
    }

    Ok(())
}

fn add_items(config: &Config, items: &[String]) -> anyhow::Result<()> {
    let store = storage::open(&config.storage)?;

    for item in items.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
        store.register_item(item)?;
        println!("{} {}", "✓ Added".green(), item);
    }
    Ok(())
}

fn initialize(config: &Config) -> anyhow::Result<()> {
    println!("{}", "Initializing gift registry...".green());
    let store = storage::open(&config.storage)?;
    println!("{}", format!("✓ {} store ready", store.backend()).green());
    println!("{}", "✓ Configuration loaded".green());

    println!("\n{}", "Configuration:".cyan());
    println!("  Listen:        {}", config.socket_addr());
    println!("  Storage:       {} ({})", config.storage.backend, config.storage.path().display());
    println!("  Memory fallback: {}", config.storage.fallback_to_memory);
    match config.server.public_dir.as_ref() {
        Some(dir) => println!("  Public dir:    {}", dir.display()),
        None => println!("  Public dir:    (API only)"),
    }
    match config.email.as_ref().filter(|e| e.enabled) {
        Some(email) => println!(
            "  Email:         {} via {}:{}",
            email.recipient().unwrap_or("-"),
            email.smtp_host,
            email.smtp_port
        ),
        None => println!("  Email:         disabled"),
    }

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to start the server", "gift-registry serve".yellow());
    println!("  {} to view claims", "gift-registry list".yellow());
    Ok(())
}

fn import_legacy(config: &Config, path: &Path) -> anyhow::Result<()> {
    let data = storage::file::read_document(path)?;
    let store = storage::open(&config.storage)?;

    let progress = ProgressBar::new(data.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let summary = storage::import_claims(store.as_ref(), &data, &progress)?;

    println!("\n{}", "=== Import Summary ===".cyan().bold());
    println!("Imported:   {} ✓", summary.imported.to_string().green());
    println!("Conflicts:  {}", summary.conflicts.to_string().yellow());
    println!("Unclaimed:  {}", summary.empty);
    Ok(())
}
