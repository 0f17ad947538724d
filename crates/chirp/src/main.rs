//! chirp CLI - watch a timeline and saved searches, notify on new posts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chirp::config::{default_config_path, WatchConfig};
use chirp::scheduler::{Components, DeliveryScheduler, SystemClock};
use chirp::storage::{AvatarCache, HttpProfileSource, MetadataCache, Watermark, WatermarkStore};
use chirp::timeline::{timestamp, SearchSource, TimelineSource};
use chirp::{ApiClient, Credentials, UrgencyClassifier};
use notify::{DesktopChannel, Notifier, NotifyChannel, WebhookChannel};

/// chirp - Surface new timeline and search posts as notifications.
#[derive(Parser)]
#[command(name = "chirp")]
#[command(about = "Timeline and search watcher with desktop notifications")]
#[command(version)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/chirp/config.yml)
    #[arg(short, long, global = true, env = "CHIRP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch continuously until Ctrl-C
    Run,

    /// Run a single fetch-and-notify cycle (for cron use)
    Poll,

    /// Inspect or move the persisted watermark
    Watermark {
        #[command(subcommand)]
        action: WatermarkAction,
    },

    /// Validate the configuration and print resolved paths
    Check,
}

#[derive(Subcommand)]
pub enum WatermarkAction {
    /// Print the current watermark
    Show,

    /// Set the watermark to a timestamp
    Set {
        /// e.g. "Wed Aug 27 13:08:45 +0000 2008" or RFC 3339
        timestamp: String,
    },

    /// Delete the watermark; the next run starts from the default lookback
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("chirp=debug,notify=debug,info")
    } else {
        EnvFilter::new("chirp=info,notify=info,warn")
    };

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = WatchConfig::load(&config_path)?;

    match cli.command {
        Commands::Run => run_watch(config).await,
        Commands::Poll => run_poll(config).await,
        Commands::Watermark { action } => run_watermark(&config, action),
        Commands::Check => run_check(&config, &config_path),
    }
}

fn build_scheduler(config: &WatchConfig) -> Result<DeliveryScheduler> {
    let credentials = Credentials {
        user: config.user.clone(),
        password: config.password.clone(),
    };
    let client = ApiClient::new(credentials, config.request_timeout(), &config.user_agent)?;

    let timeline = TimelineSource::new(
        client.clone(),
        config.timeline_url.clone(),
        config.user.clone(),
        config.feed_order,
    );
    let search = SearchSource::new(
        client.clone(),
        config.search_url.clone(),
        config.searches.clone(),
        config.user.clone(),
        config.feed_order,
    );
    let profiles = HttpProfileSource::new(client.clone(), config.profile_url.clone());

    let channels: Vec<Arc<dyn NotifyChannel>> = vec![
        Arc::new(DesktopChannel::new(config.notify.command.clone())),
        Arc::new(WebhookChannel::new(
            config.notify.webhook_url.clone(),
            config.profile_page_url.clone(),
        )),
    ];

    let components = Components {
        timeline: Arc::new(timeline),
        search: Arc::new(search),
        store: WatermarkStore::new(config.watermark_path()),
        metadata: MetadataCache::new(config.cache_dir(), Arc::new(profiles)),
        avatars: Some(AvatarCache::new(config.avatar_dir(), client)),
        classifier: UrgencyClassifier::new(&config.sticky),
        notifier: Notifier::new(channels),
    };

    Ok(DeliveryScheduler::new(components, Arc::new(SystemClock))?
        .with_intervals(config.tick_interval(), config.min_poll_interval()))
}

async fn run_watch(config: WatchConfig) -> Result<()> {
    tracing::info!(
        user = %config.user,
        searches = config.searches.len(),
        state_dir = %config.state_dir.display(),
        "Starting watcher"
    );

    let mut scheduler = build_scheduler(&config)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        trigger.cancel();
    });

    scheduler.run(cancel).await
}

async fn run_poll(config: WatchConfig) -> Result<()> {
    let mut scheduler = build_scheduler(&config)?;
    let report = scheduler.run_once().await?;

    println!("Poll cycle summary");
    println!("   Fetched:   {}", report.fetched);
    println!("   Delivered: {}", report.delivered);
    println!("   Sticky:    {}", report.sticky);
    if report.failed > 0 {
        println!("   Failed:    {}", report.failed);
    }
    if report.fetch_failures > 0 {
        println!("   Fetch errors: {}", report.fetch_failures);
    }
    if report.skipped > 0 {
        println!("   Skipped malformed: {}", report.skipped);
    }
    if let Some(watermark) = report.watermark {
        println!("   Watermark: {}", timestamp::format(watermark));
    }

    Ok(())
}

fn run_watermark(config: &WatchConfig, action: WatermarkAction) -> Result<()> {
    let store = WatermarkStore::new(config.watermark_path());

    match action {
        WatermarkAction::Show => match store.load()? {
            Some(watermark) => println!("{}", timestamp::format(watermark.at())),
            None => println!("(none, next run looks back {} days)", chirp::storage::DEFAULT_LOOKBACK_DAYS),
        },
        WatermarkAction::Set { timestamp: raw } => {
            let at = timestamp::parse(&raw)
                .with_context(|| format!("Unrecognized timestamp: {raw}"))?;
            store.save(&Watermark::new(at))?;
            tracing::info!(watermark = %at, "Watermark updated");
            println!("{}", timestamp::format(at));
        }
        WatermarkAction::Reset => match std::fs::remove_file(store.path()) {
            Ok(()) => println!("Removed {}", store.path().display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => println!("No watermark to remove"),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", store.path().display()))
            }
        },
    }

    Ok(())
}

fn run_check(config: &WatchConfig, config_path: &std::path::Path) -> Result<()> {
    println!("Configuration OK: {}", config_path.display());
    println!("   User:        {}", config.user);
    println!("   Searches:    {}", config.searches.join(", "));
    println!("   Sticky:      {}", config.sticky.join(", "));
    println!("   Feed order:  {:?}", config.feed_order);
    println!("   Watermark:   {}", config.watermark_path().display());
    println!("   Cache:       {}", config.cache_dir().display());
    println!(
        "   Desktop:     {}",
        if config.notify.command.is_empty() { "disabled" } else { config.notify.command.as_str() }
    );
    println!(
        "   Webhook:     {}",
        if config.notify.webhook_url.is_some() { "configured" } else { "disabled" }
    );
    Ok(())
}
