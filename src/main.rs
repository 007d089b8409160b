//! Fairway CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use fairway::bot::simulated::SimulatedBotFactory;
use fairway::runtime::ReadyRuntime;
use fairway::settings::{FileSettings, SettingsProvider, StaticSettings};
use fairway::{
    BookingSchedule, CancellationWatch, MemoryStore, Orchestrator, OrchestratorDeps, RecordStatus,
    Settings, WorkItem,
};

#[derive(Parser, Debug)]
#[command(name = "fairway", about = "Tee-time booking bot orchestrator", version)]
struct Cli {
    /// Path to the settings TOML file.
    #[arg(long, env = "FAIRWAY_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the orchestrator against a seeded in-memory store with simulated
    /// bots. Exercises window and cadence configuration without a browser.
    Simulate {
        /// Pending bookings to seed, launching today.
        #[arg(long, default_value_t = 3)]
        bookings: usize,

        /// Active cancellation watches to seed, spanning today.
        #[arg(long, default_value_t = 2)]
        watches: usize,

        /// How long to let the simulation run, in seconds.
        #[arg(long, default_value_t = 10)]
        duration: u64,
    },

    /// Print the effective settings and the computed booking window.
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            bookings,
            watches,
            duration,
        } => simulate(cli.settings, bookings, watches, duration).await,
        Command::Settings => show_settings(cli.settings).await,
    }
}

/// Load settings from the configured file, or fall back to a snapshot whose
/// booking window opens immediately.
async fn load_settings(path: Option<PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => {
            let provider = FileSettings::new(&path);
            provider
                .current_settings(true)
                .await
                .with_context(|| format!("loading settings from {}", path.display()))
        }
        None => {
            let default = FileSettings::default_path();
            if default.exists() {
                return FileSettings::new(&default)
                    .current_settings(true)
                    .await
                    .with_context(|| format!("loading settings from {}", default.display()));
            }
            Ok(Settings {
                booking_interval: Some(1),
                booking_target_date_time: Utc::now(),
                start_before: 30,
                open_tee_times: 3,
            })
        }
    }
}

async fn simulate(
    settings_path: Option<PathBuf>,
    bookings: usize,
    watches: usize,
    duration: u64,
) -> anyhow::Result<()> {
    let settings = load_settings(settings_path).await?;
    let today = Utc::now().date_naive();

    let store = Arc::new(MemoryStore::new());
    for _ in 0..bookings {
        store
            .insert(WorkItem::Booking(BookingSchedule {
                id: Uuid::new_v4(),
                status: RecordStatus::Pending,
                status_message: String::new(),
                status_time: Utc::now(),
                launch_date: today,
                account: None,
            }))
            .await;
    }
    for _ in 0..watches {
        store
            .insert(WorkItem::Watch(CancellationWatch {
                id: Uuid::new_v4(),
                status: RecordStatus::Active,
                status_message: String::new(),
                status_time: Utc::now(),
                from_date: today,
                to_date: today + TimeDelta::days(2),
                account: None,
            }))
            .await;
    }

    let controller = Orchestrator::create(OrchestratorDeps {
        store: Arc::clone(&store) as Arc<dyn fairway::RecordStore>,
        factory: Arc::new(SimulatedBotFactory::default()),
        runtime: Arc::new(ReadyRuntime),
        settings: Arc::new(StaticSettings::new(settings)),
    })
    .await?;

    tracing::info!(bookings, watches, duration, "simulation running");
    tokio::time::sleep(Duration::from_secs(duration)).await;

    println!("Work items after {duration}s:");
    for item in store.all().await {
        println!(
            "  {} {:10} {:12} {}",
            item.id(),
            item.kind().to_string(),
            item.status().to_string(),
            item.status_message()
        );
    }
    println!("Active bots at shutdown: {}", controller.active_bots().await);

    controller.shutdown().await;
    Ok(())
}

async fn show_settings(settings_path: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = load_settings(settings_path).await?;
    let (opens, closes) = settings.booking_window();

    println!("booking_interval  = {} min", settings.booking_interval.unwrap_or(1));
    println!("target time       = {}", settings.booking_target_date_time);
    println!("start_before      = {} min", settings.start_before);
    println!("open_tee_times    = {} days", settings.open_tee_times);
    println!("booking window    = {opens} .. {closes}");
    println!(
        "window open now   = {}",
        settings.booking_window_contains(Utc::now())
    );
    Ok(())
}
