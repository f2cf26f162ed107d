//! Klaxon alarm player (klaxon-ap) - main entry point
//!
//! Loads bootstrap configuration, opens the settings/alarm database, starts
//! the playback controller and serves the HTTP command API until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use klaxon_common::CallState;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klaxon_ap::api::{self, AppContext};
use klaxon_ap::assets::DirectoryAssetCatalog;
use klaxon_ap::audio::CpalEngineFactory;
use klaxon_ap::config::{Config, TomlConfig};
use klaxon_ap::db::init::init_database;
use klaxon_ap::directory::SqliteAlarmDirectory;
use klaxon_ap::output::{ConfiguredOutputRouter, StreamType};
use klaxon_ap::playback::{self, Collaborators, ControllerOptions};
use klaxon_ap::settings_store::SettingsStore;
use klaxon_ap::telephony::{ManualTelephony, TelephonyObserver};

/// Command-line arguments for klaxon-ap
#[derive(Parser, Debug)]
#[command(name = "klaxon-ap")]
#[command(about = "Alarm playback engine for Klaxon")]
#[command(version)]
struct Args {
    /// Bootstrap TOML configuration file
    #[arg(short, long, env = "KLAXON_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder for the database and assets
    #[arg(short, long, env = "KLAXON_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "KLAXON_AP_PORT")]
    port: Option<u16>,

    /// SQLite database path
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Alarm sound asset directory
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Pick a random themed variant for each alarm
    #[arg(long)]
    themed: bool,

    /// Output device name
    #[arg(long, env = "KLAXON_AUDIO_DEVICE")]
    device: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_file = args
        .config
        .clone()
        .or_else(|| klaxon_common::config::default_config_file().ok());
    let toml_config = match &config_file {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => TomlConfig::default(),
    };

    // RUST_LOG wins over the config file
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Klaxon alarm player (klaxon-ap) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = klaxon_common::config::resolve_root_folder(
        args.root_folder.as_deref(),
        klaxon_common::config::ROOT_FOLDER_ENV,
        config_file.as_deref(),
    );
    let mut config = Config::resolve(root_folder, toml_config);
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(assets) = args.assets {
        config.assets_dir = assets;
    }
    if args.themed {
        config.themed_mode = true;
    }
    if args.device.is_some() {
        config.audio_device = args.device;
    }
    info!("Root folder: {}", config.root_folder.display());
    info!("Database: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let db_pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true),
        )
        .await
        .context("Failed to open database")?;
    init_database(&db_pool)
        .await
        .context("Failed to initialize database")?;

    let settings = Arc::new(
        SettingsStore::load(db_pool.clone())
            .await
            .context("Failed to load settings")?,
    );
    let telephony = Arc::new(ManualTelephony::new(CallState::Idle));
    let output = Arc::new(ConfiguredOutputRouter::new(
        StreamType::Alarm,
        config.alarm_stream_gain,
    ));
    let assets = DirectoryAssetCatalog::scan(&config.assets_dir).unwrap_or_else(|e| {
        warn!("Asset scan failed ({}), using built-in tones", e);
        DirectoryAssetCatalog::builtin()
    });

    let collaborators = Collaborators {
        directory: Arc::new(SqliteAlarmDirectory::new(db_pool.clone())),
        engines: Arc::new(CpalEngineFactory::new(config.audio_device.clone())),
        assets: Arc::new(assets),
        output: output.clone(),
    };
    let options = ControllerOptions {
        themed_mode: config.themed_mode,
        resolver_seed: None,
    };

    let (controller, controller_task) = playback::spawn(
        collaborators,
        options,
        settings.current(),
        telephony.call_state(),
    );
    controller.follow_call_state(telephony.subscribe());
    controller.follow_settings(settings.subscribe());
    info!("Playback controller initialized");

    let ctx = AppContext {
        controller: controller.clone(),
        settings,
        telephony,
        output,
    };
    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if controller.shutdown().is_ok() {
        controller_task
            .await
            .context("Playback controller task failed")?;
    }
    db_pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
