//! hrs-ui - Harmony Recommendation System client
//!
//! Headless driver for the workflow: uploads a recording to the Analysis
//! Service, prints the recommendation, optionally regenerates the harmony for
//! another instrument, and binds the returned media to headless players.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrs_common::config::{load_toml_config, resolve_service_url, LoggingConfig, SERVICE_URL_ENV};
use hrs_common::events::EventBus;
use hrs_common::{Instrument, MediaSlot};
use hrs_ui::playback::HeadlessRendererFactory;
use hrs_ui::{AnalysisClient, AudioUpload, WorkflowController, WorkflowView};

/// Command-line arguments for hrs-ui
#[derive(Parser, Debug)]
#[command(name = "hrs-ui")]
#[command(about = "Harmony recommendation client")]
#[command(version)]
struct Args {
    /// Audio file to analyze (mp3, wav, flac, ogg)
    audio: PathBuf,

    /// Target instrument ("Acoustic Guitar", "Electric Guitar", "Bass", "Ukulele", "Piano")
    #[arg(short, long)]
    instrument: Instrument,

    /// After the first recommendation, regenerate for this instrument
    #[arg(short, long)]
    regenerate: Option<Instrument>,

    /// Analysis Service base URL (overrides HRS_SERVICE_URL and the config file)
    #[arg(short, long)]
    service_url: Option<String>,

    /// Config file (default: <config dir>/hrs/hrs-ui.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("hrs_ui={0},hrs_common={0}", logging.level).into());

    let (stderr_layer, file_layer) = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (Some(tracing_subscriber::fmt::layer()), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn print_view(view: &WorkflowView) {
    if let Some(features) = &view.tonal_features_pretty {
        println!("Tonal Features:\n{}", features);
    }
    println!("Recommended Chords: {}", view.chords.join(", "));
    println!("Chord Progression: {}", view.progression_display);
    for player in &view.players {
        println!("  [{}] {} ({})", player.slot, player.url, player.label);
    }
    if let Some(url) = &view.download_url {
        println!("Download: {}", url);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;
    init_logging(&config.logging)?;

    let service_url = resolve_service_url(args.service_url.as_deref(), SERVICE_URL_ENV, &config);
    info!("Starting hrs-ui {}", env!("CARGO_PKG_VERSION"));
    info!("Analysis Service: {}", service_url);

    let client = AnalysisClient::new(&service_url, config.request_timeout())
        .context("Failed to create Analysis Service client")?;
    let controller = WorkflowController::new(
        Arc::new(client),
        Arc::new(HeadlessRendererFactory),
        EventBus::default(),
    );

    let upload = AudioUpload::from_path(&args.audio)
        .await
        .with_context(|| format!("Failed to read {}", args.audio.display()))?;
    controller.select_file(upload).await?;
    controller.select_instrument(Some(args.instrument)).await?;

    controller.submit().await?;
    print_view(&controller.view().await);

    if let Some(instrument) = args.regenerate {
        controller.select_instrument(Some(instrument)).await?;
        controller.regenerate().await?;
        println!("\nRegenerated for {}:", instrument);
        print_view(&controller.view().await);
    }

    // Run each bound player through a full pass
    for slot in MediaSlot::ALL {
        controller.toggle_playback(slot).await;
        controller.seek(slot, 1.0).await;
    }
    let finished = controller.pump_finished().await;
    info!(finished, "Playback check complete");

    Ok(())
}
