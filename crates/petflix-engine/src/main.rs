//! Pipeline CLI binary.

use std::sync::Arc;

use petflix_media::{ContinuityExtractor, ReferenceImageLibrary};
use petflix_models::ThemeCatalog;
use petflix_remote::{GenerationClient, GenerationConfig, RenderClient, RenderConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use petflix_engine::{EngineConfig, GenerationOrchestrator};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("petflix=info".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let (image_ref, theme_id) = match (args.next(), args.next()) {
        (Some(image), Some(theme)) => (image, theme),
        _ => {
            let catalog = ThemeCatalog::builtin();
            eprintln!("Usage: petflix <image_ref> <theme_id>");
            eprintln!("Available themes: {}", catalog.available_themes().join(", "));
            std::process::exit(2);
        }
    };

    info!("Starting petflix pipeline");

    let generator = match GenerationClient::new(GenerationConfig::from_env()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create generation client: {}", e);
            std::process::exit(1);
        }
    };
    let stitcher = match RenderClient::new(RenderConfig::from_env()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create render client: {}", e);
            std::process::exit(1);
        }
    };

    let engine_config = EngineConfig::from_env();
    let references = match &engine_config.reference_manifest {
        Some(path) => match ReferenceImageLibrary::from_manifest(path).await {
            Ok(library) => library,
            Err(e) => {
                error!("Failed to load reference image manifest: {}", e);
                std::process::exit(1);
            }
        },
        None => ReferenceImageLibrary::default(),
    };

    let orchestrator = GenerationOrchestrator::new(
        engine_config,
        ThemeCatalog::builtin(),
        Arc::new(generator),
        Arc::new(stitcher),
        Arc::new(ContinuityExtractor::default()),
    )
    .with_reference_library(references);

    // Print progress snapshots as they arrive
    let mut progress = orchestrator.subscribe();
    let reporter = tokio::spawn(async move {
        loop {
            match progress.recv().await {
                Ok(state) => {
                    info!(
                        stage = %state.stage,
                        progress = %format!("{:.0}%", state.overall_progress * 100.0),
                        "{}",
                        state.message
                    );
                }
                // Falling behind the pipeline must not end reporting
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Progress reporter lagged, resuming");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    match orchestrator.run(&image_ref, &theme_id).await {
        Ok(outcome) => {
            println!("{}", outcome.video_ref);
            if outcome.from_cache {
                info!("Served from cache");
            }
        }
        Err(e) => {
            error!("{}", e.user_message());
            reporter.abort();
            std::process::exit(1);
        }
    }

    reporter.abort();
}
