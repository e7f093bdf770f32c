use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use studymate_capture::{create_router, AppState, Config, CpalBackend, MediaBackend};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "studymate-capture", about = "Interview capture service")]
struct Args {
    /// Path to the service configuration file (without extension)
    #[arg(long, default_value = "config/studymate-capture")]
    config: String,

    /// Transcript streaming endpoint, overriding the configuration
    #[arg(long)]
    transcript_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("studymate-capture v0.1.0");
    info!("loaded config: {}", cfg.service.name);

    let mut defaults = cfg.capture_defaults();
    if args.transcript_url.is_some() {
        defaults.transcript_url = args.transcript_url;
    }

    let recordings_dir = match &cfg.capture.recordings_path {
        Some(path) => {
            let dir = PathBuf::from(path);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create recordings directory: {:?}", dir))?;
            Some(dir)
        }
        None => None,
    };

    let backend: Arc<dyn MediaBackend> = Arc::new(CpalBackend::new());
    let state = AppState::new(backend, defaults, recordings_dir);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, router).await?;

    Ok(())
}
