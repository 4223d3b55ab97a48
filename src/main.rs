use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use annotation_server::assignment::load_curated_list;
use annotation_server::clip_store::{ClipStore, SqliteClipStore};
use annotation_server::enrichment::AiEnrichmentClient;
use annotation_server::server::{run_server, RequestsLoggingLevel};
use annotation_server::user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite clip database file.
    #[clap(value_parser = parse_path)]
    pub clip_db: PathBuf,

    /// Path to the SQLite database file to use for user storage.
    #[clap(value_parser = parse_path)]
    pub user_store_file_path: PathBuf,

    /// Path to the audio media directory clips are served from.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3002)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to a newline-delimited list of clip paths walked in order by
    /// curated-mode annotators.
    #[clap(long, value_parser = parse_path)]
    pub curated_list_path: Option<PathBuf>,

    /// URL of the AI prediction service endpoint for clip pre-annotations.
    #[clap(long)]
    pub prediction_url: Option<String>,

    /// Timeout in seconds for prediction service requests.
    #[clap(long, default_value_t = 5)]
    pub prediction_timeout_sec: u64,

    /// Skip scanning the media directory for new audio files at startup.
    #[clap(long)]
    pub skip_media_import: bool,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Default media path to parent of clip db if not specified
    let media_path = match cli_args.media_path {
        Some(path) => path,
        None => cli_args
            .clip_db
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    info!("Opening SQLite clip database at {:?}...", cli_args.clip_db);
    let clip_store = Arc::new(SqliteClipStore::new(&cli_args.clip_db, &media_path)?);

    if !cli_args.skip_media_import {
        info!("Scanning {:?} for audio clips...", media_path);
        clip_store.import_clips_from_media_dir()?;
    }
    info!(
        "Serving {} registered clips",
        clip_store.all_clips()?.len()
    );

    let user_store = Arc::new(SqliteUserStore::new(&cli_args.user_store_file_path)?);

    let curated_list = match cli_args.curated_list_path {
        Some(path) => {
            let list = load_curated_list(&path)?;
            info!("Loaded curated list of {} clips from {:?}", list.len(), path);
            list
        }
        None => Vec::new(),
    };

    // Create prediction client if URL is configured
    let enrichment: Option<Arc<AiEnrichmentClient>> = match cli_args.prediction_url {
        Some(url) => {
            info!("AI prediction service configured at {}", url);
            Some(Arc::new(AiEnrichmentClient::new(
                url,
                cli_args.prediction_timeout_sec,
            )?))
        }
        None => {
            info!("No AI prediction service configured, serving default pre-annotations");
            None
        }
    };

    info!("Ready to serve at port {}!", cli_args.port);
    run_server(
        clip_store,
        user_store,
        curated_list,
        enrichment,
        cli_args.logging_level,
        cli_args.port,
        cli_args.frontend_dir_path,
    )
    .await
}
