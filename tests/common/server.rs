//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases and media
//! directory, spawned on a random port and shut down on drop.

use super::constants::*;
use super::fixtures::create_test_clip_db;
use annotation_server::clip_store::{ClipStore, SqliteClipStore};
use annotation_server::enrichment::AiEnrichmentClient;
use annotation_server::server::server::make_app;
use annotation_server::server::{RequestsLoggingLevel, ServerConfig};
use annotation_server::user::SqliteUserStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Knobs for spawning a test server with a curated list or a prediction
/// service endpoint.
#[derive(Default)]
pub struct TestServerOptions {
    pub curated_list: Vec<String>,
    pub prediction_url: Option<String>,
}

/// Test server instance with isolated stores
///
/// When dropped, the server shuts down and temp resources are cleaned up.
#[allow(dead_code)] // Not every test binary reads every field
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Clip store for direct database access in tests
    pub clip_store: Arc<SqliteClipStore>,

    /// Absolute path of the media directory backing the clips
    pub media_path: std::path::PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server with the standard three-clip fixture, no
    /// curated list and no prediction service.
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let (temp_dir, clip_db_path, media_path) =
            create_test_clip_db().expect("Failed to create test clip db");

        let clip_store = Arc::new(
            SqliteClipStore::new(&clip_db_path, &media_path).expect("Failed to open clip store"),
        );
        let clip_store_for_test = clip_store.clone();

        let user_db_path = temp_dir.path().join("users.db");
        let user_store =
            Arc::new(SqliteUserStore::new(&user_db_path).expect("Failed to open user store"));

        let enrichment = options.prediction_url.map(|url| {
            Arc::new(AiEnrichmentClient::new(url, 2).expect("Failed to build enrichment client"))
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };

        let app = make_app(
            config,
            clip_store as Arc<dyn ClipStore>,
            user_store,
            options.curated_list,
            enrichment,
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            clip_store: clip_store_for_test,
            media_path,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir cleans up after itself
    }
}
