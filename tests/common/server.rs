//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own artifact directory.

use super::constants::*;
use super::fixtures::{create_test_artifacts, ArtifactFixture};
use async_trait::async_trait;
use boxoffice_server::artifacts::ArtifactStore;
use boxoffice_server::media::{MediaProvider, MediaSignal, SocialMetrics, Trailer};
use boxoffice_server::prediction::Predictor;
use boxoffice_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Media provider that knows a single hyped title and nothing else.
struct StubMediaProvider;

#[async_trait]
impl MediaProvider for StubMediaProvider {
    async fn get_media(&self, title: &str) -> MediaSignal {
        if title != HYPED_TITLE {
            return MediaSignal::not_found();
        }
        MediaSignal {
            found: true,
            title: Some(HYPED_TITLE.to_string()),
            year: Some("2024".to_string()),
            trailers: vec![Trailer {
                name: "Official Trailer 3".to_string(),
                key: "U2Qp5pL3ovA".to_string(),
                kind: "Trailer".to_string(),
                site: "YouTube".to_string(),
            }],
            metrics: SocialMetrics {
                trailer_views_approx: HYPED_TRAILER_VIEWS,
                social_buzz_score: 90,
            },
            ..MediaSignal::default()
        }
    }
}

/// Test server instance with an isolated artifact directory
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    #[allow(dead_code)]
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_artifacts_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server with complete artifacts on a random port
    pub async fn spawn() -> Self {
        Self::spawn_with(ArtifactFixture::Complete, None).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Writes the requested artifact fixture into a temporary directory
    /// 2. Loads it the same way the binary does
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if the fixture cannot be written, the port cannot be bound or
    /// the server doesn't become ready within timeout.
    pub async fn spawn_with(
        fixture: ArtifactFixture,
        retrain_command: Option<Vec<String>>,
    ) -> Self {
        let temp_artifacts_dir =
            create_test_artifacts(fixture).expect("Failed to create test artifacts");

        let load = ArtifactStore::new(temp_artifacts_dir.path()).load();
        let media: Arc<dyn MediaProvider> = Arc::new(StubMediaProvider);
        let predictor = Arc::new(Predictor::new(load, media.clone()));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            retrain_command,
        };
        let app = make_app(ServerState::new(config, predictor, media));

        // Spawn server in background task with graceful shutdown
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
            _temp_artifacts_dir: temp_artifacts_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the root endpoint
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
                Ok(response) if response.status().is_success() => return,
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
    }
}
