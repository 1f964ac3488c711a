//! Webhook receiver for Telegram Bot API updates.
//!
//! Telegram POSTs each update as JSON to the configured path. The receiver
//! checks the optional secret token, queues the raw payload and answers
//! immediately; a single worker drains the queue and hands each update to
//! [`Robot::handle`] one at a time.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::Value;
use subtle::ConstantTimeEq;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::bot::Robot;

/// Header carrying the secret registered with `setWebhook`.
const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Updates waiting for the worker before the receiver answers 503.
const UPDATE_QUEUE_SIZE: usize = 64;

/// Shared state for the webhook handler.
struct WebhookState {
    /// Expected secret token; requests are not checked when `None`.
    secret_token: Option<String>,
    /// Queue feeding the update worker.
    update_tx: mpsc::Sender<Value>,
}

/// HTTP server accepting webhook updates.
#[derive(Debug)]
pub struct WebhookServer {
    addr: SocketAddr,
    path: String,
    secret_token: Option<String>,
}

impl WebhookServer {
    pub fn new(addr: SocketAddr, path: impl Into<String>, secret_token: Option<String>) -> Self {
        Self {
            addr,
            path: path.into(),
            secret_token,
        }
    }

    /// Serves webhook requests until `shutdown` resolves, then lets the
    /// worker finish the queued updates.
    pub async fn run<F>(self, robot: Robot, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (update_tx, update_rx) = mpsc::channel(UPDATE_QUEUE_SIZE);
        let worker = tokio::spawn(process_updates(robot, update_rx));

        let app = router(&self.path, self.secret_token, update_tx);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("Webhook server listening on {}{}", listener.local_addr()?, self.path);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Webhook server stopped, draining queued updates");
        if let Err(e) = worker.await {
            error!("Update worker panicked: {e}");
        }
        Ok(())
    }
}

/// Builds the webhook router.
pub fn router(path: &str, secret_token: Option<String>, update_tx: mpsc::Sender<Value>) -> Router {
    let state = Arc::new(WebhookState {
        secret_token,
        update_tx,
    });

    Router::new()
        .route(path, post(handle_webhook))
        .with_state(state)
}

/// Handles queued updates sequentially until every sender is gone.
///
/// Each update runs on its own task and is awaited before the next one is
/// taken, so a panic while handling it drops only that update.
pub async fn process_updates(robot: Robot, mut update_rx: mpsc::Receiver<Value>) {
    let robot = Arc::new(robot);
    while let Some(raw) = update_rx.recv().await {
        let robot = Arc::clone(&robot);
        match tokio::spawn(async move { robot.handle(raw).await }).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Dropping update: {e}"),
            Err(e) => error!("Update handling aborted: {e}"),
        }
    }
    debug!("Update queue closed");
}

/// Compares secrets in constant time.
fn validate_secret(expected: &str, provided: &str) -> bool {
    let expected_bytes = expected.as_bytes();
    let provided_bytes = provided.as_bytes();

    if expected_bytes.len() != provided_bytes.len() {
        let _ = expected_bytes.ct_eq(expected_bytes);
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}

/// Axum handler for incoming webhook POST requests.
async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if let Some(expected) = &state.secret_token {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !validate_secret(expected, provided) {
            warn!("Webhook request with missing or invalid secret token");
            return StatusCode::FORBIDDEN;
        }
    }

    let raw: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse webhook body as JSON: {e}");
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.update_tx.try_send(raw) {
        Ok(()) => StatusCode::OK,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Update queue full, asking Telegram to retry");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            error!("Update worker is gone");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
