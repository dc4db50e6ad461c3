//! Webhook server for inbound SMS.
//!
//! Endpoints:
//! - POST /sms - Provider webhook (form-encoded `From`, `Body`, ...)
//! - GET /health - Liveness check
//!
//! Every webhook request/response pair is appended to the audit log
//! collection. The audit trail is write-only.

mod auth;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::FormRejection, State},
    http::{header::WWW_AUTHENTICATE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{Config, SessionSettings};
use crate::db::{DocumentStore, Fields};
use crate::models::format_timestamp;
use crate::session::{handle_inbound, hash_sender};

pub use auth::Credentials;

const SUCCESS_MESSAGE: &str = "Success!";
const FAILURE_MESSAGE: &str = "Oh no! Something went wrong...";
const REALM: &str = "Basic realm=\"Pager Rebug\"";

/// Shared server state.
pub struct ServerState {
    /// Store handle shared by every request.
    store: Arc<dyn DocumentStore>,
    settings: SessionSettings,
    credentials: Option<Credentials>,
}

impl ServerState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        settings: SessionSettings,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            store,
            settings,
            credentials,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/sms", post(sms_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Server Lifecycle ===

/// Start the server and run until interrupted.
pub async fn start_server(config: &Config, store: Arc<dyn DocumentStore>) -> Result<()> {
    let credentials = config.webhook_auth.as_deref().and_then(Credentials::parse);
    if credentials.is_none() {
        warn!("Webhook credentials missing or malformed; every webhook request will be rejected");
    }

    let state = Arc::new(ServerState::new(
        store,
        config.session.clone(),
        credentials,
    ));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(addr = %config.bind, mode = ?config.session.mode, "Pager server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Pager server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

// === Handlers ===

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn sms_webhook(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let payload = match form {
        Ok(Form(payload)) => payload,
        Err(e) => {
            warn!(error = %e, "Rejecting undecodable webhook body");
            return respond(&state, HashMap::new(), StatusCode::BAD_REQUEST).await;
        }
    };

    if let Err(e) = auth::check(&headers, state.credentials.as_ref()) {
        warn!(error = %e, "Rejecting unauthenticated webhook request");
        return respond(&state, payload, StatusCode::UNAUTHORIZED).await;
    }

    let Some(from) = payload.get("From").filter(|f| !f.is_empty()).cloned() else {
        warn!("Rejecting webhook request without a sender");
        return respond(&state, payload, StatusCode::BAD_REQUEST).await;
    };
    let body = payload.get("Body").cloned().unwrap_or_default();

    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        handle_inbound(worker.store.as_ref(), &worker.settings, &body, &from)
    })
    .await;

    let status = match result {
        Ok(Ok(outcome)) => {
            info!(path = %outcome.path, claimed = outcome.claimed, "Inbound message applied");
            StatusCode::CREATED
        }
        Ok(Err(e)) if e.is_client_error() => {
            warn!(error = %e, "Inbound message rejected");
            e.status_code()
        }
        Ok(Err(e)) => {
            error!(error = %e, "Inbound message failed");
            e.status_code()
        }
        Err(e) => {
            error!(error = %e, "Inbound message task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    respond(&state, payload, status).await
}

/// Record the exchange in the audit log, then build the response.
async fn respond(
    state: &Arc<ServerState>,
    payload: HashMap<String, String>,
    status: StatusCode,
) -> Response {
    let entry = audit_entry(payload, status);
    let worker = Arc::clone(state);
    let logged = tokio::task::spawn_blocking(move || {
        worker
            .store
            .add(&worker.settings.logs_collection, &entry)
    })
    .await;
    match logged {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to write audit log"),
        Err(e) => warn!(error = %e, "Audit log task failed"),
    }

    let message = if status.is_success() {
        SUCCESS_MESSAGE
    } else {
        FAILURE_MESSAGE
    };
    let mut response = (status, Json(json!({ "Response": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    }
    response
}

/// Audit record for one exchange. The sender is stored as its token.
fn audit_entry(mut payload: HashMap<String, String>, status: StatusCode) -> Fields {
    if let Some(from) = payload.get_mut("From") {
        *from = hash_sender(from.as_bytes()).to_string();
    }

    let mut entry = Fields::new();
    entry.insert("payload".into(), json!(payload));
    entry.insert("statusCode".into(), json!(status.as_u16()));
    entry.insert("time".into(), json!(format_timestamp(Utc::now())));
    entry
}
