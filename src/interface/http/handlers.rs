use std::sync::Arc;
use std::time::Instant;

use axum::{
    debug_handler,
    extract::{Multipart, Query, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adapters::{LiveMetrics, Registry};
use crate::application::{DataSource, IngestService, PullCoordinator};
use crate::codec;
use crate::domain::{parse_url_list, Counter, Error, HostInfo, Range};
use crate::ports::MetricSource;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub live: Arc<LiveMetrics>,
    pub puller: Arc<PullCoordinator>,
    pub ingest: Arc<IngestService>,
}

/// Query params for GET /monitoring and GET /monitoring/data
#[derive(Debug, Deserialize)]
pub struct MonitoringQuery {
    pub application: Option<String>,
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl MonitoringQuery {
    fn range(&self) -> Result<Range, Error> {
        Range::from_query(
            self.period.as_deref(),
            self.start.as_deref(),
            self.end.as_deref(),
        )
    }
}

/// Form fields of the add-application admin POST
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(rename = "appName")]
    pub app_name: Option<String>,
    #[serde(rename = "appUrls")]
    pub app_urls: Option<String>,
}

/// Rendered response for GET /monitoring
#[derive(Debug, Serialize)]
pub struct MonitoringView {
    pub application: String,
    pub urls: Vec<String>,
    pub source: &'static str,
    pub captured_at: String,
    pub period: String,
    pub host: HostInfo,
    pub counters: Vec<Counter>,
    pub stored_snapshots: usize,
}

/// Middleware feeding the live metric source: every handled request becomes
/// one hit on a per-route counter.
pub async fn record_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let label = format!("http {} {}", request.method(), request.uri().path());
    let start = Instant::now();
    let response = next.run(request).await;
    state
        .live
        .record(&label, start.elapsed(), response.status().is_server_error());
    response
}

/// Handler for GET /monitoring/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "relaymon"
        })),
    )
}

/// Handler for GET /monitoring: resolve an application (registry fallback
/// when none is named) and render its data.
#[debug_handler]
pub async fn monitoring_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitoringQuery>,
) -> Response {
    let range = match params.range() {
        Ok(range) => range,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state
        .puller
        .collect(params.application.as_deref(), &range)
        .await
    {
        Ok(pulled) => {
            let view = MonitoringView {
                stored_snapshots: state.registry.history_len(&pulled.application.name),
                application: pulled.application.name,
                urls: pulled.application.urls,
                source: match pulled.source {
                    DataSource::Remote => "remote",
                    DataSource::Stored => "stored",
                },
                captured_at: pulled.snapshot.captured_at.to_rfc3339(),
                period: pulled.snapshot.range.kind.as_str().to_string(),
                host: pulled.snapshot.host,
                counters: pulled.snapshot.counters,
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(Error::NoApplicationsRegistered) => (
            StatusCode::OK,
            "no applications registered, add one by posting appName and appUrls to /monitoring",
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Handler for POST /monitoring, the add-application admin form. Validation
/// failures render a message instead of an HTTP error status.
pub async fn register_handler(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let (Some(name), Some(urls)) = (
        form.app_name.filter(|s| !s.trim().is_empty()),
        form.app_urls.filter(|s| !s.trim().is_empty()),
    ) else {
        return (StatusCode::OK, "appName and appUrls are both required").into_response();
    };

    let urls = match parse_url_list(&urls) {
        Ok(urls) => urls,
        Err(e) => return (StatusCode::OK, e.to_string()).into_response(),
    };

    if let Err(e) = state.registry.register(&name, urls.clone()) {
        return (StatusCode::OK, e.to_string()).into_response();
    }

    info!(application = %name, urls = ?urls, "monitored application added");
    Redirect::to(&format!("?application={name}")).into_response()
}

/// Handler for GET /monitoring/applications
pub async fn applications_handler(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.registry.entries())).into_response()
}

/// Handler for GET /monitoring/data: this instance's own snapshot,
/// serialized for a pulling collector.
#[debug_handler]
pub async fn data_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitoringQuery>,
) -> Response {
    let range = match params.range() {
        Ok(range) => range,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let snapshot = match state.live.capture(range) {
        Ok(snapshot) => snapshot,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };
    match codec::serialize(&snapshot) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Handler for the push ingest surface: a multipart submission with a binary
/// snapshot part and an `application` identity part.
pub async fn ingest_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut identity: Option<String> = None;
    let mut payload: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "unreadable push request");
                return (StatusCode::BAD_REQUEST, "unreadable multipart request").into_response();
            }
        };

        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("application") => match field.text().await {
                Ok(text) => identity = Some(text),
                Err(e) => {
                    warn!(error = %e, "unreadable application part");
                    return (StatusCode::BAD_REQUEST, "unreadable application part")
                        .into_response();
                }
            },
            _ => match field.bytes().await {
                Ok(bytes) => payload = Some(bytes.to_vec()),
                Err(e) => {
                    warn!(error = %e, "unreadable data part");
                    return (StatusCode::BAD_REQUEST, "unreadable data part").into_response();
                }
            },
        }
    }

    let (Some(identity), Some(payload)) = (identity, payload) else {
        let missing = Error::MalformedPushRequest {
            part: "application or data",
        };
        warn!(error = %missing, "push request rejected");
        return (StatusCode::BAD_REQUEST, missing.to_string()).into_response();
    };

    match state.ingest.ingest(&identity, &payload) {
        Ok(_) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            warn!(identity, error = %e, "push request rejected");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}
