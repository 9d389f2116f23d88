//! HTTP boundary: routes, request parsing and error-to-status mapping
//!
//! The handlers are thin; all capture semantics live in [`ScreenshotService`].

use crate::{
    Artifact, BasicAuthCaptureRequest, BearerAuthCaptureRequest, CaptureError, CaptureRequest,
    Config, ScreenshotService,
};
use anyhow::Context as _;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

const DOCS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Webpage Screenshot Service</title></head>
<body>
<h1>Webpage Screenshot Service</h1>
<p>Capture screenshots of webpages as images and serve them.</p>
<h2>Endpoints</h2>
<ul>
<li><code>POST /screenshot/</code> &mdash; body <code>{"url": "...", "headers": {...}, "output_filename": "..."}</code></li>
<li><code>POST /screenshot/basic</code> &mdash; body <code>{"url": "...", "username": "...", "password": "...", "output_filename": "..."}</code></li>
<li><code>POST /screenshot/bearer</code> &mdash; body <code>{"url": "...", "bearer_token": "...", "output_filename": "..."}</code></li>
<li><code>GET /static/{filename}</code> &mdash; download a persisted screenshot</li>
<li><code>DELETE /static/{filename}</code> &mdash; remove a persisted screenshot</li>
<li><code>GET /health</code> &mdash; service health</li>
<li><code>GET /metrics</code> &mdash; Prometheus metrics</li>
</ul>
<p>Errors are returned as <code>{"detail": "..."}</code>.</p>
</body>
</html>
"#;

#[derive(Clone)]
pub struct AppState {
    pub service: ScreenshotService,
    pub metrics: Option<PrometheusHandle>,
}

impl IntoResponse for CaptureError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.service.config().cors_allowed_origins);

    let artifacts = Router::new().route(
        "/:filename",
        delete(delete_artifact).fallback_service(ServeDir::new(state.service.store().root())),
    );

    let router = Router::new()
        .route("/", get(|| async { Redirect::temporary("/docs") }))
        .route("/docs", get(|| async { Html(DOCS_PAGE) }))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route("/screenshot", post(create_screenshot))
        .route("/screenshot/", post(create_screenshot))
        .route("/screenshot/basic", post(create_basic_auth_screenshot))
        .route("/screenshot/bearer", post(create_bearer_auth_screenshot))
        .nest("/static", artifacts)
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
            .max_age(Duration::from_secs(86400)),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn reject(rejection: JsonRejection) -> CaptureError {
    CaptureError::invalid_input(format!("Invalid request: {}", rejection.body_text()))
}

async fn create_screenshot(
    State(state): State<AppState>,
    payload: Result<Json<CaptureRequest>, JsonRejection>,
) -> Result<Response, CaptureError> {
    let Json(request) = payload.map_err(reject)?;
    respond(state.service.capture_artifact(request).await?)
}

async fn create_basic_auth_screenshot(
    State(state): State<AppState>,
    payload: Result<Json<BasicAuthCaptureRequest>, JsonRejection>,
) -> Result<Response, CaptureError> {
    let Json(request) = payload.map_err(reject)?;
    respond(state.service.capture_artifact(request.into()).await?)
}

async fn create_bearer_auth_screenshot(
    State(state): State<AppState>,
    payload: Result<Json<BearerAuthCaptureRequest>, JsonRejection>,
) -> Result<Response, CaptureError> {
    let Json(request) = payload.map_err(reject)?;
    respond(state.service.capture_artifact(request.into()).await?)
}

fn respond(artifact: Artifact) -> Result<Response, CaptureError> {
    match artifact {
        Artifact::Persisted { file_url, .. } => {
            Ok((StatusCode::OK, Json(json!({ "file_url": file_url }))).into_response())
        }
        Artifact::Inline { file_name, bytes } => {
            let disposition = HeaderValue::from_str(&format!("inline; filename=\"{file_name}\""))
                .map_err(|e| CaptureError::storage(e.to_string()))?;
            Ok((
                StatusCode::OK,
                [
                    (CONTENT_TYPE, HeaderValue::from_static("image/png")),
                    (CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
    }
}

async fn delete_artifact(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>, CaptureError> {
    state.service.delete_artifact(&filename).await?;
    Ok(Json(json!({ "message": format!("File {filename} deleted") })))
}

/// Run the HTTP server until SIGINT/SIGTERM.
pub async fn serve(config: Config, metrics: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let service = ScreenshotService::new(config.clone())?;
    service.store().ensure_dir().await?;

    let app = build_router(AppState { service, metrics });
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        "Listening on {} ({} engine, {:?} delivery, artifacts in {})",
        config.bind,
        config.engine.as_str(),
        config.delivery,
        config.static_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
