//! Main screenshot service orchestrating the capture pipeline
//!
//! A request flows through URL validation, output path resolution, the
//! configured capture engine and finally artifact delivery. Any failure after
//! the output path is chosen removes the partially written file before the
//! error is returned.

use crate::engine::{build_engine, RequestHeaders};
use crate::{
    parse_target, telemetry, Artifact, ArtifactStore, CaptureEngine, CaptureError,
    CapturedArtifact, Config,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Body of `POST /screenshot/`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureRequest {
    pub url: String,
    #[serde(default)]
    pub headers: Option<RequestHeaders>,
    #[serde(default)]
    pub output_filename: Option<String>,
}

impl CaptureRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Body of `POST /screenshot/basic`: credentials become an `Authorization: Basic` header.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthCaptureRequest {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub output_filename: Option<String>,
}

impl From<BasicAuthCaptureRequest> for CaptureRequest {
    fn from(req: BasicAuthCaptureRequest) -> Self {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", req.username, req.password));
        let mut headers = RequestHeaders::new();
        headers.insert("Authorization".to_string(), format!("Basic {credentials}"));

        CaptureRequest {
            url: req.url,
            headers: Some(headers),
            output_filename: req.output_filename,
        }
    }
}

/// Body of `POST /screenshot/bearer`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BearerAuthCaptureRequest {
    pub url: String,
    pub bearer_token: String,
    #[serde(default)]
    pub output_filename: Option<String>,
}

impl From<BearerAuthCaptureRequest> for CaptureRequest {
    fn from(req: BearerAuthCaptureRequest) -> Self {
        let mut headers = RequestHeaders::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", req.bearer_token),
        );

        CaptureRequest {
            url: req.url,
            headers: Some(headers),
            output_filename: req.output_filename,
        }
    }
}

/// Screenshot pipeline shared by all request handlers.
///
/// # Examples
///
/// ```rust,no_run
/// use screenshot_service::{CaptureRequest, Config, ScreenshotService};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = ScreenshotService::new(Config::default())?;
///     let artifact = service
///         .capture(CaptureRequest::new("https://example.com"))
///         .await?;
///     println!("Captured {}", artifact.path.display());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ScreenshotService {
    engine: Arc<dyn CaptureEngine>,
    store: ArtifactStore,
    config: Config,
    concurrency_limiter: Arc<Semaphore>,
}

impl ScreenshotService {
    pub fn new(config: Config) -> Result<Self, CaptureError> {
        let engine = build_engine(&config)?;
        Ok(Self::with_engine(config, engine))
    }

    pub fn with_engine(config: Config, engine: Arc<dyn CaptureEngine>) -> Self {
        Self {
            store: ArtifactStore::new(config.static_dir.clone()),
            concurrency_limiter: Arc::new(Semaphore::new(config.max_concurrent_captures)),
            engine,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run one capture and leave the result on disk under the static directory.
    pub async fn capture(&self, request: CaptureRequest) -> Result<CapturedArtifact, CaptureError> {
        info!("Received capture request for {}", request.url);

        let url = parse_target(&request.url).map_err(|e| {
            warn!("Rejected capture request: {}", e);
            e
        })?;
        let output = self
            .store
            .resolve_output_path(request.output_filename.as_deref())
            .await?;
        let headers = request.headers.unwrap_or_default();

        let _permit = self.concurrency_limiter.acquire().await?;
        let _in_flight = telemetry::InFlightGuard::enter();
        debug!(
            "Capturing {} into {} with {} engine",
            url,
            output.path().display(),
            self.engine.kind().as_str()
        );

        let start = Instant::now();
        let result = self
            .engine
            .capture(&url, &headers, output.staging_path())
            .await;
        telemetry::record_capture(
            self.engine.kind(),
            start.elapsed(),
            result.as_ref().map(|_| ()),
        );

        match result {
            Ok(_) => {
                let artifact = output.commit().await?;
                info!("Screenshot of {} saved to {}", url, artifact.path.display());
                Ok(artifact)
            }
            Err(e) => {
                if e.is_client_error() {
                    warn!("Screenshot of {} failed: {}", url, e);
                } else {
                    error!("Screenshot of {} failed: {}", url, e);
                }
                // Dropping `output` removes only what this capture wrote.
                Err(e)
            }
        }
    }

    /// Capture and deliver according to the configured [`crate::DeliveryMode`].
    pub async fn capture_artifact(&self, request: CaptureRequest) -> Result<Artifact, CaptureError> {
        let captured = self.capture(request).await?;
        self.store.finalize(captured, self.config.delivery).await
    }

    pub async fn delete_artifact(&self, file_name: &str) -> Result<(), CaptureError> {
        self.store.delete(file_name).await?;
        telemetry::record_deletion();
        Ok(())
    }
}
