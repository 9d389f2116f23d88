//! Capture engine capability and deployment-time selection
//!
//! Both rendering strategies implement [`CaptureEngine`]; the service holds one
//! `Arc<dyn CaptureEngine>` chosen from [`Config::engine`] at startup.

use crate::{BrowserEngine, CaptureError, Config, EngineKind, FetchConvertEngine};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Extra request headers supplied by the caller.
pub type RequestHeaders = BTreeMap<String, String>;

/// Turns a URL into a PNG file at `output`.
///
/// Implementations must release every resource they acquire (browser
/// processes, scratch files) before returning, on success and on failure.
/// Cleanup of `output` itself on failure belongs to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    async fn capture(
        &self,
        url: &Url,
        headers: &RequestHeaders,
        output: &Path,
    ) -> Result<PathBuf, CaptureError>;
}

pub fn build_engine(config: &Config) -> Result<Arc<dyn CaptureEngine>, CaptureError> {
    let engine: Arc<dyn CaptureEngine> = match config.engine {
        EngineKind::Browser => Arc::new(BrowserEngine::new(config.clone())),
        EngineKind::FetchConvert => Arc::new(FetchConvertEngine::new(config.clone())?),
    };
    Ok(engine)
}

/// A written, non-empty output file is the only success signal.
pub(crate) async fn ensure_output_written(output: &Path) -> Result<(), CaptureError> {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(CaptureError::render(format!(
            "renderer produced no output at {}",
            output.display()
        ))),
    }
}
