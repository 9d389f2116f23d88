//! Fetch+convert capture engine
//!
//! Downloads the target with a plain HTTP GET, writes the body to a per-call
//! scratch file and hands that file to an external HTML-to-image renderer.
//!
//! The renderer sees disconnected static HTML: relative assets and same-origin
//! requests made by page scripts cannot be resolved, so pages depending on them
//! render incompletely compared to the browser engine.

use crate::engine::{ensure_output_written, RequestHeaders};
use crate::{format_bytes, format_duration, CaptureEngine, CaptureError, Config, EngineKind, ScratchFile};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

pub struct FetchConvertEngine {
    client: reqwest::Client,
    config: Config,
}

impl FetchConvertEngine {
    pub fn new(config: Config) -> Result<Self, CaptureError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| CaptureError::engine(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Default User-Agent first, then caller headers; names compare case-insensitively.
    pub fn merged_headers(&self, headers: &RequestHeaders) -> Result<HeaderMap, CaptureError> {
        let mut merged = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&self.config.user_agent)
            .map_err(|e| CaptureError::Configuration(format!("invalid user_agent: {e}")))?;
        merged.insert(USER_AGENT, user_agent);

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                CaptureError::invalid_input(format!("invalid header name '{name}'"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                CaptureError::invalid_input(format!("invalid value for header '{name}'"))
            })?;
            merged.insert(name, value);
        }

        Ok(merged)
    }

    /// Download the page body verbatim; the renderer honours the page's own charset.
    async fn fetch(&self, url: &Url, headers: &RequestHeaders) -> Result<Vec<u8>, CaptureError> {
        let headers = self.merged_headers(headers)?;
        let limit = self.config.max_page_bytes;

        let mut response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| CaptureError::fetch(describe_request_error(url, &e)))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(CaptureError::fetch(format!(
                "{url} responded with HTTP {status}"
            )));
        }

        let too_large = || {
            CaptureError::fetch(format!(
                "{url} body exceeds the {} page size limit",
                format_bytes(limit)
            ))
        };
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CaptureError::fetch(describe_request_error(url, &e)))?
        {
            if body.len() + chunk.len() > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} ({})", url, format_bytes(body.len()));
        Ok(body)
    }

    async fn render(&self, input: &Path, output: &Path) -> Result<(), CaptureError> {
        let settings = &self.config.renderer;

        let mut cmd = Command::new(&settings.program);
        cmd.args(settings.args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let budget = self.config.render_timeout;
        let out = timeout(budget, cmd.output())
            .await
            .map_err(|_| {
                CaptureError::render(format!(
                    "{} timed out after {}",
                    settings.program,
                    format_duration(budget)
                ))
            })?
            .map_err(|e| {
                CaptureError::render(format!(
                    "failed to spawn {} (is it installed and on PATH?): {e}",
                    settings.program
                ))
            })?;

        if !out.status.success() {
            return Err(CaptureError::render(format!(
                "{} exited with {}: {}",
                settings.program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CaptureEngine for FetchConvertEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::FetchConvert
    }

    async fn capture(
        &self,
        url: &Url,
        headers: &RequestHeaders,
        output: &Path,
    ) -> Result<PathBuf, CaptureError> {
        let start = Instant::now();
        let body = self.fetch(url, headers).await?;

        let scratch = ScratchFile::create(&self.config.scratch_dir, &body).await?;
        let rendered = self.render(scratch.path(), output).await;
        drop(scratch);
        rendered?;

        ensure_output_written(output).await?;
        info!(
            "Fetch+convert capture of {} finished in {}",
            url,
            format_duration(start.elapsed())
        );
        Ok(output.to_path_buf())
    }
}

fn describe_request_error(url: &Url, err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request to {url} timed out")
    } else if err.is_connect() {
        format!("could not connect to {url}: {err}")
    } else {
        format!("request to {url} failed: {err}")
    }
}
