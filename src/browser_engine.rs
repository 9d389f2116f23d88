//! Browser-driven capture engine
//!
//! Every call launches its own headless Chromium with a throwaway profile
//! directory, navigates, waits for network idle and writes a full-page PNG.
//! Nothing is shared between calls, so concurrent captures cannot observe
//! each other's cookies, headers or crashes.

use crate::engine::{ensure_output_written, RequestHeaders};
use crate::{create_browser_config, format_duration, CaptureEngine, CaptureError, Config, EngineKind};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, Headers, ResourceType, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::{FutureExt, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

const NETWORK_IDLE: &str = "networkIdle";

pub struct BrowserEngine {
    config: Config,
}

impl BrowserEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    async fn drive(
        &self,
        session: &BrowserSession,
        url: &Url,
        headers: &RequestHeaders,
        output: &Path,
    ) -> Result<(), CaptureError> {
        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::engine(format!("failed to open page: {e}")))?;

        let result = self.navigate_and_rasterize(&page, url, headers, output).await;

        if let Err(e) = page.close().await {
            debug!("Closing page failed (browser teardown follows): {}", e);
        }

        result
    }

    async fn navigate_and_rasterize(
        &self,
        page: &Page,
        url: &Url,
        headers: &RequestHeaders,
        output: &Path,
    ) -> Result<(), CaptureError> {
        if !headers.is_empty() {
            let value = serde_json::to_value(headers)
                .map_err(|e| CaptureError::invalid_input(format!("invalid headers: {e}")))?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(value)))
                .await
                .map_err(|e| CaptureError::invalid_input(format!("invalid headers: {e}")))?;
            debug!("Attached {} extra header(s)", headers.len());
        }

        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| CaptureError::engine(e.to_string()))?;

        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| CaptureError::engine(e.to_string()))?;
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| CaptureError::engine(e.to_string()))?;

        // Lifecycle events already queued belong to about:blank.
        let mut stale_loaders = HashSet::new();
        while let Some(Some(event)) = lifecycle.next().now_or_never() {
            stale_loaders.insert(event.loader_id.inner().clone());
        }

        let navigation = async {
            page.goto(url.as_str())
                .await
                .map_err(|e| CaptureError::fetch(format!("navigation to {url} failed: {e}")))?;

            while let Some(event) = lifecycle.next().await {
                if event.name == NETWORK_IDLE && !stale_loaders.contains(event.loader_id.inner()) {
                    debug!("Network idle reached for {}", url);
                    break;
                }
            }
            Ok::<(), CaptureError>(())
        };

        let budget = self.config.navigation_timeout;
        timeout(budget, navigation).await.map_err(|_| {
            CaptureError::fetch(format!(
                "navigation to {url} timed out after {}",
                format_duration(budget)
            ))
        })??;

        // First document response belongs to the main frame.
        while let Some(Some(event)) = responses.next().now_or_never() {
            if event.r#type == ResourceType::Document {
                let status = event.response.status;
                if status >= 400 {
                    return Err(CaptureError::fetch(format!(
                        "{url} responded with HTTP {status}"
                    )));
                }
                break;
            }
        }

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        page.save_screenshot(params, output)
            .await
            .map_err(|e| CaptureError::render(format!("screenshot failed: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl CaptureEngine for BrowserEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Browser
    }

    async fn capture(
        &self,
        url: &Url,
        headers: &RequestHeaders,
        output: &Path,
    ) -> Result<PathBuf, CaptureError> {
        let start = Instant::now();
        let session = BrowserSession::launch(&self.config).await?;

        let result = self.drive(&session, url, headers, output).await;
        session.teardown().await;
        result?;

        ensure_output_written(output).await?;
        info!(
            "Browser capture of {} finished in {}",
            url,
            format_duration(start.elapsed())
        );
        Ok(output.to_path_buf())
    }
}

/// One launched browser, its CDP handler task and its profile directory.
///
/// `teardown` closes the browser gracefully; if the session is dropped
/// instead (cancelled request), the handler task is aborted and chromiumoxide
/// kills the child process.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    _profile: TempDir,
}

impl BrowserSession {
    async fn launch(config: &Config) -> Result<Self, CaptureError> {
        let profile = tempfile::Builder::new()
            .prefix("screenshot-profile-")
            .tempdir()
            .map_err(|e| CaptureError::engine(format!("failed to create profile dir: {e}")))?;

        let browser_config = create_browser_config(config, profile.path())?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CaptureError::engine(format!("browser launch failed: {e}")))?;

        // The handler stream drives all CDP traffic and must be polled until the browser exits.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        debug!("Launched browser with profile {}", profile.path().display());
        Ok(Self {
            browser,
            handler,
            _profile: profile,
        })
    }

    async fn teardown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Waiting for browser exit failed: {}", e);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
