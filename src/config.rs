//! Configuration management with serde serialization/deserialization
//!
//! This module provides the deployment configuration for the screenshot service:
//! which capture engine runs, how artifacts are delivered, where files live and
//! the per-call timeouts.

use crate::CaptureError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_PAGE_BYTES: usize = 32 * 1024 * 1024;

/// User-Agent sent by the fetch+convert engine unless the caller overrides it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Main configuration structure for the screenshot service
///
/// # Examples
///
/// ```rust
/// use screenshot_service::{Config, DeliveryMode, EngineKind};
///
/// // Use default configuration
/// let config = Config::default();
/// assert_eq!(config.engine, EngineKind::Browser);
///
/// // Fetch+convert deployment returning images inline
/// let config = Config {
///     engine: EngineKind::FetchConvert,
///     delivery: DeliveryMode::Inline,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Socket address the HTTP server binds to (default: 0.0.0.0:8000)
    pub bind: String,

    /// Directory persisted artifacts are written to and served from (default: `static`)
    pub static_dir: PathBuf,

    /// Directory for per-call scratch files of the fetch+convert engine
    /// (default: the system temporary directory)
    pub scratch_dir: PathBuf,

    /// Capture strategy used for every request (default: browser)
    pub engine: EngineKind,

    /// How captured artifacts are handed back to callers (default: persist)
    pub delivery: DeliveryMode,

    /// Maximum number of captures running at once (default: 2 x CPU count)
    ///
    /// Each browser capture launches its own Chromium process, so this is
    /// effectively a cap on concurrent browser processes.
    pub max_concurrent_captures: usize,

    /// Navigation budget for the browser engine, including the wait for network idle (default: 30s)
    pub navigation_timeout: Duration,

    /// Request budget for the fetch+convert engine's GET (default: 10s)
    pub fetch_timeout: Duration,

    /// Upper bound on the external renderer's run time (default: 60s)
    pub render_timeout: Duration,

    /// Largest page body the fetch+convert engine downloads (default: 32 MiB)
    pub max_page_bytes: usize,

    /// User-Agent for fetched pages; caller headers take precedence
    pub user_agent: String,

    /// Browser window used for rendering
    pub viewport: Viewport,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// External HTML-to-image renderer settings
    pub renderer: RendererSettings,

    /// Origins allowed by the CORS layer; empty disables CORS handling
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            static_dir: PathBuf::from("static"),
            scratch_dir: std::env::temp_dir(),
            engine: EngineKind::default(),
            delivery: DeliveryMode::default(),
            max_concurrent_captures: num_cpus::get() * 2,
            navigation_timeout: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(60),
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: Viewport::default(),
            chrome_path: None,
            renderer: RendererSettings::default(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.max_concurrent_captures == 0 {
            return Err(CaptureError::Configuration(
                "max_concurrent_captures must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("navigation_timeout", self.navigation_timeout),
            ("fetch_timeout", self.fetch_timeout),
            ("render_timeout", self.render_timeout),
        ] {
            if value.is_zero() {
                return Err(CaptureError::Configuration(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.max_page_bytes == 0 {
            return Err(CaptureError::Configuration(
                "max_page_bytes must be greater than 0".to_string(),
            ));
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(CaptureError::Configuration(
                "Viewport dimensions must be greater than 0".to_string(),
            ));
        }

        if self.renderer.program.trim().is_empty() {
            return Err(CaptureError::Configuration(
                "renderer.program must not be empty".to_string(),
            ));
        }

        if self.renderer.width == 0 || self.renderer.quality > 100 {
            return Err(CaptureError::Configuration(
                "renderer width must be > 0 and quality within 0..=100".to_string(),
            ));
        }

        self.bind.parse::<std::net::SocketAddr>().map_err(|e| {
            CaptureError::Configuration(format!("invalid bind address '{}': {e}", self.bind))
        })?;

        Ok(())
    }
}

/// Rendering strategy, fixed per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Headless Chromium driven over the DevTools protocol
    #[default]
    Browser,
    /// Plain HTTP GET followed by an external HTML-to-image renderer
    FetchConvert,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Browser => "browser",
            EngineKind::FetchConvert => "fetch_convert",
        }
    }
}

impl std::str::FromStr for EngineKind {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" | "chrome" | "chromium" => Ok(EngineKind::Browser),
            "fetch_convert" | "fetch-convert" | "wkhtmltoimage" => Ok(EngineKind::FetchConvert),
            other => Err(CaptureError::Configuration(format!(
                "unknown engine '{other}' (expected browser or fetch_convert)"
            ))),
        }
    }
}

/// Whether artifacts stay on disk or are streamed back and deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Leave the file under the static directory and return its URL
    #[default]
    Persist,
    /// Return the PNG bytes in the response and delete the file
    Inline,
}

/// Browser viewport configuration for screenshots
///
/// The full-page capture extends beyond `height` when the document scrolls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Viewport {
    /// Viewport width in pixels (default: 1280)
    pub width: u32,

    /// Viewport height in pixels (default: 800)
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Settings for the external HTML-to-image renderer (wkhtmltoimage compatible).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Executable name or path (default: `wkhtmltoimage`)
    pub program: String,

    /// Target image width in pixels (default: 1280)
    pub width: u32,

    /// Image quality passed to the renderer (default: 90)
    pub quality: u8,

    /// Settle delay given to page scripts before rasterizing (default: 2000ms)
    pub javascript_delay_ms: u64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            program: "wkhtmltoimage".to_string(),
            width: 1280,
            quality: 90,
            javascript_delay_ms: 2000,
        }
    }
}

impl RendererSettings {
    /// Fixed argument list for one render, input and output paths last.
    pub fn args(&self, input: &std::path::Path, output: &std::path::Path) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            "--format".to_string(),
            "png".to_string(),
            "--width".to_string(),
            self.width.to_string(),
            "--quality".to_string(),
            self.quality.to_string(),
            "--enable-javascript".to_string(),
            "--javascript-delay".to_string(),
            self.javascript_delay_ms.to_string(),
            "--no-stop-slow-scripts".to_string(),
            "--load-error-handling".to_string(),
            "ignore".to_string(),
            "--load-media-error-handling".to_string(),
            "ignore".to_string(),
            "--enable-local-file-access".to_string(),
            input.display().to_string(),
            output.display().to_string(),
        ]
    }
}

/// Generate Chrome command-line arguments based on configuration
///
/// Every browser capture gets its own profile directory (passed separately to
/// the launcher), so no singleton or debugging-port juggling is needed here.
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        "--ignore-certificate-errors".to_string(),
        format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        ),
    ]
}

/// Build the launcher configuration for one isolated browser.
pub fn create_browser_config(
    config: &Config,
    profile_dir: &std::path::Path,
) -> Result<chromiumoxide::browser::BrowserConfig, CaptureError> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder()
        .window_size(config.viewport.width, config.viewport.height)
        .user_data_dir(profile_dir)
        .args(get_chrome_args(config));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(CaptureError::Engine)
}
