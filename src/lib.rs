//! # Screenshot Service
//!
//! An HTTP service that turns a URL into a PNG screenshot. A capture request
//! passes through a purely syntactic URL check, picks a collision-free output
//! file, runs one of two interchangeable capture engines and hands the result
//! back either as a file under `/static` or inline as `image/png` bytes.
//!
//! ## Capture engines
//!
//! | Engine | How it renders | Wait condition | Timeout |
//! |--------|----------------|----------------|---------|
//! | **browser** | Headless Chromium per call (chromiumoxide) | `networkIdle` lifecycle event | 30s navigation |
//! | **fetch_convert** | HTTP GET + external `wkhtmltoimage` | JavaScript settle delay | 10s fetch, 60s render |
//!
//! The engine is a deployment setting; requests cannot switch it.
//!
//! ## Cleanup guarantees
//!
//! - Output files are guarded until the capture succeeds; any failure removes
//!   the partial file before the error is returned.
//! - Fetch+convert scratch HTML lives in a uniquely named file per call and is
//!   removed whatever the outcome.
//! - Browser processes, their CDP handler tasks and profile directories are
//!   torn down after every call, including cancelled ones.
//!
//! ## Error classification
//!
//! | Error | HTTP status | Meaning |
//! |-------|-------------|---------|
//! | `InvalidInput` | 400 | Malformed URL, filename or header |
//! | `Fetch` | 400 | Target unreachable, timed out or returned an error status |
//! | `Render` | 500 | Renderer failed; message carries its stderr |
//! | `Engine` | 500 | Browser could not be launched |
//! | `Storage` | 500 | Filesystem failure |
//! | `NotFound` | 404 | Deleting an artifact that does not exist |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use screenshot_service::{CaptureRequest, Config, ScreenshotService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ScreenshotService::new(Config::default())?;
//!     let artifact = service
//!         .capture_artifact(CaptureRequest::new("https://example.com"))
//!         .await?;
//!     println!("Captured {}", artifact.file_name());
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! screenshot-service serve --bind 0.0.0.0:8000
//! screenshot-service --engine fetch_convert capture --url https://example.com --output shot.png
//! ```

/// Configuration and settings for the screenshot service
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// Syntactic URL validation
pub mod validator;

/// Output naming, scratch files and artifact delivery
pub mod artifact;

/// Capture engine trait and selection
pub mod engine;

/// Headless Chromium capture engine
pub mod browser_engine;

/// HTTP fetch + external renderer capture engine
pub mod fetch_convert;

/// Main screenshot service orchestrating the pipeline
pub mod screenshot_service;

/// HTTP routes and server lifecycle
pub mod server;

/// Command-line interface implementation
pub mod cli;

/// Capture metrics
pub mod telemetry;

/// Utility functions and helpers
pub mod utils;

#[cfg(test)]
mod tests;

pub use artifact::*;
pub use browser_engine::*;
pub use cli::*;
pub use config::*;
pub use engine::{build_engine, CaptureEngine, RequestHeaders};
pub use error::*;
pub use fetch_convert::*;
pub use screenshot_service::*;
pub use server::*;
pub use telemetry::install_prometheus_recorder;
pub use utils::*;
pub use validator::*;
