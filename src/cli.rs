use crate::{
    format_bytes, has_png_signature, CaptureRequest, Config, DeliveryMode, EngineKind,
    ScreenshotService,
};
use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "screenshot-service")]
#[command(about = "Capture webpage screenshots over HTTP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Capture engine (browser, fetch_convert)")]
    pub engine: Option<EngineKind>,

    #[arg(long, global = true, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, global = true, help = "HTML-to-image renderer executable")]
    pub renderer: Option<String>,

    #[arg(long, global = true, help = "Navigation/fetch timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(short, long, help = "Bind address, e.g. 0.0.0.0:8000")]
        bind: Option<String>,

        #[arg(long, help = "Directory persisted screenshots are written to")]
        static_dir: Option<PathBuf>,

        #[arg(long, help = "Return PNG bytes inline instead of persisting files")]
        inline: bool,
    },

    /// Take a single screenshot and write it to a local file
    Capture {
        #[arg(short, long, help = "URL to screenshot")]
        url: String,

        #[arg(short, long, help = "Output file path")]
        output: PathBuf,

        #[arg(long = "header", value_name = "NAME:VALUE", help = "Extra request header (repeatable)")]
        headers: Vec<String>,
    },

    /// Validate configuration
    Validate {
        #[arg(help = "Configuration file to validate")]
        file: PathBuf,
    },
}

pub async fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path).await?,
        None => Config::default(),
    };

    if let Some(engine) = args.engine {
        config.engine = engine;
    }
    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }
    if let Some(renderer) = &args.renderer {
        config.renderer.program = renderer.clone();
    }
    if let Some(timeout) = args.timeout {
        config.navigation_timeout = std::time::Duration::from_secs(timeout);
        config.fetch_timeout = std::time::Duration::from_secs(timeout);
    }

    if let Commands::Serve {
        bind,
        static_dir,
        inline,
    } = &args.command
    {
        if let Some(bind) = bind {
            config.bind = bind.clone();
        }
        if let Some(static_dir) = static_dir {
            config.static_dir = static_dir.clone();
        }
        if *inline {
            config.delivery = DeliveryMode::Inline;
        }
    }

    config.validate()?;

    info!("Configuration loaded successfully");
    info!("Engine: {}", config.engine.as_str());
    info!("Max concurrent captures: {}", config.max_concurrent_captures);
    info!("Navigation timeout: {:?}", config.navigation_timeout);

    Ok(config)
}

async fn read_config_file(path: &Path) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

pub fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("header '{raw}' must look like NAME:VALUE"),
    }
}

pub struct CliRunner {
    pub config: Config,
    pub metrics: Option<PrometheusHandle>,
}

impl CliRunner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PrometheusHandle) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Serve { .. } => crate::serve(self.config, self.metrics).await,
            Commands::Capture {
                url,
                output,
                headers,
            } => self.run_capture(url, output, headers).await,
            Commands::Validate { file } => self.validate_config(file).await,
        }
    }

    pub async fn run_capture(
        &self,
        url: String,
        output: PathBuf,
        headers: Vec<String>,
    ) -> anyhow::Result<()> {
        let headers = headers
            .iter()
            .map(|h| parse_header(h))
            .collect::<anyhow::Result<_>>()?;

        // Capture into a private directory so the pipeline's naming and cleanup apply unchanged.
        let workdir = tempfile::tempdir().context("failed to create working directory")?;
        let config = Config {
            static_dir: workdir.path().to_path_buf(),
            delivery: DeliveryMode::Persist,
            ..self.config.clone()
        };
        let service = ScreenshotService::new(config)?;

        let artifact = service
            .capture(CaptureRequest {
                url: url.clone(),
                headers: Some(headers),
                output_filename: None,
            })
            .await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let bytes = artifact.read_bytes().await?;
        fs::write(&output, &bytes)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;

        println!("Screenshot captured successfully:");
        println!("  URL: {url}");
        println!("  Output: {}", output.display());
        println!("  Engine: {}", service.config().engine.as_str());
        println!("  Size: {}", format_bytes(bytes.len()));
        if !has_png_signature(&bytes) {
            println!("  Warning: output does not start with a PNG signature");
        }

        Ok(())
    }

    pub async fn validate_config(&self, file: PathBuf) -> anyhow::Result<()> {
        println!("Validating configuration: {}", file.display());

        let config = read_config_file(&file).await?;
        config.validate()?;

        println!("Configuration is valid:");
        println!("  Bind: {}", config.bind);
        println!("  Engine: {}", config.engine.as_str());
        println!("  Delivery: {:?}", config.delivery);
        println!("  Static dir: {}", config.static_dir.display());
        println!("  Max concurrent: {}", config.max_concurrent_captures);
        println!("  Navigation timeout: {:?}", config.navigation_timeout);
        println!("  Fetch timeout: {:?}", config.fetch_timeout);

        Ok(())
    }
}

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    Ok(())
}
