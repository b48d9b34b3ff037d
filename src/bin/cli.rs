//! session-labeler command line
//!
//! Runs a labeling session in Chrome, serves the upload endpoint, or sends exported
//! datasets to it.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use session_labeler::browser::{BrowserSession, ConnectionOptions, DriverOptions, DriverReport, LabelingDriver, LaunchOptions};
use session_labeler::config::{self, CONFIG_FILE_NAME, LabelerConfig};
use session_labeler::upload::{UploadClient, server};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser)]
#[command(name = "session-labeler")]
#[command(version)]
#[command(about = "Label webpage regions by clicking them", long_about = None)]
struct Cli {
    /// Configuration file (default: ./session-labeler.toml when present)
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a page and label the elements you click
    Label {
        /// Page to label
        url: String,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        /// Directory ux_examples.json is written to
        #[arg(long, short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,

        /// End the session after this many examples
        #[arg(long, value_name = "N")]
        max_examples: Option<usize>,

        /// Path to custom browser executable
        #[arg(long, value_name = "PATH")]
        chrome: Option<PathBuf>,

        /// WebSocket endpoint URL of an already running browser
        #[arg(long, value_name = "URL")]
        ws_endpoint: Option<String>,

        /// Persistent browser profile directory
        #[arg(long, value_name = "DIR")]
        user_data_dir: Option<PathBuf>,
    },

    /// Run the upload endpoint
    ServeUpload {
        /// Address to bind (overrides upload.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Directory uploaded files are stored in (overrides upload.upload_dir)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Shared upload token (overrides upload.token)
        #[arg(long, env = "UPLOAD_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Send exported files to an upload endpoint
    Upload {
        /// Full URL of the upload endpoint
        #[arg(long, value_name = "URL")]
        endpoint: String,

        /// Shared upload token (overrides upload.token)
        #[arg(long, env = "UPLOAD_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Target file (default: ./session-labeler.toml)
        path: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Command::InitConfig { path } = &cli.command {
        let path = path.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        config::init_config(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Label { url, headless, output, max_examples, chrome, ws_endpoint, user_data_dir } => {
            let mut launch = LaunchOptions::from(&config.browser).headless(headless || config.browser.headless);
            if let Some(path) = chrome {
                launch = launch.chrome_path(path);
            }
            if let Some(dir) = user_data_dir {
                launch = launch.user_data_dir(dir);
            }

            let mut options = DriverOptions::from(&config.browser).max_examples(max_examples);
            if let Some(dir) = output {
                options = options.output_dir(dir);
            }

            let report = label(config, url, launch, ws_endpoint, options).await?;
            println!("Saved {} example(s) to {}", report.examples, report.export_path.display());
        }
        Command::ServeUpload { bind, dir, token } => {
            let mut upload = config.upload;
            if let Some(bind) = bind {
                upload.bind = bind;
            }
            if let Some(dir) = dir {
                upload.upload_dir = dir;
            }
            if token.is_some() {
                upload.token = token;
            }

            server::serve_with_shutdown(&upload, shutdown_signal()).await?;
        }
        Command::Upload { endpoint, token, files } => {
            let token = token
                .or(config.upload.token)
                .context("No upload token: pass --token, set UPLOAD_TOKEN or upload.token in the config")?;

            let report = UploadClient::new(endpoint, token).upload(&files).await?;
            println!("{}", report);
        }
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

/// Run the blocking labeling loop off the runtime; Ctrl+C ends it and still writes the export
async fn label(
    config: LabelerConfig,
    url: String,
    launch: LaunchOptions,
    ws_endpoint: Option<String>,
    options: DriverOptions,
) -> Result<DriverReport> {
    let stop = Arc::new(AtomicBool::new(false));
    let driver_stop = Arc::clone(&stop);

    let mut task = tokio::task::spawn_blocking(move || {
        let session = match ws_endpoint {
            Some(ws_url) => BrowserSession::connect(ConnectionOptions::new(ws_url))?,
            None => BrowserSession::launch(launch)?,
        };
        LabelingDriver::new(session, config.labeling, options).with_stop_flag(driver_stop).run(&url)
    });

    let report = tokio::select! {
        result = &mut task => result??,
        _ = shutdown_signal() => {
            log::info!("Interrupted, finishing the labeling session");
            stop.store(true, Ordering::Relaxed);
            task.await??
        }
    };
    Ok(report)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
