//! advisor: command-line front end for the legal advisor backend.
//! `ask` sends a query to `/chat`, `analyze` uploads a document to
//! `/analyze`; the rendered HTML answer goes to stdout.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use advisor_client::config::{self, Config};
use advisor_client::{FileAnalysisRequest, QueryClient, ValidationError, View};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Exit code for input rejected before sending.
const EXIT_VALIDATION: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "advisor", version, about = "Ask the legal advisor or have it analyze a document")]
struct Cli {
    /// Config file (default: ~/.advisor/config.yaml).
    #[arg(long, global = true, env = "ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides `server.base_url`.
    #[arg(long, global = true, env = "ADVISOR_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a query to the chat endpoint. Reads stdin when QUERY is omitted.
    Ask { query: Option<String> },
    /// Upload a document to the analyze endpoint.
    Analyze { file: Option<PathBuf> },
    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the config file path.
    Path,
    /// Print the effective config as YAML.
    Show,
    /// Write a config file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("error"))?;
    let fmt_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))
}

/// `--config` / `ADVISOR_CONFIG` first, then the default location.
fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.config {
        return Ok(path.clone());
    }
    config::default_config_path()
        .context("unable to determine config path (set --config or ADVISOR_CONFIG)")
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match config::default_config_path() {
            Some(path) => config::load_or_default(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => Config::default(),
        },
    };
    if let Some(server) = &cli.server {
        cfg.server.base_url = Some(server.clone());
    }
    Ok(cfg)
}

/// First line of stdin, trimmed.
fn read_query_from_stdin() -> anyhow::Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read query from stdin")?;
    Ok(line.trim().to_string())
}

fn report(result: Result<View, ValidationError>) -> ExitCode {
    match result {
        Err(alert) => {
            eprintln!("{}", alert);
            ExitCode::from(EXIT_VALIDATION)
        }
        Ok(view @ View::Rendered { .. }) => {
            println!("{}", view.text());
            ExitCode::SUCCESS
        }
        Ok(view) => {
            eprintln!("{}", view.text());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Command::Config { action } => {
            let path = resolve_config_path(&cli)?;
            match action {
                ConfigAction::Path => println!("{}", path.display()),
                ConfigAction::Show => {
                    let mut cfg = load_config(&cli)?;
                    let endpoints = cfg.endpoints();
                    cfg.server.base_url = Some(endpoints.base_url);
                    cfg.server.chat_path = Some(endpoints.chat_path);
                    cfg.server.analyze_path = Some(endpoints.analyze_path);
                    cfg.server.upload_field = Some(endpoints.upload_field);
                    print!("{}", serde_yaml::to_string(&cfg)?);
                }
                ConfigAction::Init { force } => {
                    if path.exists() && !force {
                        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
                    }
                    config::save(&path, &Config::with_defaults())?;
                    println!("wrote {}", path.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ask { query } => {
            let client = QueryClient::new(load_config(&cli)?.endpoints());
            let query = match query {
                Some(q) => q.clone(),
                None => read_query_from_stdin()?,
            };
            Ok(report(client.submit_query(&query).await))
        }
        Command::Analyze { file } => {
            let client = QueryClient::new(load_config(&cli)?.endpoints());
            let file = match file {
                Some(path) => Some(
                    FileAnalysisRequest::load(path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => None,
            };
            Ok(report(client.submit_file(file).await))
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {e}");
    }
    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
