#![forbid(unsafe_code)]

//! `adapter-probe`: command-line test client for the agent adapter.
//!
//! Loads the probe configuration, connects to the adapter over gRPC, and
//! either runs a single-shot task (`run`) or a multi-turn session
//! (`session`), printing the event stream as it arrives.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use adapter_probe::config::ProbeConfig;
use adapter_probe::session::{run_once, SessionCoordinator};
use adapter_probe::stream::render::ConsoleSink;
use adapter_probe::transport::grpc::GrpcTransport;
use adapter_probe::{AppError, Result};

const RULE: &str = "==================================================";

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "adapter-probe", about = "Test client for the agent adapter", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Override the adapter endpoint from the configuration.
    #[arg(long)]
    endpoint: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one task through `AdapterService/Run`.
    Run {
        /// Task prompt.
        prompt: String,
    },

    /// Run consecutive turns of one session through `AgentService/RunTask`.
    Session {
        /// One prompt per turn, in order.
        #[arg(required = true, num_args = 1..)]
        prompts: Vec<String>,

        /// Reuse an existing session id instead of generating one.
        #[arg(long)]
        session_id: Option<String>,

        /// Seed the first turn with a rollout saved by an earlier run.
        #[arg(long)]
        rollout_in: Option<PathBuf>,

        /// Write the final carried rollout to this file.
        #[arg(long)]
        rollout_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = ProbeConfig::load_from_path(&args.config)?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    let env_vars = config.resolve_env_vars().await?;
    let template = config.request_template(env_vars)?;
    info!(endpoint = config.endpoint.as_str(), "configuration loaded");

    // ── Connect ─────────────────────────────────────────
    let transport = GrpcTransport::connect(&config.endpoint).await?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, abandoning current turn");
            signal_cancel.cancel();
        }
    });

    let mut sink = ConsoleSink::stdout();

    match args.command {
        Command::Run { prompt } => {
            println!("📝 Task: {prompt}\n{RULE}");
            let outcome = run_once(
                &transport,
                &template,
                config.demux_options(),
                &prompt,
                &mut sink,
                &cancel,
            )
            .await;
            report(outcome.map(|_| ()))
        }
        Command::Session {
            prompts,
            session_id,
            rollout_in,
            rollout_out,
        } => {
            let seed = match rollout_in {
                Some(path) => Some(read_rollout(&path)?),
                None => None,
            };

            let mut coordinator = match session_id {
                Some(id) => SessionCoordinator::with_session_id(transport, template, id),
                None => SessionCoordinator::new(transport, template),
            }
            .with_rollout(seed)
            .with_demux_options(config.demux_options())
            .with_error_frame_policy(config.policy.on_error_frame);

            println!("🔑 Session: {}", coordinator.session_id());

            let mut result = Ok(());
            for (index, prompt) in prompts.iter().enumerate() {
                println!("\n📝 Turn {}: {prompt}\n{RULE}", index + 1);
                if let Err(err) = coordinator.run_turn(prompt, &mut sink, &cancel).await {
                    result = Err(err);
                    break;
                }
            }

            if let (Some(path), Some(rollout)) = (rollout_out, coordinator.carried_rollout()) {
                write_rollout(&path, rollout)?;
                info!(path = %path.display(), len = rollout.len(), "rollout saved");
            }

            report(result)
        }
    }
}

fn report(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => {
            println!("\n{RULE}\n✅ Done");
            Ok(())
        }
        Err(err) => {
            println!("\n{RULE}\n❌ Failed: {err}");
            Err(err)
        }
    }
}

fn read_rollout(path: &Path) -> Result<Bytes> {
    std::fs::read(path)
        .map(Bytes::from)
        .map_err(|err| AppError::Io(format!("cannot read rollout {}: {err}", path.display())))
}

fn write_rollout(path: &Path, rollout: &Bytes) -> Result<()> {
    std::fs::write(path, rollout)
        .map_err(|err| AppError::Io(format!("cannot write rollout {}: {err}", path.display())))
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
