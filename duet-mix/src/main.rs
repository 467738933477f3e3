//! duet-mix - two-host dialogue audio assembler
//!
//! Subcommands:
//! - `render`: script → synthesized segments → one composed audio file
//! - `combine`: compose clip files left by an earlier render
//! - `parse`: print the parsed segments as JSON (no network)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use duet_mix::config::ProviderKind;
use duet_mix::pipeline::{self, RenderOptions, RunSummary};
use duet_mix::script::parse_script;
use duet_mix::{synth, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("DUET_GIT_HASH"),
    ", built ",
    env!("DUET_BUILD_TIMESTAMP"),
    ")"
);

/// Command-line arguments for duet-mix
#[derive(Parser, Debug)]
#[command(name = "duet-mix")]
#[command(about = "Assemble a two-host dialogue script into one audio track")]
#[command(version = VERSION)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize every segment of a script and compose the result
    Render {
        /// Dialogue script with host markers
        #[arg(short, long)]
        script: PathBuf,

        /// Output audio file (.mp3 or .wav)
        #[arg(short, long)]
        output: PathBuf,

        /// Directory for segment clips (default: <output-stem>_segments)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Keep segment clips and manifest after a successful run
        #[arg(long)]
        keep_segments: bool,

        /// Override the configured speech provider
        #[arg(long, value_enum)]
        provider: Option<ProviderKind>,
    },

    /// Compose existing segment clips without synthesizing
    Combine {
        /// Directory holding segment_* clips (and optionally segments.json)
        #[arg(short, long)]
        segments: PathBuf,

        /// Output audio file (.mp3 or .wav)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the parsed segments of a script as JSON
    Parse {
        #[arg(short, long)]
        script: PathBuf,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("duet_mix={},duet_common={}", level, level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn log_summary(summary: &RunSummary) {
    info!(
        segments = summary.segments,
        output = %summary.output.display(),
        tier = summary.report.winner().unwrap_or("none"),
        degraded = summary.report.degraded(),
        "Done"
    );
    if let Some(record) = &summary.script_record {
        info!("Script record: {}", record.display());
    }
}

async fn run(args: Args) -> Result<()> {
    if let Command::Parse { script } = &args.command {
        let text = std::fs::read_to_string(script)
            .with_context(|| format!("Failed to read script {}", script.display()))?;
        let segments = parse_script(&text);
        println!("{}", serde_json::to_string_pretty(&segments)?);
        return Ok(());
    }

    let (mut config, source) =
        Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging.level);
    match source.path() {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }
    info!("duet-mix {}", VERSION);

    match args.command {
        Command::Render {
            script,
            output,
            work_dir,
            keep_segments,
            provider,
        } => {
            if let Some(provider) = provider {
                config.synthesis.provider = provider;
            }
            let synthesizer = synth::build_synthesizer(&config.synthesis)
                .context("Failed to set up speech provider")?;

            let options = RenderOptions {
                script,
                output,
                work_dir,
                keep_segments,
            };
            let summary = pipeline::render(&config, synthesizer.as_ref(), &options)
                .await
                .context("Render failed")?;
            log_summary(&summary);
        }
        Command::Combine { segments, output } => {
            let summary = pipeline::combine_only(&config, &segments, &output)
                .context("Combine failed")?;
            log_summary(&summary);
        }
        Command::Parse { .. } => {}
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let stage = e
                .downcast_ref::<duet_mix::Error>()
                .map(|inner| inner.stage().to_string())
                .unwrap_or_else(|| "io".to_string());
            eprintln!("duet-mix: {} stage failed: {:#}", stage, e);
            ExitCode::FAILURE
        }
    }
}
