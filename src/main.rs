//! restyle CLI - apply a hairstyle from a reference photo to a face photo.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restyle::{asset, Config, Role, StylePipeline, SynthesisClient};

/// Apply a hairstyle from a reference photo using a generative synthesis service.
#[derive(Parser, Debug)]
#[command(name = "restyle")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one style transfer end to end.
    Apply {
        /// Face photo path.
        #[arg(value_name = "FACE")]
        face: PathBuf,

        /// Hairstyle reference photo path.
        #[arg(value_name = "STYLE")]
        style: PathBuf,

        /// Optional style hint (e.g. "natural", "dramatic").
        #[arg(short = 's', long, value_name = "HINT")]
        style_hint: Option<String>,
    },

    /// Probe the synthesis service for reachability and auth validity.
    Status,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("restyle={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[tokio::main]
async fn run(args: Args) -> Result<()> {
    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    match args.command {
        Command::Apply {
            face,
            style,
            style_hint,
        } => apply(config, &face, &style, style_hint.as_deref()).await,
        Command::Status => status(&config).await,
    }
}

async fn apply(
    config: Config,
    face: &Path,
    style: &Path,
    style_hint: Option<&str>,
) -> Result<()> {
    for input in [face, style] {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }

    config.ensure_dirs().context("Failed to create directories")?;

    let client =
        Arc::new(SynthesisClient::new(&config).context("Failed to initialize synthesis client")?);

    // Stage the inputs the way the upload boundary would.
    let face_asset = asset::stage_upload(face, &config.upload_dir)
        .context("Failed to stage face photo")?;
    let style_asset = asset::stage_upload(style, &config.upload_dir)
        .context("Failed to stage style photo")?;

    let pipeline = StylePipeline::new(config, client);
    let outcome = pipeline
        .run(
            vec![(Role::Face, face_asset), (Role::Style, style_asset)],
            style_hint,
        )
        .await
        .context("Style transfer failed")?;

    match &outcome.stored {
        Some(stored) => println!(
            "Result saved to {} (served at {})",
            stored.path.display(),
            stored.public_url
        ),
        None => println!("The service returned no image"),
    }
    if let Some(commentary) = &outcome.commentary {
        println!("Service commentary: {commentary}");
    }
    println!("Synthesis took {}ms", outcome.elapsed.as_millis());

    Ok(())
}

async fn status(config: &Config) -> Result<()> {
    let client = SynthesisClient::new(config).context("Failed to initialize synthesis client")?;

    let status = client
        .check_status()
        .await
        .context("Synthesis service probe failed")?;

    println!("Service healthy (model {}): {}", status.model, status.sample);
    Ok(())
}
