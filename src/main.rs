//! Retime - Subtitle-driven audio duration reconciliation
//!
//! Entry point for the `retime` command line tool, which fits a dubbed audio
//! track to the timing of its subtitle file using ffprobe and ffmpeg.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use retime::cli::{Args, Commands};
use retime::config::Config;
use retime::reconcile::{DurationReconciler, ReconcileOutcome};
use retime::subtitle::SubtitleTrack;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting Retime - Subtitle-driven audio duration reconciliation");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load retime.toml from current directory first
            if std::path::Path::new("retime.toml").exists() {
                info!("Found retime.toml in current directory, loading...");
                Config::from_file("retime.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Execute command
    match args.command {
        Commands::Reconcile { audio, subtitles, output, dry_run, json } => {
            let reconciler = DurationReconciler::new(config)?;

            if dry_run {
                let decision = reconciler.plan(&audio, &subtitles).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&decision)?);
                } else {
                    println!("Current duration: {:.3}s", decision.current_duration);
                    println!("Target duration:  {:.3}s", decision.target_duration);
                    println!("Raw factor:       {:.4}", decision.raw_factor);
                    println!("Clamped factor:   {:.4}", decision.clamped_factor);
                    match &decision.plan {
                        Some(plan) => println!("Filter:           {}", plan.filter_chain()),
                        None => println!("Filter:           none (audio would be copied)"),
                    }
                }
                return Ok(());
            }

            let spinner = spinner("Adjusting audio timing to match subtitles...");
            let outcome = reconciler.reconcile(&audio, &subtitles, &output).await;
            spinner.finish_and_clear();

            match outcome {
                ReconcileOutcome::Success(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else if report.was_stretched() {
                        println!("Timing-adjusted audio: {}", report.output_path.display());
                    } else {
                        println!("Original audio retained: {}", report.output_path.display());
                    }
                }
                ReconcileOutcome::Failure(e) => {
                    eprintln!("Audio adjustment failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Probe { input } => {
            let reconciler = DurationReconciler::new(config)?;
            let duration = reconciler.media().probe_duration(&input).await?;
            println!("{:.6}", duration);
        }
        Commands::Inspect { subtitles } => {
            let track = SubtitleTrack::load(&subtitles).await?;
            println!("Cues:            {}", track.cues.len());
            println!("First cue start: {}", track.first_start());
            println!("Last cue end:    {}", track.last_end());
            println!("Target duration: {:.3}s", track.target_duration());
        }
        Commands::Check => {
            let reconciler = DurationReconciler::new(config)?;
            reconciler.media().check_availability().await?;
            for line in reconciler.media().get_version_info().await? {
                println!("{}", line);
            }
        }
        Commands::InitConfig { output } => {
            if output.exists() {
                anyhow::bail!("{} already exists", output.display());
            }
            config.save_to_file(&output)?;
            println!("Wrote configuration to {}", output.display());
        }
    }

    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".retime").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "retime.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
