use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stretch an audio file so it spans the same time as a subtitle file
    Reconcile {
        /// Input audio file (e.g. TTS output)
        #[arg(short, long)]
        audio: PathBuf,

        /// Subtitle file whose first and last cue define the target duration
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output audio file; a timestamp is added if it already exists
        #[arg(short, long)]
        output: PathBuf,

        /// Print the stretch plan without writing any audio
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the duration of a media file in seconds
    Probe {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the timing span of a subtitle file
    Inspect {
        /// Subtitle file
        #[arg(short, long)]
        subtitles: PathBuf,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "retime.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reconcile() {
        let args = Args::try_parse_from([
            "retime", "-v", "reconcile",
            "--audio", "tts/final.wav",
            "--subtitles", "merged.srt",
            "--output", "tts/adjusted.wav",
            "--dry-run",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Reconcile { audio, subtitles, output, dry_run, json } => {
                assert_eq!(audio, PathBuf::from("tts/final.wav"));
                assert_eq!(subtitles, PathBuf::from("merged.srt"));
                assert_eq!(output, PathBuf::from("tts/adjusted.wav"));
                assert!(dry_run);
                assert!(!json);
            }
            _ => panic!("expected reconcile"),
        }
    }

    #[test]
    fn test_init_config_default_path() {
        let args = Args::try_parse_from(["retime", "init-config"]).unwrap();
        match args.command {
            Commands::InitConfig { output } => assert_eq!(output, PathBuf::from("retime.toml")),
            _ => panic!("expected init-config"),
        }
    }

    #[test]
    fn test_reconcile_requires_paths() {
        assert!(Args::try_parse_from(["retime", "reconcile", "--audio", "a.wav"]).is_err());
    }
}
