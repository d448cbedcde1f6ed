//! Command line parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing::warn;

/// Remove silent stretches from videos.
///
/// Each input is analysed with FFmpeg's volumedetect and silencedetect
/// filters; the non-silent parts are re-encoded and joined into one file.
#[derive(Parser, Debug, Clone)]
#[command(name = "hushcut", version, about, long_about = None)]
#[command(allow_external_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,

    /// Shortest non-silent stretch worth keeping, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub min_keep: Option<f64>,

    /// Shortest silence to detect, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub min_silence: Option<f64>,

    /// Silence kept around each cut (half on each side), in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub padding: Option<f64>,

    /// Silence threshold below the file's mean volume, in dB
    #[arg(long, global = true, value_name = "DB", allow_hyphen_values = true)]
    pub threshold_offset: Option<f64>,

    /// Verbose output (repeat for more verbosity: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode - only errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Process a single file
    File {
        /// Input video
        input: PathBuf,
        /// Output path (default: <name>.silenceremoved.<ext> beside the input)
        output: Option<PathBuf>,
    },
    /// Process every video in a directory, recursively
    Dir {
        /// Input directory
        input: PathBuf,
        /// Output directory (default: <dir>.silenceremoved beside the input)
        output: Option<PathBuf>,
    },
    #[command(external_subcommand)]
    Other(Vec<OsString>),
}

/// What to run, after resolving the mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    File { input: PathBuf, output: Option<PathBuf> },
    Dir { input: PathBuf, output: Option<PathBuf> },
}

impl Cli {
    /// Resolve the mode.
    ///
    /// An unknown mode falls back to `file` with the whole argument list, so
    /// `hushcut talk.mp4 out.mp4` treats `talk.mp4` as the input.
    pub fn invocation(&self) -> Invocation {
        match &self.mode {
            Mode::File { input, output } => Invocation::File {
                input: input.clone(),
                output: output.clone(),
            },
            Mode::Dir { input, output } => Invocation::Dir {
                input: input.clone(),
                output: output.clone(),
            },
            Mode::Other(args) => {
                let mode = args.first().map(|a| a.to_string_lossy().to_string()).unwrap_or_default();
                warn!(mode = %mode, "Unknown mode, treating arguments as `file <input> [output]`");

                if args.len() > 2 {
                    warn!(ignored = args.len() - 2, "Ignoring extra arguments");
                }

                Invocation::File {
                    input: args.first().map(PathBuf::from).unwrap_or_default(),
                    output: args.get(1).map(PathBuf::from),
                }
            }
        }
    }

    /// Get the tracing log level filter based on verbosity settings
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::ERROR
        } else {
            match self.verbose {
                0 => LevelFilter::INFO,
                1 => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            }
        }
    }
}
