// CLI configuration
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::OutputFormat;
use soundtag::ReaderOptions;

/// soundtag - MP3 tag reader for soundboard files
#[derive(Parser, Debug)]
#[command(name = "soundtag")]
#[command(about = "Read ID3 tags and display metadata of numbered soundboard files", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never use USLT lyrics as the comment
    #[arg(long, global = true)]
    pub no_uslt: bool,

    /// Do not probe ID3v1 comments past their standard 30 bytes
    #[arg(long, global = true)]
    pub no_extended_v1: bool,

    /// Enable byte-swap and manual UTF-16 comment recovery
    #[arg(long, global = true)]
    pub utf16_heuristics: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve display metadata for sound numbers
    Lookup {
        /// Sound number(s), 1 to 3 digits
        #[arg(value_name = "NUMBER", required = true)]
        numbers: Vec<String>,

        /// Board directory containing sounds/ (default: current directory)
        #[arg(long, conflicts_with = "base_url")]
        root: Option<PathBuf>,

        /// Board URL serving sounds/ over HTTP
        #[arg(long)]
        base_url: Option<String>,

        /// Fetch timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Known-metadata table (JSON object keyed by file name)
        #[arg(short, long)]
        known: Option<PathBuf>,

        /// Lookup configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read tags from audio file(s)
    Tags {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Only print these fields (title, artist, comment, album, year, genre)
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,

        /// Output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect tag containers
    Detect {
        /// Audio file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// List raw ID3v2 frames
    Frames {
        /// Audio file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Read tags of every matching file in a directory
    Scan {
        /// Directory path
        #[arg(short, long)]
        directory: PathBuf,

        /// File pattern (e.g., "*.mp3", "0*.mp3")
        #[arg(short, long, default_value = "*.mp3")]
        pattern: String,
    },
}

impl Config {
    /// Parser flags selected on the command line, over the defaults
    pub fn reader_options(&self) -> ReaderOptions {
        let mut options = ReaderOptions::default();
        self.apply_reader_flags(&mut options);
        options
    }

    /// Override only the options whose flag was passed
    pub fn apply_reader_flags(&self, options: &mut ReaderOptions) {
        if self.no_uslt {
            options.consult_uslt = false;
        }
        if self.no_extended_v1 {
            options.probe_extended_v1_comment = false;
        }
        if self.utf16_heuristics {
            options.utf16_heuristics = true;
        }
    }

    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}
