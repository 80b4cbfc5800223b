//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Resolve file arguments relative to that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rangelog - history of a block of lines across git and svn
#[derive(Parser, Debug)]
#[command(name = "rangelog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Resolve file arguments as if started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the revisions that changed a range of lines
    #[command(
        name = "track",
        long_about = "List the revisions that changed a range of lines.\n\n\
            The range is given in the file's current on-disk coordinates and is \
            followed backward through history, one diff at a time. Uncommitted \
            changes are taken into account but never reported as a revision.",
        after_help = "\
EXAMPLES:
    # Who touched lines 40-62 in the last 20 revisions?
    rangelog track src/parser.rs 40 62

    # Look further back: three windows of 50 revisions each
    rangelog track src/parser.rs 40 62 --window 50 --pages 3"
    )]
    Track {
        /// File to inspect
        file: PathBuf,

        /// First line of the range (1-based)
        start: i64,

        /// Last line of the range (inclusive)
        end: i64,

        /// Revisions examined per window (default from config, else 20)
        #[arg(short, long)]
        window: Option<usize>,

        /// Number of windows to walk
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },

    /// List revisions that touched a file, newest first
    #[command(name = "log")]
    Log {
        /// File to inspect
        file: PathBuf,

        /// Maximum number of revisions
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },

    /// Print the diff a revision introduced to a file
    #[command(name = "diff")]
    Diff {
        /// File to inspect
        file: PathBuf,

        /// Revision identifier
        revision: String,
    },

    /// Show metadata for a revision
    #[command(name = "show")]
    Show {
        /// File to inspect
        file: PathBuf,

        /// Revision identifier
        revision: String,
    },

    /// Check svn credentials against a repository URL
    #[command(name = "verify")]
    Verify {
        /// Repository URL
        url: String,

        /// User name to check
        #[arg(short, long)]
        username: String,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },
}
