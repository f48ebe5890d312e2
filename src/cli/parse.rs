//! CLI parse: clap types for treehash. No behavior; definitions only.

use crate::hash::HashKind;
use crate::types::RevisionNumber;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// treehash CLI - Versioned node trees with incrementally maintained digests
#[derive(Parser)]
#[command(name = "treehash")]
#[command(about = "Versioned node trees with incrementally maintained structural digests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a persistent resource
    Init {
        /// Resource directory
        dir: PathBuf,
        /// Digest strategy (none, rolling, postorder); defaults to the configured one
        #[arg(long)]
        hash_kind: Option<HashKind>,
    },
    /// Show resource configuration and revisions
    Info {
        /// Resource directory
        dir: PathBuf,
    },
    /// Dump the node tree of a revision
    Inspect {
        /// Resource directory
        dir: PathBuf,
        /// Revision number (default: latest)
        #[arg(long)]
        revision: Option<RevisionNumber>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: InspectFormat,
    },
    /// Recompute every digest of a revision and compare with the stored ones
    Verify {
        /// Resource directory
        dir: PathBuf,
        /// Revision number (default: latest)
        #[arg(long)]
        revision: Option<RevisionNumber>,
    },
    /// Commit a small sample document
    Demo {
        /// Resource directory (created if missing)
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InspectFormat {
    Text,
    Json,
}
