//! Standard Names Command-Line Tool
//!
//! Browse the catalog, apply staged edits from operation files, audit the
//! vocabularies for gaps, and manage vocabulary tokens.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Standard-names catalog tool
#[derive(Parser, Debug)]
#[command(name = "stdnames")]
#[command(version, about = "Standard-names catalog tool")]
pub struct Args {
    /// Catalog root directory (per-entry YAML files grouped by primary tag)
    #[arg(short = 'r', long, default_value = "standard_names")]
    pub root: PathBuf,

    /// Vocabulary directory (components.yml, positions.yml, ...)
    #[arg(long, default_value = "vocabularies")]
    pub vocab_dir: PathBuf,

    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List entry names, optionally filtered by kind
    List {
        /// Filter by kind (scalar, vector, derived-scalar, ...)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Show one entry as YAML
    Show {
        /// Entry name
        name: String,
    },
    /// Substring search over names and descriptions
    Search {
        /// Query string
        query: String,
        /// Filter by kind
        #[arg(long)]
        kind: Option<String>,
        /// Filter by status (draft, active, deprecated, superseded)
        #[arg(long)]
        status: Option<String>,
        /// Filter by tag (primary or secondary)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Apply operations from a JSON file and commit them
    Apply {
        /// Path to a JSON operation document (single operation or array)
        file: PathBuf,
        /// Validate without staging or writing anything
        #[arg(long)]
        dry_run: bool,
        /// Failure policy for multi-operation files
        #[arg(long, default_value = "continue")]
        mode: String,
        /// Skip operations before this index
        #[arg(long)]
        resume_from: Option<usize>,
    },
    /// Mine the corpus for tokens missing from the vocabularies
    Audit {
        /// Restrict to one vocabulary
        #[arg(long)]
        vocabulary: Option<String>,
        /// Minimum occurrence count
        #[arg(long, default_value_t = 3)]
        threshold: usize,
        /// Maximum candidates per vocabulary
        #[arg(long, default_value_t = 20)]
        max_results: usize,
    },
    /// Check a single name for vocabulary gaps
    Check {
        /// The name to check
        name: String,
        /// Minimum occurrence count
        #[arg(long, default_value_t = 3)]
        threshold: usize,
    },
    /// Manage vocabulary tokens
    #[command(subcommand)]
    Vocab(VocabCommand),
}

#[derive(Subcommand, Debug)]
pub enum VocabCommand {
    /// List the tokens of one vocabulary
    List {
        /// Vocabulary name (components, subjects, bases, objects,
        /// positions, processes)
        vocabulary: String,
    },
    /// Add tokens to a vocabulary and regenerate grammar types
    Add {
        /// Vocabulary name
        vocabulary: String,
        /// Tokens to add
        #[arg(required = true)]
        tokens: Vec<String>,
        /// Codegen command to run after a successful write
        #[arg(long)]
        codegen: Option<String>,
    },
    /// Remove tokens from a vocabulary and regenerate grammar types
    Remove {
        /// Vocabulary name
        vocabulary: String,
        /// Tokens to remove
        #[arg(required = true)]
        tokens: Vec<String>,
        /// Codegen command to run after a successful write
        #[arg(long)]
        codegen: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stdnames_cli=info".parse().unwrap())
                .add_directive("stdnames_core=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = commands::run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
