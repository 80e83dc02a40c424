//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Hierarchical weight allocation for RFP requirement trees
#[derive(Parser, Debug)]
#[command(name = "rfpweights")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Data directory holding tree and weights (default: from config, else cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Tree snapshot file (overrides data_dir/tree_file)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub tree: Option<PathBuf>,

    /// Weights file (overrides data_dir/weights_file)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub weights: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the tree with local and effective weights
    Show {
        /// Print node views as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Set a node's share of its parent, in percent, and save
    Set {
        /// Node id
        node: String,
        /// New local percentage (negative values count as 0)
        #[arg(allow_negative_numbers = true)]
        percent: f64,
    },

    /// Give siblings equal shares and save
    Equalize {
        /// Parent category id (default: root level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Sibling ids (default: all children of the parent)
        siblings: Vec<String>,
    },

    /// Replace all weights with per-level defaults and save
    Reset,

    /// Requirement weight statistics
    Stats,

    /// Report sibling groups whose local percentages do not add up to 100
    Check,

    /// Print the weights that would be saved
    Export,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
