//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Tree of life manager: nested taxonomic groups with inherited attributes
#[derive(Parser, Debug)]
#[command(name = "taxotree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Record file or directory to load (repeatable, default: data_file from config)
    #[arg(short = 'f', long = "file", global = true, value_hint = ValueHint::AnyPath)]
    pub files: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the whole hierarchy as tree
    Tree,

    /// Show the hierarchy below one group
    Subtree {
        /// Rank, e.g. Kingdom
        kind: String,
        /// Group name
        name: String,
    },

    /// Show a group with its inherited attributes
    Info {
        /// Rank, e.g. Kingdom
        kind: String,
        /// Group name
        name: String,
    },

    /// Search groups by super set, name and attributes
    Search {
        /// Only direct children of this group
        #[arg(short, long, value_name = "KIND:NAME")]
        superset: Option<String>,
        /// Text matched against rank and name
        #[arg(short, long)]
        query: Option<String>,
        /// inclusive | exact | "regular expression" (default from config)
        #[arg(short, long = "match", value_name = "TYPE")]
        match_type: Option<String>,
        /// Attribute condition, op is exact|range|lt|lte|gt|gte (range: LOW..HIGH)
        #[arg(short = 'F', long = "filter", value_name = "ATTR:OP:VALUE")]
        filters: Vec<String>,
        /// Print full info of every match
        #[arg(short, long)]
        long: bool,
    },

    /// Delete a group and everything below it, then show the tree
    Delete {
        /// Rank, e.g. Kingdom
        kind: String,
        /// Group name
        name: String,
    },

    /// Set an attribute on a group and all its descendants, then show it
    Edit {
        /// Rank, e.g. Kingdom
        kind: String,
        /// Group name
        name: String,
        /// Attribute name
        attribute: String,
        /// New value (numbers are stored as numbers)
        value: String,
    },

    /// Replace the description of a group, then show it
    Describe {
        /// Rank, e.g. Kingdom
        kind: String,
        /// Group name
        name: String,
        /// New description (omit to clear)
        description: Option<String>,
    },

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

    /// Show config paths
    Path,

    /// Create global config template
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
