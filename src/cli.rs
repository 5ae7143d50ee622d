//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Schema-driven client for a spaced-repetition vocabulary backend
#[derive(Parser, Debug)]
#[command(name = "vocab-client")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "VOCAB_CLIENT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, env = "VOCAB_CLIENT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Read the API description from a local JSON/YAML file instead of the backend
    #[arg(long, global = true)]
    pub spec_file: Option<PathBuf>,

    /// Ignore the cached description document
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "warn",
        env = "VOCAB_CLIENT_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "VOCAB_CLIENT_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which backend operation serves each capability
    Capabilities,

    /// List every operation, grouped by tag
    Operations {
        /// Only show this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Print a pre-filled request for an operation
    Example {
        /// Operation id
        #[arg(required = true)]
        operation: String,
    },

    /// Invoke any operation
    Call {
        /// Operation id
        #[arg(required = true)]
        operation: String,

        /// Path parameter (name=value), repeatable
        #[arg(short = 'p', long = "path", value_name = "NAME=VALUE")]
        path_params: Vec<String>,

        /// Query parameter (name=value), repeatable
        #[arg(short = 'q', long = "query", value_name = "NAME=VALUE")]
        query: Vec<String>,

        /// JSON request body
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// File containing the JSON request body
        #[arg(long)]
        body_file: Option<PathBuf>,
    },

    /// Check backend liveness
    Health,

    /// Show today's review session
    Today {
        /// Maximum number of cards
        #[arg(short, long, default_value_t = 30)]
        limit: u32,
    },

    /// List vocabulary
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Page number
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show one vocabulary item
    Get {
        /// Vocabulary id
        #[arg(required = true)]
        id: String,
    },

    /// Delete one vocabulary item
    Delete {
        /// Vocabulary id
        #[arg(required = true)]
        id: String,
    },

    /// Download a full backup
    Export {
        /// Output file (defaults to vocab-sync-<timestamp>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Restore a backup
    Import {
        /// Backup file (JSON)
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Save many vocabulary rows from a JSON array
    Bulk {
        /// File containing a JSON array of vocab objects
        #[arg(required = true)]
        file: PathBuf,

        /// Overwrite existing records (upsert only)
        #[arg(long)]
        overwrite: bool,

        /// Let the backend fill gaps with AI (upsert only)
        #[arg(long)]
        use_ai: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_call() {
        let cli = Cli::parse_from([
            "vocab-client",
            "--base-url",
            "http://api.test",
            "call",
            "get_vocab",
            "-p",
            "vocab_id=7",
            "-q",
            "expand=true",
        ]);
        assert_eq!(cli.base_url.as_deref(), Some("http://api.test"));
        match cli.command {
            Command::Call {
                operation,
                path_params,
                query,
                body,
                ..
            } => {
                assert_eq!(operation, "get_vocab");
                assert_eq!(path_params, vec!["vocab_id=7"]);
                assert_eq!(query, vec!["expand=true"]);
                assert!(body.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_today_default_limit() {
        let cli = Cli::parse_from(["vocab-client", "today"]);
        assert!(matches!(cli.command, Command::Today { limit: 30 }));
    }
}
