//! # Lexis CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a database, optionally with the demo dictionary
//! - `status` - Show concept counts
//! - `get` - Retrieve one concept by uuid or name
//! - `search` - Search concepts
//! - `import` - Create concepts from a JSON file
//! - `export` - Write a binary snapshot
//! - `restore` - Replace the store content from a snapshot

mod commands;

use crate::config::{AppConfig, BackendKind};
use clap::{Parser, Subcommand};
use lexis_core::LexisError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Lexis - concept dictionary server
///
/// Resolves, projects, searches and maintains coded clinical concepts.
#[derive(Parser, Debug)]
#[command(name = "lexis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./lexis.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the concept database (overrides [storage] path)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "memory" or "redb" (overrides [storage] backend)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides [server] host)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides [server] port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve the demo dictionary from memory
        #[arg(long)]
        demo: bool,
    },

    /// Initialize a new database
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,

        /// Seed the demo dictionary
        #[arg(long)]
        demo: bool,
    },

    /// Show concept counts
    Status,

    /// Retrieve a concept by uuid or name
    Get {
        /// Concept uuid or exact name
        id: String,

        /// Representation: ref or full (default view when omitted)
        #[arg(short = 'r', long = "rep")]
        v: Option<String>,
    },

    /// Search concepts by name
    Search {
        /// Query text (empty matches every concept)
        #[arg(default_value = "")]
        query: String,

        /// Only members of this concept set (uuid)
        #[arg(long)]
        member_of: Option<String>,

        /// Only answers of this question (uuid)
        #[arg(long)]
        answer_to: Option<String>,

        /// Representation: ref, default or full
        #[arg(short = 'r', long = "rep")]
        v: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Include retired concepts
        #[arg(long)]
        include_retired: bool,
    },

    /// Create concepts from a JSON array of concept specs
    Import {
        /// Path to the JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export every concept to a binary snapshot
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace the store content with a binary snapshot
    Restore {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve the configuration layers: file, then global flags.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, LexisError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.database {
        config.storage.path = path.clone();
    }
    if let Some(backend) = cli.backend.as_deref() {
        config.storage.backend = BackendKind::parse(backend)?;
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LexisError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port, demo }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(config, demo).await
        }
        Some(Commands::Init { force, demo }) => cmd_init(&config, force, demo),
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Get { id, v }) => cmd_get(&config, &id, v.as_deref()),
        Some(Commands::Search {
            query,
            member_of,
            answer_to,
            v,
            limit,
            include_retired,
        }) => cmd_search(
            &config,
            json_mode,
            &SearchArgs {
                query,
                member_of,
                answer_to,
                representation: v,
                limit,
                include_retired,
            },
        ),
        Some(Commands::Import { file }) => cmd_import(&config, json_mode, &file),
        Some(Commands::Export { output }) => cmd_export(&config, &output),
        Some(Commands::Restore { input }) => cmd_restore(&config, &input),
    }
}
