//! # Lexis - Concept Dictionary Server
//!
//! The main binary for the Lexis concept engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │             apps/lexis (THE BINARY)            │
//! │                                                │
//! │   ┌─────────────┐         ┌─────────────────┐  │
//! │   │    CLI      │         │ Concept REST API│  │
//! │   │   (clap)    │         │     (axum)      │  │
//! │   └──────┬──────┘         └────────┬────────┘  │
//! │          └────────────┬────────────┘           │
//! │                       ▼                        │
//! │               ┌───────────────┐                │
//! │               │  lexis-core   │                │
//! │               │  (THE LOGIC)  │                │
//! │               └───────────────┘                │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! lexis init --demo
//! lexis server --host 0.0.0.0 --port 8080
//! lexis search food --member-of 0f97e14e-cdc2-49ac-9255-b5126f8a5147
//! ```

use clap::Parser;
use lexis::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // LEXIS_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("LEXIS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "lexis=debug,lexis_core=debug,tower_http=debug"
    } else {
        "lexis=info,lexis_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ██╗     ███████╗██╗  ██╗██╗███████╗
  ██║     ██╔════╝╚██╗██╔╝██║██╔════╝
  ██║     █████╗   ╚███╔╝ ██║███████╗
  ██║     ██╔══╝   ██╔██╗ ██║╚════██║
  ███████╗███████╗██╔╝ ██╗██║███████║
  ╚══════╝╚══════╝╚═╝  ╚═╝╚═╝╚══════╝

  Concept Dictionary Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
