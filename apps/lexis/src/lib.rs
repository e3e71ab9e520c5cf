//! # lexis
//!
//! The application crate: the concept resource controller (axum), the CLI
//! (clap) and the configuration layer. Exposed as a library so integration
//! tests can build the router directly.

pub mod api;
pub mod cli;
pub mod config;
