//! # Formats
//!
//! Byte-level encodings owned by the core. File I/O stays in the app.

pub mod persistence;

pub use persistence::{MAX_SNAPSHOT_SIZE, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
