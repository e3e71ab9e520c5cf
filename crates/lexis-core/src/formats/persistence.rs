//! # Snapshot Format
//!
//! Binary encoding of a whole concept store, used by `lexis export` and
//! `lexis restore`.
//!
//! Format: Header (5 bytes) + postcard-serialized concept list.
//! - 4 bytes: Magic ("LXS1")
//! - 1 byte: Version
//!
//! Size and header are checked before the payload is decoded, so a corrupt
//! or oversized file fails without allocating for it.

use crate::{Concept, LexisError, primitives};
use serde::{Deserialize, Serialize};

/// Maximum accepted snapshot size.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024; // 256 MB

const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header precedes all snapshot data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), LexisError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(LexisError::Serialization(
                "not a lexis snapshot (bad magic bytes)".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(LexisError::Serialization(format!(
                "unsupported snapshot version {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LexisError> {
        let Some(header) = bytes.get(..HEADER_LEN) else {
            return Err(LexisError::Serialization("snapshot header too short".to_string()));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotPayload {
    concepts: Vec<Concept>,
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Encode concepts as a snapshot (header + payload). No file I/O.
pub fn snapshot_to_bytes(concepts: &[Concept]) -> Result<Vec<u8>, LexisError> {
    let payload = postcard::to_stdvec(&SnapshotPayload {
        concepts: concepts.to_vec(),
    })
    .map_err(|e| LexisError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&SnapshotHeader::new().to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a snapshot. No file I/O.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Vec<Concept>, LexisError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(LexisError::Serialization(format!(
            "snapshot of {} bytes exceeds maximum {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload: SnapshotPayload = postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| LexisError::Serialization(format!("corrupt snapshot payload: {}", e)))?;
    Ok(payload.concepts)
}

// =============================================================================
// TESTS
// =============================================================================
