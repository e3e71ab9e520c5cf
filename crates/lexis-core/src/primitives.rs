//! # Engine Primitives
//!
//! Hardcoded runtime constants for the Lexis engine.
//!
//! These are compiled into the binary and immutable at runtime. Limits that
//! operators may tune (page sizes, retire policy) live in the app's
//! configuration and are passed in; these are the defaults and hard caps.

/// Locale used when a caller supplies none.
pub const DEFAULT_LOCALE: &str = "en";

/// Actor recorded in audit info when a caller supplies none.
pub const DEFAULT_ACTOR: &str = "admin";

/// Magic bytes for the Lexis snapshot format header.
///
/// - File Header = Magic Bytes ("LXS1") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"LXS1";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// PAGING
// =============================================================================

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a concept name.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length of a retire reason.
pub const MAX_REASON_LENGTH: usize = 255;

/// Maximum length of a version tag.
pub const MAX_VERSION_LENGTH: usize = 50;

/// Maximum number of set members or answers on a single concept.
pub const MAX_REFERENCES: usize = 1000;

/// Maximum length of a search query.
pub const MAX_QUERY_LENGTH: usize = 255;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_within_cap() {
        assert!(DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"LXS1");
    }
}
