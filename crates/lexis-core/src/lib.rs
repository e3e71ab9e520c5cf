//! # lexis-core
//!
//! The resource-resolution and representation engine for Lexis - THE LOGIC.
//!
//! This crate owns the Concept aggregate (a coded terminology entry with
//! localized names, a datatype, a class, set members and answers) and the
//! four components every request goes through:
//!
//! - `identifier`: dispatches a token to a UUID or an exact-name lookup
//! - `representation`: projects a concept at `ref`, `default` or `full`
//! - `lifecycle`: create, update, retire, purge and membership changes
//! - `search`: free-text matching with `memberOf` / `answerTo` filters
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - The `ConceptStore` is the single source of truth; components hold no
//!   entity state between calls
//! - Every listing is ordered deterministically

// =============================================================================
// MODULES
// =============================================================================

pub mod demo;
pub mod formats;
pub mod identifier;
pub mod lifecycle;
pub mod paging;
pub mod primitives;
pub mod representation;
pub mod search;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;
pub mod vocabulary;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AuditInfo, Concept, ConceptId, ConceptName, ConceptNameType, LexisError, Locale,
    RequestContext,
};
pub use vocabulary::{ConceptClass, Datatype, Vocabulary};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use identifier::{Identifier, IdentifierResolver, NameMatching};
pub use lifecycle::{
    ConceptPatch, LifecycleManager, LifecycleState, NameSpec, NewConcept, RetirePolicy,
};
pub use paging::{Page, PagingLimits, Window};
pub use representation::{ConceptView, Field, RefView, Representation, project};
pub use search::{MatchRank, SearchEngine, SearchFilter, SearchOptions};
pub use session::{ConceptCounts, EngineSettings, Session, StorageBackend};
pub use storage::RedbStore;
pub use store::{ConceptStore, MemoryStore};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
