//! # Session Module
//!
//! The facade the controller and CLI drive: one storage backend plus the four
//! stateless components configured once.
//!
//! ## Storage Backends
//!
//! Session supports two storage backends:
//! - `InMemory`: Uses `MemoryStore` (fast, volatile unless exported)
//! - `Persistent`: Uses `RedbStore` for disk-backed ACID storage
//!
//! Nothing about a concept is cached here between calls; every operation goes
//! back to the backend.

use crate::identifier::{IdentifierResolver, NameMatching};
use crate::lifecycle::{ConceptPatch, LifecycleManager, NewConcept, RetirePolicy};
use crate::paging::{Page, PagingLimits, Window};
use crate::representation::{ConceptView, Representation, project};
use crate::search::{SearchEngine, SearchFilter, SearchOptions};
use crate::storage::RedbStore;
use crate::store::{ConceptStore, MemoryStore};
use crate::vocabulary::Vocabulary;
use crate::{Concept, ConceptId, LexisError, RequestContext};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl ConceptStore for StorageBackend {
    fn find_by_uuid(&self, id: ConceptId) -> Result<Option<Concept>, LexisError> {
        match self {
            Self::InMemory(s) => s.find_by_uuid(id),
            Self::Persistent(s) => s.find_by_uuid(id),
        }
    }

    fn find_by_exact_name(
        &self,
        name: &str,
        include_retired: bool,
    ) -> Result<Vec<Concept>, LexisError> {
        match self {
            Self::InMemory(s) => s.find_by_exact_name(name, include_retired),
            Self::Persistent(s) => s.find_by_exact_name(name, include_retired),
        }
    }

    fn list_all(&self, include_retired: bool) -> Result<Vec<Concept>, LexisError> {
        match self {
            Self::InMemory(s) => s.list_all(include_retired),
            Self::Persistent(s) => s.list_all(include_retired),
        }
    }

    fn count_all(&self, include_retired: bool) -> Result<usize, LexisError> {
        match self {
            Self::InMemory(s) => s.count_all(include_retired),
            Self::Persistent(s) => s.count_all(include_retired),
        }
    }

    fn save(&mut self, concept: Concept) -> Result<(), LexisError> {
        match self {
            Self::InMemory(s) => s.save(concept),
            Self::Persistent(s) => s.save(concept),
        }
    }

    fn delete(&mut self, id: ConceptId) -> Result<bool, LexisError> {
        match self {
            Self::InMemory(s) => s.delete(id),
            Self::Persistent(s) => s.delete(id),
        }
    }

    fn vocabulary(&self) -> &Vocabulary {
        match self {
            Self::InMemory(s) => s.vocabulary(),
            Self::Persistent(s) => s.vocabulary(),
        }
    }
}

// =============================================================================
// ENGINE SETTINGS
// =============================================================================

/// Behavioural switches, usually read from the application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineSettings {
    pub name_matching: NameMatching,
    pub retire_policy: RetirePolicy,
    pub paging: PagingLimits,
}

/// Concept counts for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConceptCounts {
    pub total: usize,
    pub active: usize,
    pub retired: usize,
}

// =============================================================================
// SESSION
// =============================================================================

/// A configured engine over one storage backend.
///
/// Note: Session does NOT implement Clone; a redb handle cannot be shared
/// that way. Wrap it in a lock to share it.
#[derive(Debug, Default)]
pub struct Session {
    backend: StorageBackend,
    resolver: IdentifierResolver,
    lifecycle: LifecycleManager,
    search: SearchEngine,
    paging: PagingLimits,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session over an existing in-memory store.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            backend: StorageBackend::InMemory(store),
            ..Self::default()
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    /// All changes are persisted to disk as they are made.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, LexisError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
            ..Self::default()
        })
    }

    /// Builder: apply engine settings.
    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.resolver = IdentifierResolver::new(settings.name_matching);
        self.lifecycle = LifecycleManager::new(settings.retire_policy);
        self.paging = settings.paging;
        self
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn paging(&self) -> PagingLimits {
        self.paging
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Resolve a UUID or name token to a concept.
    pub fn resolve(&self, token: &str) -> Result<Concept, LexisError> {
        self.resolver.resolve(&self.backend, token)
    }

    /// Resolve a concept by identity only.
    pub fn get(&self, id: ConceptId) -> Result<Concept, LexisError> {
        self.resolver.by_uuid(&self.backend, id)
    }

    /// Project a concept at `level` in the request locale.
    pub fn project(
        &self,
        ctx: &RequestContext,
        concept: &Concept,
        level: Representation,
    ) -> Result<ConceptView, LexisError> {
        project(&self.backend, concept, level, &ctx.locale)
    }

    /// Single-item GET: resolve `token`, then project at the `v` parameter.
    ///
    /// The representation token is checked before any lookup.
    pub fn retrieve(
        &self,
        ctx: &RequestContext,
        token: &str,
        representation: Option<&str>,
    ) -> Result<ConceptView, LexisError> {
        let level = Representation::for_retrieve(representation)?;
        let concept = self.resolve(token)?;
        self.project(ctx, &concept, level)
    }

    /// List concepts in identity order.
    pub fn list(&self, include_retired: bool, window: Window) -> Result<Page<Concept>, LexisError> {
        Ok(window.apply(self.backend.list_all(include_retired)?))
    }

    /// Free-text search with an optional structural filter.
    pub fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        filter: SearchFilter,
        options: SearchOptions,
        window: Window,
    ) -> Result<Page<Concept>, LexisError> {
        let hits = self
            .search
            .search(&self.backend, ctx, query, filter, options)?;
        Ok(window.apply(hits))
    }

    /// Total, active and retired counts.
    pub fn counts(&self) -> Result<ConceptCounts, LexisError> {
        let total = self.backend.count_all(true)?;
        let active = self.backend.count_all(false)?;
        Ok(ConceptCounts {
            total,
            active,
            retired: total.saturating_sub(active),
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn create(
        &mut self,
        ctx: &RequestContext,
        spec: NewConcept,
    ) -> Result<Concept, LexisError> {
        self.lifecycle.create(&mut self.backend, ctx, spec)
    }

    pub fn update(
        &mut self,
        ctx: &RequestContext,
        id: ConceptId,
        patch: ConceptPatch,
    ) -> Result<Concept, LexisError> {
        self.lifecycle.update(&mut self.backend, ctx, id, patch)
    }

    pub fn retire(
        &mut self,
        ctx: &RequestContext,
        id: ConceptId,
        reason: &str,
    ) -> Result<Concept, LexisError> {
        self.lifecycle.retire(&mut self.backend, ctx, id, reason)
    }

    pub fn purge(&mut self, id: ConceptId) -> Result<(), LexisError> {
        self.lifecycle.purge(&mut self.backend, id)
    }

    pub fn add_set_members(
        &mut self,
        ctx: &RequestContext,
        id: ConceptId,
        members: &[String],
    ) -> Result<Concept, LexisError> {
        self.lifecycle
            .add_set_members(&mut self.backend, ctx, id, members)
    }

    pub fn set_answers(
        &mut self,
        ctx: &RequestContext,
        id: ConceptId,
        answers: &[String],
    ) -> Result<Concept, LexisError> {
        self.lifecycle.set_answers(&mut self.backend, ctx, id, answers)
    }

    /// Create every spec in order, stopping at the first failure.
    ///
    /// Earlier specs stay created when a later one fails.
    pub fn import(
        &mut self,
        ctx: &RequestContext,
        specs: Vec<NewConcept>,
    ) -> Result<Vec<ConceptId>, LexisError> {
        let mut created = Vec::with_capacity(specs.len());
        for spec in specs {
            created.push(self.create(ctx, spec)?.id);
        }
        tracing::info!(count = created.len(), "concepts imported");
        Ok(created)
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// Every concept, retired included, in identity order.
    pub fn export_concepts(&self) -> Result<Vec<Concept>, LexisError> {
        self.backend.list_all(true)
    }

    /// Replace the whole store content with `concepts`.
    ///
    /// Every concept is validated before anything is removed. Identities must
    /// be unique and every set member or answer must be part of the snapshot.
    pub fn restore_concepts(&mut self, concepts: Vec<Concept>) -> Result<(), LexisError> {
        let mut ids = BTreeSet::new();
        for concept in &concepts {
            concept.validate()?;
            if !ids.insert(concept.id) {
                return Err(LexisError::Validation(format!(
                    "snapshot contains concept {} more than once",
                    concept.id
                )));
            }
        }
        for concept in &concepts {
            let dangling = concept
                .set_members
                .iter()
                .chain(&concept.answers)
                .find(|reference| !ids.contains(*reference));
            if let Some(reference) = dangling {
                return Err(LexisError::Validation(format!(
                    "concept {} references {} which is not in the snapshot",
                    concept.id, reference
                )));
            }
        }
        for existing in self.backend.list_all(true)? {
            self.backend.delete(existing.id)?;
        }
        let count = concepts.len();
        for concept in concepts {
            self.backend.save(concept)?;
        }
        tracing::info!(count, "concepts restored");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NameSpec;
    use tempfile::tempdir;

    fn spec(name: &str) -> NewConcept {
        NewConcept {
            names: vec![NameSpec::fully_specified(name)],
            datatype: "N/A".to_string(),
            concept_class: "Misc".to_string(),
            ..NewConcept::default()
        }
    }

    #[test]
    fn new_session_is_in_memory() {
        let session = Session::new();
        assert!(!session.is_persistent());
        assert_eq!(
            session.counts().expect("counts"),
            ConceptCounts {
                total: 0,
                active: 0,
                retired: 0
            }
        );
    }

    #[test]
    fn retrieve_checks_representation_first() {
        let session = Session::new();
        let err = session
            .retrieve(&RequestContext::default(), "does not exist", Some("default"))
            .expect_err("explicit default");
        assert!(matches!(err, LexisError::InvalidArgument(_)));
    }

    #[test]
    fn redb_session_persists_lifecycle() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("lexis.redb");
        let ctx = RequestContext::default();

        let id = {
            let mut session = Session::with_redb(&path).expect("open");
            assert!(session.is_persistent());
            let concept = session.create(&ctx, spec("MALARIA")).expect("create");
            session.retire(&ctx, concept.id, "duplicate").expect("retire");
            concept.id
        };

        let session = Session::with_redb(&path).expect("reopen");
        let concept = session.get(id).expect("get");
        assert!(concept.retired);
        assert_eq!(session.counts().expect("counts").retired, 1);
    }

    #[test]
    fn restore_replaces_content() {
        let ctx = RequestContext::default();
        let mut source = Session::new();
        source.create(&ctx, spec("KEPT")).expect("create");
        let snapshot = source.export_concepts().expect("export");

        let mut target = Session::new();
        target.create(&ctx, spec("DROPPED")).expect("create");
        target.restore_concepts(snapshot.clone()).expect("restore");

        assert_eq!(target.export_concepts().expect("export"), snapshot);
    }

    #[test]
    fn restore_rejects_duplicate_identities_without_removing() {
        let ctx = RequestContext::default();
        let mut session = Session::new();
        let existing = session.create(&ctx, spec("EXISTING")).expect("create");
        let twin = session.create(&ctx, spec("TWIN")).expect("create");
        let snapshot = vec![twin.clone(), twin];

        let err = session.restore_concepts(snapshot).expect_err("duplicate id");
        assert_eq!(err.kind(), "validation");
        assert_eq!(session.counts().expect("counts").total, 2);
        assert!(session.export_concepts().expect("export").contains(&existing));
    }

    #[test]
    fn restore_rejects_references_outside_snapshot() {
        let ctx = RequestContext::default();
        let mut source = Session::new();
        let member = source.create(&ctx, spec("MEMBER")).expect("create");
        let mut set = spec("SET");
        set.set_members = vec![member.id.to_string()];
        let set = source.create(&ctx, set).expect("create");

        let mut target = Session::new();
        target.create(&ctx, spec("KEPT")).expect("create");
        let err = target
            .restore_concepts(vec![set.clone()])
            .expect_err("dangling member");
        assert_eq!(err.kind(), "validation");
        assert_eq!(target.counts().expect("counts").total, 1);

        let mut looped = set;
        looped.set_members = vec![looped.id];
        target.restore_concepts(vec![looped]).expect("self reference");
        assert_eq!(target.counts().expect("counts").total, 1);
    }

    #[test]
    fn idempotent_settings_apply() {
        let ctx = RequestContext::default();
        let mut session = Session::new().with_settings(EngineSettings {
            retire_policy: RetirePolicy::Idempotent,
            ..EngineSettings::default()
        });
        let concept = session.create(&ctx, spec("TWICE")).expect("create");
        session.retire(&ctx, concept.id, "first").expect("retire");
        assert!(session.retire(&ctx, concept.id, "second").is_ok());
    }
}
