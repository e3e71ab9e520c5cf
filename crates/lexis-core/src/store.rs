//! # Concept Store
//!
//! The collaborator interface the engine reads and writes Concepts through,
//! plus the in-memory implementation.
//!
//! The engine keeps no entity state of its own between calls: every
//! component asks the store again. All listings are ordered by `ConceptId`
//! so repeated calls over the same data return the same sequence.

use crate::vocabulary::Vocabulary;
use crate::{Concept, ConceptId, LexisError};
use std::collections::{BTreeMap, BTreeSet};

/// Case-fold a name for index lookups.
#[must_use]
pub fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// CONCEPTSTORE TRAIT
// =============================================================================

/// Persistence contract for Concept aggregates.
///
/// All fallible operations return `Result<T, LexisError>` to support both
/// in-memory and persistent backends uniformly. Each call is its own
/// transaction; the engine never spans one across calls.
pub trait ConceptStore {
    /// Lookup a concept by identity.
    fn find_by_uuid(&self, id: ConceptId) -> Result<Option<Concept>, LexisError>;

    /// Concepts with a name equal to `name` after case folding.
    ///
    /// This is a superset lookup; callers apply their own case rules to the
    /// returned names.
    fn find_by_exact_name(
        &self,
        name: &str,
        include_retired: bool,
    ) -> Result<Vec<Concept>, LexisError>;

    /// All concepts ordered by identity.
    fn list_all(&self, include_retired: bool) -> Result<Vec<Concept>, LexisError>;

    /// Number of concepts, optionally counting retired ones.
    fn count_all(&self, include_retired: bool) -> Result<usize, LexisError>;

    /// Insert or replace a concept.
    fn save(&mut self, concept: Concept) -> Result<(), LexisError>;

    /// Permanently remove a concept. Returns whether it existed.
    fn delete(&mut self, id: ConceptId) -> Result<bool, LexisError>;

    /// Vocabulary that datatype and class references resolve against.
    fn vocabulary(&self) -> &Vocabulary;

    /// Set members of `id` in list order.
    fn find_set_members(&self, id: ConceptId) -> Result<Vec<Concept>, LexisError> {
        let Some(owner) = self.find_by_uuid(id)? else {
            return Ok(Vec::new());
        };
        self.fetch_all(&owner.set_members)
    }

    /// Registered answers of `id` in list order.
    fn find_answers(&self, id: ConceptId) -> Result<Vec<Concept>, LexisError> {
        let Some(owner) = self.find_by_uuid(id)? else {
            return Ok(Vec::new());
        };
        self.fetch_all(&owner.answers)
    }

    /// Concepts other than `id` that reference it as a set member or answer.
    fn find_referrers(&self, id: ConceptId) -> Result<Vec<ConceptId>, LexisError> {
        Ok(self
            .list_all(true)?
            .into_iter()
            .filter(|c| c.id != id && c.references(id))
            .map(|c| c.id)
            .collect())
    }

    /// Fetch several concepts, skipping identities that no longer exist.
    fn fetch_all(&self, ids: &[ConceptId]) -> Result<Vec<Concept>, LexisError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find_by_uuid(*id)? {
                Some(concept) => out.push(concept),
                None => tracing::warn!(concept = %id, "dangling concept reference skipped"),
            }
        }
        Ok(out)
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// In-memory concept store.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Concept storage: ConceptId -> Concept
    concepts: BTreeMap<ConceptId, Concept>,

    /// Name index: folded name -> concepts carrying it
    name_index: BTreeMap<String, BTreeSet<ConceptId>>,

    vocabulary: Vocabulary,
}

impl MemoryStore {
    /// Create a new empty store with the standard vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing concepts.
    #[must_use]
    pub fn from_concepts(concepts: impl IntoIterator<Item = Concept>) -> Self {
        let mut store = Self::new();
        for concept in concepts {
            store.index(&concept);
            store.concepts.insert(concept.id, concept);
        }
        store
    }

    /// All concepts in identity order, retired included.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    fn index(&mut self, concept: &Concept) {
        for name in &concept.names {
            self.name_index
                .entry(fold_name(&name.name))
                .or_default()
                .insert(concept.id);
        }
    }

    fn unindex(&mut self, concept: &Concept) {
        for name in &concept.names {
            let key = fold_name(&name.name);
            if let Some(ids) = self.name_index.get_mut(&key) {
                ids.remove(&concept.id);
                if ids.is_empty() {
                    self.name_index.remove(&key);
                }
            }
        }
    }
}

impl ConceptStore for MemoryStore {
    fn find_by_uuid(&self, id: ConceptId) -> Result<Option<Concept>, LexisError> {
        Ok(self.concepts.get(&id).cloned())
    }

    fn find_by_exact_name(
        &self,
        name: &str,
        include_retired: bool,
    ) -> Result<Vec<Concept>, LexisError> {
        Ok(self
            .name_index
            .get(&fold_name(name))
            .into_iter()
            .flatten()
            .filter_map(|id| self.concepts.get(id))
            .filter(|c| include_retired || !c.retired)
            .cloned()
            .collect())
    }

    fn list_all(&self, include_retired: bool) -> Result<Vec<Concept>, LexisError> {
        Ok(self
            .concepts
            .values()
            .filter(|c| include_retired || !c.retired)
            .cloned()
            .collect())
    }

    fn count_all(&self, include_retired: bool) -> Result<usize, LexisError> {
        Ok(self
            .concepts
            .values()
            .filter(|c| include_retired || !c.retired)
            .count())
    }

    fn save(&mut self, concept: Concept) -> Result<(), LexisError> {
        if let Some(previous) = self.concepts.remove(&concept.id) {
            self.unindex(&previous);
        }
        self.index(&concept);
        self.concepts.insert(concept.id, concept);
        Ok(())
    }

    fn delete(&mut self, id: ConceptId) -> Result<bool, LexisError> {
        match self.concepts.remove(&id) {
            Some(previous) => {
                self.unindex(&previous);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

// =============================================================================
// TESTS
// =============================================================================
