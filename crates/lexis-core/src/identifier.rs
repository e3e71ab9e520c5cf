//! # Identifier Resolver
//!
//! Dispatches a caller-supplied string to a UUID lookup or a name lookup.
//!
//! The token is classified once at the boundary into an `Identifier` and then
//! follows exactly one of two lookup paths. Name lookups only succeed through
//! a concept's fully specified or locale-preferred name; fetching by a
//! synonym is rejected so clients are never handed a concept they did not
//! name precisely.

use crate::store::ConceptStore;
use crate::{Concept, ConceptId, LexisError};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Length of a hyphenated UUID.
const UUID_TEXT_LENGTH: usize = 36;

/// A classified lookup token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    Uuid(ConceptId),
    Name(&'a str),
}

impl<'a> Identifier<'a> {
    /// Classify a token: hyphenated UUID text is an identity, anything else a name.
    #[must_use]
    pub fn classify(token: &'a str) -> Self {
        let trimmed = token.trim();
        if trimmed.len() != UUID_TEXT_LENGTH {
            return Self::Name(trimmed);
        }
        match Uuid::try_parse(trimmed) {
            Ok(uuid) => Self::Uuid(ConceptId(uuid)),
            Err(_) => Self::Name(trimmed),
        }
    }
}

/// How names are compared during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatching {
    /// Unicode case-insensitive (the default).
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

impl NameMatching {
    fn matches(self, candidate: &str, wanted: &str) -> bool {
        match self {
            Self::CaseSensitive => candidate.trim() == wanted,
            Self::CaseInsensitive => candidate.trim().to_lowercase() == wanted.to_lowercase(),
        }
    }
}

/// Resolves lookup tokens against a store. Read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierResolver {
    pub matching: NameMatching,
}

impl IdentifierResolver {
    #[must_use]
    pub const fn new(matching: NameMatching) -> Self {
        Self { matching }
    }

    /// Resolve `token` to a concept.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no concept has the UUID or the name
    /// - `AmbiguousName` when several non-retired concepts carry the name
    /// - `InvalidName` when the only match is a synonym of its concept
    pub fn resolve(&self, store: &impl ConceptStore, token: &str) -> Result<Concept, LexisError> {
        match Identifier::classify(token) {
            Identifier::Uuid(id) => self.by_uuid(store, id),
            Identifier::Name(name) => self.by_name(store, name),
        }
    }

    /// Direct identity lookup. Retired concepts are returned.
    pub fn by_uuid(&self, store: &impl ConceptStore, id: ConceptId) -> Result<Concept, LexisError> {
        tracing::debug!(concept = %id, "resolving concept by uuid");
        store
            .find_by_uuid(id)?
            .ok_or_else(|| LexisError::NotFound(id.to_string()))
    }

    /// Exact-name lookup restricted to non-retired concepts.
    pub fn by_name(&self, store: &impl ConceptStore, name: &str) -> Result<Concept, LexisError> {
        tracing::debug!(name, "resolving concept by name");
        if name.is_empty() {
            return Err(LexisError::NotFound(String::new()));
        }

        // Group matching names by concept; a concept counts once however many
        // of its names (across locales) carry the text.
        let mut hits: BTreeMap<ConceptId, (Concept, bool)> = BTreeMap::new();
        for concept in store.find_by_exact_name(name, false)? {
            let matching: Vec<bool> = concept
                .names
                .iter()
                .filter(|n| self.matching.matches(&n.name, name))
                .map(|n| n.is_primary())
                .collect();
            if matching.is_empty() {
                continue;
            }
            let primary = matching.iter().any(|p| *p);
            hits.insert(concept.id, (concept, primary));
        }

        match hits.len() {
            0 => Err(LexisError::NotFound(name.to_string())),
            1 => {
                let Some((_, (concept, primary))) = hits.pop_first() else {
                    return Err(LexisError::NotFound(name.to_string()));
                };
                if primary {
                    Ok(concept)
                } else {
                    Err(LexisError::InvalidName(name.to_string()))
                }
            }
            count => Err(LexisError::AmbiguousName {
                name: name.to_string(),
                count,
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
