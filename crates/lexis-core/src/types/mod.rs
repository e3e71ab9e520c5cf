//! # Core Type Definitions
//!
//! This module contains the data model of the Lexis terminology engine:
//! - Identifiers (`ConceptId`, `Locale`)
//! - The Concept aggregate (`Concept`, `ConceptName`, `ConceptNameType`, `AuditInfo`)
//! - Per-request context (`RequestContext`)
//! - Error types (`LexisError`)
//!
//! ## Ownership
//!
//! A Concept owns its names: they are stored inline and destroyed with it.
//! Set members and answers are references (`ConceptId`), never nested
//! aggregates, so a set may contain itself without creating an ownership cycle.

use crate::vocabulary::{ConceptClass, Datatype};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Globally unique, immutable identity of a Concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConceptId(pub Uuid);

impl ConceptId {
    /// Assign a fresh random identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<Uuid> for ConceptId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Opaque locale token (`en`, `en_GB`, `fr`).
///
/// Locales are compared exactly. The only structure the engine relies on is
/// the language prefix before the first `_` or `-`, used as a fallback when a
/// concept has no name for the exact locale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Locale(pub String);

impl Locale {
    /// Create a new locale from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the locale as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The language part of the locale (`en_GB` -> `en`).
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split(['_', '-']).next().unwrap_or_default()
    }

    /// True if both locales share a language.
    #[must_use]
    pub fn same_language(&self, other: &Locale) -> bool {
        self.language().eq_ignore_ascii_case(other.language())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(crate::primitives::DEFAULT_LOCALE)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CONCEPT NAME
// =============================================================================

/// Kind of a concept name. A name with no type is a plain synonym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConceptNameType {
    FullySpecified,
    Short,
    IndexTerm,
}

impl ConceptNameType {
    /// Wire token for this name type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullySpecified => "FULLY_SPECIFIED",
            Self::Short => "SHORT",
            Self::IndexTerm => "INDEX_TERM",
        }
    }

    /// Parse a wire token, case-insensitively.
    pub fn parse(token: &str) -> Result<Self, LexisError> {
        match token.trim().to_ascii_uppercase().as_str() {
            "FULLY_SPECIFIED" => Ok(Self::FullySpecified),
            "SHORT" => Ok(Self::Short),
            "INDEX_TERM" => Ok(Self::IndexTerm),
            other => Err(LexisError::Validation(format!(
                "unknown concept name type '{}'",
                other
            ))),
        }
    }
}

/// A localized name owned by exactly one Concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptName {
    /// Identity of the name row itself.
    pub id: Uuid,
    pub name: String,
    pub locale: Locale,
    /// `None` for synonyms.
    pub name_type: Option<ConceptNameType>,
    /// Preferred name for its locale.
    pub locale_preferred: bool,
}

impl ConceptName {
    /// Create a synonym (untyped, not preferred) name.
    #[must_use]
    pub fn new(name: impl Into<String>, locale: Locale) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            locale,
            name_type: None,
            locale_preferred: false,
        }
    }

    /// Create a fully specified name.
    #[must_use]
    pub fn fully_specified(name: impl Into<String>, locale: Locale) -> Self {
        Self {
            name_type: Some(ConceptNameType::FullySpecified),
            ..Self::new(name, locale)
        }
    }

    /// Builder: set the name type.
    #[must_use]
    pub fn with_type(mut self, name_type: ConceptNameType) -> Self {
        self.name_type = Some(name_type);
        self
    }

    /// Builder: mark as preferred for its locale.
    #[must_use]
    pub fn preferred(mut self) -> Self {
        self.locale_preferred = true;
        self
    }

    #[must_use]
    pub fn is_fully_specified(&self) -> bool {
        self.name_type == Some(ConceptNameType::FullySpecified)
    }

    /// Fully specified or locale-preferred: the names a concept may be fetched by.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.is_fully_specified() || self.locale_preferred
    }
}

// =============================================================================
// AUDIT INFO
// =============================================================================

/// Read-only bookkeeping maintained by the lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub creator: String,
    pub date_created: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub date_changed: Option<DateTime<Utc>>,
    pub retired_by: Option<String>,
    pub date_retired: Option<DateTime<Utc>>,
}

impl AuditInfo {
    /// Audit record for a concept created now by `actor`.
    #[must_use]
    pub fn created(actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            creator: actor.into(),
            date_created: at,
            changed_by: None,
            date_changed: None,
            retired_by: None,
            date_retired: None,
        }
    }

    /// Stamp a modification.
    pub fn touch(&mut self, actor: &str, at: DateTime<Utc>) {
        self.changed_by = Some(actor.to_string());
        self.date_changed = Some(at);
    }
}

// =============================================================================
// CONCEPT
// =============================================================================

/// The Concept aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    pub names: Vec<ConceptName>,
    pub datatype: Datatype,
    pub concept_class: ConceptClass,
    /// Free-form version tag.
    pub version: Option<String>,
    pub retired: bool,
    pub retire_reason: Option<String>,
    /// Ordered, non-owning.
    pub set_members: Vec<ConceptId>,
    /// Ordered, non-owning.
    pub answers: Vec<ConceptId>,
    pub audit: AuditInfo,
}

impl Concept {
    /// Fully specified name for `locale`.
    ///
    /// Exact locale first, then any locale of the same language.
    #[must_use]
    pub fn fully_specified_name(&self, locale: &Locale) -> Option<&ConceptName> {
        self.find_name(locale, ConceptName::is_fully_specified)
    }

    /// Locale-preferred name, falling back to the fully specified one.
    #[must_use]
    pub fn preferred_name(&self, locale: &Locale) -> Option<&ConceptName> {
        self.find_name(locale, |n| n.locale_preferred)
            .or_else(|| self.fully_specified_name(locale))
    }

    /// The single name shown for this concept in `locale`.
    ///
    /// Preferred, then fully specified, then any fully specified name, then
    /// the first name. `None` only for a concept without names.
    #[must_use]
    pub fn display_name(&self, locale: &Locale) -> Option<&ConceptName> {
        self.preferred_name(locale)
            .or_else(|| self.names.iter().find(|n| n.is_fully_specified()))
            .or_else(|| self.names.first())
    }

    /// Display text, empty for a nameless concept.
    #[must_use]
    pub fn display(&self, locale: &Locale) -> &str {
        self.display_name(locale)
            .map(|n| n.name.as_str())
            .unwrap_or_default()
    }

    /// True if this concept groups other concepts.
    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.set_members.is_empty()
    }

    /// True if this concept references `other` as a set member or answer.
    #[must_use]
    pub fn references(&self, other: ConceptId) -> bool {
        self.set_members.contains(&other) || self.answers.contains(&other)
    }

    fn find_name(
        &self,
        locale: &Locale,
        predicate: impl Fn(&ConceptName) -> bool,
    ) -> Option<&ConceptName> {
        self.names
            .iter()
            .find(|n| &n.locale == locale && predicate(n))
            .or_else(|| {
                self.names
                    .iter()
                    .find(|n| n.locale.same_language(locale) && predicate(n))
            })
    }

    /// Check the aggregate invariants.
    ///
    /// - a non-retired concept has at least one non-blank name
    /// - a retired concept carries a non-blank retire reason
    /// - at most one fully specified and one preferred name per locale
    pub fn validate(&self) -> Result<(), LexisError> {
        if !self.retired && self.names.is_empty() {
            return Err(LexisError::Validation(format!(
                "concept {} must have at least one name",
                self.id
            )));
        }
        if self.names.iter().any(|n| n.name.trim().is_empty()) {
            return Err(LexisError::Validation("concept names must not be blank".into()));
        }
        if self.retired
            && self
                .retire_reason
                .as_deref()
                .is_none_or(|r| r.trim().is_empty())
        {
            return Err(LexisError::Validation(format!(
                "retired concept {} requires a retire reason",
                self.id
            )));
        }

        let mut fully_specified: BTreeMap<&Locale, usize> = BTreeMap::new();
        let mut preferred: BTreeMap<&Locale, usize> = BTreeMap::new();
        for name in &self.names {
            if name.is_fully_specified() {
                *fully_specified.entry(&name.locale).or_default() += 1;
            }
            if name.locale_preferred {
                *preferred.entry(&name.locale).or_default() += 1;
            }
        }
        if let Some((locale, _)) = fully_specified.iter().find(|(_, n)| **n > 1) {
            return Err(LexisError::Validation(format!(
                "more than one fully specified name for locale '{}'",
                locale
            )));
        }
        if let Some((locale, _)) = preferred.iter().find(|(_, n)| **n > 1) {
            return Err(LexisError::Validation(format!(
                "more than one preferred name for locale '{}'",
                locale
            )));
        }
        Ok(())
    }
}

// =============================================================================
// REQUEST CONTEXT
// =============================================================================

/// Per-call context supplied by the controller.
///
/// The engine never reads ambient session state; locale and actor arrive here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Locale names are resolved and matched in.
    pub locale: Locale,
    /// Recorded in audit info for mutations.
    pub actor: String,
}

impl RequestContext {
    #[must_use]
    pub fn new(locale: Locale, actor: impl Into<String>) -> Self {
        Self {
            locale,
            actor: actor.into(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Locale::default(), crate::primitives::DEFAULT_ACTOR)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Lexis engine.
///
/// Input errors (`NotFound`, `Validation`, `InvalidArgument`, the name errors)
/// are deterministic and must reach the caller unmodified. Nothing in the
/// engine retries.
#[derive(Debug, Error)]
pub enum LexisError {
    /// The identifier did not resolve to a concept.
    #[error("Concept not found: {0}")]
    NotFound(String),

    /// More than one concept carries the requested name.
    #[error("Ambiguous name '{name}': matches {count} concepts")]
    AmbiguousName { name: String, count: usize },

    /// The name exists but is neither fully specified nor preferred.
    #[error("Name '{0}' is neither the fully specified nor a preferred name of its concept")]
    InvalidName(String),

    /// Missing required field, malformed reference, blank reason.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal lifecycle move.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Referential integrity blocks the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad representation token or filter combination.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl LexisError {
    /// Short machine-readable kind, used in API error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AmbiguousName { .. } => "ambiguous_name",
            Self::InvalidName(_) => "invalid_name",
            Self::Validation(_) => "validation",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::Conflict(_) => "conflict",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Storage(_) => "storage",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
