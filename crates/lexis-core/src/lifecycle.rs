//! # Lifecycle Manager
//!
//! Applies create, update, retire and purge transitions to Concepts.
//!
//! ```text
//!   create ──► Active ──retire──► Retired
//!                │                   │
//!                └──────purge────────┴──► (gone)
//! ```
//!
//! Every mutating operation validates fully before it writes, and writes the
//! aggregate with a single `save`, so a rejected call leaves the store as it
//! was. Purge refuses while any other concept still references the target.

use crate::identifier::Identifier;
use crate::primitives::{MAX_NAME_LENGTH, MAX_REASON_LENGTH, MAX_REFERENCES, MAX_VERSION_LENGTH};
use crate::store::ConceptStore;
use crate::{
    AuditInfo, Concept, ConceptId, ConceptName, ConceptNameType, LexisError, Locale,
    RequestContext,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// INPUT TYPES
// =============================================================================

/// A name as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NameSpec {
    pub name: String,
    /// Defaults to the request locale.
    #[serde(default)]
    pub locale: Option<String>,
    /// `FULLY_SPECIFIED`, `SHORT`, `INDEX_TERM`; absent for a synonym.
    #[serde(default)]
    pub concept_name_type: Option<String>,
    #[serde(default)]
    pub locale_preferred: bool,
}

impl NameSpec {
    /// A fully specified name in the request locale.
    #[must_use]
    pub fn fully_specified(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concept_name_type: Some(ConceptNameType::FullySpecified.as_str().to_string()),
            ..Self::default()
        }
    }
}

/// Everything needed to create a concept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewConcept {
    pub names: Vec<NameSpec>,
    /// Datatype UUID or name.
    pub datatype: String,
    /// Concept class UUID or name.
    pub concept_class: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub set_members: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Partial update. Only supplied fields change.
///
/// `name` is a shorthand that retargets the fully specified name in the
/// request locale and leaves every other name alone; `names` replaces the
/// whole name list. Supplying both is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConceptPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub names: Option<Vec<NameSpec>>,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub concept_class: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub set_members: Option<Vec<String>>,
    #[serde(default)]
    pub answers: Option<Vec<String>>,
}

// =============================================================================
// STATE & POLICY
// =============================================================================

/// Lifecycle state of an existing concept. Purged concepts do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    Retired,
}

impl LifecycleState {
    #[must_use]
    pub fn of(concept: &Concept) -> Self {
        if concept.retired {
            Self::Retired
        } else {
            Self::Active
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retired => "retired",
        }
    }
}

/// What retiring an already retired concept does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetirePolicy {
    /// Fail with `InvalidStateTransition`.
    #[default]
    Reject,
    /// Return the concept unchanged, keeping the original reason.
    Idempotent,
}

/// Which reference list an operation replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefList {
    SetMembers,
    Answers,
}

impl RefList {
    const fn label(self) -> &'static str {
        match self {
            Self::SetMembers => "set member",
            Self::Answers => "answer",
        }
    }
}

// =============================================================================
// LIFECYCLE MANAGER
// =============================================================================

/// Applies lifecycle transitions against a store.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleManager {
    pub retire_policy: RetirePolicy,
}

impl LifecycleManager {
    #[must_use]
    pub const fn new(retire_policy: RetirePolicy) -> Self {
        Self { retire_policy }
    }

    /// Create a concept with a fresh identity.
    pub fn create(
        &self,
        store: &mut impl ConceptStore,
        ctx: &RequestContext,
        spec: NewConcept,
    ) -> Result<Concept, LexisError> {
        if spec.names.is_empty() {
            return Err(LexisError::Validation(
                "a concept requires at least one name".to_string(),
            ));
        }
        let datatype = store
            .vocabulary()
            .datatype(&spec.datatype)
            .cloned()
            .ok_or_else(|| unknown_reference("datatype", &spec.datatype))?;
        let concept_class = store
            .vocabulary()
            .concept_class(&spec.concept_class)
            .cloned()
            .ok_or_else(|| unknown_reference("concept class", &spec.concept_class))?;

        let id = ConceptId::generate();
        let mut concept = Concept {
            id,
            names: build_names(&spec.names, &ctx.locale)?,
            datatype,
            concept_class,
            version: check_version(spec.version)?,
            retired: false,
            retire_reason: None,
            set_members: Vec::new(),
            answers: Vec::new(),
            audit: AuditInfo::created(ctx.actor.as_str(), Utc::now()),
        };
        apply_references(store, &mut concept, &spec.set_members, RefList::SetMembers)?;
        apply_references(store, &mut concept, &spec.answers, RefList::Answers)?;
        concept.validate()?;

        store.save(concept.clone())?;
        tracing::info!(
            concept = %concept.id,
            display = concept.display(&ctx.locale),
            "concept created"
        );
        Ok(concept)
    }

    /// Merge `patch` into the concept.
    pub fn update(
        &self,
        store: &mut impl ConceptStore,
        ctx: &RequestContext,
        id: ConceptId,
        patch: ConceptPatch,
    ) -> Result<Concept, LexisError> {
        let mut concept = fetch(store, id)?;

        if patch.name.is_some() && patch.names.is_some() {
            return Err(LexisError::InvalidArgument(
                "supply either 'name' or 'names', not both".to_string(),
            ));
        }
        if let Some(names) = &patch.names {
            if names.is_empty() {
                return Err(LexisError::Validation(
                    "a concept requires at least one name".to_string(),
                ));
            }
            concept.names = build_names(names, &ctx.locale)?;
        }
        if let Some(name) = &patch.name {
            retarget_fully_specified(&mut concept, &ctx.locale, name)?;
        }
        if let Some(reference) = &patch.datatype {
            concept.datatype = store
                .vocabulary()
                .datatype(reference)
                .cloned()
                .ok_or_else(|| unknown_reference("datatype", reference))?;
        }
        if let Some(reference) = &patch.concept_class {
            concept.concept_class = store
                .vocabulary()
                .concept_class(reference)
                .cloned()
                .ok_or_else(|| unknown_reference("concept class", reference))?;
        }
        if patch.version.is_some() {
            concept.version = check_version(patch.version)?;
        }
        if let Some(tokens) = &patch.set_members {
            apply_references(store, &mut concept, tokens, RefList::SetMembers)?;
        }
        if let Some(tokens) = &patch.answers {
            apply_references(store, &mut concept, tokens, RefList::Answers)?;
        }

        concept.audit.touch(&ctx.actor, Utc::now());
        concept.validate()?;
        store.save(concept.clone())?;
        tracing::info!(concept = %id, "concept updated");
        Ok(concept)
    }

    /// Soft-delete: Active -> Retired, keeping all data.
    pub fn retire(
        &self,
        store: &mut impl ConceptStore,
        ctx: &RequestContext,
        id: ConceptId,
        reason: &str,
    ) -> Result<Concept, LexisError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LexisError::Validation("a retire reason is required".to_string()));
        }
        if reason.chars().count() > MAX_REASON_LENGTH {
            return Err(LexisError::Validation(format!(
                "retire reason exceeds {} characters",
                MAX_REASON_LENGTH
            )));
        }

        let mut concept = fetch(store, id)?;
        if LifecycleState::of(&concept) == LifecycleState::Retired {
            return match self.retire_policy {
                RetirePolicy::Idempotent => Ok(concept),
                RetirePolicy::Reject => Err(LexisError::InvalidStateTransition {
                    from: LifecycleState::Retired.as_str(),
                    to: LifecycleState::Retired.as_str(),
                }),
            };
        }

        let now = Utc::now();
        concept.retired = true;
        concept.retire_reason = Some(reason.to_string());
        concept.audit.retired_by = Some(ctx.actor.clone());
        concept.audit.date_retired = Some(now);
        concept.audit.touch(&ctx.actor, now);
        concept.validate()?;

        store.save(concept.clone())?;
        tracing::info!(concept = %id, reason, "concept retired");
        Ok(concept)
    }

    /// Hard-delete. Irreversible.
    ///
    /// # Errors
    ///
    /// `Conflict` while another concept lists this one as a set member or
    /// answer; detach it first.
    pub fn purge(&self, store: &mut impl ConceptStore, id: ConceptId) -> Result<(), LexisError> {
        let concept = fetch(store, id)?;

        let referrers = store.find_referrers(id)?;
        if !referrers.is_empty() {
            let listed: Vec<String> = referrers.iter().map(ToString::to_string).collect();
            return Err(LexisError::Conflict(format!(
                "concept {} is still referenced by {}",
                id,
                listed.join(", ")
            )));
        }

        store.delete(id)?;
        tracing::info!(
            concept = %id,
            state = LifecycleState::of(&concept).as_str(),
            "concept purged"
        );
        Ok(())
    }

    /// Replace the set member list. All members must exist or nothing changes.
    pub fn add_set_members(
        &self,
        store: &mut impl ConceptStore,
        ctx: &RequestContext,
        id: ConceptId,
        members: &[String],
    ) -> Result<Concept, LexisError> {
        self.replace_references(store, ctx, id, members, RefList::SetMembers)
    }

    /// Replace the answer list. All answers must exist or nothing changes.
    pub fn set_answers(
        &self,
        store: &mut impl ConceptStore,
        ctx: &RequestContext,
        id: ConceptId,
        answers: &[String],
    ) -> Result<Concept, LexisError> {
        self.replace_references(store, ctx, id, answers, RefList::Answers)
    }

    fn replace_references(
        &self,
        store: &mut impl ConceptStore,
        ctx: &RequestContext,
        id: ConceptId,
        tokens: &[String],
        list: RefList,
    ) -> Result<Concept, LexisError> {
        let mut concept = fetch(store, id)?;
        apply_references(store, &mut concept, tokens, list)?;
        concept.audit.touch(&ctx.actor, Utc::now());

        store.save(concept.clone())?;
        tracing::info!(
            concept = %id,
            count = tokens.len(),
            kind = list.label(),
            "references replaced"
        );
        Ok(concept)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn fetch(store: &impl ConceptStore, id: ConceptId) -> Result<Concept, LexisError> {
    store
        .find_by_uuid(id)?
        .ok_or_else(|| LexisError::NotFound(id.to_string()))
}

fn unknown_reference(kind: &str, reference: &str) -> LexisError {
    LexisError::Validation(format!("unknown {} '{}'", kind, reference))
}

fn check_version(version: Option<String>) -> Result<Option<String>, LexisError> {
    match version {
        Some(v) if v.chars().count() > MAX_VERSION_LENGTH => Err(LexisError::Validation(
            format!("version exceeds {} characters", MAX_VERSION_LENGTH),
        )),
        other => Ok(other),
    }
}

/// Turn caller name specs into owned names.
///
/// If no spec is fully specified, the first name becomes the fully specified
/// name of its locale.
fn build_names(
    specs: &[NameSpec],
    default_locale: &Locale,
) -> Result<Vec<ConceptName>, LexisError> {
    let mut names = Vec::with_capacity(specs.len());
    for spec in specs {
        names.push(build_name(spec, default_locale)?);
    }
    if !names.iter().any(ConceptName::is_fully_specified) {
        if let Some(first) = names.first_mut() {
            first.name_type = Some(ConceptNameType::FullySpecified);
        }
    }
    Ok(names)
}

fn build_name(spec: &NameSpec, default_locale: &Locale) -> Result<ConceptName, LexisError> {
    let text = check_name(&spec.name)?;
    let locale = spec
        .locale
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map_or_else(|| default_locale.clone(), Locale::new);
    let mut name = ConceptName::new(text, locale);
    if let Some(token) = &spec.concept_name_type {
        name.name_type = Some(ConceptNameType::parse(token)?);
    }
    name.locale_preferred = spec.locale_preferred;
    Ok(name)
}

fn check_name(name: &str) -> Result<&str, LexisError> {
    let text = name.trim();
    if text.is_empty() {
        return Err(LexisError::Validation("concept names must not be blank".to_string()));
    }
    if text.chars().count() > MAX_NAME_LENGTH {
        return Err(LexisError::Validation(format!(
            "concept name exceeds {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(text)
}

/// Point the fully specified name for `locale` at new text.
///
/// The name that would resolve for `locale` (exact, then same language) is
/// edited in place; a new one is added only when none resolves.
fn retarget_fully_specified(
    concept: &mut Concept,
    locale: &Locale,
    text: &str,
) -> Result<(), LexisError> {
    let text = check_name(text)?;
    let target = concept.fully_specified_name(locale).map(|n| n.id);
    match target.and_then(|id| concept.names.iter_mut().find(|n| n.id == id)) {
        Some(existing) => existing.name = text.to_string(),
        None => concept
            .names
            .push(ConceptName::fully_specified(text, locale.clone())),
    }
    Ok(())
}

/// Resolve `tokens` and install them as the concept's `list`.
fn apply_references(
    store: &impl ConceptStore,
    concept: &mut Concept,
    tokens: &[String],
    list: RefList,
) -> Result<(), LexisError> {
    let resolved = resolve_references(store, concept.id, tokens, list)?;
    match list {
        RefList::SetMembers => concept.set_members = resolved,
        RefList::Answers => concept.answers = resolved,
    }
    Ok(())
}

/// Resolve reference tokens to existing concepts, all or nothing.
///
/// Tokens must be UUIDs. `owner` may reference itself.
fn resolve_references(
    store: &impl ConceptStore,
    owner: ConceptId,
    tokens: &[String],
    list: RefList,
) -> Result<Vec<ConceptId>, LexisError> {
    if tokens.len() > MAX_REFERENCES {
        return Err(LexisError::Validation(format!(
            "at most {} {}s allowed",
            MAX_REFERENCES,
            list.label()
        )));
    }

    let mut seen = BTreeSet::new();
    let mut resolved = Vec::with_capacity(tokens.len());
    for token in tokens {
        let Identifier::Uuid(id) = Identifier::classify(token) else {
            return Err(LexisError::Validation(format!(
                "{} '{}' is not a concept uuid",
                list.label(),
                token
            )));
        };
        if !seen.insert(id) {
            return Err(LexisError::Validation(format!(
                "duplicate {} {}",
                list.label(),
                id
            )));
        }
        if id != owner && store.find_by_uuid(id)?.is_none() {
            return Err(LexisError::Validation(format!(
                "{} {} does not exist",
                list.label(),
                id
            )));
        }
        resolved.push(id);
    }
    Ok(resolved)
}

// =============================================================================
// TESTS
// =============================================================================
