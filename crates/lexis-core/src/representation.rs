//! # Representation Resolver
//!
//! Projects a Concept into one of three named output shapes.
//!
//! Which fields appear at which level is a static table (`Representation::fields`).
//! The projection walks that table; there is no reflective copying. Nested
//! concepts (set members, answers) are always projected as `RefView`, a
//! separate type that cannot hold further nesting, so a set that contains
//! itself expands exactly one level.
//!
//! | level     | fields                                                        |
//! |-----------|---------------------------------------------------------------|
//! | `ref`     | uuid, display                                                 |
//! | `default` | ref + name, names, datatype, conceptClass, version, retired, set |
//! | `full`    | default + retireReason, setMembers, answers, auditInfo         |

use crate::store::ConceptStore;
use crate::vocabulary::{ConceptClass, Datatype};
use crate::{AuditInfo, Concept, ConceptId, ConceptName, ConceptNameType, LexisError, Locale};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// LEVELS & FIELD TABLE
// =============================================================================

/// A named projection shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Representation {
    Ref,
    Default,
    Full,
}

/// A field that may appear in a projected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Uuid,
    Display,
    Name,
    Names,
    Datatype,
    ConceptClass,
    Version,
    Retired,
    Set,
    RetireReason,
    SetMembers,
    Answers,
    AuditInfo,
}

const REF_FIELDS: &[Field] = &[Field::Uuid, Field::Display];

const DEFAULT_FIELDS: &[Field] = &[
    Field::Uuid,
    Field::Display,
    Field::Name,
    Field::Names,
    Field::Datatype,
    Field::ConceptClass,
    Field::Version,
    Field::Retired,
    Field::Set,
];

const FULL_FIELDS: &[Field] = &[
    Field::Uuid,
    Field::Display,
    Field::Name,
    Field::Names,
    Field::Datatype,
    Field::ConceptClass,
    Field::Version,
    Field::Retired,
    Field::Set,
    Field::RetireReason,
    Field::SetMembers,
    Field::Answers,
    Field::AuditInfo,
];

impl Representation {
    /// Wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ref => "ref",
            Self::Default => "default",
            Self::Full => "full",
        }
    }

    /// Parse a representation token (`ref`, `default`, `full`).
    pub fn parse(token: &str) -> Result<Self, LexisError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "ref" => Ok(Self::Ref),
            "default" => Ok(Self::Default),
            "full" => Ok(Self::Full),
            other => Err(LexisError::InvalidArgument(format!(
                "unknown representation '{}' (expected ref, default or full)",
                other
            ))),
        }
    }

    /// Level for a single-item retrieve.
    ///
    /// Omitting the parameter yields `default`; naming `default` explicitly is
    /// rejected because the bare request already means it.
    pub fn for_retrieve(param: Option<&str>) -> Result<Self, LexisError> {
        match param {
            None => Ok(Self::Default),
            Some(token) => match Self::parse(token)? {
                Self::Default => Err(LexisError::InvalidArgument(
                    "'default' is implied on retrieve; omit the representation parameter"
                        .to_string(),
                )),
                other => Ok(other),
            },
        }
    }

    /// Level for list and search results: `ref` unless asked otherwise.
    pub fn for_listing(param: Option<&str>) -> Result<Self, LexisError> {
        param.map_or(Ok(Self::Ref), Self::parse)
    }

    /// Fields included at this level.
    #[must_use]
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::Ref => REF_FIELDS,
            Self::Default => DEFAULT_FIELDS,
            Self::Full => FULL_FIELDS,
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// Embedded reference to another concept. Never nests further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefView {
    pub uuid: ConceptId,
    pub display: String,
}

impl RefView {
    #[must_use]
    pub fn of(concept: &Concept, locale: &Locale) -> Self {
        Self {
            uuid: concept.id,
            display: concept.display(locale).to_string(),
        }
    }
}

/// Projected concept name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameView {
    pub uuid: Uuid,
    pub display: String,
    pub name: String,
    pub locale: String,
    pub concept_name_type: Option<ConceptNameType>,
    pub locale_preferred: bool,
}

impl From<&ConceptName> for NameView {
    fn from(name: &ConceptName) -> Self {
        Self {
            uuid: name.id,
            display: name.name.clone(),
            name: name.name.clone(),
            locale: name.locale.as_str().to_string(),
            concept_name_type: name.name_type,
            locale_preferred: name.locale_preferred,
        }
    }
}

/// Projected vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabView {
    pub uuid: Uuid,
    pub display: String,
}

impl From<&Datatype> for VocabView {
    fn from(d: &Datatype) -> Self {
        Self {
            uuid: d.uuid,
            display: d.name.clone(),
        }
    }
}

impl From<&ConceptClass> for VocabView {
    fn from(c: &ConceptClass) -> Self {
        Self {
            uuid: c.uuid,
            display: c.name.clone(),
        }
    }
}

/// Projected audit info (full level only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditView {
    pub creator: String,
    pub date_created: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub date_changed: Option<DateTime<Utc>>,
    pub retired_by: Option<String>,
    pub date_retired: Option<DateTime<Utc>>,
}

impl From<&AuditInfo> for AuditView {
    fn from(a: &AuditInfo) -> Self {
        Self {
            creator: a.creator.clone(),
            date_created: a.date_created,
            changed_by: a.changed_by.clone(),
            date_changed: a.date_changed,
            retired_by: a.retired_by.clone(),
            date_retired: a.date_retired,
        }
    }
}

/// A concept projected at some representation level.
///
/// A field is `Some` exactly when the level includes it; nullable values
/// inside an included field use an inner `Option` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptView {
    pub uuid: ConceptId,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<NameView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<NameView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<VocabView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_class: Option<VocabView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retire_reason: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_members: Option<Vec<RefView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<RefView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_info: Option<AuditView>,
}

impl ConceptView {
    fn bare(concept: &Concept, locale: &Locale) -> Self {
        Self {
            uuid: concept.id,
            display: concept.display(locale).to_string(),
            name: None,
            names: None,
            datatype: None,
            concept_class: None,
            version: None,
            retired: None,
            set: None,
            retire_reason: None,
            set_members: None,
            answers: None,
            audit_info: None,
        }
    }

    /// Fields present in this view, in table order.
    #[must_use]
    pub fn present_fields(&self) -> Vec<Field> {
        let optional = [
            (Field::Name, self.name.is_some()),
            (Field::Names, self.names.is_some()),
            (Field::Datatype, self.datatype.is_some()),
            (Field::ConceptClass, self.concept_class.is_some()),
            (Field::Version, self.version.is_some()),
            (Field::Retired, self.retired.is_some()),
            (Field::Set, self.set.is_some()),
            (Field::RetireReason, self.retire_reason.is_some()),
            (Field::SetMembers, self.set_members.is_some()),
            (Field::Answers, self.answers.is_some()),
            (Field::AuditInfo, self.audit_info.is_some()),
        ];
        [Field::Uuid, Field::Display]
            .into_iter()
            .chain(optional.into_iter().filter(|(_, p)| *p).map(|(f, _)| f))
            .collect()
    }
}

// =============================================================================
// PROJECTION
// =============================================================================

/// Project `concept` at `level`, naming things in `locale`.
///
/// Only `full` touches the store, to look up set members and answers for
/// their `ref` views. References that no longer resolve are skipped.
pub fn project(
    store: &impl ConceptStore,
    concept: &Concept,
    level: Representation,
    locale: &Locale,
) -> Result<ConceptView, LexisError> {
    let mut view = ConceptView::bare(concept, locale);

    for field in level.fields() {
        match field {
            Field::Uuid | Field::Display => {}
            Field::Name => {
                view.name = Some(
                    concept
                        .fully_specified_name(locale)
                        .or_else(|| concept.display_name(locale))
                        .map(NameView::from),
                );
            }
            Field::Names => view.names = Some(concept.names.iter().map(NameView::from).collect()),
            Field::Datatype => view.datatype = Some(VocabView::from(&concept.datatype)),
            Field::ConceptClass => {
                view.concept_class = Some(VocabView::from(&concept.concept_class));
            }
            Field::Version => view.version = Some(concept.version.clone()),
            Field::Retired => view.retired = Some(concept.retired),
            Field::Set => view.set = Some(concept.is_set()),
            Field::RetireReason => view.retire_reason = Some(concept.retire_reason.clone()),
            Field::SetMembers => {
                view.set_members = Some(ref_views(store, &concept.set_members, locale)?);
            }
            Field::Answers => view.answers = Some(ref_views(store, &concept.answers, locale)?),
            Field::AuditInfo => view.audit_info = Some(AuditView::from(&concept.audit)),
        }
    }

    Ok(view)
}

fn ref_views(
    store: &impl ConceptStore,
    ids: &[ConceptId],
    locale: &Locale,
) -> Result<Vec<RefView>, LexisError> {
    Ok(store
        .fetch_all(ids)?
        .iter()
        .map(|c| RefView::of(c, locale))
        .collect())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::vocabulary::Vocabulary;
    use std::collections::BTreeSet;

    fn concept(name: &str) -> Concept {
        let vocab = Vocabulary::standard();
        Concept {
            id: ConceptId::generate(),
            names: vec![ConceptName::fully_specified(name, Locale::new("en"))],
            datatype: vocab.datatypes[1].clone(),
            concept_class: vocab.classes[6].clone(),
            version: None,
            retired: false,
            retire_reason: None,
            set_members: Vec::new(),
            answers: Vec::new(),
            audit: AuditInfo::created("admin", Utc::now()),
        }
    }

    #[test]
    fn field_tables_form_strict_superset_chain() {
        let r: BTreeSet<_> = Representation::Ref.fields().iter().collect();
        let d: BTreeSet<_> = Representation::Default.fields().iter().collect();
        let f: BTreeSet<_> = Representation::Full.fields().iter().collect();
        assert!(r.is_subset(&d) && r.len() < d.len());
        assert!(d.is_subset(&f) && d.len() < f.len());
    }

    #[test]
    fn retrieve_rejects_explicit_default() {
        assert_eq!(Representation::for_retrieve(None).ok(), Some(Representation::Default));
        assert!(matches!(
            Representation::for_retrieve(Some("default")),
            Err(LexisError::InvalidArgument(_))
        ));
        assert_eq!(
            Representation::for_retrieve(Some("full")).ok(),
            Some(Representation::Full)
        );
    }

    #[test]
    fn listing_defaults_to_ref_and_accepts_default() {
        assert_eq!(Representation::for_listing(None).ok(), Some(Representation::Ref));
        assert_eq!(
            Representation::for_listing(Some("default")).ok(),
            Some(Representation::Default)
        );
        assert!(Representation::parse("custom:(uuid)").is_err());
    }

    #[test]
    fn ref_view_has_no_datatype() {
        let store = MemoryStore::new();
        let c = concept("ASPIRIN");
        let view = project(&store, &c, Representation::Ref, &Locale::new("en")).expect("project");
        assert_eq!(view.display, "ASPIRIN");
        assert!(view.datatype.is_none());
        assert!(view.audit_info.is_none());
        assert_eq!(view.present_fields(), Representation::Ref.fields());
    }

    #[test]
    fn default_view_carries_full_name_objects() {
        let store = MemoryStore::new();
        let c = concept("ASPIRIN");
        let view =
            project(&store, &c, Representation::Default, &Locale::new("en")).expect("project");
        let name = view.name.clone().flatten().expect("name");
        assert_eq!(name.name, "ASPIRIN");
        assert_eq!(name.concept_name_type, Some(ConceptNameType::FullySpecified));
        assert!(view.audit_info.is_none());
        assert_eq!(view.present_fields(), Representation::Default.fields());
    }

    #[test]
    fn full_view_expands_self_containing_set_one_level() {
        let mut store = MemoryStore::new();
        let member = concept("FOOD");
        let mut set = concept("FOOD CONSTRUCT");
        set.set_members = vec![member.id, set.id];
        store.save(member.clone()).expect("save");
        store.save(set.clone()).expect("save");

        let en = Locale::new("en");
        let view = project(&store, &set, Representation::Full, &en).expect("project");
        let members = view.set_members.clone().expect("members");
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].uuid, member.id);
        assert_eq!(members[1].uuid, set.id);
        assert!(view.audit_info.is_some());
        assert_eq!(view.present_fields(), Representation::Full.fields());
    }
}
