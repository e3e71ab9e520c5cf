//! # Fixed Vocabularies
//!
//! Datatypes and concept classes are closed vocabularies compiled into the
//! binary. Concepts hold a copy of the entry they reference; a reference
//! supplied by a caller is resolved by UUID or by case-insensitive name.

use serde::{Deserialize, Serialize};
use uuid::{Uuid, uuid};

/// Value type of observations recorded against a concept.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Datatype {
    pub uuid: Uuid,
    pub name: String,
    /// HL7 abbreviation (`NM`, `CWE`, `ST`, ...).
    pub hl7_abbreviation: String,
}

/// Category a concept belongs to (Diagnosis, Drug, Question, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConceptClass {
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
}

const DATATYPES: &[(Uuid, &str, &str)] = &[
    (uuid!("8d4a4488-c2cc-11de-8d13-0010c6dffd0f"), "Numeric", "NM"),
    (uuid!("8d4a48b6-c2cc-11de-8d13-0010c6dffd0f"), "Coded", "CWE"),
    (uuid!("8d4a4ab4-c2cc-11de-8d13-0010c6dffd0f"), "Text", "ST"),
    (uuid!("8d4a4c94-c2cc-11de-8d13-0010c6dffd0f"), "N/A", "ZZ"),
    (uuid!("8d4a4e74-c2cc-11de-8d13-0010c6dffd0f"), "Document", "RP"),
    (uuid!("8d4a505e-c2cc-11de-8d13-0010c6dffd0f"), "Date", "DT"),
    (uuid!("8d4a591e-c2cc-11de-8d13-0010c6dffd0f"), "Time", "TM"),
    (uuid!("8d4a5af4-c2cc-11de-8d13-0010c6dffd0f"), "Datetime", "TS"),
    (uuid!("8d4a5cca-c2cc-11de-8d13-0010c6dffd0f"), "Boolean", "BIT"),
    (uuid!("8d4a5e96-c2cc-11de-8d13-0010c6dffd0f"), "Rule", "ZZ"),
    (uuid!("8d4a606c-c2cc-11de-8d13-0010c6dffd0f"), "Structured Numeric", "SN"),
    (uuid!("8d4a6242-c2cc-11de-8d13-0010c6dffd0f"), "Complex", "ED"),
];

const CLASSES: &[(Uuid, &str, &str)] = &[
    (
        uuid!("8d4907b2-c2cc-11de-8d13-0010c6dffd0f"),
        "Test",
        "Acq. during patient encounter (vitals, labs, etc.)",
    ),
    (uuid!("8d490bf4-c2cc-11de-8d13-0010c6dffd0f"), "Procedure", "Describes a clinical procedure"),
    (uuid!("8d490dfc-c2cc-11de-8d13-0010c6dffd0f"), "Drug", "Drug"),
    (
        uuid!("8d4918b0-c2cc-11de-8d13-0010c6dffd0f"),
        "Diagnosis",
        "Conclusion drawn through findings",
    ),
    (uuid!("8d491a9a-c2cc-11de-8d13-0010c6dffd0f"), "Finding", "Practitioner observation/finding"),
    (uuid!("8d491c7a-c2cc-11de-8d13-0010c6dffd0f"), "Anatomy", "Anatomic sites / descriptors"),
    (
        uuid!("8d491e50-c2cc-11de-8d13-0010c6dffd0f"),
        "Question",
        "Question (eg, patient history, SF36 items)",
    ),
    (uuid!("8d492026-c2cc-11de-8d13-0010c6dffd0f"), "LabSet", "Term to describe laboratory sets"),
    (uuid!("8d4923b4-c2cc-11de-8d13-0010c6dffd0f"), "MedSet", "Term to describe medication sets"),
    (uuid!("8d492594-c2cc-11de-8d13-0010c6dffd0f"), "ConvSet", "Term to describe convenience sets"),
    (
        uuid!("8d492774-c2cc-11de-8d13-0010c6dffd0f"),
        "Misc",
        "Terms which don't fit other categories",
    ),
    (uuid!("8d492954-c2cc-11de-8d13-0010c6dffd0f"), "Symptom", "Patient-reported observation"),
    (
        uuid!("8d492b2a-c2cc-11de-8d13-0010c6dffd0f"),
        "Symptom/Finding",
        "Observation that can be reported from patient or found on exam",
    ),
    (uuid!("8d492d0a-c2cc-11de-8d13-0010c6dffd0f"), "Specimen", "Body or fluid specimen"),
];

/// The closed set of datatypes and classes a store resolves references against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub datatypes: Vec<Datatype>,
    pub classes: Vec<ConceptClass>,
}

impl Vocabulary {
    /// The standard terminology vocabulary.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            datatypes: DATATYPES
                .iter()
                .map(|(uuid, name, code)| Datatype {
                    uuid: *uuid,
                    name: (*name).to_string(),
                    hl7_abbreviation: (*code).to_string(),
                })
                .collect(),
            classes: CLASSES
                .iter()
                .map(|(uuid, name, description)| ConceptClass {
                    uuid: *uuid,
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                })
                .collect(),
        }
    }

    /// Resolve a datatype reference (UUID or name).
    #[must_use]
    pub fn datatype(&self, reference: &str) -> Option<&Datatype> {
        let reference = reference.trim();
        let by_uuid = Uuid::try_parse(reference).ok();
        self.datatypes.iter().find(|d| {
            by_uuid.is_some_and(|u| u == d.uuid) || d.name.eq_ignore_ascii_case(reference)
        })
    }

    /// Resolve a concept class reference (UUID or name).
    #[must_use]
    pub fn concept_class(&self, reference: &str) -> Option<&ConceptClass> {
        let reference = reference.trim();
        let by_uuid = Uuid::try_parse(reference).ok();
        self.classes.iter().find(|c| {
            by_uuid.is_some_and(|u| u == c.uuid) || c.name.eq_ignore_ascii_case(reference)
        })
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::standard()
    }
}
