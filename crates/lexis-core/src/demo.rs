//! # Demo Dictionary
//!
//! A small clinical dictionary with fixed UUIDs: 25 concepts, one of them
//! retired. `lexis init --demo` seeds it, and the test suites use it as
//! their shared dataset.
//!
//! Notable entries:
//! - FOOD CONSTRUCT is a set of FAVORITE FOOD, NON-CODED and DAILY MEAL COUNT
//! - FOOD ASSISTANCE FOR ENTIRE FAMILY has answers YES and NO
//! - COUGH SYRUP carries the synonym COUGH MEDICINE
//! - UNKNOWN REGIMEN is retired

use crate::vocabulary::Vocabulary;
use crate::{AuditInfo, Concept, ConceptId, ConceptName, LexisError, Locale, MemoryStore};
use chrono::Utc;
use uuid::{Uuid, uuid};

pub const ASPIRIN: Uuid = uuid!("15f83cd6-64e9-4e06-a5f9-364d3b14a43d");
pub const TREATMENT_STATUS: Uuid = uuid!("511e03ab-7cbb-4b9f-abe3-d9256d67f27e");
pub const CD4_COUNT: Uuid = uuid!("f923524a-b90c-4870-a948-4125638606fd");
pub const WEIGHT: Uuid = uuid!("0a9afe04-088b-44ca-9291-0a8c3b5c96fa");
pub const HEIGHT: Uuid = uuid!("11716f9c-1434-4f8d-b9fc-9aa14c4d6129");
pub const FOOD_ASSISTANCE: Uuid = uuid!("0dde1358-7fcf-4341-a330-f119241a46e8");
pub const FOOD_CONSTRUCT: Uuid = uuid!("0f97e14e-cdc2-49ac-9255-b5126f8a5147");
pub const FAVORITE_FOOD: Uuid = uuid!("f4d0b584-6ce5-40e2-9ce5-fa7ec07b32b4");
pub const DAILY_MEAL_COUNT: Uuid = uuid!("54d2dce5-0357-4253-a91a-85ce519137f5");
pub const FOOD_ASSISTANCE_FAMILY: Uuid = uuid!("95312123-e0c2-466d-b6b1-cb6e990d0d65");
pub const NO: Uuid = uuid!("b98a6ed4-77e7-4cee-aae2-81957fcd7f48");
pub const YES: Uuid = uuid!("b055abd8-a420-4a11-8b98-02ee170a7b54");
pub const COUGH_SYRUP: Uuid = uuid!("0cbe2ed3-cd5f-4f46-9459-26127c9265ab");
pub const UNKNOWN_REGIMEN: Uuid = uuid!("3d4a5b2f-7e61-4c0e-9a8b-1f2e3d4c5b6a");
pub const MALARIA: Uuid = uuid!("a09ab2c5-878e-4905-b25d-5784167d0216");
pub const TUBERCULOSIS: Uuid = uuid!("c8f3c1a4-2d7b-4e4f-8a1c-6b0f9e2d3a71");
pub const FEVER: Uuid = uuid!("d2a7c5e1-9b3f-4a60-8c4e-5f1a2b3c4d5e");
pub const HEADACHE: Uuid = uuid!("e5b8d6f2-0c4a-4b71-9d5f-6a2b3c4d5e6f");
pub const CIVIL_STATUS: Uuid = uuid!("89ca642a-dab6-4f20-b712-e12ca4fc6d36");
pub const MARRIED: Uuid = uuid!("92afda7c-78c9-47bd-a841-0de0817027d4");
pub const SINGLE: Uuid = uuid!("a4b5c6d7-e8f9-4a0b-8c1d-2e3f4a5b6c7d");
pub const SYSTOLIC: Uuid = uuid!("b6c7d8e9-f0a1-4b2c-9d3e-4f5a6b7c8d9e");
pub const DIASTOLIC: Uuid = uuid!("c7d8e9f0-a1b2-4c3d-8e4f-5a6b7c8d9e0f");
pub const VITAL_SIGNS: Uuid = uuid!("d8e9f0a1-b2c3-4d4e-9f5a-6b7c8d9e0f1a");
pub const PARACETAMOL: Uuid = uuid!("e9f0a1b2-c3d4-4e5f-8a6b-7c8d9e0f1a2b");

/// One row of the dictionary: uuid, english name, datatype, class.
const ENTRIES: &[(Uuid, &str, &str, &str)] = &[
    (ASPIRIN, "ASPIRIN", "N/A", "Drug"),
    (TREATMENT_STATUS, "TREATMENT STATUS", "Coded", "Question"),
    (CD4_COUNT, "CD4 COUNT", "Numeric", "Test"),
    (WEIGHT, "WEIGHT (KG)", "Numeric", "Test"),
    (HEIGHT, "HEIGHT (CM)", "Numeric", "Test"),
    (FOOD_ASSISTANCE, "FOOD ASSISTANCE", "Coded", "Question"),
    (FOOD_CONSTRUCT, "FOOD CONSTRUCT", "N/A", "ConvSet"),
    (FAVORITE_FOOD, "FAVORITE FOOD, NON-CODED", "Text", "Question"),
    (DAILY_MEAL_COUNT, "DAILY MEAL COUNT", "Numeric", "Question"),
    (FOOD_ASSISTANCE_FAMILY, "FOOD ASSISTANCE FOR ENTIRE FAMILY", "Coded", "Question"),
    (NO, "NO", "N/A", "Misc"),
    (YES, "YES", "N/A", "Misc"),
    (COUGH_SYRUP, "COUGH SYRUP", "N/A", "Drug"),
    (UNKNOWN_REGIMEN, "UNKNOWN REGIMEN", "N/A", "Misc"),
    (MALARIA, "MALARIA", "N/A", "Diagnosis"),
    (TUBERCULOSIS, "TUBERCULOSIS", "N/A", "Diagnosis"),
    (FEVER, "FEVER", "N/A", "Symptom"),
    (HEADACHE, "HEADACHE", "N/A", "Symptom"),
    (CIVIL_STATUS, "CIVIL STATUS", "Coded", "Question"),
    (MARRIED, "MARRIED", "N/A", "Misc"),
    (SINGLE, "SINGLE", "N/A", "Misc"),
    (SYSTOLIC, "SYSTOLIC BLOOD PRESSURE", "Numeric", "Test"),
    (DIASTOLIC, "DIASTOLIC BLOOD PRESSURE", "Numeric", "Test"),
    (VITAL_SIGNS, "VITAL SIGNS", "N/A", "ConvSet"),
    (PARACETAMOL, "PARACETAMOL", "N/A", "Drug"),
];

/// Deterministic id for the `index`-th name of a concept.
fn name_id(concept: Uuid, index: u128) -> Uuid {
    Uuid::from_u128(concept.as_u128().wrapping_add(index))
}

fn name(concept: Uuid, index: u128, text: &str, locale: &str) -> ConceptName {
    ConceptName {
        id: name_id(concept, index),
        ..ConceptName::new(text, Locale::new(locale))
    }
}

/// Build the demo dictionary in identity order.
///
/// # Errors
///
/// `Validation` if an entry names a datatype or class the standard
/// vocabulary lacks.
pub fn concepts() -> Result<Vec<Concept>, LexisError> {
    let vocab = Vocabulary::standard();
    let created = AuditInfo::created(crate::primitives::DEFAULT_ACTOR, Utc::now());

    let mut out = Vec::with_capacity(ENTRIES.len());
    for (id, text, datatype_name, class_name) in ENTRIES {
        let datatype = vocab.datatype(datatype_name).ok_or_else(|| {
            LexisError::Validation(format!(
                "demo entry {} has unknown datatype '{}'",
                text, datatype_name
            ))
        })?;
        let concept_class = vocab.concept_class(class_name).ok_or_else(|| {
            LexisError::Validation(format!(
                "demo entry {} has unknown class '{}'",
                text, class_name
            ))
        })?;
        out.push(Concept {
            id: ConceptId(*id),
            names: vec![ConceptName {
                name_type: Some(crate::ConceptNameType::FullySpecified),
                ..name(*id, 1, text, "en")
            }],
            datatype: datatype.clone(),
            concept_class: concept_class.clone(),
            version: None,
            retired: false,
            retire_reason: None,
            set_members: Vec::new(),
            answers: Vec::new(),
            audit: created.clone(),
        });
    }

    for concept in &mut out {
        let id = concept.id.uuid();
        match id {
            COUGH_SYRUP => concept.names.push(name(id, 2, "COUGH MEDICINE", "en")),
            PARACETAMOL => {
                concept.names.push(name(id, 2, "ACETAMINOPHEN", "en").preferred());
                concept.names.push(ConceptName {
                    name_type: Some(crate::ConceptNameType::FullySpecified),
                    ..name(id, 3, "PARACÉTAMOL", "fr")
                });
            }
            FOOD_CONSTRUCT => {
                concept.set_members = vec![ConceptId(FAVORITE_FOOD), ConceptId(DAILY_MEAL_COUNT)];
            }
            VITAL_SIGNS => concept.set_members = vec![ConceptId(SYSTOLIC), ConceptId(DIASTOLIC)],
            FOOD_ASSISTANCE | FOOD_ASSISTANCE_FAMILY => {
                concept.answers = vec![ConceptId(YES), ConceptId(NO)];
            }
            CIVIL_STATUS => concept.answers = vec![ConceptId(MARRIED), ConceptId(SINGLE)],
            TREATMENT_STATUS => concept.version = Some("1.0".to_string()),
            UNKNOWN_REGIMEN => {
                concept.retired = true;
                concept.retire_reason = Some("duplicate of TREATMENT STATUS".to_string());
                concept.audit.retired_by = Some(crate::primitives::DEFAULT_ACTOR.to_string());
                concept.audit.date_retired = Some(concept.audit.date_created);
            }
            _ => {}
        }
    }

    out.sort_by_key(|c| c.id);
    Ok(out)
}

/// An in-memory store holding the demo dictionary.
pub fn store() -> Result<MemoryStore, LexisError> {
    concepts().map(MemoryStore::from_concepts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_five_concepts_one_retired() {
        let all = concepts().expect("demo");
        assert_eq!(all.len(), 25);
        assert_eq!(all.iter().filter(|c| c.retired).count(), 1);
        assert!(all.iter().all(|c| c.validate().is_ok()));
    }

    #[test]
    fn references_resolve_within_dictionary() {
        let all = concepts().expect("demo");
        for concept in &all {
            for target in concept.set_members.iter().chain(&concept.answers) {
                assert!(all.iter().any(|c| c.id == *target), "dangling {}", target);
            }
        }
    }
}
