//! # Concept Resource Tests
//!
//! End-to-end behaviour of the engine over the demo dictionary
//! (25 concepts, one retired), driven through `Session` the way the
//! resource controller drives it.

use lexis_core::demo;
use lexis_core::{
    ConceptPatch, LexisError, Locale, NameSpec, NewConcept, Representation, RequestContext,
    SearchFilter, SearchOptions, Session, Window,
};
use uuid::Uuid;

fn session() -> Session {
    Session::with_store(demo::store().expect("demo"))
}

fn ctx() -> RequestContext {
    RequestContext::default()
}

fn uuids(page: &lexis_core::Page<lexis_core::Concept>) -> Vec<Uuid> {
    page.results.iter().map(|c| c.id.uuid()).collect()
}

// =============================================================================
// RETRIEVE
// =============================================================================

mod retrieve {
    use super::*;

    #[test]
    fn by_uuid() {
        let view = session()
            .retrieve(&ctx(), &demo::ASPIRIN.to_string(), None)
            .expect("retrieve");
        assert_eq!(view.uuid.uuid(), demo::ASPIRIN);
        let name = view.name.flatten().expect("default view has a name");
        assert_eq!(name.name, "ASPIRIN");
    }

    #[test]
    fn explicit_default_representation_rejected() {
        let err = session()
            .retrieve(&ctx(), &demo::ASPIRIN.to_string(), Some("default"))
            .expect_err("explicit default");
        assert!(matches!(err, LexisError::InvalidArgument(_)));
    }

    #[test]
    fn by_name() {
        let view = session()
            .retrieve(&ctx(), "TREATMENT STATUS", None)
            .expect("retrieve");
        assert_eq!(view.uuid.uuid(), demo::TREATMENT_STATUS);
        assert_eq!(
            view.name.flatten().map(|n| n.name),
            Some("TREATMENT STATUS".to_string())
        );
    }

    #[test]
    fn synonym_name_is_invalid_name_error() {
        let session = session();
        // The synonym belongs to a live concept
        let owner = session.get(demo::COUGH_SYRUP.into()).expect("get");
        assert!(!owner.retired);
        assert!(owner.names.iter().any(|n| n.name == "COUGH MEDICINE"));

        let err = session.resolve("COUGH MEDICINE").expect_err("synonym");
        assert!(matches!(err, LexisError::InvalidName(_)));
    }

    #[test]
    fn preferred_name_resolves() {
        let concept = session().resolve("acetaminophen").expect("preferred name");
        assert_eq!(concept.id.uuid(), demo::PARACETAMOL);
    }

    #[test]
    fn full_representation_has_audit_info() {
        let view = session()
            .retrieve(&ctx(), &demo::FOOD_ASSISTANCE.to_string(), Some("full"))
            .expect("retrieve");
        assert!(view.audit_info.is_some());
        let answers = view.answers.expect("full view lists answers");
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].display, "YES");
    }

    #[test]
    fn retired_concept_still_retrievable_by_uuid() {
        let view = session()
            .retrieve(&ctx(), &demo::UNKNOWN_REGIMEN.to_string(), Some("full"))
            .expect("retrieve");
        assert_eq!(view.retired, Some(true));
        assert!(matches!(
            session().resolve("UNKNOWN REGIMEN"),
            Err(LexisError::NotFound(_))
        ));
    }

    #[test]
    fn french_locale_display() {
        let fr = RequestContext::new(lexis_core::Locale::new("fr"), "admin");
        let view = session()
            .retrieve(&fr, &demo::PARACETAMOL.to_string(), Some("ref"))
            .expect("retrieve");
        assert_eq!(view.display, "PARACÉTAMOL");
    }
}

// =============================================================================
// LIST
// =============================================================================

mod list {
    use super::*;

    #[test]
    fn lists_only_unretired() {
        let session = session();
        let total = session.counts().expect("counts").total;
        let page = session.list(false, Window { start_index: 0, limit: 100 }).expect("list");

        assert_eq!(total, 25);
        assert_eq!(page.results.len(), 24);
        assert_eq!(page.total_count, 24);
        assert!(page.results.iter().all(|c| !c.retired));
    }

    #[test]
    fn include_all_counts_retired() {
        let page = session()
            .list(true, Window { start_index: 0, limit: 100 })
            .expect("list");
        assert_eq!(page.total_count, 25);
    }

    #[test]
    fn ref_by_default_and_default_on_request() {
        let session = session();
        let page = session.list(false, Window::default()).expect("list");
        let first = &page.results[0];

        let level = Representation::for_listing(None).expect("level");
        let view = session.project(&ctx(), first, level).expect("project");
        assert!(view.datatype.is_none());

        let level = Representation::for_listing(Some("default")).expect("level");
        let view = session.project(&ctx(), first, level).expect("project");
        assert!(view.datatype.is_some());
    }

    #[test]
    fn paging_windows_are_stable() {
        let session = session();
        let first = session.list(false, Window { start_index: 0, limit: 10 }).expect("list");
        let second = session.list(false, Window { start_index: 10, limit: 10 }).expect("list");
        let third = session.list(false, Window { start_index: 20, limit: 10 }).expect("list");

        assert!(first.has_more && second.has_more && !third.has_more);
        assert_eq!(third.results.len(), 4);

        let mut all = uuids(&first);
        all.extend(uuids(&second));
        all.extend(uuids(&third));
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn create_concept() {
        let mut session = session();
        let before = session.counts().expect("counts").total;
        let spec = NewConcept {
            names: vec![NameSpec {
                name: "test concept".into(),
                locale: Some("en".into()),
                concept_name_type: Some("FULLY_SPECIFIED".into()),
                locale_preferred: false,
            }],
            datatype: "8d4a4c94-c2cc-11de-8d13-0010c6dffd0f".into(),
            concept_class: "Diagnosis".into(),
            ..NewConcept::default()
        };

        let created = session.create(&ctx(), spec).expect("create");
        assert!(!created.id.uuid().is_nil());
        assert_eq!(session.counts().expect("counts").total, before + 1);
    }

    #[test]
    fn edit_fully_specified_name() {
        let mut session = session();
        let patch = ConceptPatch {
            name: Some("TESTING NAME".into()),
            ..ConceptPatch::default()
        };
        session
            .update(&ctx(), demo::CD4_COUNT.into(), patch)
            .expect("update");

        let updated = session.get(demo::CD4_COUNT.into()).expect("get");
        assert_eq!(
            updated
                .fully_specified_name(&ctx().locale)
                .map(|n| n.name.as_str()),
            Some("TESTING NAME")
        );
        // The index follows the rename
        assert_eq!(session.resolve("TESTING NAME").expect("resolve").id, updated.id);
        assert!(session.resolve("CD4 COUNT").is_err());
    }

    #[test]
    fn edit_fully_specified_name_from_regional_locale() {
        let mut session = session();
        let en_gb = RequestContext::new(Locale::new("en_GB"), "admin");
        let patch = ConceptPatch {
            name: Some("TESTING NAME".into()),
            ..ConceptPatch::default()
        };
        let updated = session
            .update(&en_gb, demo::CD4_COUNT.into(), patch)
            .expect("update");

        let fully_specified: Vec<&str> = updated
            .names
            .iter()
            .filter(|n| n.is_fully_specified())
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(fully_specified, vec!["TESTING NAME"]);
        assert_eq!(updated.names[0].locale, Locale::new("en"));
        assert!(session.resolve("CD4 COUNT").is_err());
    }

    #[test]
    fn set_answers_replaces_list() {
        let mut session = session();
        let answers = vec![demo::NO.to_string()];
        let updated = session
            .set_answers(&ctx(), demo::FOOD_ASSISTANCE.into(), &answers)
            .expect("answers");
        assert_eq!(
            updated.answers.iter().map(|id| id.uuid()).collect::<Vec<_>>(),
            vec![demo::NO]
        );

        let err = session
            .set_answers(
                &ctx(),
                demo::FOOD_ASSISTANCE.into(),
                &[demo::YES.to_string(), Uuid::new_v4().to_string()],
            )
            .expect_err("unknown answer");
        assert!(matches!(err, LexisError::Validation(_)));
        let unchanged = session.get(demo::FOOD_ASSISTANCE.into()).expect("get");
        assert_eq!(unchanged.answers, updated.answers);
    }

    #[test]
    fn edit_version() {
        let mut session = session();
        let before = session.get(demo::CD4_COUNT.into()).expect("get");
        let patch = ConceptPatch {
            version: Some("1.2.3".into()),
            ..ConceptPatch::default()
        };
        let updated = session
            .update(&ctx(), demo::CD4_COUNT.into(), patch)
            .expect("update");

        assert_eq!(updated.version.as_deref(), Some("1.2.3"));
        assert_eq!(updated.names, before.names);
        assert_eq!(updated.datatype, before.datatype);
        assert_eq!(updated.concept_class, before.concept_class);
    }

    #[test]
    fn update_unknown_uuid_not_found() {
        let mut session = session();
        let err = session
            .update(&ctx(), Uuid::nil().into(), ConceptPatch::default())
            .expect_err("missing");
        assert!(matches!(err, LexisError::NotFound(_)));
    }

    #[test]
    fn retire_concept() {
        let mut session = session();
        assert!(!session.get(demo::WEIGHT.into()).expect("get").retired);

        session
            .retire(&ctx(), demo::WEIGHT.into(), "really ridiculous random reason")
            .expect("retire");

        let concept = session.get(demo::WEIGHT.into()).expect("get");
        assert!(concept.retired);
        assert_eq!(
            concept.retire_reason.as_deref(),
            Some("really ridiculous random reason")
        );
        assert_eq!(session.counts().expect("counts").retired, 2);
    }

    #[test]
    fn purge_concept() {
        let mut session = session();
        let before = session.counts().expect("counts").total;

        session.purge(demo::HEIGHT.into()).expect("purge");

        assert!(matches!(
            session.get(demo::HEIGHT.into()),
            Err(LexisError::NotFound(_))
        ));
        assert_eq!(session.counts().expect("counts").total, before - 1);
    }

    #[test]
    fn purge_referenced_answer_conflicts() {
        let mut session = session();
        let err = session.purge(demo::NO.into()).expect_err("referenced");
        assert!(matches!(err, LexisError::Conflict(_)));
        assert!(session.get(demo::NO.into()).is_ok());
    }

    #[test]
    fn add_set_members() {
        let mut session = session();
        let members = vec![
            demo::FOOD_ASSISTANCE.to_string(),
            demo::DAILY_MEAL_COUNT.to_string(),
        ];
        session
            .add_set_members(&ctx(), demo::COUGH_SYRUP.into(), &members)
            .expect("members");

        let concept = session.get(demo::COUGH_SYRUP.into()).expect("get");
        assert_eq!(concept.set_members.len(), 2);
        assert_eq!(
            concept.set_members.iter().map(|id| id.uuid()).collect::<Vec<_>>(),
            vec![demo::FOOD_ASSISTANCE, demo::DAILY_MEAL_COUNT]
        );
    }

    #[test]
    fn update_set_members_replaces() {
        let mut session = session();
        let patch = ConceptPatch {
            set_members: Some(vec![demo::SYSTOLIC.to_string()]),
            ..ConceptPatch::default()
        };
        let updated = session
            .update(&ctx(), demo::VITAL_SIGNS.into(), patch)
            .expect("update");
        assert_eq!(updated.set_members.len(), 1);
    }
}

// =============================================================================
// SEARCH
// =============================================================================

mod search {
    use super::*;

    fn search(session: &Session, q: &str, filter: SearchFilter) -> Vec<Uuid> {
        let page = session
            .search(&ctx(), q, filter, SearchOptions::default(), Window::default())
            .expect("search");
        uuids(&page)
    }

    #[test]
    fn matches_query_string_in_rank_order() {
        let hits = search(&session(), "food", SearchFilter::None);
        assert_eq!(
            hits,
            vec![
                demo::FOOD_ASSISTANCE,
                demo::FOOD_ASSISTANCE_FAMILY,
                demo::FOOD_CONSTRUCT,
                demo::FAVORITE_FOOD,
            ]
        );
    }

    #[test]
    fn exact_match_ranks_first() {
        let hits = search(&session(), "food construct", SearchFilter::None);
        assert_eq!(hits, vec![demo::FOOD_CONSTRUCT]);
    }

    #[test]
    fn members_of_concept() {
        let filter = SearchFilter::from_params(Some(&demo::FOOD_CONSTRUCT.to_string()), None)
            .expect("filter");
        assert_eq!(search(&session(), "no", filter), vec![demo::FAVORITE_FOOD]);
    }

    #[test]
    fn answers_to_concept() {
        let filter =
            SearchFilter::from_params(None, Some(&demo::FOOD_ASSISTANCE_FAMILY.to_string()))
                .expect("filter");
        assert_eq!(search(&session(), "no", filter), vec![demo::NO]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(search(&session(), "zebra", SearchFilter::None).is_empty());
    }

    #[test]
    fn repeated_searches_identical() {
        let session = session();
        let first = search(&session, "", SearchFilter::None);
        let second = search(&session, "", SearchFilter::None);
        assert_eq!(first.len(), 24);
        assert_eq!(first, second);
    }
}
