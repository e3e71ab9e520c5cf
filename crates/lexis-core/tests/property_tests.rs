//! # Property-Based Tests
//!
//! Invariants of resolution, projection, membership and listing, checked
//! over generated dictionaries with proptest.

use lexis_core::{
    ConceptId, ConceptPatch, Field, LexisError, MemoryStore, NameSpec, NewConcept, Representation,
    RequestContext, SearchFilter, SearchOptions, Session, Window,
};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn spec(name: &str) -> NewConcept {
    NewConcept {
        names: vec![NameSpec::fully_specified(name)],
        datatype: "N/A".to_string(),
        concept_class: "Misc".to_string(),
        ..NewConcept::default()
    }
}

/// Create one concept per name, in order.
fn seeded(names: &BTreeSet<String>) -> (Session, Vec<ConceptId>) {
    let mut session = Session::with_store(MemoryStore::new());
    let ctx = RequestContext::default();
    let ids = names
        .iter()
        .map(|n| session.create(&ctx, spec(n)).expect("create").id)
        .collect();
    (session, ids)
}

fn all() -> Window {
    Window {
        start_index: 0,
        limit: usize::MAX,
    }
}

fn name_set(max: usize) -> impl Strategy<Value = BTreeSet<String>> {
    btree_set("[A-Z]{3,10}", 1..max)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A unique fully specified name resolves to the same concept as its uuid.
    #[test]
    fn name_and_uuid_resolve_alike(names in name_set(12)) {
        let (session, ids) = seeded(&names);
        for (name, id) in names.iter().zip(&ids) {
            let by_name = session.resolve(name).expect("by name");
            let by_uuid = session.resolve(&id.to_string()).expect("by uuid");
            prop_assert_eq!(by_name, by_uuid);
        }
    }

    /// Representation levels form a strict superset chain.
    #[test]
    fn projections_nest(names in name_set(6)) {
        let (session, ids) = seeded(&names);
        let ctx = RequestContext::default();
        for id in ids {
            let concept = session.get(id).expect("get");
            let fields = |level| -> BTreeSet<Field> {
                session
                    .project(&ctx, &concept, level)
                    .expect("project")
                    .present_fields()
                    .into_iter()
                    .collect()
            };
            let r = fields(Representation::Ref);
            let d = fields(Representation::Default);
            let f = fields(Representation::Full);
            prop_assert!(r.is_subset(&d) && r.len() < d.len());
            prop_assert!(d.is_subset(&f) && d.len() < f.len());
            prop_assert!(f.contains(&Field::AuditInfo));
        }
    }

    /// memberOf returns exactly the set's members.
    #[test]
    fn member_of_returns_exactly_members(
        names in name_set(15),
        picks in vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let (mut session, ids) = seeded(&names);
        let ctx = RequestContext::default();
        let owner = session.create(&ctx, spec("OWNER SET")).expect("create").id;

        let members: BTreeSet<ConceptId> = picks.iter().map(|i| *i.get(&ids)).collect();
        let tokens: Vec<String> = members.iter().map(ToString::to_string).collect();
        session.add_set_members(&ctx, owner, &tokens).expect("members");

        let page = session
            .search(&ctx, "", SearchFilter::MemberOf(owner), SearchOptions::default(), all())
            .expect("search");
        let found: BTreeSet<ConceptId> = page.results.iter().map(|c| c.id).collect();
        prop_assert_eq!(found, members);
    }

    /// Replacing members twice keeps only the second list.
    #[test]
    fn set_members_replace(
        names in name_set(10),
        first in vec(any::<prop::sample::Index>(), 0..5),
        second in vec(any::<prop::sample::Index>(), 0..5),
    ) {
        let (mut session, ids) = seeded(&names);
        let ctx = RequestContext::default();
        let owner = *ids.first().expect("at least one");

        let tokens = |picks: &[prop::sample::Index]| -> Vec<String> {
            let unique: BTreeSet<ConceptId> = picks.iter().map(|i| *i.get(&ids)).collect();
            unique.iter().map(ToString::to_string).collect()
        };
        session.add_set_members(&ctx, owner, &tokens(&first)).expect("first");
        let expected = tokens(&second);
        let updated = session.add_set_members(&ctx, owner, &expected).expect("second");

        let got: Vec<String> = updated.set_members.iter().map(ToString::to_string).collect();
        prop_assert_eq!(got, expected);
    }

    /// Active listing size is total minus retired.
    #[test]
    fn listing_excludes_retired(
        names in name_set(20),
        retire in vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let (mut session, ids) = seeded(&names);
        let ctx = RequestContext::default();
        let retired: BTreeSet<ConceptId> = retire.iter().map(|i| *i.get(&ids)).collect();
        for id in &retired {
            session.retire(&ctx, *id, "generated").expect("retire");
        }

        let counts = session.counts().expect("counts");
        let page = session.list(false, all()).expect("list");
        prop_assert_eq!(counts.total, ids.len());
        prop_assert_eq!(page.results.len(), counts.total - retired.len());
        prop_assert_eq!(counts.retired, retired.len());
    }

    /// Retire then purge: the concept is gone and the count drops by one.
    #[test]
    fn retire_then_purge(names in name_set(8), reason in "[a-z ]{1,40}[a-z]") {
        let (mut session, ids) = seeded(&names);
        let ctx = RequestContext::default();
        let id = ids[0];

        let retired = session.retire(&ctx, id, &reason).expect("retire");
        prop_assert!(retired.retired);
        prop_assert_eq!(retired.retire_reason.as_deref(), Some(reason.trim()));

        let before = session.counts().expect("counts").total;
        session.purge(id).expect("purge");
        prop_assert!(matches!(session.get(id), Err(LexisError::NotFound(_))));
        prop_assert_eq!(session.counts().expect("counts").total, before - 1);
    }

    /// A version-only patch changes nothing else.
    #[test]
    fn version_patch_is_partial(names in name_set(5), version in "[0-9]{1,3}\\.[0-9]{1,3}") {
        let (mut session, ids) = seeded(&names);
        let ctx = RequestContext::default();
        let before = session.get(ids[0]).expect("get");

        let patch = ConceptPatch { version: Some(version.clone()), ..ConceptPatch::default() };
        let after = session.update(&ctx, ids[0], patch).expect("update");

        prop_assert_eq!(after.version, Some(version));
        prop_assert_eq!(after.names, before.names);
        prop_assert_eq!(after.set_members, before.set_members);
        prop_assert_eq!(after.retired, before.retired);
    }
}
