// Property-based tests for the men index and the reconciliation engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, HashMap};

use civreg_recon::engine::{apply_phase, build_index, build_table, reconcile, reset_phase};
use civreg_recon::model::{MaritalStatus, MarriageEvent, PersonId, PersonRecord};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_status() -> impl Strategy<Value = MaritalStatus> {
    prop_oneof![
        3 => Just(MaritalStatus::Single),
        2 => Just(MaritalStatus::Married),
        1 => "[A-Za-z ]{1,12}".prop_map(MaritalStatus::Other),
    ]
}

/// Small id range so duplicates are common.
fn arb_record() -> impl Strategy<Value = PersonRecord> {
    (0u64..200, "[A-Z][a-z]{0,8}", arb_status())
        .prop_map(|(id, last, status)| PersonRecord::new(PersonId(id), last, "N", status))
}

fn arb_records() -> impl Strategy<Value = Vec<PersonRecord>> {
    prop::collection::vec(arb_record(), 0..120)
}

/// Some events lack an id on one or both sides, like blank cells in the log.
fn arb_events() -> impl Strategy<Value = Vec<MarriageEvent>> {
    let side = || prop::option::weighted(0.9, (0u64..250).prop_map(PersonId));
    prop::collection::vec(
        (side(), side()).prop_map(|(female_id, male_id)| MarriageEvent { female_id, male_id }),
        0..60,
    )
}

/// First occurrence of each id, the reference model for first-write-wins.
fn first_writes(records: &[PersonRecord]) -> BTreeMap<PersonId, PersonRecord> {
    let mut model = BTreeMap::new();
    for r in records {
        model.entry(r.id).or_insert_with(|| r.clone());
    }
    model
}

fn statuses<'a>(records: impl IntoIterator<Item = &'a PersonRecord>) -> HashMap<PersonId, MaritalStatus> {
    records.into_iter().map(|r| (r.id, r.status.clone())).collect()
}

// ---------------------------------------------------------------------------
// Index properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn traversal_is_strictly_ascending(records in arb_records()) {
        let (index, _) = build_index(records);
        let ids: Vec<PersonId> = index.iter().map(|r| r.id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]), "not ascending: {ids:?}");
        prop_assert_eq!(ids.len(), index.len());
    }

    #[test]
    fn first_write_wins_and_lookup_is_exact(records in arb_records()) {
        let model = first_writes(&records);
        let (index, duplicates) = build_index(records.clone());

        prop_assert_eq!(index.len(), model.len());
        prop_assert_eq!(duplicates.len(), records.len() - model.len());
        for (id, expected) in &model {
            prop_assert_eq!(index.find_by_id(*id), Some(expected));
        }
        prop_assert_eq!(index.to_ordered_vec(), model.into_values().collect::<Vec<_>>());
    }

    #[test]
    fn never_inserted_ids_are_absent(records in arb_records(), probe in 200u64..400) {
        let (index, _) = build_index(records);
        prop_assert!(index.find_by_id(PersonId(probe)).is_none());
    }

    #[test]
    fn depth_is_bounded_by_size(records in arb_records()) {
        let (index, _) = build_index(records);
        prop_assert!(index.depth() <= index.len());
        if !index.is_empty() {
            let min_depth = (usize::BITS - index.len().leading_zeros()) as usize;
            prop_assert!(index.depth() >= min_depth);
        }
    }

    // -----------------------------------------------------------------------
    // Reconciliation properties
    // -----------------------------------------------------------------------

    #[test]
    fn reset_twice_equals_reset_once(men in arb_records(), women in arb_records()) {
        let (mut index, _) = build_index(men);
        let (mut table, _) = build_table(women);
        reset_phase(&mut index, &mut table);
        let men_once = index.to_ordered_vec();
        let women_once = table.to_vec();
        reset_phase(&mut index, &mut table);
        prop_assert_eq!(index.to_ordered_vec(), men_once);
        prop_assert_eq!(table.to_vec(), women_once);
    }

    #[test]
    fn married_iff_referenced_by_an_event(
        men in arb_records(),
        women in arb_records(),
        events in arb_events(),
    ) {
        let (mut index, _) = build_index(men);
        let (mut table, _) = build_table(women);
        prop_assume!(!index.is_empty());

        let outcome = reconcile(&mut index, &mut table, &events).unwrap();

        let grooms: Vec<PersonId> = events.iter().filter_map(|e| e.male_id).collect();
        let brides: Vec<PersonId> = events.iter().filter_map(|e| e.female_id).collect();
        for (id, status) in statuses(&index) {
            let expected = if grooms.contains(&id) { MaritalStatus::Married } else { MaritalStatus::Single };
            prop_assert_eq!(status, expected, "man {}", id);
        }
        for (id, status) in statuses(&table) {
            let expected = if brides.contains(&id) { MaritalStatus::Married } else { MaritalStatus::Single };
            prop_assert_eq!(status, expected, "woman {}", id);
        }
        prop_assert_eq!(
            outcome.women_updated + outcome.men_updated + outcome.misses.len(),
            events.len() * 2
        );
    }

    #[test]
    fn apply_phase_replay_is_idempotent(
        men in arb_records(),
        women in arb_records(),
        events in arb_events(),
    ) {
        let (mut index, _) = build_index(men);
        let (mut table, _) = build_table(women);
        reset_phase(&mut index, &mut table);
        let first = apply_phase(&mut index, &mut table, &events);
        let men_once = index.to_ordered_vec();
        let women_once = table.to_vec();

        let second = apply_phase(&mut index, &mut table, &events);
        prop_assert_eq!(index.to_ordered_vec(), men_once);
        prop_assert_eq!(table.to_vec(), women_once);
        prop_assert_eq!(first, second);
    }
}
