use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::index::OrderedIndex;
use crate::model::{EventMiss, InsertOutcome, MaritalStatus, MarriageEvent, MissSide, PersonId, PersonRecord};
use crate::table::DirectTable;

/// Counters and misses from one apply phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub events: usize,
    pub women_updated: usize,
    pub men_updated: usize,
    pub misses: Vec<EventMiss>,
}

/// Recompute every marital status from the marriage log.
///
/// Reset phase: everyone in both registries becomes single, discarding any
/// earlier edits. Apply phase: for each event in order, the woman and the
/// man are marked married independently; a missing id on one side is
/// recorded as a miss and does not affect the other side.
///
/// Refuses to run on an empty men index, leaving the table untouched.
pub fn reconcile(
    index: &mut OrderedIndex,
    table: &mut DirectTable,
    events: &[MarriageEvent],
) -> Result<ReconcileOutcome, RegistryError> {
    if index.is_empty() {
        warn!("no men to reconcile, skipping");
        return Err(RegistryError::EmptyIndex);
    }

    reset_phase(index, table);
    let outcome = apply_phase(index, table, events);

    info!(
        events = outcome.events,
        women_updated = outcome.women_updated,
        men_updated = outcome.men_updated,
        misses = outcome.misses.len(),
        "marital status reconciled"
    );
    Ok(outcome)
}

pub fn reset_phase(index: &mut OrderedIndex, table: &mut DirectTable) {
    index.reset_all_to(&MaritalStatus::Single);
    table.update_status_all(&MaritalStatus::Single);
    debug!(men = index.len(), women = table.len(), "statuses reset to single");
}

/// Mark both participants of every event married. Replaying the same events
/// leaves the same statuses.
pub fn apply_phase(
    index: &mut OrderedIndex,
    table: &mut DirectTable,
    events: &[MarriageEvent],
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    for (event_index, event) in events.iter().enumerate() {
        outcome.events += 1;

        let bride_found = match event.female_id {
            Some(id) => table.set_status(id, MaritalStatus::Married).is_ok(),
            None => false,
        };
        if bride_found {
            outcome.women_updated += 1;
        } else {
            warn!(event = event_index, id = ?event.female_id, "bride not in women registry");
            outcome.misses.push(EventMiss {
                event_index,
                side: MissSide::Female,
                id: event.female_id,
            });
        }

        match event.male_id.and_then(|id| index.find_by_id_mut(id)) {
            Some(man) => {
                man.status = MaritalStatus::Married;
                outcome.men_updated += 1;
            }
            None => {
                warn!(event = event_index, id = ?event.male_id, "groom not in men registry");
                outcome.misses.push(EventMiss {
                    event_index,
                    side: MissSide::Male,
                    id: event.male_id,
                });
            }
        }
    }

    outcome
}

/// Build the men index in input order. Returns the ids that were dropped as
/// duplicates.
pub fn build_index(men: impl IntoIterator<Item = PersonRecord>) -> (OrderedIndex, Vec<PersonId>) {
    let mut index = OrderedIndex::new();
    let mut duplicates = Vec::new();
    for record in men {
        let id = record.id;
        if index.insert(record) == InsertOutcome::Duplicate {
            warn!(%id, "duplicate id in men registry, keeping first");
            duplicates.push(id);
        }
    }
    debug!(records = index.len(), depth = index.depth(), "men index built");
    (index, duplicates)
}

/// Build the women table in input order. Returns the ids that were dropped
/// as duplicates.
pub fn build_table(women: impl IntoIterator<Item = PersonRecord>) -> (DirectTable, Vec<PersonId>) {
    let mut table = DirectTable::new();
    let mut duplicates = Vec::new();
    for record in women {
        let id = record.id;
        if table.insert(record) == InsertOutcome::Duplicate {
            warn!(%id, "duplicate id in women registry, keeping first");
            duplicates.push(id);
        }
    }
    debug!(records = table.len(), "women table built");
    (table, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_partial_update;
    use crate::model::RecordUpdate;

    fn person(id: u64, status: MaritalStatus) -> PersonRecord {
        PersonRecord::new(PersonId(id), "Apellido", "Nombre", status)
    }

    fn event(female: u64, male: u64) -> MarriageEvent {
        MarriageEvent::pair(PersonId(female), PersonId(male))
    }

    fn stores() -> (OrderedIndex, DirectTable) {
        let (index, _) = build_index([person(1001, MaritalStatus::Single), person(1002, MaritalStatus::Single)]);
        let (table, _) = build_table([person(2001, MaritalStatus::Single)]);
        (index, table)
    }

    fn status_of_man(index: &OrderedIndex, id: u64) -> MaritalStatus {
        index.find_by_id(PersonId(id)).unwrap().status.clone()
    }

    fn status_of_woman(table: &DirectTable, id: u64) -> MaritalStatus {
        table.find_by_id(PersonId(id)).unwrap().status.clone()
    }

    #[test]
    fn marks_both_participants() {
        let (mut index, mut table) = stores();
        let outcome = reconcile(&mut index, &mut table, &[event(2001, 1002)]).unwrap();

        assert_eq!(status_of_man(&index, 1002), MaritalStatus::Married);
        assert_eq!(status_of_man(&index, 1001), MaritalStatus::Single);
        assert_eq!(status_of_woman(&table, 2001), MaritalStatus::Married);
        assert_eq!(outcome.events, 1);
        assert_eq!(outcome.women_updated, 1);
        assert_eq!(outcome.men_updated, 1);
        assert!(outcome.misses.is_empty());
    }

    #[test]
    fn miss_on_one_side_still_updates_the_other() {
        let (mut index, mut table) = stores();
        let outcome = reconcile(&mut index, &mut table, &[event(2001, 9999), event(8888, 1001)]).unwrap();

        assert_eq!(status_of_woman(&table, 2001), MaritalStatus::Married);
        assert_eq!(status_of_man(&index, 1001), MaritalStatus::Married);
        assert_eq!(status_of_man(&index, 1002), MaritalStatus::Single);
        assert_eq!(
            outcome.misses,
            vec![
                EventMiss { event_index: 0, side: MissSide::Male, id: Some(PersonId(9999)) },
                EventMiss { event_index: 1, side: MissSide::Female, id: Some(PersonId(8888)) },
            ]
        );
    }

    #[test]
    fn event_with_one_id_missing_marks_the_present_side() {
        let (mut index, mut table) = stores();
        let events = [
            MarriageEvent { female_id: None, male_id: Some(PersonId(1001)) },
            MarriageEvent { female_id: Some(PersonId(2001)), male_id: None },
        ];
        let outcome = reconcile(&mut index, &mut table, &events).unwrap();

        assert_eq!(status_of_man(&index, 1001), MaritalStatus::Married);
        assert_eq!(status_of_woman(&table, 2001), MaritalStatus::Married);
        assert_eq!(outcome.events, 2);
        assert_eq!(outcome.men_updated, 1);
        assert_eq!(outcome.women_updated, 1);
        assert_eq!(
            outcome.misses,
            vec![
                EventMiss { event_index: 0, side: MissSide::Female, id: None },
                EventMiss { event_index: 1, side: MissSide::Male, id: None },
            ]
        );
    }

    #[test]
    fn reset_overrides_manual_edit() {
        let (mut index, mut table) = stores();
        apply_partial_update(&mut index, PersonId(1001), &RecordUpdate::status(MaritalStatus::parse("Unión Libre")))
            .unwrap();
        assert_eq!(status_of_man(&index, 1001), MaritalStatus::Other("Unión Libre".into()));

        reconcile(&mut index, &mut table, &[event(2001, 1002)]).unwrap();
        assert_eq!(status_of_man(&index, 1001), MaritalStatus::Single);
    }

    #[test]
    fn prior_married_status_without_event_is_cleared() {
        let (mut index, _) = build_index([person(1, MaritalStatus::Married)]);
        let (mut table, _) = build_table([person(2, MaritalStatus::Married)]);
        reconcile(&mut index, &mut table, &[]).unwrap();
        assert_eq!(status_of_man(&index, 1), MaritalStatus::Single);
        assert_eq!(status_of_woman(&table, 2), MaritalStatus::Single);
    }

    #[test]
    fn replaying_events_is_idempotent() {
        let events = [event(2001, 1002), event(2001, 1002), event(7, 1001)];
        let (mut index, mut table) = stores();
        reset_phase(&mut index, &mut table);
        apply_phase(&mut index, &mut table, &events);
        let men_once = index.to_ordered_vec();
        let women_once = table.to_vec();

        apply_phase(&mut index, &mut table, &events);
        assert_eq!(index.to_ordered_vec(), men_once);
        assert_eq!(table.to_vec(), women_once);
    }

    #[test]
    fn empty_index_skips_everything() {
        let mut index = OrderedIndex::new();
        let (mut table, _) = build_table([person(2001, MaritalStatus::Married)]);
        let err = reconcile(&mut index, &mut table, &[event(2001, 1)]).unwrap_err();
        assert_eq!(err, RegistryError::EmptyIndex);
        assert_eq!(status_of_woman(&table, 2001), MaritalStatus::Married);
    }

    #[test]
    fn build_reports_duplicates() {
        let (index, dups) = build_index([
            person(5, MaritalStatus::Single),
            person(5, MaritalStatus::Married),
            person(6, MaritalStatus::Single),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(dups, vec![PersonId(5)]);
        assert_eq!(status_of_man(&index, 5), MaritalStatus::Single);
    }
}
