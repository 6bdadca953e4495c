use tracing::debug;

use crate::error::RegistryError;
use crate::index::OrderedIndex;
use crate::model::{PersonId, PersonRecord, RecordUpdate};

/// Overwrite the fields present in `update` on the man with `id`.
///
/// The tree is never restructured: `RecordUpdate` has no key field, so the
/// node stays where it is. Fails with `EmptyIndex` before any lookup when
/// the index has no root, and with `NotFound` when the id is absent.
pub fn apply_partial_update<'a>(
    index: &'a mut OrderedIndex,
    id: PersonId,
    update: &RecordUpdate,
) -> Result<&'a PersonRecord, RegistryError> {
    if index.is_empty() {
        return Err(RegistryError::EmptyIndex);
    }

    let record = index
        .find_by_id_mut(id)
        .ok_or(RegistryError::NotFound { registry: "men", id })?;
    update.apply_to(record);

    debug!(%id, status = %record.status, "men record edited");
    Ok(&*record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaritalStatus;

    fn index() -> OrderedIndex {
        [(1002, "Gómez"), (1001, "Pérez"), (1003, "Díaz")]
            .into_iter()
            .map(|(id, last)| PersonRecord::new(PersonId(id), last, "Juan", MaritalStatus::Single))
            .collect()
    }

    #[test]
    fn edits_only_present_fields() {
        let mut index = index();
        let update = RecordUpdate {
            first_name: Some("Pedro".into()),
            ..RecordUpdate::default()
        };
        let edited = apply_partial_update(&mut index, PersonId(1001), &update).unwrap();
        assert_eq!(edited.first_name, "Pedro");
        assert_eq!(edited.last_name, "Pérez");
        assert_eq!(edited.status, MaritalStatus::Single);
    }

    #[test]
    fn unknown_id_is_not_found_and_changes_nothing() {
        let mut index = index();
        let before = index.to_ordered_vec();
        let err = apply_partial_update(&mut index, PersonId(4242), &RecordUpdate::status(MaritalStatus::Married))
            .unwrap_err();
        assert_eq!(err, RegistryError::NotFound { registry: "men", id: PersonId(4242) });
        assert_eq!(index.to_ordered_vec(), before);
    }

    #[test]
    fn empty_index_is_reported() {
        let mut index = OrderedIndex::new();
        let err = apply_partial_update(&mut index, PersonId(1), &RecordUpdate::default()).unwrap_err();
        assert_eq!(err, RegistryError::EmptyIndex);
    }

    #[test]
    fn edit_keeps_traversal_order() {
        let mut index = index();
        apply_partial_update(&mut index, PersonId(1002), &RecordUpdate::status(MaritalStatus::parse("Unión Libre")))
            .unwrap();
        let ids: Vec<u64> = index.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1001, 1002, 1003]);
    }
}
