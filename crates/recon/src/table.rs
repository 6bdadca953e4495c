//! Direct-access table over the women registry.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::model::{InsertOutcome, MaritalStatus, PersonId, PersonRecord};

/// Id → record map that enumerates in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DirectTable {
    slots: HashMap<PersonId, usize>,
    records: Vec<PersonRecord>,
}

impl DirectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First write wins, same as the men index.
    pub fn insert(&mut self, record: PersonRecord) -> InsertOutcome {
        if self.slots.contains_key(&record.id) {
            return InsertOutcome::Duplicate;
        }
        self.slots.insert(record.id, self.records.len());
        self.records.push(record);
        InsertOutcome::Inserted
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn find_by_id(&self, id: PersonId) -> Option<&PersonRecord> {
        self.slots.get(&id).map(|&slot| &self.records[slot])
    }

    pub fn find_by_id_mut(&mut self, id: PersonId) -> Option<&mut PersonRecord> {
        self.slots.get(&id).map(|&slot| &mut self.records[slot])
    }

    /// Overwrite one record's status. Absent ids leave the table untouched.
    pub fn set_status(&mut self, id: PersonId, status: MaritalStatus) -> Result<(), RegistryError> {
        let record = self.find_by_id_mut(id).ok_or(RegistryError::NotFound {
            registry: "women",
            id,
        })?;
        record.status = status;
        Ok(())
    }

    pub fn update_status_all(&mut self, status: &MaritalStatus) {
        for record in &mut self.records {
            record.status = status.clone();
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PersonRecord> {
        self.records.iter()
    }

    /// Snapshot of every record in insertion order.
    pub fn to_vec(&self) -> Vec<PersonRecord> {
        self.records.clone()
    }
}

impl Extend<PersonRecord> for DirectTable {
    fn extend<I: IntoIterator<Item = PersonRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}

impl FromIterator<PersonRecord> for DirectTable {
    fn from_iter<I: IntoIterator<Item = PersonRecord>>(records: I) -> Self {
        let mut table = Self::new();
        table.extend(records);
        table
    }
}

impl<'a> IntoIterator for &'a DirectTable {
    type Item = &'a PersonRecord;
    type IntoIter = std::slice::Iter<'a, PersonRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
