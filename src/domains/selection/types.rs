use crate::types::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What happens to the selection when the record store is reloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReloadPolicy {
    /// Start over with nothing selected
    #[default]
    Clear,
    /// Keep only the picks whose id survived the reload
    Intersect,
}

/// Records the user has marked, keyed by id.
///
/// Membership is by id, never by object identity: a record reloaded with the
/// same id counts as the same record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    records: Vec<Record>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the record if its id is selected, otherwise adds a copy.
    /// Returns whether the record is selected afterwards.
    pub fn toggle(&mut self, record: &Record) -> bool {
        match self.position(record.id()) {
            Some(index) => {
                self.records.remove(index);
                false
            }
            None => {
                self.records.push(record.clone());
                true
            }
        }
    }

    /// Toggles the record with `id` out of `records`. Ids that are not in
    /// `records` leave the selection untouched and yield `None`.
    pub fn toggle_id(&mut self, id: &RecordId, records: &[Record]) -> Option<bool> {
        let record = records.iter().find(|r| r.id() == id)?;
        Some(self.toggle(record))
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Selected ids in insertion order
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id().clone()).collect()
    }

    pub fn id_set(&self) -> HashSet<RecordId> {
        self.records.iter().map(|r| r.id().clone()).collect()
    }

    /// Drops picks whose id is gone from `records` and refreshes the kept
    /// copies with the current versions.
    pub fn retain_existing(&mut self, records: &[Record]) {
        self.records = self
            .records
            .iter()
            .filter_map(|picked| records.iter().find(|r| r.id() == picked.id()).cloned())
            .collect();
    }

    /// The selected records, in the order they appear in `records`
    pub fn ordered_in<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let ids = self.id_set();
        records.iter().filter(|r| ids.contains(r.id())).collect()
    }

    /// Applies the reload policy against the freshly loaded records.
    pub fn on_reload(&mut self, policy: SelectionReloadPolicy, records: &[Record]) {
        match policy {
            SelectionReloadPolicy::Clear => self.clear(),
            SelectionReloadPolicy::Intersect => self.retain_existing(records),
        }
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            Record::new(1).with("name", "Juan"),
            Record::new(2).with("name", "María"),
            Record::new(3).with("name", "Carlos"),
        ]
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let data = records();
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(&data[1]));
        assert!(selection.is_selected(&RecordId::Int(2)));
        assert!(!selection.toggle(&data[1]));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_double_toggle_restores_id_set() {
        let data = records();
        let mut selection = SelectionSet::new();
        selection.toggle(&data[0]);
        selection.toggle(&data[2]);
        let before = selection.id_set();

        selection.toggle_id(&RecordId::Int(2), &data);
        selection.toggle_id(&RecordId::Int(2), &data);
        assert_eq!(selection.id_set(), before);

        selection.toggle_id(&RecordId::Int(1), &data);
        selection.toggle_id(&RecordId::Int(1), &data);
        assert_eq!(selection.id_set(), before);
    }

    #[test]
    fn test_membership_is_by_id() {
        let data = records();
        let mut selection = SelectionSet::new();
        selection.toggle(&data[0]);

        let reloaded = Record::new(1).with("name", "Juan Pérez");
        assert!(selection.is_selected(reloaded.id()));
        assert!(!selection.toggle(&reloaded));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let data = records();
        let mut selection = SelectionSet::new();
        assert_eq!(selection.toggle_id(&RecordId::Int(42), &data), None);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_ordered_in_follows_store_order() {
        let data = records();
        let mut selection = SelectionSet::new();
        selection.toggle(&data[2]);
        selection.toggle(&data[0]);
        assert_eq!(selection.ids(), vec![RecordId::Int(3), RecordId::Int(1)]);

        let ordered: Vec<&RecordId> = selection.ordered_in(&data).into_iter().map(|r| r.id()).collect();
        assert_eq!(ordered, vec![&RecordId::Int(1), &RecordId::Int(3)]);
    }

    #[test]
    fn test_reload_policies() {
        let data = records();
        let mut selection = SelectionSet::new();
        selection.toggle(&data[0]);
        selection.toggle(&data[1]);

        let reloaded = vec![Record::new(2).with("name", "María José"), Record::new(4)];
        let mut intersected = selection.clone();
        intersected.on_reload(SelectionReloadPolicy::Intersect, &reloaded);
        assert_eq!(intersected.ids(), vec![RecordId::Int(2)]);
        assert_eq!(intersected.ordered_in(&reloaded)[0].get("name").unwrap().as_str(), Some("María José"));

        selection.on_reload(SelectionReloadPolicy::Clear, &reloaded);
        assert!(selection.is_empty());
    }
}
