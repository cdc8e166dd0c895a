//! Keyed store of the tables visible to one viewer
//!
//! Tables arrive from two independent sources: live broadcasts and one-time
//! snapshots (the REST pending list and the `get_active_tables` ack). Every
//! update is keyed by table id so applying the same event twice is harmless,
//! and live state always wins over snapshot state.

use crate::lobby::visibility::is_visible_to;
use crate::types::{TableId, TableSummary, UserId};
use std::collections::HashSet;
use tracing::debug;

/// Where the current copy of a table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Snapshot,
    Event,
}

#[derive(Debug, Clone)]
struct BoardEntry {
    table: TableSummary,
    source: EntrySource,
}

/// Visible tables for a single viewer, in arrival order
#[derive(Debug, Clone)]
pub struct TableBoard {
    viewer: UserId,
    entries: Vec<BoardEntry>,
    /// Ids removed by a live event; snapshots may not bring these back.
    ///
    /// Only a live `table_created` clears an id, so this grows with the number
    /// of tables removed during the session. The REST list and the
    /// `get_active_tables` ack each cover only part of the lobby, so an id
    /// missing from one snapshot says nothing about the other.
    removed: HashSet<TableId>,
}

impl TableBoard {
    pub fn new(viewer: impl Into<UserId>) -> Self {
        Self {
            viewer: viewer.into(),
            entries: Vec::new(),
            removed: HashSet::new(),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.table.id == id)
    }

    /// Apply a `table_created` broadcast. Returns whether the table is now listed.
    ///
    /// The visibility predicate is applied here regardless of any filtering
    /// the server already did. A repeated id replaces the earlier entry.
    pub fn apply_created(&mut self, table: TableSummary) -> bool {
        if !is_visible_to(&table, &self.viewer) {
            debug!(
                "Dropping private table '{}' not visible to '{}'",
                table.id, self.viewer
            );
            // The latest state hides it, so an older visible copy must go too
            if let Some(index) = self.position(&table.id) {
                self.entries.remove(index);
            }
            return false;
        }

        self.removed.remove(&table.id);
        let entry = BoardEntry {
            table,
            source: EntrySource::Event,
        };
        match self.position(&entry.table.id) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
        true
    }

    /// Apply a `table_updated` broadcast. Returns whether the table is listed
    /// afterwards.
    ///
    /// Unknown ids are ignored. An update that hides the table from the viewer
    /// (made private without inviting them) removes the existing entry.
    pub fn apply_updated(&mut self, table: TableSummary) -> bool {
        let Some(index) = self.position(&table.id) else {
            debug!("Ignoring update for unknown table '{}'", table.id);
            return false;
        };

        if !is_visible_to(&table, &self.viewer) {
            debug!(
                "Table '{}' is no longer visible to '{}'",
                table.id, self.viewer
            );
            self.entries.remove(index);
            return false;
        }

        self.entries[index] = BoardEntry {
            table,
            source: EntrySource::Event,
        };
        true
    }

    /// Apply a `table_removed` broadcast. Returns whether anything was removed.
    pub fn apply_removed(&mut self, id: &str) -> bool {
        self.removed.insert(id.to_string());
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Merge a one-time snapshot. Returns the number of tables added or refreshed.
    ///
    /// Snapshot entries never replace live entries and never bring back a
    /// table removed by a live event.
    pub fn merge_snapshot(&mut self, tables: impl IntoIterator<Item = TableSummary>) -> usize {
        let mut merged = 0;
        for table in tables {
            if self.removed.contains(&table.id) || !is_visible_to(&table, &self.viewer) {
                continue;
            }
            match self.position(&table.id) {
                Some(index) if self.entries[index].source == EntrySource::Event => {}
                Some(index) => {
                    self.entries[index].table = table;
                    merged += 1;
                }
                None => {
                    self.entries.push(BoardEntry {
                        table,
                        source: EntrySource::Snapshot,
                    });
                    merged += 1;
                }
            }
        }
        merged
    }

    pub fn get(&self, id: &str) -> Option<&TableSummary> {
        self.entries
            .iter()
            .find(|entry| entry.table.id == id)
            .map(|entry| &entry.table)
    }

    pub fn source_of(&self, id: &str) -> Option<EntrySource> {
        self.entries
            .iter()
            .find(|entry| entry.table.id == id)
            .map(|entry| entry.source)
    }

    pub fn tables(&self) -> Vec<TableSummary> {
        self.entries.iter().map(|entry| entry.table.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
