//! The dashboard roster: patient records with their current status, in arrival order.
//!
//! Entries are indexed by [`PatientId`] so the replace-or-append decision is a single lookup.
//! Entries are never removed, which keeps every stored position valid.

use intake_types::{PatientId, RosterEntry, StatusTag};
use std::collections::HashMap;

/// What a merge did to the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new identity was appended at the end.
    Inserted,
    /// An existing entry was overwritten in place.
    Replaced,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RosterCounts {
    pub total: usize,
    pub submitted: usize,
    pub filling: usize,
    pub inactive: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    index: HashMap<PatientId, usize>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a roster by merging `entries` in order.
    pub fn from_entries(entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        let mut roster = Self::new();
        for entry in entries {
            roster.merge(entry);
        }
        roster
    }

    /// Last write wins: an entry with a known id replaces the stored entry wholesale (no
    /// field-level merge) and keeps its position; an unknown id is appended.
    pub fn merge(&mut self, entry: RosterEntry) -> MergeOutcome {
        match self.index.get(&entry.record.id) {
            Some(&pos) => {
                self.entries[pos] = entry;
                MergeOutcome::Replaced
            }
            None => {
                self.index
                    .insert(entry.record.id.clone(), self.entries.len());
                self.entries.push(entry);
                MergeOutcome::Inserted
            }
        }
    }

    pub fn get(&self, id: &PatientId) -> Option<&RosterEntry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries eligible for the persisted mirror, in roster order.
    pub fn persisted(&self) -> Vec<&RosterEntry> {
        self.entries
            .iter()
            .filter(|e| e.status.is_persisted())
            .collect()
    }

    pub fn counts(&self) -> RosterCounts {
        let count = |tag: StatusTag| self.entries.iter().filter(|e| e.status == tag).count();
        RosterCounts {
            total: self.entries.len(),
            submitted: count(StatusTag::Submitted),
            filling: count(StatusTag::Filling),
            inactive: count(StatusTag::Inactive),
        }
    }
}
