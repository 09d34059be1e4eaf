//! In-memory particle table loaded from a `gen1` tree.
//!
//! A [`ParticleTable`] owns every [`ParticleRecord`] of a file and remembers the
//! distinct event identifiers in the order they were first seen. Events are
//! exposed as borrowed [`Event`] views so reports never copy records.

mod track;

pub use track::{HitSample, TrackRecord, TrackTable};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One simulated particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub event_id: i64,
    /// Simulation track id, `-1` when none was assigned.
    pub sim_id: i64,
    pub pdg_code: i32,
    /// 1 = primary.
    pub generation: i32,
    /// GeV.
    pub energy: f64,
    pub is_simulated: bool,
    pub is_reconstructed: bool,
}

impl Default for ParticleRecord {
    fn default() -> Self {
        Self {
            event_id: 0,
            sim_id: NO_SIM_ID,
            pdg_code: 0,
            generation: 1,
            energy: 0.0,
            is_simulated: true,
            is_reconstructed: false,
        }
    }
}

/// Marker for records without a simulation id.
pub const NO_SIM_ID: i64 = -1;

#[derive(Debug, Clone, Default)]
struct EventIndex {
    rows: Vec<usize>,
    neutrino_pdg: Option<i32>,
}

/// All particle records of one file, grouped by event.
#[derive(Debug, Clone, Default)]
pub struct ParticleTable {
    records: Vec<ParticleRecord>,
    events: IndexMap<i64, EventIndex>,
}

/// Borrowed view of one event.
#[derive(Debug, Clone)]
pub struct Event<'a> {
    /// Zero-based position in the table's event order.
    pub ordinal: usize,
    pub event_id: i64,
    pub neutrino_pdg: Option<i32>,
    pub particles: Vec<&'a ParticleRecord>,
}

impl ParticleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from loose records, grouping them by `event_id`.
    pub fn from_records(records: impl IntoIterator<Item = ParticleRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.push_particle(record);
        }
        table
    }

    /// Registers an event and appends its particles.
    ///
    /// The `event_id` of each particle is overwritten with `event_id`. Calling this
    /// again for a known id appends to that event; the first neutrino code wins.
    pub fn push_event(
        &mut self,
        event_id: i64,
        neutrino_pdg: Option<i32>,
        particles: impl IntoIterator<Item = ParticleRecord>,
    ) {
        let entry = self.events.entry(event_id).or_default();
        if entry.neutrino_pdg.is_none() {
            entry.neutrino_pdg = neutrino_pdg;
        }
        for mut particle in particles {
            particle.event_id = event_id;
            entry.rows.push(self.records.len());
            self.records.push(particle);
        }
    }

    /// Appends one particle to the event named by its `event_id`.
    pub fn push_particle(&mut self, particle: ParticleRecord) {
        let event_id = particle.event_id;
        self.push_event(event_id, None, std::iter::once(particle));
    }

    /// Sets the neutrino code of an event if it has none yet.
    pub fn set_neutrino(&mut self, event_id: i64, neutrino_pdg: i32) {
        let entry = self.events.entry(event_id).or_default();
        entry.neutrino_pdg.get_or_insert(neutrino_pdg);
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    /// Distinct event ids in first-seen order.
    pub fn event_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.events.keys().copied()
    }

    /// Returns the event at `ordinal`, or `None` past the end.
    pub fn event(&self, ordinal: usize) -> Option<Event<'_>> {
        let (&event_id, index) = self.events.get_index(ordinal)?;
        Some(Event {
            ordinal,
            event_id,
            neutrino_pdg: index.neutrino_pdg,
            particles: index.rows.iter().map(|&row| &self.records[row]).collect(),
        })
    }

    /// Returns the ordinal of the event with the given id.
    pub fn position_of(&self, event_id: i64) -> Option<usize> {
        self.events.get_index_of(&event_id)
    }

    pub fn events(&self) -> impl Iterator<Item = Event<'_>> + '_ {
        (0..self.event_count()).filter_map(|ordinal| self.event(ordinal))
    }
}

impl Event<'_> {
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(event_id: i64, pdg_code: i32) -> ParticleRecord {
        ParticleRecord {
            event_id,
            pdg_code,
            ..ParticleRecord::default()
        }
    }

    #[test]
    fn test_from_records_groups_by_event_in_first_seen_order() {
        let table = ParticleTable::from_records(vec![
            particle(7, 13),
            particle(3, 211),
            particle(7, 2212),
        ]);

        assert_eq!(table.event_count(), 2);
        assert_eq!(table.record_count(), 3);
        assert_eq!(table.event_ids().collect::<Vec<_>>(), vec![7, 3]);

        let first = table.event(0).unwrap();
        assert_eq!(first.event_id, 7);
        let codes: Vec<i32> = first.particles.iter().map(|p| p.pdg_code).collect();
        assert_eq!(codes, vec![13, 2212]);
    }

    #[test]
    fn test_push_event_keeps_empty_events_and_first_neutrino() {
        let mut table = ParticleTable::new();
        table.push_event(1, Some(16), Vec::new());
        table.push_event(1, Some(14), vec![particle(99, 13)]);

        assert_eq!(table.event_count(), 1);
        let event = table.event(0).unwrap();
        assert_eq!(event.neutrino_pdg, Some(16));
        assert_eq!(event.len(), 1);
        assert_eq!(event.particles[0].event_id, 1);
    }

    #[test]
    fn test_event_out_of_range() {
        let table = ParticleTable::from_records(vec![particle(1, 13)]);
        assert!(table.event(1).is_none());
        assert_eq!(table.position_of(1), Some(0));
        assert_eq!(table.position_of(2), None);
    }

    #[test]
    fn test_set_neutrino_does_not_overwrite() {
        let mut table = ParticleTable::from_records(vec![particle(5, 13)]);
        table.set_neutrino(5, 16);
        table.set_neutrino(5, 12);
        assert_eq!(table.event(0).unwrap().neutrino_pdg, Some(16));
    }
}
