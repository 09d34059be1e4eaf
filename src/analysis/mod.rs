//! Filter-and-reduce over particle records.
//!
//! Every particle count, spectrum and table in the crate is one [`Reduction`]:
//! a [`Selection`] predicate over [`ParticleRecord`]s plus an [`Aggregation`].
//! Track reports ([`TrackScoreReport`], [`DedxReport`]) bin per-track values.

mod histogram;
mod listing;
mod spectrum;
mod tracks;
mod unreco;

pub use histogram::Histogram;
pub(crate) use histogram::{bin_index, integer_bin_label};
pub use listing::EventListing;
pub use spectrum::{SpectrumOptions, SpectrumReport};
pub use tracks::{
    DedxOptions, DedxProfile, DedxReport, ProfileCell, SpeciesScores, TRACK_SPECIES,
    TrackScoreOptions, TrackScoreReport,
};
pub use unreco::{UnrecoOptions, UnrecoReport, UnrecoRow};

use std::hash::Hash;

use indexmap::IndexMap;

use crate::data::{NO_SIM_ID, ParticleRecord};

/// Record predicate. Every `Some` field must match; `None` fields are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub simulated: Option<bool>,
    pub reconstructed: Option<bool>,
    pub generation: Option<i32>,
    pub pdg: Option<i32>,
    pub abs_pdg: Option<i32>,
}

impl Selection {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn simulated() -> Self {
        Self {
            simulated: Some(true),
            ..Self::default()
        }
    }

    /// Simulated and reconstructed.
    pub fn reconstructed() -> Self {
        Self {
            simulated: Some(true),
            reconstructed: Some(true),
            ..Self::default()
        }
    }

    /// Simulated but not reconstructed.
    pub fn unreconstructed() -> Self {
        Self {
            simulated: Some(true),
            reconstructed: Some(false),
            ..Self::default()
        }
    }

    pub fn with_generation(mut self, generation: i32) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_pdg(mut self, pdg: i32) -> Self {
        self.pdg = Some(pdg);
        self
    }

    pub fn with_abs_pdg(mut self, pdg: i32) -> Self {
        self.abs_pdg = Some(pdg.abs());
        self
    }

    pub fn matches(&self, record: &ParticleRecord) -> bool {
        self.simulated.is_none_or(|v| record.is_simulated == v)
            && self.reconstructed.is_none_or(|v| record.is_reconstructed == v)
            && self.generation.is_none_or(|g| record.generation == g)
            && self.pdg.is_none_or(|p| record.pdg_code == p)
            && self.abs_pdg.is_none_or(|p| record.pdg_code.abs() == p)
    }
}

/// What to compute over the selected records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Number of records.
    Count,
    /// Occurrences per PDG code.
    CountByPdg,
    /// Occurrences per simulation id, `-1` excluded.
    CountBySimId,
    /// Energies in GeV, in record order.
    Energies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
    pub selection: Selection,
    pub aggregation: Aggregation,
}

impl Reduction {
    pub fn new(selection: Selection, aggregation: Aggregation) -> Self {
        Self {
            selection,
            aggregation,
        }
    }
}

/// Result of a [`Reduction`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reduced {
    Count(usize),
    ByPdg(Counts<i32>),
    BySimId(Counts<i64>),
    Energies(Vec<f64>),
}

/// Applies `reduction` to `records`.
pub fn reduce<'a>(
    records: impl IntoIterator<Item = &'a ParticleRecord>,
    reduction: &Reduction,
) -> Reduced {
    let selected = records
        .into_iter()
        .filter(|record| reduction.selection.matches(record));
    match reduction.aggregation {
        Aggregation::Count => Reduced::Count(selected.count()),
        Aggregation::CountByPdg => Reduced::ByPdg(selected.map(|r| r.pdg_code).collect()),
        Aggregation::CountBySimId => Reduced::BySimId(
            selected
                .map(|r| r.sim_id)
                .filter(|&id| id != NO_SIM_ID)
                .collect(),
        ),
        Aggregation::Energies => Reduced::Energies(selected.map(|r| r.energy).collect()),
    }
}

/// Shorthand for a [`Aggregation::CountByPdg`] reduction.
pub fn count_by_pdg<'a>(
    records: impl IntoIterator<Item = &'a ParticleRecord>,
    selection: Selection,
) -> Counts<i32> {
    match reduce(records, &Reduction::new(selection, Aggregation::CountByPdg)) {
        Reduced::ByPdg(counts) => counts,
        _ => Counts::default(),
    }
}

/// Shorthand for a [`Aggregation::CountBySimId`] reduction.
pub fn count_by_sim_id<'a>(
    records: impl IntoIterator<Item = &'a ParticleRecord>,
    selection: Selection,
) -> Counts<i64> {
    match reduce(records, &Reduction::new(selection, Aggregation::CountBySimId)) {
        Reduced::BySimId(counts) => counts,
        _ => Counts::default(),
    }
}

/// Shorthand for a [`Aggregation::Energies`] reduction.
pub fn energies<'a>(
    records: impl IntoIterator<Item = &'a ParticleRecord>,
    selection: Selection,
) -> Vec<f64> {
    match reduce(records, &Reduction::new(selection, Aggregation::Energies)) {
        Reduced::Energies(values) => values,
        _ => Vec::new(),
    }
}

/// Occurrence counts keyed in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counts<K: Hash + Eq> {
    map: IndexMap<K, usize>,
}

impl<K: Hash + Eq> Default for Counts<K> {
    fn default() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq + Copy> Counts<K> {
    pub fn add(&mut self, key: K) {
        *self.map.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: K) -> usize {
        self.map.get(&key).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.map.values().sum()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.map.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, usize)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }

    /// Keys with more than one occurrence.
    pub fn duplicated(&self) -> impl Iterator<Item = (K, usize)> + '_ {
        self.iter().filter(|&(_, count)| count > 1)
    }
}

impl<K: Hash + Eq + Copy> FromIterator<K> for Counts<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counts = Self::default();
        for key in iter {
            counts.add(key);
        }
        counts
    }
}

/// Keys of both maps, first-seen order (`a` first), deduplicated.
pub fn union_keys<K: Hash + Eq + Copy>(a: &Counts<K>, b: &Counts<K>) -> Vec<K> {
    let mut keys: IndexMap<K, ()> = IndexMap::new();
    for key in a.keys().chain(b.keys()) {
        keys.insert(key, ());
    }
    keys.into_keys().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ParticleRecord> {
        vec![
            ParticleRecord {
                sim_id: 1,
                pdg_code: 13,
                energy: 1.5,
                is_reconstructed: true,
                ..ParticleRecord::default()
            },
            ParticleRecord {
                sim_id: 2,
                pdg_code: -211,
                energy: 0.4,
                ..ParticleRecord::default()
            },
            ParticleRecord {
                sim_id: 2,
                pdg_code: -211,
                generation: 2,
                energy: 0.2,
                ..ParticleRecord::default()
            },
            ParticleRecord {
                sim_id: -1,
                pdg_code: 2112,
                is_simulated: false,
                ..ParticleRecord::default()
            },
        ]
    }

    #[test]
    fn test_selection_matches() {
        let rows = records();
        assert!(Selection::all().matches(&rows[3]));
        assert!(!Selection::simulated().matches(&rows[3]));
        assert!(Selection::reconstructed().matches(&rows[0]));
        assert!(Selection::unreconstructed().matches(&rows[1]));
        assert!(Selection::simulated().with_abs_pdg(211).matches(&rows[1]));
        assert!(!Selection::simulated().with_generation(1).matches(&rows[2]));
    }

    #[test]
    fn test_reduce_count_and_by_pdg() {
        let rows = records();
        let count = reduce(
            &rows,
            &Reduction::new(Selection::simulated(), Aggregation::Count),
        );
        assert_eq!(count, Reduced::Count(3));

        let counts = count_by_pdg(&rows, Selection::simulated());
        assert_eq!(counts.get(13), 1);
        assert_eq!(counts.get(-211), 2);
        assert_eq!(counts.get(2112), 0);
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec![13, -211]);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_reduce_sim_ids_skip_unassigned() {
        let rows = records();
        let ids = count_by_sim_id(&rows, Selection::all());
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.duplicated().collect::<Vec<_>>(), vec![(2, 2)]);
    }

    #[test]
    fn test_reduce_energies() {
        let rows = records();
        let values = energies(&rows, Selection::simulated().with_generation(1).with_pdg(-211));
        assert_eq!(values, vec![0.4]);
    }

    #[test]
    fn test_union_keys_first_seen() {
        let a: Counts<i32> = [13, 211].into_iter().collect();
        let b: Counts<i32> = [2212, 13].into_iter().collect();
        assert_eq!(union_keys(&a, &b), vec![13, 211, 2212]);
    }
}
