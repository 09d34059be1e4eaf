//! Reconstructed tracks from the `tree` written next to `gen1`.
//!
//! Each track carries the Pandora track score, the true PDG code of the
//! matched particle and its calorimetry hits.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// One calorimetry point along a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitSample {
    /// cm from the track end.
    pub residual_range: f64,
    /// MeV/cm.
    pub dedx: f64,
}

impl HitSample {
    /// Both coordinates are numbers. Calorimetry writes NaN for unusable hits.
    pub fn is_finite(&self) -> bool {
        self.residual_range.is_finite() && self.dedx.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub event_id: i64,
    /// PDG code of the simulated particle matched to the track.
    pub true_pdg: i32,
    /// Track-like score in `[0, 1]`.
    pub score: f64,
    /// cm, when the tree has a length branch.
    pub length: Option<f64>,
    pub hits: Vec<HitSample>,
}

impl TrackRecord {
    pub fn finite_hits(&self) -> impl Iterator<Item = &HitSample> + '_ {
        self.hits.iter().filter(|hit| hit.is_finite())
    }
}

/// Every track of one file.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    tracks: Vec<TrackRecord>,
    events: IndexSet<i64>,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `event_id` even when it has no tracks.
    pub fn push_event(&mut self, event_id: i64, tracks: impl IntoIterator<Item = TrackRecord>) {
        self.events.insert(event_id);
        self.tracks.extend(tracks.into_iter().map(|track| TrackRecord {
            event_id,
            ..track
        }));
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    /// Tracks whose true particle has `|pdg| == abs_pdg`.
    pub fn with_abs_pdg(&self, abs_pdg: i32) -> impl Iterator<Item = &TrackRecord> + '_ {
        self.tracks
            .iter()
            .filter(move |track| track.true_pdg.abs() == abs_pdg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(true_pdg: i32, hits: Vec<HitSample>) -> TrackRecord {
        TrackRecord {
            event_id: 0,
            true_pdg,
            score: 0.5,
            length: None,
            hits,
        }
    }

    #[test]
    fn test_push_event_sets_event_id() {
        let mut table = TrackTable::new();
        table.push_event(7, vec![track(13, vec![]), track(-211, vec![])]);
        table.push_event(8, vec![]);
        table.push_event(7, vec![track(2212, vec![])]);
        assert_eq!(table.event_count(), 2);
        assert_eq!(table.track_count(), 3);
        assert!(table.tracks().iter().all(|t| t.event_id == 7));
        assert_eq!(table.with_abs_pdg(211).count(), 1);
    }

    #[test]
    fn test_finite_hits() {
        let t = track(
            13,
            vec![
                HitSample { residual_range: 1.0, dedx: 2.0 },
                HitSample { residual_range: f64::NAN, dedx: 2.0 },
                HitSample { residual_range: 3.0, dedx: f64::INFINITY },
            ],
        );
        assert_eq!(t.finite_hits().count(), 1);
    }
}
