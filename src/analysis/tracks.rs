//! Muon and charged-pion track summaries: score distributions and dE/dx
//! against residual range.

use std::fmt;

use crate::data::{HitSample, TrackTable};
use crate::fmt::{mean, rule};

use super::{Histogram, bin_index};

const BAR_WIDTH: usize = 30;

/// `|pdg|` and plural label of the species compared by both reports.
pub const TRACK_SPECIES: [(i32, &str); 2] = [(13, "muons"), (211, "pions")];

fn range_edges(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    let step = (hi - lo) / bins as f64;
    (0..=bins).map(|i| lo + step * i as f64).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct TrackScoreOptions {
    /// Equal-width bins over `[0, 1]`.
    pub bins: usize,
}

impl Default for TrackScoreOptions {
    fn default() -> Self {
        Self { bins: 50 }
    }
}

#[derive(Debug, Clone)]
pub struct SpeciesScores {
    pub abs_pdg: i32,
    pub label: &'static str,
    pub scores: Vec<f64>,
    pub histogram: Histogram,
}

impl SpeciesScores {
    pub fn mean(&self) -> Option<f64> {
        mean(&self.scores)
    }
}

/// Track-score histograms of muons and pions on shared `[0, 1]` edges.
#[derive(Debug, Clone)]
pub struct TrackScoreReport {
    pub tracks: usize,
    pub species: Vec<SpeciesScores>,
}

impl TrackScoreReport {
    pub fn build(table: &TrackTable, options: &TrackScoreOptions) -> Self {
        let bins = options.bins.max(1);
        let species = TRACK_SPECIES
            .into_iter()
            .map(|(abs_pdg, label)| {
                let scores: Vec<f64> = table
                    .with_abs_pdg(abs_pdg)
                    .map(|track| track.score)
                    .filter(|score| score.is_finite())
                    .collect();
                let histogram = Histogram::with_edges(&scores, range_edges(0.0, 1.0, bins));
                SpeciesScores {
                    abs_pdg,
                    label,
                    scores,
                    histogram,
                }
            })
            .collect();
        Self {
            tracks: table.track_count(),
            species,
        }
    }
}

impl fmt::Display for TrackScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Track Score: Muons vs Pions ({} tracks)", self.tracks)?;
        for species in &self.species {
            writeln!(f)?;
            match species.mean() {
                Some(mean) => writeln!(
                    f,
                    "{} {} (|PDG| {}), mean score {:.3}",
                    species.scores.len(),
                    species.label,
                    species.abs_pdg,
                    mean
                )?,
                None => {
                    writeln!(f, "No {} (|PDG| {})", species.label, species.abs_pdg)?;
                    continue;
                }
            }
            let histogram = &species.histogram;
            for (lower, upper, count) in histogram.iter() {
                writeln!(
                    f,
                    "  {:>5.2} - {:<5.2} | {:<width$} {}",
                    lower,
                    upper,
                    "#".repeat(histogram.bar_len(count, BAR_WIDTH)),
                    count,
                    width = BAR_WIDTH
                )?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DedxOptions {
    /// Residual range window `[0, max_range]`, cm.
    pub max_range: f64,
    /// dE/dx window `[0, max_dedx]`, MeV/cm.
    pub max_dedx: f64,
    /// Residual range bins.
    pub bins: usize,
}

impl Default for DedxOptions {
    fn default() -> Self {
        Self {
            max_range: 130.0,
            max_dedx: 15.0,
            bins: 13,
        }
    }
}

/// Hit count and mean dE/dx in one residual range bin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfileCell {
    pub hits: usize,
    pub sum: f64,
}

impl ProfileCell {
    fn add(&mut self, dedx: f64) {
        self.hits += 1;
        self.sum += dedx;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.hits > 0).then(|| self.sum / self.hits as f64)
    }
}

/// Mean dE/dx per residual range bin.
#[derive(Debug, Clone, PartialEq)]
pub struct DedxProfile {
    pub label: &'static str,
    pub cells: Vec<ProfileCell>,
}

impl DedxProfile {
    fn new(label: &'static str, bins: usize) -> Self {
        Self {
            label,
            cells: vec![ProfileCell::default(); bins],
        }
    }

    pub fn hits(&self) -> usize {
        self.cells.iter().map(|cell| cell.hits).sum()
    }
}

/// dE/dx vs residual range for every track, then for muons and pions.
#[derive(Debug, Clone)]
pub struct DedxReport {
    pub edges: Vec<f64>,
    pub max_dedx: f64,
    /// Hits with a NaN or infinite coordinate.
    pub non_finite: usize,
    /// Finite hits outside the range or dE/dx window.
    pub outside: usize,
    /// All tracks first, then one profile per species.
    pub profiles: Vec<DedxProfile>,
}

impl DedxReport {
    pub fn build(table: &TrackTable, options: &DedxOptions) -> Self {
        let bins = options.bins.max(1);
        let edges = range_edges(0.0, options.max_range, bins);
        let mut profiles = vec![DedxProfile::new("all tracks", bins)];
        profiles.extend(
            TRACK_SPECIES
                .iter()
                .map(|&(_, label)| DedxProfile::new(label, bins)),
        );

        let mut non_finite = 0;
        let mut outside = 0;
        for track in table.tracks() {
            let species = TRACK_SPECIES
                .iter()
                .position(|&(abs_pdg, _)| track.true_pdg.abs() == abs_pdg);
            for hit in &track.hits {
                if !hit.is_finite() {
                    non_finite += 1;
                    continue;
                }
                let Some(bin) = profile_bin(&edges, options.max_dedx, hit) else {
                    outside += 1;
                    continue;
                };
                profiles[0].cells[bin].add(hit.dedx);
                if let Some(species) = species {
                    profiles[species + 1].cells[bin].add(hit.dedx);
                }
            }
        }

        Self {
            edges,
            max_dedx: options.max_dedx,
            non_finite,
            outside,
            profiles,
        }
    }
}

fn profile_bin(edges: &[f64], max_dedx: f64, hit: &HitSample) -> Option<usize> {
    if !(0.0..=max_dedx).contains(&hit.dedx) {
        return None;
    }
    bin_index(edges, hit.residual_range)
}

fn mean_cell(cell: &ProfileCell) -> String {
    match cell.mean() {
        Some(mean) => format!("{:.2}", mean),
        None => "-".to_string(),
    }
}

impl fmt::Display for DedxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dE/dx vs Residual Range")?;
        writeln!(
            f,
            "dE/dx window 0 - {} MeV/cm; {} non-finite hits dropped, {} outside the window",
            self.max_dedx, self.non_finite, self.outside
        )?;
        writeln!(f)?;

        write!(f, "{:<17}", "Range [cm]")?;
        for profile in &self.profiles {
            write!(f, " {:>10} {:>8}", format!("{} hits", hit_label(profile)), "dE/dx")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", rule('-', 17 + self.profiles.len() * 20))?;

        for (bin, window) in self.edges.windows(2).enumerate() {
            write!(f, "{:>7.1} - {:<7.1}", window[0], window[1])?;
            for profile in &self.profiles {
                let cell = &profile.cells[bin];
                write!(f, " {:>10} {:>8}", cell.hits, mean_cell(cell))?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        for profile in &self.profiles {
            writeln!(f, "Hits, {}: {}", profile.label, profile.hits())?;
        }
        Ok(())
    }
}

/// Short column label: `"all"`, `"muons"`, `"pions"`.
fn hit_label(profile: &DedxProfile) -> &str {
    profile.label.split_whitespace().next().unwrap_or(profile.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TrackRecord;

    fn track(true_pdg: i32, score: f64, hits: &[(f64, f64)]) -> TrackRecord {
        TrackRecord {
            event_id: 0,
            true_pdg,
            score,
            length: None,
            hits: hits
                .iter()
                .map(|&(residual_range, dedx)| HitSample {
                    residual_range,
                    dedx,
                })
                .collect(),
        }
    }

    fn table(tracks: Vec<TrackRecord>) -> TrackTable {
        let mut table = TrackTable::new();
        table.push_event(1, tracks);
        table
    }

    #[test]
    fn test_scores_by_abs_pdg() {
        let table = table(vec![
            track(13, 0.95, &[]),
            track(-13, 1.0, &[]),
            track(211, 0.25, &[]),
            track(-211, 0.375, &[]),
            track(2212, 0.9, &[]),
            track(13, f64::NAN, &[]),
        ]);
        let report = TrackScoreReport::build(&table, &TrackScoreOptions::default());
        assert_eq!(report.tracks, 6);

        let muons = &report.species[0];
        assert_eq!(muons.scores, vec![0.95, 1.0]);
        assert_eq!(muons.histogram.bins(), 50);
        // 1.0 lands in the closed last bin
        assert_eq!(muons.histogram.counts()[49], 1);
        assert_eq!(muons.histogram.counts()[47], 1);

        let pions = &report.species[1];
        assert_eq!(pions.scores.len(), 2);
        assert_eq!(pions.histogram.counts()[12], 1);
        assert_eq!(pions.histogram.counts()[18], 1);
        assert_eq!(pions.mean(), Some(0.3125));
    }

    #[test]
    fn test_score_report_text() {
        let table = table(vec![track(13, 0.5, &[])]);
        let options = TrackScoreOptions { bins: 2 };
        let text = TrackScoreReport::build(&table, &options).to_string();
        assert!(text.starts_with("Track Score: Muons vs Pions (1 tracks)"));
        assert!(text.contains("1 muons (|PDG| 13), mean score 0.500"));
        assert!(text.contains("   0.50 - 1.00  | "));
        assert!(text.contains("No pions (|PDG| 211)"));
    }

    #[test]
    fn test_dedx_profile() {
        let table = table(vec![
            track(13, 0.9, &[(5.0, 2.0), (5.0, 4.0), (125.0, 1.5), (f64::NAN, 3.0)]),
            track(-211, 0.3, &[(15.0, 6.0), (200.0, 2.0), (15.0, 20.0)]),
            track(2212, 0.8, &[(5.0, 9.0)]),
        ]);
        let report = DedxReport::build(&table, &DedxOptions::default());
        assert_eq!(report.edges.len(), 14);
        assert_eq!(report.non_finite, 1);
        assert_eq!(report.outside, 2);

        let all = &report.profiles[0];
        assert_eq!(all.hits(), 5);
        assert_eq!(all.cells[0].hits, 3);
        assert_eq!(all.cells[0].mean(), Some(5.0));

        let muons = &report.profiles[1];
        assert_eq!(muons.label, "muons");
        assert_eq!(muons.cells[0].mean(), Some(3.0));
        assert_eq!(muons.cells[12].hits, 1);

        let pions = &report.profiles[2];
        assert_eq!(pions.hits(), 1);
        assert_eq!(pions.cells[1].mean(), Some(6.0));
        assert_eq!(pions.cells[0].mean(), None);
    }

    #[test]
    fn test_dedx_report_text() {
        let table = table(vec![track(13, 0.9, &[(5.0, 2.0), (f64::NAN, f64::NAN)])]);
        let text = DedxReport::build(&table, &DedxOptions::default()).to_string();
        assert!(text.starts_with("dE/dx vs Residual Range"));
        assert!(text.contains("1 non-finite hits dropped, 0 outside the window"));
        assert!(text.contains("all hits"));
        assert!(text.contains("muons hits"));
        assert!(text.contains("Hits, pions: 0"));
        let first_bin = text.lines().find(|line| line.starts_with("    0.0 - 10.0")).unwrap();
        assert!(first_bin.contains("2.00"));
        assert!(first_bin.trim_end().ends_with('-'));
    }
}
