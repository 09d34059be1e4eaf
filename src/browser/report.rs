//! Per-event report and the running statistics over displayed events.

use std::fmt;

use crate::analysis::{
    Counts, Histogram, Selection, count_by_pdg, count_by_sim_id, integer_bin_label, union_keys,
};
use crate::data::Event;
use crate::fmt::{format_percent, format_ratio_or_na, mean, rule, truncate};
use crate::pdg::{NameLookup, display_name};
use crate::policy::Reconstructable;

const WIDE: usize = 70;
const NARROW: usize = 50;
const TOP_SIM_IDS: usize = 5;
const MAX_DISTRIBUTION_BINS: usize = 10;

/// Summary tuple recorded for each displayed event with reconstructable particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitedStat {
    pub simulated: usize,
    pub reconstructed: usize,
    pub reconstructable: usize,
    /// In `[0, 1]`.
    pub efficiency: f64,
}

/// One row of the particle table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRow {
    pub pdg: i32,
    pub name: String,
    pub simulated: usize,
    pub reconstructed: usize,
}

impl ParticleRow {
    pub fn efficiency(&self) -> Option<f64> {
        (self.simulated > 0).then(|| self.reconstructed as f64 / self.simulated as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimIdRow {
    pub sim_id: i64,
    pub simulated: usize,
    pub reconstructed: usize,
}

/// simID sharing within one event, `-1` excluded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimIdSummary {
    pub unique: usize,
    /// simIDs carried by more than one simulated record.
    pub multi: usize,
    /// Records per simID, one entry per unique simID.
    pub particles_per_id: Vec<usize>,
    /// Largest multi-particle simIDs, at most five.
    pub top: Vec<SimIdRow>,
}

impl SimIdSummary {
    fn build(sim: &Counts<i64>, reco: &Counts<i64>) -> Self {
        let mut top: Vec<SimIdRow> = sim
            .duplicated()
            .map(|(sim_id, count)| SimIdRow {
                sim_id,
                simulated: count,
                reconstructed: reco.get(sim_id),
            })
            .collect();
        top.sort_by(|a, b| b.simulated.cmp(&a.simulated));
        let multi = top.len();
        top.truncate(TOP_SIM_IDS);
        Self {
            unique: sim.len(),
            multi,
            particles_per_id: sim.iter().map(|(_, count)| count).collect(),
            top,
        }
    }
}

/// Everything displayed for the event under the cursor.
#[derive(Debug, Clone)]
pub struct EventReport {
    pub ordinal: usize,
    pub event_count: usize,
    pub event_id: i64,
    pub neutrino: Option<(i32, String)>,
    pub simulated: usize,
    pub reconstructed: usize,
    pub reconstructable_simulated: usize,
    pub reconstructable_reconstructed: usize,
    pub sim_ids: SimIdSummary,
    pub rows: Vec<ParticleRow>,
}

impl EventReport {
    pub fn build(
        event: &Event<'_>,
        event_count: usize,
        policy: &dyn Reconstructable,
        names: &dyn NameLookup,
    ) -> Self {
        let records = || event.particles.iter().copied();
        let sim_counts = count_by_pdg(records(), Selection::simulated());
        let reco_counts = count_by_pdg(records(), Selection::reconstructed());

        let reconstructable = |counts: &Counts<i32>| {
            counts
                .iter()
                .filter(|&(pdg, _)| policy.is_reconstructable(pdg))
                .map(|(_, count)| count)
                .sum::<usize>()
        };

        let mut rows: Vec<ParticleRow> = union_keys(&sim_counts, &reco_counts)
            .into_iter()
            .map(|pdg| ParticleRow {
                pdg,
                name: display_name(names, pdg),
                simulated: sim_counts.get(pdg),
                reconstructed: reco_counts.get(pdg),
            })
            .collect();
        // stable: ties keep first-seen order
        rows.sort_by(|a, b| b.simulated.cmp(&a.simulated));

        let sim_ids = SimIdSummary::build(
            &count_by_sim_id(records(), Selection::simulated()),
            &count_by_sim_id(records(), Selection::reconstructed()),
        );

        Self {
            ordinal: event.ordinal,
            event_count,
            event_id: event.event_id,
            neutrino: event
                .neutrino_pdg
                .map(|pdg| (pdg, display_name(names, pdg))),
            simulated: sim_counts.total(),
            reconstructed: reco_counts.total(),
            reconstructable_simulated: reconstructable(&sim_counts),
            reconstructable_reconstructed: reconstructable(&reco_counts),
            sim_ids,
            rows,
        }
    }

    /// Reconstructable efficiency, `None` when nothing is reconstructable.
    pub fn efficiency(&self) -> Option<f64> {
        (self.reconstructable_simulated > 0).then(|| {
            self.reconstructable_reconstructed as f64 / self.reconstructable_simulated as f64
        })
    }

    /// The tuple to record for this display, if any.
    pub fn visited_stat(&self) -> Option<VisitedStat> {
        self.efficiency().map(|efficiency| VisitedStat {
            simulated: self.simulated,
            reconstructed: self.reconstructed,
            reconstructable: self.reconstructable_simulated,
            efficiency,
        })
    }
}

impl fmt::Display for EventReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", rule('=', WIDE))?;
        writeln!(
            f,
            "Event {}/{} (ID: {})",
            self.ordinal + 1,
            self.event_count,
            self.event_id
        )?;
        if let Some((pdg, name)) = &self.neutrino {
            writeln!(f, "Neutrino type: {} (PDG: {})", name, pdg)?;
        }
        writeln!(f, "{}", rule('=', WIDE))?;

        writeln!(f, "Total simulated particles: {}", self.simulated)?;
        writeln!(f, "Total reconstructed particles: {}", self.reconstructed)?;
        writeln!(
            f,
            "Reconstructable particles: {}",
            self.reconstructable_simulated
        )?;
        writeln!(
            f,
            "Reconstruction efficiency: {}",
            format_ratio_or_na(
                self.reconstructable_reconstructed,
                self.reconstructable_simulated
            )
        )?;

        writeln!(f)?;
        writeln!(f, "SimID Analysis:")?;
        writeln!(f, "Unique simIDs: {}", self.sim_ids.unique)?;
        writeln!(f, "SimIDs with multiple particles: {}", self.sim_ids.multi)?;
        if !self.sim_ids.top.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top simIDs with multiple particles:")?;
            writeln!(
                f,
                "{:<10} {:<10} {:<10} {:<10}",
                "SimID", "Sim Count", "Reco Count", "Reco %"
            )?;
            writeln!(f, "{}", rule('-', NARROW))?;
            for row in &self.sim_ids.top {
                writeln!(
                    f,
                    "{:<10} {:<10} {:<10} {:<10}",
                    row.sim_id,
                    row.simulated,
                    row.reconstructed,
                    format_ratio_or_na(row.reconstructed, row.simulated)
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Particle Counts:")?;
        writeln!(
            f,
            "{:<25} {:<8} {:<5} {:<5} {:<10}",
            "Particle", "PDG", "Sim", "Reco", "Efficiency"
        )?;
        writeln!(f, "{}", rule('-', WIDE))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<25} {:<8} {:<5} {:<5} {:<10}",
                truncate(&row.name, 24),
                row.pdg,
                row.simulated,
                row.reconstructed,
                format_ratio_or_na(row.reconstructed, row.simulated)
            )?;
        }
        Ok(())
    }
}

/// Averages of the simID summaries.
#[derive(Debug, Clone)]
pub struct SimIdAverages {
    pub unique: f64,
    pub multi: f64,
    /// Records per multi-particle simID across all summaries.
    pub distribution: Option<Histogram>,
}

/// Means over the recorded [`VisitedStat`]s.
#[derive(Debug, Clone)]
pub struct StatsReport {
    pub events: usize,
    pub simulated: f64,
    pub reconstructed: f64,
    pub reconstructable: f64,
    pub efficiency: f64,
    pub sim_ids: Option<SimIdAverages>,
}

/// Returns `None` when no statistics were collected.
pub fn aggregate_stats(visited: &[VisitedStat]) -> Option<StatsReport> {
    let column = |get: fn(&VisitedStat) -> f64| {
        mean(&visited.iter().map(get).collect::<Vec<_>>())
    };
    Some(StatsReport {
        events: visited.len(),
        simulated: column(|s| s.simulated as f64)?,
        reconstructed: column(|s| s.reconstructed as f64)?,
        reconstructable: column(|s| s.reconstructable as f64)?,
        efficiency: column(|s| s.efficiency)?,
        sim_ids: None,
    })
}

impl StatsReport {
    pub fn with_sim_ids(mut self, summaries: &[SimIdSummary]) -> Self {
        let unique: Vec<f64> = summaries.iter().map(|s| s.unique as f64).collect();
        let multi: Vec<f64> = summaries.iter().map(|s| s.multi as f64).collect();
        self.sim_ids = match (mean(&unique), mean(&multi)) {
            (Some(unique), Some(multi)) => Some(SimIdAverages {
                unique,
                multi,
                distribution: multi_particle_distribution(
                    summaries.iter().flat_map(|s| s.particles_per_id.iter().copied()),
                ),
            }),
            _ => None,
        };
        self
    }
}

/// Histogram of records per simID for simIDs with more than one record.
///
/// Uses `min(10, largest count)` bins.
pub(crate) fn multi_particle_distribution(
    counts: impl IntoIterator<Item = usize>,
) -> Option<Histogram> {
    let multi: Vec<f64> = counts
        .into_iter()
        .filter(|&count| count > 1)
        .map(|count| count as f64)
        .collect();
    let largest = multi.iter().copied().reduce(f64::max)? as usize;
    Histogram::from_values(&multi, MAX_DISTRIBUTION_BINS.min(largest))
}

/// Text shown when the stats command runs before any data was recorded.
pub const NO_STATISTICS: &str = "No statistics collected yet.";

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", rule('=', NARROW))?;
        writeln!(f, "Statistics Summary ({} events)", self.events)?;
        writeln!(f, "{}", rule('=', NARROW))?;
        writeln!(
            f,
            "Average simulated particles per event: {:.1}",
            self.simulated
        )?;
        writeln!(
            f,
            "Average reconstructed particles per event: {:.1}",
            self.reconstructed
        )?;
        writeln!(
            f,
            "Average reconstructable particles per event: {:.1}",
            self.reconstructable
        )?;
        writeln!(
            f,
            "Average reconstruction efficiency: {}",
            format_percent(self.efficiency)
        )?;

        if let Some(sim_ids) = &self.sim_ids {
            writeln!(f)?;
            writeln!(f, "SimID Statistics:")?;
            writeln!(f, "Average unique simIDs per event: {:.1}", sim_ids.unique)?;
            writeln!(
                f,
                "Average multi-particle simIDs per event: {:.1}",
                sim_ids.multi
            )?;
            if let Some(histogram) = &sim_ids.distribution {
                writeln!(f)?;
                writeln!(f, "Distribution of particles per multi-particle simID:")?;
                for (lower, upper, count) in histogram.iter() {
                    writeln!(
                        f,
                        "  {:>5} particles: {} ({})",
                        integer_bin_label(lower, upper),
                        "#".repeat(histogram.bar_len(count, 20)),
                        count
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ParticleRecord, ParticleTable};
    use crate::pdg::PdgCatalog;
    use crate::policy::ExclusionSet;

    fn particle(sim_id: i64, pdg_code: i32, reco: bool) -> ParticleRecord {
        ParticleRecord {
            sim_id,
            pdg_code,
            is_reconstructed: reco,
            ..ParticleRecord::default()
        }
    }

    fn build(particles: Vec<ParticleRecord>) -> EventReport {
        let mut table = ParticleTable::new();
        table.push_event(1, Some(14), particles);
        let event = table.event(0).unwrap();
        EventReport::build(&event, 1, &ExclusionSet::standard(), &PdgCatalog::new())
    }

    #[test]
    fn test_rows_sorted_by_sim_count_stable() {
        let report = build(vec![
            particle(1, 2212, false),
            particle(2, 13, true),
            particle(3, 211, false),
            particle(4, 211, true),
        ]);
        let codes: Vec<i32> = report.rows.iter().map(|r| r.pdg).collect();
        assert_eq!(codes, vec![211, 2212, 13]);
        assert_eq!(report.neutrino, Some((14, "nu(mu)".to_string())));
    }

    #[test]
    fn test_not_simulated_records_are_ignored() {
        let mut ghost = particle(9, 13, true);
        ghost.is_simulated = false;
        let report = build(vec![ghost, particle(1, 13, false)]);
        assert_eq!(report.simulated, 1);
        assert_eq!(report.reconstructed, 0);
    }

    #[test]
    fn test_efficiency_na_without_reconstructable() {
        let report = build(vec![particle(1, 2112, true), particle(2, 22, false)]);
        assert_eq!(report.reconstructable_simulated, 0);
        assert_eq!(report.efficiency(), None);
        assert!(report.visited_stat().is_none());
        assert!(report.to_string().contains("Reconstruction efficiency: N/A"));
    }

    #[test]
    fn test_efficiency_excludes_neutrals() {
        let report = build(vec![
            particle(1, 13, true),
            particle(2, 2212, false),
            particle(3, 2112, true),
        ]);
        assert_eq!(report.reconstructable_simulated, 2);
        assert_eq!(report.reconstructable_reconstructed, 1);
        assert_eq!(report.efficiency(), Some(0.5));
    }

    #[test]
    fn test_sim_id_summary() {
        let report = build(vec![
            particle(1, 13, true),
            particle(1, 13, false),
            particle(1, 13, false),
            particle(2, 211, true),
            particle(2, 211, true),
            particle(3, 2212, false),
            particle(-1, 2112, false),
        ]);
        let summary = &report.sim_ids;
        assert_eq!(summary.unique, 3);
        assert_eq!(summary.multi, 2);
        assert_eq!(summary.particles_per_id, vec![3, 2, 1]);
        assert_eq!(
            summary.top[0],
            SimIdRow {
                sim_id: 1,
                simulated: 3,
                reconstructed: 1
            }
        );
        assert!(report.to_string().contains("Top simIDs with multiple particles:"));
    }

    #[test]
    fn test_aggregate_stats() {
        assert!(aggregate_stats(&[]).is_none());

        let stats = aggregate_stats(&[
            VisitedStat {
                simulated: 4,
                reconstructed: 2,
                reconstructable: 4,
                efficiency: 0.5,
            },
            VisitedStat {
                simulated: 6,
                reconstructed: 6,
                reconstructable: 5,
                efficiency: 1.0,
            },
        ])
        .unwrap();
        assert_eq!(stats.events, 2);
        assert_eq!(stats.simulated, 5.0);
        assert_eq!(stats.reconstructed, 4.0);
        assert_eq!(stats.reconstructable, 4.5);
        assert_eq!(stats.efficiency, 0.75);
        assert!(stats.to_string().contains("Average reconstruction efficiency: 75.0%"));
    }

    #[test]
    fn test_stats_with_sim_id_distribution() {
        let summaries = vec![
            SimIdSummary {
                unique: 3,
                multi: 1,
                particles_per_id: vec![1, 2, 1],
                top: Vec::new(),
            },
            SimIdSummary {
                unique: 1,
                multi: 1,
                particles_per_id: vec![4],
                top: Vec::new(),
            },
        ];
        let stats = aggregate_stats(&[VisitedStat {
            simulated: 1,
            reconstructed: 1,
            reconstructable: 1,
            efficiency: 1.0,
        }])
        .unwrap()
        .with_sim_ids(&summaries);

        let sim_ids = stats.sim_ids.as_ref().unwrap();
        assert_eq!(sim_ids.unique, 2.0);
        assert_eq!(sim_ids.multi, 1.0);
        let histogram = sim_ids.distribution.as_ref().unwrap();
        assert_eq!(histogram.bins(), 4);
        assert_eq!(histogram.counts().iter().sum::<usize>(), 2);
        assert!(stats.to_string().contains("Distribution of particles per multi-particle simID:"));
    }
}
