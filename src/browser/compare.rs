//! Side-by-side comparison of two particle tables.

use std::fmt;

use crate::analysis::{
    Counts, Histogram, Selection, count_by_pdg, integer_bin_label, union_keys,
};
use crate::data::{NO_SIM_ID, ParticleTable};
use crate::fmt::{rule, truncate};
use crate::pdg::{NameLookup, display_name};

const TOP_PARTICLES: usize = 10;
const MAX_DISTRIBUTION_BINS: usize = 10;

/// Totals and simID sharing for one file.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub label: String,
    pub events: usize,
    pub simulated: usize,
    pub reconstructed: usize,
    /// Distinct `(event, simID)` pairs, `-1` excluded.
    pub unique_sim_ids: usize,
    pub multi_sim_ids: usize,
    /// Records per `(event, simID)` pair.
    particles_per_id: Vec<usize>,
    sim_counts: Counts<i32>,
}

impl FileSummary {
    fn build(label: &str, table: &ParticleTable) -> Self {
        let sim_counts = count_by_pdg(table.records(), Selection::simulated());
        let reconstructed = count_by_pdg(table.records(), Selection::reconstructed()).total();
        // simIDs are only unique within an event
        let per_id: Counts<(i64, i64)> = table
            .records()
            .iter()
            .filter(|r| Selection::simulated().matches(r) && r.sim_id != NO_SIM_ID)
            .map(|r| (r.event_id, r.sim_id))
            .collect();
        let particles_per_id: Vec<usize> = per_id.iter().map(|(_, count)| count).collect();
        Self {
            label: label.to_string(),
            events: table.event_count(),
            simulated: sim_counts.total(),
            reconstructed,
            unique_sim_ids: per_id.len(),
            multi_sim_ids: per_id.duplicated().count(),
            particles_per_id,
            sim_counts,
        }
    }

    /// `value / events`, 0 for a file without events.
    fn per_event(&self, value: usize) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            value as f64 / self.events as f64
        }
    }

    pub fn avg_simulated(&self) -> f64 {
        self.per_event(self.simulated)
    }

    pub fn avg_reconstructed(&self) -> f64 {
        self.per_event(self.reconstructed)
    }

    pub fn avg_particles_per_id(&self) -> f64 {
        if self.unique_sim_ids == 0 {
            0.0
        } else {
            self.particles_per_id.iter().sum::<usize>() as f64 / self.unique_sim_ids as f64
        }
    }

    fn multi_counts(&self) -> Vec<f64> {
        self.particles_per_id
            .iter()
            .filter(|&&count| count > 1)
            .map(|&count| count as f64)
            .collect()
    }
}

/// Per-event average of one PDG code in both files.
#[derive(Debug, Clone, PartialEq)]
pub struct PdgComparison {
    pub pdg: i32,
    pub name: String,
    pub avg_a: f64,
    pub avg_b: f64,
}

impl PdgComparison {
    pub fn difference(&self) -> f64 {
        self.avg_b - self.avg_a
    }

    pub fn ratio(&self) -> f64 {
        self.avg_b / self.avg_a.max(0.001)
    }
}

/// Histograms of particles per multi-particle simID over the same edges.
#[derive(Debug, Clone)]
pub struct SharedDistribution {
    pub a: Histogram,
    pub b: Histogram,
}

#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub a: FileSummary,
    pub b: FileSummary,
    pub particles: Vec<PdgComparison>,
    pub distribution: Option<SharedDistribution>,
}

/// Compares `table_b` against `table_a`. Differences read `b - a`.
pub fn compare(
    label_a: &str,
    table_a: &ParticleTable,
    label_b: &str,
    table_b: &ParticleTable,
    names: &dyn NameLookup,
) -> ComparisonReport {
    let a = FileSummary::build(label_a, table_a);
    let b = FileSummary::build(label_b, table_b);

    let mut codes = union_keys(&a.sim_counts, &b.sim_counts);
    // stable: ties keep first-seen order, file A first
    codes.sort_by_key(|&pdg| std::cmp::Reverse(a.sim_counts.get(pdg) + b.sim_counts.get(pdg)));
    codes.truncate(TOP_PARTICLES);
    let particles = codes
        .into_iter()
        .map(|pdg| PdgComparison {
            pdg,
            name: display_name(names, pdg),
            avg_a: a.per_event(a.sim_counts.get(pdg)),
            avg_b: b.per_event(b.sim_counts.get(pdg)),
        })
        .collect();

    let distribution = shared_distribution(&a.multi_counts(), &b.multi_counts());
    ComparisonReport {
        a,
        b,
        particles,
        distribution,
    }
}

/// Bins both inputs over edges derived from `a`. `None` unless both are non-empty.
fn shared_distribution(a: &[f64], b: &[f64]) -> Option<SharedDistribution> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let largest = a.iter().chain(b).copied().reduce(f64::max)? as usize;
    let a = Histogram::from_values(a, MAX_DISTRIBUTION_BINS.min(largest))?;
    let b = Histogram::with_edges(b, a.edges().to_vec());
    Some(SharedDistribution { a, b })
}

fn count_row(f: &mut fmt::Formatter<'_>, label: &str, a: usize, b: usize) -> fmt::Result {
    writeln!(
        f,
        "{:20} {:>15} {:>15} {:>15}",
        label,
        a,
        b,
        b as i64 - a as i64
    )
}

fn average_row(f: &mut fmt::Formatter<'_>, label: &str, a: f64, b: f64) -> fmt::Result {
    writeln!(f, "{:20} {:>15.2} {:>15.2} {:>15.2}", label, a, b, b - a)
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = (&self.a, &self.b);
        writeln!(f, "{}", rule('=', 70))?;
        writeln!(f, "Comparison: {} vs {}", a.label, b.label)?;
        writeln!(f, "{}", rule('=', 70))?;
        writeln!(
            f,
            "{:20} {:>15} {:>15} {:>15}",
            "", "File 1", "File 2", "Difference"
        )?;
        count_row(f, "Events", a.events, b.events)?;
        count_row(f, "Total sim particles", a.simulated, b.simulated)?;
        average_row(f, "Avg sim per event", a.avg_simulated(), b.avg_simulated())?;
        count_row(f, "Total reco particles", a.reconstructed, b.reconstructed)?;
        average_row(
            f,
            "Avg reco per event",
            a.avg_reconstructed(),
            b.avg_reconstructed(),
        )?;

        writeln!(f)?;
        writeln!(f, "Top 10 Particles Comparison (avg per event):")?;
        writeln!(
            f,
            "{:<25} {:<8} {:<8} {:<8} {:<8} {:<8}",
            "Particle", "PDG", "File 1", "File 2", "Diff", "Ratio"
        )?;
        writeln!(f, "{}", rule('-', 70))?;
        for row in &self.particles {
            writeln!(
                f,
                "{:<25} {:<8} {:<8.2} {:<8.2} {:<+8.2} {:<8.2}",
                truncate(&row.name, 24),
                row.pdg,
                row.avg_a,
                row.avg_b,
                row.difference(),
                row.ratio()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "SimID Analysis:")?;
        count_row(f, "Unique simIDs", a.unique_sim_ids, b.unique_sim_ids)?;
        count_row(f, "Multi-particle simIDs", a.multi_sim_ids, b.multi_sim_ids)?;
        average_row(
            f,
            "Avg particles per simID",
            a.avg_particles_per_id(),
            b.avg_particles_per_id(),
        )?;

        if let Some(distribution) = &self.distribution {
            writeln!(f)?;
            writeln!(f, "Distribution of particles per simID:")?;
            writeln!(
                f,
                "{:>10} {:>15} {:>15} {:>10}",
                "Particles", "File 1", "File 2", "Diff"
            )?;
            for ((lower, upper, count_a), count_b) in distribution
                .a
                .iter()
                .zip(distribution.b.counts().iter().copied())
            {
                writeln!(
                    f,
                    "{:>10} {:>15} {:>15} {:>+10}",
                    integer_bin_label(lower, upper),
                    count_a,
                    count_b,
                    count_b as i64 - count_a as i64
                )?;
            }
        }
        Ok(())
    }
}
