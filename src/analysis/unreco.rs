//! Reconstructed vs. unreconstructed counts per particle type.

use std::fmt;

use crate::data::ParticleTable;
use crate::fmt::{format_thousands, rule, truncate};
use crate::pdg::{NameLookup, display_name};
use crate::policy::Reconstructable;

use super::{Selection, count_by_pdg, union_keys};

/// Labels and limits for the reconstruction summary.
#[derive(Debug, Clone)]
pub struct UnrecoOptions {
    pub neutrino_type: String,
    pub interaction: String,
    /// Event count shown in the title; defaults to the table's event count.
    pub events: Option<usize>,
    pub top: usize,
}

impl Default for UnrecoOptions {
    fn default() -> Self {
        Self {
            neutrino_type: "muon".to_string(),
            interaction: "CC".to_string(),
            events: None,
            top: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnrecoRow {
    pub pdg: i32,
    pub name: String,
    pub unreco: usize,
    pub reco: usize,
}

impl UnrecoRow {
    pub fn total(&self) -> usize {
        self.unreco + self.reco
    }

    /// `reco / total` as a percentage, `None` when the total is zero.
    pub fn efficiency(&self) -> Option<f64> {
        (self.total() > 0).then(|| 100.0 * self.reco as f64 / self.total() as f64)
    }
}

#[derive(Debug, Clone)]
pub struct UnrecoReport {
    pub title: String,
    pub rows: Vec<UnrecoRow>,
}

impl UnrecoReport {
    /// Top `options.top` reconstructable species by total simulated count.
    pub fn build(
        table: &ParticleTable,
        policy: &dyn Reconstructable,
        names: &dyn NameLookup,
        options: &UnrecoOptions,
    ) -> Self {
        let unreco = count_by_pdg(table.records(), Selection::unreconstructed());
        let reco = count_by_pdg(table.records(), Selection::reconstructed());

        let mut rows: Vec<UnrecoRow> = union_keys(&unreco, &reco)
            .into_iter()
            .filter(|&pdg| policy.is_reconstructable(pdg))
            .map(|pdg| UnrecoRow {
                pdg,
                name: display_name(names, pdg),
                unreco: unreco.get(pdg),
                reco: reco.get(pdg),
            })
            .collect();
        rows.sort_by(|a, b| b.total().cmp(&a.total()));
        rows.truncate(options.top);

        let events = options.events.unwrap_or_else(|| table.event_count());
        let title = format!(
            "Particle Reconstruction - {} {} neutrino {} events",
            format_thousands(events),
            options.neutrino_type,
            options.interaction
        );
        Self { title, rows }
    }
}

impl fmt::Display for UnrecoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "Particle Reconstruction Statistics:")?;
        writeln!(
            f,
            "{:<20} {:<10} {:<10} {:<10} {:<10}",
            "Particle", "Unreco", "Reco", "Total", "Efficiency"
        )?;
        writeln!(f, "{}", rule('-', 60))?;
        for row in &self.rows {
            let efficiency = row
                .efficiency()
                .map(|e| format!("{:.1}%", e))
                .unwrap_or_else(|| "N/A".to_string());
            writeln!(
                f,
                "{:<20} {:<10} {:<10} {:<10} {:<10}",
                truncate(&row.name, 19),
                row.unreco,
                row.reco,
                row.total(),
                efficiency
            )?;
        }
        Ok(())
    }
}
