//! Per-particle listing of a single event as a markdown table.

use std::fmt;

use crate::data::{Event, NO_SIM_ID};
use crate::pdg::{NameLookup, display_name};
use crate::policy::{is_nucleus, is_visible};

use super::{Selection, count_by_sim_id};

fn check(flag: bool) -> &'static str {
    if flag { "✓" } else { "✗" }
}

/// One row of the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub sim_id: i64,
    pub name: String,
    pub generation: i32,
    pub visible: bool,
    pub reconstructed: bool,
    pub energy: f64,
}

#[derive(Debug, Clone)]
pub struct EventListing {
    pub file_label: String,
    pub event_id: i64,
    pub ordinal: usize,
    pub event_count: usize,
    /// simIDs (other than `-1`) shared by more than one record.
    pub duplicates: usize,
    pub rows: Vec<ListingRow>,
}

impl EventListing {
    pub fn build(
        file_label: &str,
        event: &Event<'_>,
        event_count: usize,
        names: &dyn NameLookup,
    ) -> Self {
        let duplicates = count_by_sim_id(event.particles.iter().copied(), Selection::all())
            .duplicated()
            .count();
        let rows = event
            .particles
            .iter()
            .map(|p| ListingRow {
                sim_id: p.sim_id,
                name: if p.pdg_code == 0 {
                    "Unknown".to_string()
                } else {
                    display_name(names, p.pdg_code)
                },
                generation: p.generation,
                visible: is_visible(p.pdg_code, p.energy) && !is_nucleus(p.pdg_code),
                reconstructed: p.is_reconstructed,
                energy: p.energy,
            })
            .collect();
        Self {
            file_label: file_label.to_string(),
            event_id: event.event_id,
            ordinal: event.ordinal,
            event_count,
            duplicates,
            rows,
        }
    }
}

impl fmt::Display for EventListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.file_label)?;
        writeln!(
            f,
            "Event ID: {}  |  Total Particles: {}  |  Duplicate Particles: {}",
            self.event_id,
            self.rows.len(),
            self.duplicates
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "| ID    | Particle    | Generation | Visible | Reconstructed | Energy (GeV) |"
        )?;
        writeln!(
            f,
            "|-------|-------------|------------|---------|---------------|--------------|"
        )?;
        for row in &self.rows {
            let id = if row.sim_id == NO_SIM_ID {
                "-".to_string()
            } else {
                row.sim_id.to_string()
            };
            writeln!(
                f,
                "| {:<5} | {:<11} | {:^10} | {:^7} | {:^13} | {:<12} |",
                id,
                row.name,
                row.generation,
                check(row.visible),
                check(row.reconstructed),
                format!("{:.3}", row.energy)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Event {} of {}", self.ordinal + 1, self.event_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ParticleRecord, ParticleTable};
    use crate::pdg::PdgCatalog;

    #[test]
    fn test_listing_rows_and_duplicates() {
        let mut table = ParticleTable::new();
        table.push_event(
            42,
            Some(16),
            vec![
                ParticleRecord {
                    sim_id: 1,
                    pdg_code: 13,
                    energy: 1.2,
                    is_reconstructed: true,
                    ..ParticleRecord::default()
                },
                ParticleRecord {
                    sim_id: 1,
                    pdg_code: 13,
                    energy: 0.01,
                    ..ParticleRecord::default()
                },
                ParticleRecord {
                    sim_id: -1,
                    pdg_code: 1000180400,
                    energy: 37.0,
                    ..ParticleRecord::default()
                },
                ParticleRecord {
                    sim_id: -1,
                    pdg_code: 1000180400,
                    energy: 37.0,
                    ..ParticleRecord::default()
                },
            ],
        );
        let event = table.event(0).unwrap();
        let listing = EventListing::build("mu.root", &event, 1, &PdgCatalog::new());

        // -1 never counts as a duplicate
        assert_eq!(listing.duplicates, 1);
        assert!(listing.rows[0].visible);
        assert!(!listing.rows[1].visible);
        assert!(!listing.rows[2].visible);

        let text = listing.to_string();
        assert!(text.contains("Event ID: 42  |  Total Particles: 4  |  Duplicate Particles: 1"));
        assert!(text.contains("| -     | Ar40"));
        assert!(text.contains("1.200"));
        assert!(text.ends_with("Event 1 of 1\n"));
    }
}
