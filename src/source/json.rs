//! JSON export format for particle tables.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{ParticleRecord, ParticleTable};

use super::{DataSourceError, TableSource};

/// Top-level JSON document written by `gen1view dump`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    /// Tree the table was read from.
    pub tree: String,
    pub events: Vec<EventDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    pub event_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nu_pdg_code: Option<i32>,
    pub particles: Vec<ParticleDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleDocument {
    pub sim_id: i64,
    pub pdg_code: i32,
    pub generation: i32,
    pub energy: f64,
    pub sim: bool,
    pub reco: bool,
}

impl TableDocument {
    pub fn from_table(table: &ParticleTable, tree: &str) -> Self {
        let events = table
            .events()
            .map(|event| EventDocument {
                event_id: event.event_id,
                nu_pdg_code: event.neutrino_pdg,
                particles: event
                    .particles
                    .iter()
                    .map(|p| ParticleDocument {
                        sim_id: p.sim_id,
                        pdg_code: p.pdg_code,
                        generation: p.generation,
                        energy: p.energy,
                        sim: p.is_simulated,
                        reco: p.is_reconstructed,
                    })
                    .collect(),
            })
            .collect();
        Self {
            tree: tree.to_string(),
            events,
        }
    }

    pub fn into_table(self) -> ParticleTable {
        let mut table = ParticleTable::new();
        for event in self.events {
            let event_id = event.event_id;
            let particles = event.particles.into_iter().map(|p| ParticleRecord {
                event_id,
                sim_id: p.sim_id,
                pdg_code: p.pdg_code,
                generation: p.generation,
                energy: p.energy,
                is_simulated: p.sim,
                is_reconstructed: p.reco,
            });
            table.push_event(event_id, event.nu_pdg_code, particles);
        }
        table
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Reads tables previously written by [`write_json`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSource;

impl TableSource for JsonSource {
    fn read_table(&self, path: &Path) -> Result<ParticleTable, DataSourceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DataSourceError::NotFound(path.to_path_buf())
            } else {
                DataSourceError::Open {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;
        let document: TableDocument = serde_json::from_str(&content)
            .map_err(|e| DataSourceError::Format(format!("{}: {}", path.display(), e)))?;
        Ok(document.into_table())
    }
}

/// Writes `table` as a pretty-printed [`TableDocument`].
pub fn write_json(
    table: &ParticleTable,
    tree: &str,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let json = TableDocument::from_table(table, tree)
        .to_json()
        .map_err(std::io::Error::other)?;
    out.write_all(json.as_bytes())?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ParticleTable {
        let mut table = ParticleTable::new();
        table.push_event(
            10,
            Some(16),
            vec![ParticleRecord {
                sim_id: 4,
                pdg_code: -15,
                generation: 1,
                energy: 2.5,
                is_simulated: true,
                is_reconstructed: false,
                ..ParticleRecord::default()
            }],
        );
        table.push_event(11, None, Vec::new());
        table
    }

    #[test]
    fn test_write_then_read_preserves_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write_json(&table(), "ana/gen1", &mut file).unwrap();
        drop(file);

        let loaded = JsonSource.read_table(&path).unwrap();
        assert_eq!(loaded.event_count(), 2);
        let first = loaded.event(0).unwrap();
        assert_eq!(first.neutrino_pdg, Some(16));
        assert_eq!(first.particles[0].pdg_code, -15);
        assert_eq!(first.particles[0].event_id, 10);
        assert!(loaded.event(1).unwrap().is_empty());
    }

    #[test]
    fn test_missing_nu_code_is_omitted() {
        let json = TableDocument::from_table(&table(), "ana/gen1").to_json().unwrap();
        assert_eq!(json.matches("nu_pdg_code").count(), 1);
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonSource.read_table(&path),
            Err(DataSourceError::Format(_))
        ));
    }
}
