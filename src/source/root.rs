//! `gen1` trees in ROOT files, read through `oxyroot`.
//!
//! Two layouts are accepted:
//! - jagged: one entry per event, per-particle branches are `std::vector<T>`
//!   and `eventID`/`nuPdgCode` are scalars;
//! - flat: one entry per particle, every branch is a scalar.
//!
//! The per-track `tree` is read the same way, with calorimetry branches as
//! `vector<vector<float>>` (jagged) or `vector<float>` (one track per entry).
//!
//! oxyroot only resolves keys at the top level of a file. A path such as
//! `ana/gen1` is tried as given, then by its last component.

use std::path::Path;

use oxyroot::{Branch, ReaderTree, RootFile};
use tracing::debug;

use crate::data::{HitSample, ParticleRecord, ParticleTable, TrackRecord, TrackTable};

use super::{BranchInfo, DataSourceError, TableSource};

/// Reads the tree at `tree` (e.g. `ana/gen1`) from ROOT files.
#[derive(Debug, Clone)]
pub struct RootSource {
    tree: String,
}

impl RootSource {
    pub fn new(tree: impl Into<String>) -> Self {
        Self { tree: tree.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScalarKind {
    Bool,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

fn scalar_kind(type_name: &str) -> Option<ScalarKind> {
    let lower = type_name.to_ascii_lowercase();
    let unsigned = lower.contains("unsigned") || lower.contains("uint") || lower.contains("ulong");
    if lower.contains("bool") {
        Some(ScalarKind::Bool)
    } else if lower.contains("double") {
        Some(ScalarKind::F64)
    } else if lower.contains("float") {
        Some(ScalarKind::F32)
    } else if lower.contains("64") || lower.contains("long") {
        Some(if unsigned { ScalarKind::U64 } else { ScalarKind::I64 })
    } else if lower.contains("int") {
        Some(if unsigned { ScalarKind::U32 } else { ScalarKind::I32 })
    } else {
        None
    }
}

fn is_jagged(branch: &Branch) -> bool {
    branch.item_type_name().to_ascii_lowercase().contains("vector")
}

fn read_error(column: &str, err: impl std::fmt::Display) -> DataSourceError {
    // the oxyroot error type is not public
    DataSourceError::Format(format!("Failed to read branch '{}': {}", column, err))
}

macro_rules! read_entries {
    ($branch:expr, $column:expr, $jagged:expr, $ty:ty, $convert:expr) => {{
        if $jagged {
            $branch
                .as_iter::<Vec<$ty>>()
                .map_err(|e| read_error($column, e))?
                .map(|entry| entry.into_iter().map($convert).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        } else {
            $branch
                .as_iter::<$ty>()
                .map_err(|e| read_error($column, e))?
                .map(|value| vec![($convert)(value)])
                .collect::<Vec<_>>()
        }
    }};
}

fn find_branch<'a>(tree: &'a ReaderTree, name: &str) -> Option<&'a Branch> {
    tree.branches().find(|branch| branch.name() == name)
}

fn required<'a>(tree: &'a ReaderTree, name: &str) -> Result<&'a Branch, DataSourceError> {
    find_branch(tree, name).ok_or_else(|| DataSourceError::MissingColumn {
        name: name.to_string(),
    })
}

fn kind_of(branch: &Branch, column: &str) -> Result<ScalarKind, DataSourceError> {
    let type_name = branch.item_type_name();
    scalar_kind(&type_name).ok_or_else(|| {
        DataSourceError::Format(format!(
            "branch '{}' has unsupported type '{}'",
            column, type_name
        ))
    })
}

/// Reads an integer-like branch as per-entry lists.
fn int_entries(branch: &Branch, column: &str) -> Result<Vec<Vec<i64>>, DataSourceError> {
    let jagged = is_jagged(branch);
    let entries = match kind_of(branch, column)? {
        ScalarKind::Bool => read_entries!(branch, column, jagged, bool, |v: bool| i64::from(v)),
        ScalarKind::I32 => read_entries!(branch, column, jagged, i32, |v: i32| i64::from(v)),
        ScalarKind::U32 => read_entries!(branch, column, jagged, u32, |v: u32| i64::from(v)),
        ScalarKind::I64 => read_entries!(branch, column, jagged, i64, |v: i64| v),
        // event ids and codes never reach 2^63
        ScalarKind::U64 => read_entries!(branch, column, jagged, u64, |v: u64| v as i64),
        ScalarKind::F32 | ScalarKind::F64 => {
            return Err(DataSourceError::Format(format!(
                "branch '{}' is floating point, expected integers",
                column
            )));
        }
    };
    Ok(entries)
}

/// Reads a float-like branch as per-entry lists.
fn float_entries(branch: &Branch, column: &str) -> Result<Vec<Vec<f64>>, DataSourceError> {
    let jagged = is_jagged(branch);
    let entries = match kind_of(branch, column)? {
        ScalarKind::F32 => read_entries!(branch, column, jagged, f32, |v: f32| f64::from(v)),
        ScalarKind::F64 => read_entries!(branch, column, jagged, f64, |v: f64| v),
        ScalarKind::I32 => read_entries!(branch, column, jagged, i32, |v: i32| f64::from(v)),
        other => {
            return Err(DataSourceError::Format(format!(
                "branch '{}' has type {:?}, expected floating point",
                column, other
            )));
        }
    };
    Ok(entries)
}

macro_rules! read_nested {
    ($branch:expr, $column:expr, $ty:ty) => {{
        $branch
            .as_iter::<Vec<Vec<$ty>>>()
            .map_err(|e| read_error($column, e))?
            .map(|entry| {
                entry
                    .into_iter()
                    .map(|inner| inner.into_iter().map(f64::from).collect::<Vec<_>>())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    }};
}

/// Reads a per-track list of floats as `[entry][track][hit]`.
fn nested_float_entries(branch: &Branch, column: &str) -> Result<Vec<Vec<Vec<f64>>>, DataSourceError> {
    let type_name = branch.item_type_name().to_ascii_lowercase();
    if type_name.matches("vector").count() < 2 {
        // one track per entry
        return Ok(float_entries(branch, column)?
            .into_iter()
            .map(|hits| vec![hits])
            .collect());
    }
    let entries = match kind_of(branch, column)? {
        ScalarKind::F32 => read_nested!(branch, column, f32),
        ScalarKind::F64 => read_nested!(branch, column, f64),
        other => {
            return Err(DataSourceError::Format(format!(
                "branch '{}' has type {:?}, expected floating point",
                column, other
            )));
        }
    };
    Ok(entries)
}

/// First branch present among `names`, with the name it was found under.
fn find_any<'a, 'n>(tree: &'a ReaderTree, names: &[&'n str]) -> Option<(&'a Branch, &'n str)> {
    names
        .iter()
        .find_map(|&name| find_branch(tree, name).map(|branch| (branch, name)))
}

fn required_any<'a, 'n>(
    tree: &'a ReaderTree,
    names: &[&'n str],
) -> Result<(&'a Branch, &'n str), DataSourceError> {
    find_any(tree, names).ok_or_else(|| DataSourceError::MissingColumn {
        name: names.join("' or '"),
    })
}

/// Opens `tree`, falling back to its last path component.
fn open_tree(file: &mut RootFile, tree: &str) -> Result<ReaderTree, DataSourceError> {
    let message = match file.get_tree(tree) {
        Ok(found) => return Ok(found),
        Err(e) => e.to_string(),
    };
    let Some((_, leaf)) = tree.rsplit_once('/').filter(|(_, leaf)| !leaf.is_empty()) else {
        return Err(DataSourceError::MissingTree {
            tree: tree.to_string(),
            message,
        });
    };
    match file.get_tree(leaf) {
        Ok(found) => {
            debug!("Tree '{}' not found, using top-level '{}'", tree, leaf);
            Ok(found)
        }
        Err(_) => Err(DataSourceError::MissingTree {
            tree: tree.to_string(),
            message: format!(
                "{}; trees inside ROOT directories cannot be read, \
                 copy '{}' to the top level of the file",
                message, leaf
            ),
        }),
    }
}

/// Per-particle columns, indexed `[entry][particle]`.
struct Columns {
    sim_id: Vec<Vec<i64>>,
    pdg_code: Vec<Vec<i64>>,
    sim: Vec<Vec<i64>>,
    reco: Vec<Vec<i64>>,
    generation: Vec<Vec<i64>>,
    energy: Vec<Vec<f64>>,
}

impl Columns {
    fn read(tree: &ReaderTree) -> Result<Self, DataSourceError> {
        let int = |name: &str| int_entries(required(tree, name)?, name);
        Ok(Self {
            sim_id: int("simID")?,
            pdg_code: int("simPdgCode")?,
            sim: int("sim")?,
            reco: int("reco")?,
            generation: int("simGeneration")?,
            energy: float_entries(required(tree, "simEnergy")?, "simEnergy")?,
        })
    }

    fn check_shape(&self, entries: usize) -> Result<(), DataSourceError> {
        let lengths = [
            ("simID", self.sim_id.len()),
            ("simPdgCode", self.pdg_code.len()),
            ("sim", self.sim.len()),
            ("reco", self.reco.len()),
            ("simGeneration", self.generation.len()),
            ("simEnergy", self.energy.len()),
        ];
        for (name, len) in lengths {
            if len != entries {
                return Err(DataSourceError::Format(format!(
                    "branch '{}' has {} entries, expected {}",
                    name, len, entries
                )));
            }
        }
        Ok(())
    }

    fn particles(&self, entry: usize, event_id: i64) -> Result<Vec<ParticleRecord>, DataSourceError> {
        let n = self.pdg_code[entry].len();
        let same_length = [
            self.sim_id[entry].len(),
            self.sim[entry].len(),
            self.reco[entry].len(),
            self.generation[entry].len(),
            self.energy[entry].len(),
        ]
        .iter()
        .all(|&len| len == n);
        if !same_length {
            return Err(DataSourceError::Format(format!(
                "entry {} (event {}) has per-particle branches of different lengths",
                entry, event_id
            )));
        }
        let records = (0..n)
            .map(|i| ParticleRecord {
                event_id,
                sim_id: self.sim_id[entry][i],
                pdg_code: self.pdg_code[entry][i] as i32,
                generation: self.generation[entry][i] as i32,
                energy: self.energy[entry][i],
                is_simulated: self.sim[entry][i] == 1,
                is_reconstructed: self.reco[entry][i] == 1,
            })
            .collect();
        Ok(records)
    }
}

const SCORE: &[&str] = &["trackScore", "trackScores"];
const TRUE_PDG: &[&str] = &["truePdgCode", "truePdgCodes"];
const LENGTH: &[&str] = &["trackLength", "trackLengths"];
const DEDX: &[&str] = &["hitdEdx", "trackdEdx"];
const RES_RANGE: &[&str] = &["hitResRange", "trackResRange"];

/// Per-track columns, indexed `[entry][track]`.
struct TrackColumns {
    score: Vec<Vec<f64>>,
    true_pdg: Vec<Vec<i64>>,
    length: Option<Vec<Vec<f64>>>,
    /// `(residual range, dE/dx)`, indexed `[entry][track][hit]`.
    hits: Option<(Vec<Vec<Vec<f64>>>, Vec<Vec<Vec<f64>>>)>,
}

impl TrackColumns {
    fn read(tree: &ReaderTree) -> Result<Self, DataSourceError> {
        let (branch, name) = required_any(tree, SCORE)?;
        let score = float_entries(branch, name)?;
        let (branch, name) = required_any(tree, TRUE_PDG)?;
        let true_pdg = int_entries(branch, name)?;
        let length = match find_any(tree, LENGTH) {
            Some((branch, name)) => Some(float_entries(branch, name)?),
            None => None,
        };
        let hits = match (find_any(tree, RES_RANGE), find_any(tree, DEDX)) {
            (Some((range, range_name)), Some((dedx, dedx_name))) => Some((
                nested_float_entries(range, range_name)?,
                nested_float_entries(dedx, dedx_name)?,
            )),
            (None, None) => None,
            (Some(_), None) => {
                return Err(DataSourceError::MissingColumn {
                    name: DEDX.join("' or '"),
                });
            }
            (None, Some(_)) => {
                return Err(DataSourceError::MissingColumn {
                    name: RES_RANGE.join("' or '"),
                });
            }
        };
        Ok(Self {
            score,
            true_pdg,
            length,
            hits,
        })
    }

    fn check_shape(&self, entries: usize) -> Result<(), DataSourceError> {
        let mut lengths = vec![
            (SCORE[0], self.score.len()),
            (TRUE_PDG[0], self.true_pdg.len()),
        ];
        if let Some(length) = &self.length {
            lengths.push((LENGTH[0], length.len()));
        }
        if let Some((range, dedx)) = &self.hits {
            lengths.push((RES_RANGE[0], range.len()));
            lengths.push((DEDX[0], dedx.len()));
        }
        for (name, len) in lengths {
            if len != entries {
                return Err(DataSourceError::Format(format!(
                    "branch '{}' has {} entries, expected {}",
                    name, len, entries
                )));
            }
        }
        Ok(())
    }

    fn tracks(&self, entry: usize, event_id: i64) -> Result<Vec<TrackRecord>, DataSourceError> {
        let n = self.true_pdg[entry].len();
        let mismatch = || {
            DataSourceError::Format(format!(
                "entry {} (event {}) has per-track branches of different lengths",
                entry, event_id
            ))
        };
        if self.score[entry].len() != n {
            return Err(mismatch());
        }
        if let Some(length) = &self.length {
            if length[entry].len() != n {
                return Err(mismatch());
            }
        }
        if let Some((range, dedx)) = &self.hits {
            if range[entry].len() != n || dedx[entry].len() != n {
                return Err(mismatch());
            }
        }

        let mut tracks = Vec::with_capacity(n);
        for i in 0..n {
            let hits = match &self.hits {
                Some((range, dedx)) => {
                    let (range, dedx) = (&range[entry][i], &dedx[entry][i]);
                    if range.len() != dedx.len() {
                        return Err(DataSourceError::Format(format!(
                            "track {} of event {} has {} residual ranges and {} dE/dx values",
                            i,
                            event_id,
                            range.len(),
                            dedx.len()
                        )));
                    }
                    range
                        .iter()
                        .zip(dedx)
                        .map(|(&residual_range, &dedx)| HitSample {
                            residual_range,
                            dedx,
                        })
                        .collect()
                }
                None => Vec::new(),
            };
            tracks.push(TrackRecord {
                event_id,
                true_pdg: self.true_pdg[entry][i] as i32,
                score: self.score[entry][i],
                length: self.length.as_ref().map(|length| length[entry][i]),
                hits,
            });
        }
        Ok(tracks)
    }
}

fn first_value(entries: &[Vec<i64>], entry: usize) -> Option<i64> {
    entries.get(entry).and_then(|values| values.first().copied())
}

impl RootSource {
    fn open(&self, path: &Path) -> Result<ReaderTree, DataSourceError> {
        let mut file = RootFile::open(path).map_err(|e| DataSourceError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        open_tree(&mut file, &self.tree)
    }

    /// Top-level branches of the tree.
    pub fn branches(&self, path: &Path) -> Result<Vec<BranchInfo>, DataSourceError> {
        if !path.exists() {
            return Err(DataSourceError::NotFound(path.to_path_buf()));
        }
        let tree = self.open(path)?;
        Ok(tree
            .branches()
            .map(|branch| BranchInfo {
                name: branch.name().to_string(),
                type_name: branch.item_type_name(),
                entries: branch.entries(),
            })
            .collect())
    }

    /// Reads the tree as tracks.
    pub fn read_tracks(&self, path: &Path) -> Result<TrackTable, DataSourceError> {
        if !path.exists() {
            return Err(DataSourceError::NotFound(path.to_path_buf()));
        }
        let tree = self.open(path)?;
        let event_ids = int_entries(required(&tree, "eventID")?, "eventID")?;
        let columns = TrackColumns::read(&tree)?;
        columns.check_shape(event_ids.len())?;
        debug!(
            "Reading {} track entries from tree '{}' in {}",
            event_ids.len(),
            self.tree,
            path.display()
        );

        let mut table = TrackTable::new();
        for entry in 0..event_ids.len() {
            let event_id = first_value(&event_ids, entry).ok_or_else(|| {
                DataSourceError::Format(format!("entry {} has no eventID", entry))
            })?;
            table.push_event(event_id, columns.tracks(entry, event_id)?);
        }
        Ok(table)
    }
}

impl TableSource for RootSource {
    fn read_table(&self, path: &Path) -> Result<ParticleTable, DataSourceError> {
        if !path.exists() {
            return Err(DataSourceError::NotFound(path.to_path_buf()));
        }
        let tree = self.open(path)?;

        let event_ids = int_entries(required(&tree, "eventID")?, "eventID")?;
        let neutrinos = match find_branch(&tree, "nuPdgCode") {
            Some(branch) => Some(int_entries(branch, "nuPdgCode")?),
            None => None,
        };
        let columns = Columns::read(&tree)?;
        columns.check_shape(event_ids.len())?;
        debug!(
            "Reading {} entries from tree '{}' in {}",
            event_ids.len(),
            self.tree,
            path.display()
        );

        let mut table = ParticleTable::new();
        for entry in 0..event_ids.len() {
            let event_id = first_value(&event_ids, entry).ok_or_else(|| {
                DataSourceError::Format(format!("entry {} has no eventID", entry))
            })?;
            let neutrino = neutrinos
                .as_deref()
                .and_then(|values| first_value(values, entry))
                .map(|pdg| pdg as i32);
            let particles = columns.particles(entry, event_id)?;
            table.push_event(event_id, neutrino, particles);
        }
        Ok(table)
    }
}
