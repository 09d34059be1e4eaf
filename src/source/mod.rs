//! Loading particle tables from files.
//!
//! The [`TableSource`] trait lets the browser load tables without knowing the
//! file format:
//! - [`RootSource`]: `gen1` trees in ROOT files (feature `root`)
//! - [`JsonSource`]: tables exported by `gen1view dump`
//! - [`AutoSource`]: picks one of the above by file extension
//!
//! Track trees ([`load_tracks`]) and branch listings ([`list_branches`]) are
//! ROOT only.

mod json;
#[cfg(feature = "root")]
mod root;

pub use json::{JsonSource, TableDocument, write_json};
#[cfg(feature = "root")]
pub use root::RootSource;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{ParticleTable, TrackTable};

/// Default tree path written by the `AnalyseEvents` module.
pub const DEFAULT_TREE: &str = "ana/gen1";

/// Default path of the per-track tree written by the same module.
pub const DEFAULT_TRACK_TREE: &str = "ana/tree";

/// Errors raised while opening or decoding an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// The file does not exist.
    NotFound(PathBuf),
    /// The file exists but could not be opened or read.
    Open { path: PathBuf, message: String },
    /// The requested tree is absent.
    MissingTree { tree: String, message: String },
    /// A required column is absent.
    MissingColumn { name: String },
    /// Columns are present but inconsistent or of an unexpected type.
    Format(String),
    /// The file type cannot be read by this build.
    Unsupported(String),
}

impl std::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSourceError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            DataSourceError::Open { path, message } => {
                write!(f, "Failed to open '{}': {}", path.display(), message)
            }
            DataSourceError::MissingTree { tree, message } => {
                write!(f, "Tree '{}' not found: {}", tree, message)
            }
            DataSourceError::MissingColumn { name } => write!(f, "Missing column '{}'", name),
            DataSourceError::Format(msg) => write!(f, "Format error: {}", msg),
            DataSourceError::Unsupported(msg) => write!(f, "Unsupported input: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

/// Explicit load configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Tree path inside ROOT files, e.g. `ana/gen1`.
    pub tree: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            tree: DEFAULT_TREE.to_string(),
        }
    }
}

/// Reads a whole particle table into memory.
pub trait TableSource {
    fn read_table(&self, path: &Path) -> Result<ParticleTable, DataSourceError>;
}

/// Dispatches on extension: `.json` to [`JsonSource`], anything else to ROOT.
#[derive(Debug, Clone, Default)]
pub struct AutoSource {
    options: LoadOptions,
}

impl AutoSource {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }
}

impl TableSource for AutoSource {
    fn read_table(&self, path: &Path) -> Result<ParticleTable, DataSourceError> {
        if !path.exists() {
            return Err(DataSourceError::NotFound(path.to_path_buf()));
        }
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            return JsonSource.read_table(path);
        }
        read_root(path, &self.options)
    }
}

#[cfg(feature = "root")]
fn read_root(path: &Path, options: &LoadOptions) -> Result<ParticleTable, DataSourceError> {
    RootSource::new(&options.tree).read_table(path)
}

#[cfg(not(feature = "root"))]
fn read_root(path: &Path, _options: &LoadOptions) -> Result<ParticleTable, DataSourceError> {
    Err(DataSourceError::Unsupported(format!(
        "'{}': ROOT input requires the `root` feature",
        path.display()
    )))
}

/// Name and storage type of one top-level branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    /// C++ type as stored, e.g. `vector<float>`.
    pub type_name: String,
    pub entries: i64,
}

impl std::fmt::Display for BranchInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<24} {:<32} {}", self.name, self.type_name, self.entries)
    }
}

#[cfg(feature = "root")]
fn read_root_tracks(path: &Path, tree: &str) -> Result<TrackTable, DataSourceError> {
    RootSource::new(tree).read_tracks(path)
}

#[cfg(not(feature = "root"))]
fn read_root_tracks(path: &Path, _tree: &str) -> Result<TrackTable, DataSourceError> {
    Err(DataSourceError::Unsupported(format!(
        "'{}': track trees require the `root` feature",
        path.display()
    )))
}

#[cfg(feature = "root")]
fn read_root_branches(path: &Path, tree: &str) -> Result<Vec<BranchInfo>, DataSourceError> {
    RootSource::new(tree).branches(path)
}

#[cfg(not(feature = "root"))]
fn read_root_branches(path: &Path, _tree: &str) -> Result<Vec<BranchInfo>, DataSourceError> {
    Err(DataSourceError::Unsupported(format!(
        "'{}': listing branches requires the `root` feature",
        path.display()
    )))
}

/// Loads the per-track tree `tree` (e.g. `ana/tree`) from a ROOT file.
pub fn load_tracks(path: impl AsRef<Path>, tree: &str) -> Result<TrackTable, DataSourceError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataSourceError::NotFound(path.to_path_buf()));
    }
    let table = read_root_tracks(path, tree)?;
    info!(
        "Loaded {} tracks from {} events in {}",
        table.track_count(),
        table.event_count(),
        path.display()
    );
    Ok(table)
}

/// Top-level branches of `tree` in a ROOT file, in storage order.
pub fn list_branches(path: impl AsRef<Path>, tree: &str) -> Result<Vec<BranchInfo>, DataSourceError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataSourceError::NotFound(path.to_path_buf()));
    }
    read_root_branches(path, tree)
}

/// Loads `path` with the extension-based [`AutoSource`].
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<ParticleTable, DataSourceError> {
    let path = path.as_ref();
    let table = AutoSource::new(options.clone()).read_table(path)?;
    info!(
        "Loaded {} events ({} particles) from {}",
        table.event_count(),
        table.record_count(),
        path.display()
    );
    Ok(table)
}

/// In-memory source keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    tables: HashMap<PathBuf, ParticleTable>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, path: impl AsRef<Path>, table: ParticleTable) {
        self.tables.insert(path.as_ref().to_path_buf(), table);
    }

    pub fn with_table(mut self, path: impl AsRef<Path>, table: ParticleTable) -> Self {
        self.add_table(path, table);
        self
    }
}

impl TableSource for MockSource {
    fn read_table(&self, path: &Path) -> Result<ParticleTable, DataSourceError> {
        self.tables
            .get(path)
            .cloned()
            .ok_or_else(|| DataSourceError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ParticleRecord;

    #[test]
    fn test_auto_source_missing_file() {
        let result = load("/nonexistent/gen1_12345.root", &LoadOptions::default());
        assert_eq!(
            result.unwrap_err(),
            DataSourceError::NotFound(PathBuf::from("/nonexistent/gen1_12345.root"))
        );
    }

    #[test]
    fn test_auto_source_reads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.JSON");
        let table = ParticleTable::from_records(vec![ParticleRecord {
            event_id: 3,
            pdg_code: 13,
            ..ParticleRecord::default()
        }]);
        std::fs::write(&path, TableDocument::from_table(&table, DEFAULT_TREE).to_json().unwrap())
            .unwrap();

        let loaded = load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.event_count(), 1);
        assert_eq!(loaded.records()[0].pdg_code, 13);
    }

    #[test]
    fn test_mock_source() {
        let source = MockSource::new().with_table("a.root", ParticleTable::new());
        assert!(source.read_table(Path::new("a.root")).is_ok());
        assert!(matches!(
            source.read_table(Path::new("b.root")),
            Err(DataSourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_default_tree() {
        assert_eq!(LoadOptions::default().tree, "ana/gen1");
    }

    #[test]
    fn test_track_loaders_missing_file() {
        assert!(matches!(
            load_tracks("/nonexistent/tree.root", DEFAULT_TRACK_TREE),
            Err(DataSourceError::NotFound(_))
        ));
        assert!(matches!(
            list_branches("/nonexistent/tree.root", DEFAULT_TRACK_TREE),
            Err(DataSourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_branch_info_row() {
        let info = BranchInfo {
            name: "trackScore".to_string(),
            type_name: "vector<float>".to_string(),
            entries: 12,
        };
        let row = info.to_string();
        assert!(row.starts_with("trackScore "));
        assert!(row.contains("vector<float>"));
        assert!(row.ends_with(" 12"));
    }
}
