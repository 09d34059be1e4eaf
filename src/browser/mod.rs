//! Interactive event-by-event browser.
//!
//! [`BrowseSession`] owns the loaded table, the cursor and the statistics
//! accumulated over displayed events. It is driven one command at a time
//! through [`BrowseSession::execute`], which keeps it independent of the
//! terminal; [`Pager`] wires it to stdin/stdout.

mod command;
mod compare;
mod pager;
mod report;

pub use command::{COMMAND_HELP, Command, InputParseError, NAVIGATION_HELP, argument_prompt};
pub use compare::{ComparisonReport, FileSummary, PdgComparison, SharedDistribution, compare};
pub use pager::{BrowserConfig, Pager};
pub use report::{
    EventReport, NO_STATISTICS, ParticleRow, SimIdRow, SimIdSummary, StatsReport, VisitedStat,
    aggregate_stats,
};

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::analysis::EventListing;
use crate::data::ParticleTable;
use crate::pdg::{NameLookup, PdgCatalog};
use crate::policy::{ExclusionSet, Reconstructable};
use crate::source::{AutoSource, DataSourceError, LoadOptions, TableSource, load};

/// Outcome of one command, interpreted by the pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show the current event again.
    Redraw,
    /// Show this text until the user presses Enter.
    Report(String),
    /// Show this line under the next redraw.
    Message(String),
    Quit,
}

/// The comparison file could not be used. The session is unaffected.
#[derive(Debug)]
pub enum ComparisonFileError {
    NotFound(PathBuf),
    Load(DataSourceError),
}

impl std::fmt::Display for ComparisonFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonFileError::NotFound(path) => {
                write!(f, "File not found: {}", path.display())
            }
            ComparisonFileError::Load(err) => write!(f, "Error comparing files: {}", err),
        }
    }
}

impl std::error::Error for ComparisonFileError {}

impl From<DataSourceError> for ComparisonFileError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::NotFound(path) => ComparisonFileError::NotFound(path),
            other => ComparisonFileError::Load(other),
        }
    }
}

/// Fatal browser errors.
#[derive(Debug)]
pub enum BrowseError {
    /// The file holds no events.
    Empty(String),
    Source(DataSourceError),
    /// Terminal I/O failed.
    Io(std::io::Error),
}

impl std::fmt::Display for BrowseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowseError::Empty(label) => write!(f, "No events found in {}", label),
            BrowseError::Source(err) => write!(f, "{}", err),
            BrowseError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for BrowseError {}

impl From<DataSourceError> for BrowseError {
    fn from(err: DataSourceError) -> Self {
        BrowseError::Source(err)
    }
}

impl From<std::io::Error> for BrowseError {
    fn from(err: std::io::Error) -> Self {
        BrowseError::Io(err)
    }
}

/// File name used in report titles, falling back to the full path.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Browser state over one loaded table.
pub struct BrowseSession {
    table: ParticleTable,
    label: String,
    /// Always `< table.event_count()`.
    cursor: usize,
    visited_stats: Vec<VisitedStat>,
    visited_simids: Vec<SimIdSummary>,
    /// Loads comparison files.
    source: Box<dyn TableSource>,
    policy: Box<dyn Reconstructable>,
    names: Box<dyn NameLookup>,
    finished: bool,
}

impl BrowseSession {
    /// Creates a session at the first event. Fails if `table` has no events.
    pub fn new(
        table: ParticleTable,
        label: impl Into<String>,
        source: Box<dyn TableSource>,
    ) -> Result<Self, BrowseError> {
        let label = label.into();
        if table.event_count() == 0 {
            return Err(BrowseError::Empty(label));
        }
        Ok(Self {
            table,
            label,
            cursor: 0,
            visited_stats: Vec::new(),
            visited_simids: Vec::new(),
            source,
            policy: Box::new(ExclusionSet::standard()),
            names: Box::new(PdgCatalog::new()),
            finished: false,
        })
    }

    /// Loads `path` and opens a session over it. Comparison files use the same options.
    pub fn open(path: &Path, options: &LoadOptions) -> Result<Self, BrowseError> {
        let table = load(path, options)?;
        Self::new(
            table,
            file_label(path),
            Box::new(AutoSource::new(options.clone())),
        )
    }

    pub fn with_policy(mut self, policy: impl Reconstructable + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_names(mut self, names: impl NameLookup + 'static) -> Self {
        self.names = Box::new(names);
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn event_count(&self) -> usize {
        self.table.event_count()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `(current position (1-based), total events)`.
    pub fn position_info(&self) -> (usize, usize) {
        (self.cursor + 1, self.event_count())
    }

    pub fn visited_stats(&self) -> &[VisitedStat] {
        &self.visited_stats
    }

    pub fn visited_simids(&self) -> &[SimIdSummary] {
        &self.visited_simids
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Moves forward, staying on the last event.
    pub fn next(&mut self) {
        if self.cursor + 1 < self.event_count() {
            self.cursor += 1;
        }
    }

    /// Moves back, staying on the first event.
    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Jumps to the one-based event `number`, clamped to the table.
    pub fn jump_to(&mut self, number: i64) {
        let last = self.event_count().saturating_sub(1) as i64;
        self.cursor = number.saturating_sub(1).clamp(0, last) as usize;
    }

    /// Report for the event under the cursor, without recording statistics.
    pub fn current_report(&self) -> Option<EventReport> {
        let event = self.table.event(self.cursor)?;
        Some(EventReport::build(
            &event,
            self.event_count(),
            self.policy.as_ref(),
            self.names.as_ref(),
        ))
    }

    /// Renders the current event and records its statistics.
    pub fn render_current(&mut self) -> String {
        let Some(report) = self.current_report() else {
            return String::new();
        };
        if let Some(stat) = report.visited_stat() {
            self.visited_stats.push(stat);
        }
        self.visited_simids.push(report.sim_ids.clone());
        report.to_string()
    }

    /// Statistics over every display so far.
    pub fn stats_report(&self) -> String {
        match aggregate_stats(&self.visited_stats) {
            Some(stats) => stats.with_sim_ids(&self.visited_simids).to_string(),
            None => NO_STATISTICS.to_string(),
        }
    }

    /// Per-particle listing of the current event.
    pub fn listing(&self) -> String {
        self.table
            .event(self.cursor)
            .map(|event| {
                EventListing::build(&self.label, &event, self.event_count(), self.names.as_ref())
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// Loads `path` through the session's source and compares it with this table.
    pub fn compare_with(&self, path: &Path) -> Result<ComparisonReport, ComparisonFileError> {
        let other = self.source.read_table(path)?;
        Ok(compare(
            &self.label,
            &self.table,
            &file_label(path),
            &other,
            self.names.as_ref(),
        ))
    }

    /// Applies one command. After `Quit`, every command returns `Quit`.
    pub fn dispatch(&mut self, command: &Command) -> Action {
        if self.finished {
            return Action::Quit;
        }
        debug!("Dispatching {:?} at event {}", command, self.cursor + 1);
        match command {
            Command::Next => {
                self.next();
                Action::Redraw
            }
            Command::Previous => {
                self.previous();
                Action::Redraw
            }
            Command::Jump(number) => {
                self.jump_to(*number);
                Action::Redraw
            }
            Command::Stats => Action::Report(self.stats_report()),
            Command::Compare(path) => match self.compare_with(path) {
                Ok(report) => Action::Report(report.to_string()),
                Err(err) => {
                    warn!("Comparison with {} failed: {}", path.display(), err);
                    Action::Message(err.to_string())
                }
            },
            Command::List => Action::Report(self.listing()),
            Command::Help => Action::Report(COMMAND_HELP.to_string()),
            Command::Quit => {
                self.finished = true;
                Action::Quit
            }
            Command::Invalid(input) => Action::Message(format!("Invalid choice: {}", input)),
        }
    }

    /// Parses and dispatches one input line.
    pub fn execute(&mut self, line: &str) -> Action {
        match Command::parse(line) {
            Ok(command) => self.dispatch(&command),
            Err(_) if self.finished => Action::Quit,
            Err(err) => Action::Message(err.to_string()),
        }
    }
}
