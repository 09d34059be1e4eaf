//! gen1view - event browser and reports for `gen1` particle trees.
//!
//! The library loads the per-particle truth/reconstruction table written by the
//! `AnalyseEvents` module and provides:
//! - `browser` - interactive event-by-event browser with running statistics
//!   and two-file comparison
//! - `analysis` - one-shot reports (reconstruction summary, pion spectra,
//!   event listings) built on a single filter-and-reduce primitive, plus
//!   muon/pion track score and dE/dx summaries of the per-track `tree`

pub mod analysis;
pub mod browser;
pub mod data;
pub mod fmt;
pub mod pdg;
pub mod policy;
pub mod source;
