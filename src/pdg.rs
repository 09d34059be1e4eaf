//! Particle display names keyed by PDG code.

use tracing::debug;

/// Error returned when a PDG code has no known name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    Unknown(i32),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::Unknown(pdg) => write!(f, "unknown PDG code {}", pdg),
        }
    }
}

impl std::error::Error for LookupError {}

/// Resolves PDG codes to display names.
pub trait NameLookup {
    fn name(&self, pdg: i32) -> Result<String, LookupError>;
}

/// Returns the display name for `pdg`, or `"PDG <code>"` when the lookup fails.
pub fn display_name(lookup: &dyn NameLookup, pdg: i32) -> String {
    match lookup.name(pdg) {
        Ok(name) => name,
        Err(e) => {
            debug!("name lookup fallback: {}", e);
            format!("PDG {}", pdg)
        }
    }
}

/// Built-in catalog of the species that show up in neutrino-argon events.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdgCatalog;

const PARTICLES: &[(i32, &str)] = &[
    (1, "d"),
    (2, "u"),
    (3, "s"),
    (4, "c"),
    (5, "b"),
    (6, "t"),
    (11, "e-"),
    (-11, "e+"),
    (12, "nu(e)"),
    (-12, "nu(e)~"),
    (13, "mu-"),
    (-13, "mu+"),
    (14, "nu(mu)"),
    (-14, "nu(mu)~"),
    (15, "tau-"),
    (-15, "tau+"),
    (16, "nu(tau)"),
    (-16, "nu(tau)~"),
    (21, "g"),
    (22, "gamma"),
    (23, "Z0"),
    (24, "W+"),
    (-24, "W-"),
    (111, "pi0"),
    (211, "pi+"),
    (-211, "pi-"),
    (113, "rho(770)0"),
    (213, "rho(770)+"),
    (-213, "rho(770)-"),
    (221, "eta"),
    (223, "omega(782)"),
    (331, "eta'(958)"),
    (130, "K(L)0"),
    (310, "K(S)0"),
    (311, "K0"),
    (-311, "K~0"),
    (321, "K+"),
    (-321, "K-"),
    (313, "K*(892)0"),
    (323, "K*(892)+"),
    (-323, "K*(892)-"),
    (411, "D+"),
    (-411, "D-"),
    (421, "D0"),
    (-421, "D~0"),
    (431, "D(s)+"),
    (-431, "D(s)-"),
    (2212, "p"),
    (-2212, "p~"),
    (2112, "n"),
    (-2112, "n~"),
    (2224, "Delta(1232)++"),
    (2214, "Delta(1232)+"),
    (2114, "Delta(1232)0"),
    (1114, "Delta(1232)-"),
    (3122, "Lambda"),
    (-3122, "Lambda~"),
    (3222, "Sigma+"),
    (3212, "Sigma0"),
    (3112, "Sigma-"),
    (-3222, "Sigma~-"),
    (-3112, "Sigma~+"),
    (3322, "Xi0"),
    (3312, "Xi-"),
    (3334, "Omega-"),
    (4122, "Lambda(c)+"),
    (-4122, "Lambda(c)~-"),
    (4222, "Sigma(c)(2455)++"),
    (4212, "Sigma(c)(2455)+"),
    (4112, "Sigma(c)(2455)0"),
];

const ELEMENTS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr",
];

const NUCLEUS_BASE: i32 = 1_000_000_000;

impl PdgCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Decodes a `10LZZZAAAI` nucleus code.
    fn nucleus_name(pdg: i32) -> Option<String> {
        if pdg <= NUCLEUS_BASE || pdg >= 2 * NUCLEUS_BASE {
            return None;
        }
        let z = ((pdg / 10_000) % 1000) as usize;
        let a = (pdg / 10) % 1000;
        let named = match (z, a) {
            (1, 2) => Some("d"),
            (1, 3) => Some("t"),
            (2, 4) => Some("alpha"),
            _ => None,
        };
        if let Some(name) = named {
            return Some(name.to_string());
        }
        let symbol = ELEMENTS.get(z.checked_sub(1)?)?;
        Some(format!("{}{}", symbol, a))
    }
}

impl NameLookup for PdgCatalog {
    fn name(&self, pdg: i32) -> Result<String, LookupError> {
        if let Some(&(_, name)) = PARTICLES.iter().find(|(code, _)| *code == pdg) {
            return Ok(name.to_string());
        }
        Self::nucleus_name(pdg).ok_or(LookupError::Unknown(pdg))
    }
}
