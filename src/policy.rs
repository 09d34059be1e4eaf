//! Detector-level classification of particle species.
//!
//! Which species count as "reconstructable" is analysis policy. The browser and
//! reports take it through the [`Reconstructable`] trait so it can be swapped.

use std::collections::BTreeSet;

/// Decides whether a species can leave a reconstructable signal.
pub trait Reconstructable {
    fn is_reconstructable(&self, pdg: i32) -> bool;
}

/// Species excluded from reconstruction, matched exactly or by absolute value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    exact: BTreeSet<i32>,
    absolute: BTreeSet<i32>,
}

const NEUTRINOS: [i32; 3] = [12, 14, 16];

impl ExclusionSet {
    /// Neutral and invisible species, including Ar40 and neutral kaons.
    pub fn standard() -> Self {
        let absolute = [2112, 22, 111, 310, 130, 3122, 2000000001, 1000180400, 311]
            .into_iter()
            .chain(NEUTRINOS)
            .collect();
        Self {
            exact: BTreeSet::new(),
            absolute,
        }
    }

    /// The earlier exclusion list: listed codes match exactly, neutrinos by |pdg|.
    pub fn legacy() -> Self {
        Self {
            exact: [2112, 22, 111, 310, 130, 3122, 2000000001]
                .into_iter()
                .collect(),
            absolute: NEUTRINOS.into_iter().collect(),
        }
    }

    /// Adds a code excluded regardless of sign.
    pub fn exclude(mut self, pdg: i32) -> Self {
        self.absolute.insert(pdg.abs());
        self
    }

    pub fn is_excluded(&self, pdg: i32) -> bool {
        self.exact.contains(&pdg) || self.absolute.contains(&pdg.abs())
    }
}

impl Reconstructable for ExclusionSet {
    fn is_reconstructable(&self, pdg: i32) -> bool {
        !self.is_excluded(pdg)
    }
}

impl<F> Reconstructable for F
where
    F: Fn(i32) -> bool,
{
    fn is_reconstructable(&self, pdg: i32) -> bool {
        self(pdg)
    }
}

/// Returns `true` for nuclear codes (`10LZZZAAAI`).
pub fn is_nucleus(pdg: i32) -> bool {
    pdg > 1_000_000_000
}

/// LArTPC visibility by species and kinetic-energy threshold (GeV).
pub fn is_visible(pdg: i32, energy: f64) -> bool {
    if matches!(pdg.abs(), 12 | 14 | 16 | 111 | 2112) {
        return false;
    }
    match pdg {
        211 | -211 => energy > 0.1,
        2212 => energy > 0.05,
        22 | 11 | -11 | 13 | -13 => energy > 0.03,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_exclusions() {
        let set = ExclusionSet::standard();
        for pdg in [2112, -2112, 22, 111, 311, -311, 1000180400, 12, -14, 16] {
            assert!(!set.is_reconstructable(pdg), "{} should be excluded", pdg);
        }
        for pdg in [13, -13, 211, -211, 2212, 11, 321] {
            assert!(set.is_reconstructable(pdg), "{} should be kept", pdg);
        }
    }

    #[test]
    fn test_legacy_exclusions_differ_from_standard() {
        let legacy = ExclusionSet::legacy();
        assert!(!legacy.is_reconstructable(2112));
        assert!(!legacy.is_reconstructable(-12));
        // Exact match only for the listed neutrals
        assert!(legacy.is_reconstructable(-2112));
        assert!(legacy.is_reconstructable(311));
        assert!(legacy.is_reconstructable(1000180400));
    }

    #[test]
    fn test_extra_exclusion() {
        let set = ExclusionSet::standard().exclude(-321);
        assert!(!set.is_reconstructable(321));
        assert!(!set.is_reconstructable(-321));
    }

    #[test]
    fn test_closure_policy() {
        let muons_only = |pdg: i32| pdg.abs() == 13;
        assert!(muons_only.is_reconstructable(-13));
        assert!(!muons_only.is_reconstructable(211));
    }

    #[test]
    fn test_visibility_thresholds() {
        assert!(!is_visible(14, 5.0));
        assert!(!is_visible(2112, 1.0));
        assert!(!is_visible(211, 0.1));
        assert!(is_visible(-211, 0.11));
        assert!(!is_visible(2212, 0.04));
        assert!(is_visible(2212, 0.06));
        assert!(!is_visible(13, 0.02));
        assert!(is_visible(321, 0.0));
        assert!(is_nucleus(1000180400));
        assert!(!is_nucleus(2212));
    }
}
