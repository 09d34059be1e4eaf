//! Energy spectra of charged pions.

use std::fmt;

use crate::data::ParticleTable;

use super::{Histogram, Selection, energies};

const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy)]
pub struct SpectrumOptions {
    pub generation: i32,
    pub bins: usize,
}

impl Default for SpectrumOptions {
    fn default() -> Self {
        Self {
            generation: 1,
            bins: 20,
        }
    }
}

/// Energies of one species.
#[derive(Debug, Clone)]
pub struct SpeciesSpectrum {
    pub pdg: i32,
    /// Plural label, e.g. `"negative pions"`.
    pub label: &'static str,
    pub energies: Vec<f64>,
    pub histogram: Option<Histogram>,
}

impl SpeciesSpectrum {
    pub fn range(&self) -> Option<(f64, f64)> {
        let min = self.energies.iter().copied().reduce(f64::min)?;
        let max = self.energies.iter().copied().reduce(f64::max)?;
        Some((min, max))
    }
}

#[derive(Debug, Clone)]
pub struct SpectrumReport {
    pub generation: i32,
    pub species: Vec<SpeciesSpectrum>,
}

impl SpectrumReport {
    /// Simulated pi- and pi+ of `options.generation`.
    pub fn build(table: &ParticleTable, options: &SpectrumOptions) -> Self {
        let species = [(-211, "negative pions"), (211, "positive pions")]
            .into_iter()
            .map(|(pdg, label)| {
                let selection = Selection::simulated()
                    .with_generation(options.generation)
                    .with_pdg(pdg);
                let energies = energies(table.records(), selection);
                let histogram = Histogram::from_values(&energies, options.bins);
                SpeciesSpectrum {
                    pdg,
                    label,
                    energies,
                    histogram,
                }
            })
            .collect();
        Self {
            generation: options.generation,
            species,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for SpectrumReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 1 {
            writeln!(f, "Energy Distribution of First-Generation Pions")?;
        } else {
            writeln!(
                f,
                "Energy Distribution of Generation-{} Pions",
                self.generation
            )?;
        }
        for species in &self.species {
            // "negative pions" -> "Negative pion"
            let singular = capitalize(species.label.trim_end_matches('s'));
            writeln!(f)?;
            writeln!(f, "Found {} {}", species.energies.len(), species.label)?;
            match species.range() {
                Some((min, max)) => writeln!(
                    f,
                    "{} energy range: {:.2} to {:.2} GeV",
                    singular, min, max
                )?,
                None => writeln!(f, "No {} found", species.label)?,
            }
            if let Some(histogram) = &species.histogram {
                for (lower, upper, count) in histogram.iter() {
                    writeln!(
                        f,
                        "  {:>7.3} - {:<7.3} GeV | {:<width$} {}",
                        lower,
                        upper,
                        "#".repeat(histogram.bar_len(count, BAR_WIDTH)),
                        count,
                        width = BAR_WIDTH
                    )?;
                }
            }
        }
        Ok(())
    }
}
