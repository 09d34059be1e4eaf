//! Fixed-width histograms rendered as text bars.

/// Equal-width histogram over a closed value range.
///
/// Bins are half-open `[lo, hi)` except the last, which includes its upper edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<usize>,
}

impl Histogram {
    /// Bins `values` into `bins` equal-width bins spanning their min..max.
    ///
    /// A degenerate range (all values equal) is widened by 0.5 on each side.
    /// Returns `None` for empty input or zero bins.
    pub fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let lo = finite.iter().copied().reduce(f64::min)?;
        let hi = finite.iter().copied().reduce(f64::max)?;
        let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
        let step = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + step * i as f64).collect();
        Some(Self::with_edges(&finite, edges))
    }

    /// Bins `values` against explicit ascending `edges`. Values outside are dropped.
    pub fn with_edges(values: &[f64], edges: Vec<f64>) -> Self {
        let bins = edges.len().saturating_sub(1);
        let mut counts = vec![0; bins];
        for &value in values {
            if let Some(bin) = bin_index(&edges, value) {
                counts[bin] += 1;
            }
        }
        Self { edges, counts }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(lower, upper, count)` for each bin.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| (self.edges[i], self.edges[i + 1], count))
    }

    /// Bar length for `count`, scaled so the fullest bin spans `width`.
    pub fn bar_len(&self, count: usize, width: usize) -> usize {
        let max = self.max_count();
        if max == 0 {
            0
        } else {
            width * count / max
        }
    }
}

/// Bin of `value` against ascending `edges`, last bin closed.
pub(crate) fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let (&lo, &hi) = (edges.first()?, edges.last()?);
    if !(lo..=hi).contains(&value) || edges.len() < 2 {
        return None;
    }
    if value == hi {
        return Some(edges.len() - 2);
    }
    // partition_point gives the count of edges <= value
    Some(edges.partition_point(|&edge| edge <= value) - 1)
}

/// Label for a bin of integer-valued data: `"3"` or `"3-5"`.
pub(crate) fn integer_bin_label(lower: f64, upper: f64) -> String {
    let (start, end) = (lower as i64, upper as i64);
    if start == end {
        format!("{}", start)
    } else {
        format!("{}-{}", start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_counts_every_value() {
        let h = Histogram::from_values(&[0.0, 0.5, 1.0, 1.0, 2.0], 4).unwrap();
        assert_eq!(h.bins(), 4);
        assert_eq!(h.edges(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(h.counts(), &[1, 1, 2, 1]);
    }

    #[test]
    fn test_degenerate_range() {
        let h = Histogram::from_values(&[3.0, 3.0], 2).unwrap();
        assert_eq!(h.edges(), &[2.5, 3.0, 3.5]);
        assert_eq!(h.counts(), &[0, 2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(Histogram::from_values(&[], 10).is_none());
        assert!(Histogram::from_values(&[1.0], 0).is_none());
    }

    #[test]
    fn test_with_edges_drops_outside_values() {
        let h = Histogram::with_edges(&[-1.0, 0.2, 0.9, 5.0], vec![0.0, 0.5, 1.0]);
        assert_eq!(h.counts(), &[1, 1]);
    }

    #[test]
    fn test_bar_len() {
        let h = Histogram::with_edges(&[0.1, 0.1, 0.6], vec![0.0, 0.5, 1.0]);
        assert_eq!(h.bar_len(2, 20), 20);
        assert_eq!(h.bar_len(1, 20), 10);
    }

    #[test]
    fn test_integer_bin_label() {
        assert_eq!(integer_bin_label(2.0, 2.9), "2");
        assert_eq!(integer_bin_label(2.0, 3.5), "2-3");
    }
}
