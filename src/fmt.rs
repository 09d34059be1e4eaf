//! Shared formatting helpers for text reports.
//!
//! Pure string functions only; nothing here touches the terminal.

/// Formats a ratio as a percentage with one decimal (`0.5` -> `"50.0%"`).
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Formats `part / whole` as a percentage, or `"N/A"` when `whole` is zero.
pub fn format_ratio_or_na(part: usize, whole: usize) -> String {
    if whole == 0 {
        "N/A".to_string()
    } else {
        format_percent(part as f64 / whole as f64)
    }
}

/// Truncates to at most `max` characters.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Formats an integer with `,` thousands separators.
pub fn format_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Horizontal rule of `width` characters.
pub fn rule(ch: char, width: usize) -> String {
    std::iter::repeat_n(ch, width).collect()
}

/// Mean of a slice, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(1.0), "100.0%");
        assert_eq!(format_percent(0.5), "50.0%");
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(2.0 / 3.0), "66.7%");
    }

    #[test]
    fn test_format_ratio_or_na() {
        assert_eq!(format_ratio_or_na(1, 0), "N/A");
        assert_eq!(format_ratio_or_na(1, 4), "25.0%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Delta(1232)++", 5), "Delta");
        assert_eq!(truncate("mu-", 24), "mu-");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }
}
