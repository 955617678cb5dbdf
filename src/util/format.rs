//! Human-readable formatting for cache statistics and CLI output.

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Format a byte count with IEC units, dropping trailing zeros.
pub fn format_bytes(bytes: usize) -> String {
    let (value, unit) = UNITS[1..]
        .iter()
        .fold((bytes as f64, UNITS[0]), |(value, unit), next| {
            if value >= 1024.0 {
                (value / 1024.0, *next)
            } else {
                (value, unit)
            }
        });

    if unit == UNITS[0] {
        return format!("{bytes} B");
    }
    let rendered = format!("{value:.2}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {unit}")
}

/// `ratio` as a percentage with at most one decimal.
pub fn format_percent(ratio: f64) -> String {
    if !ratio.is_finite() || ratio <= 0.0 {
        return "0%".to_string();
    }
    let rendered = format!("{:.1}", ratio * 100.0);
    format!("{}%", rendered.trim_end_matches('0').trim_end_matches('.'))
}

/// First `limit` characters of `text` on one line, with an ellipsis when cut.
pub fn preview(text: &str, limit: usize) -> String {
    let flattened: String = text
        .chars()
        .map(|ch| if ch == '\n' { ' ' } else { ch })
        .collect();
    match flattened.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &flattened[..cut]),
        None => flattened,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_scale_through_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1 KiB");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(16 * 1024 * 1024), "16 MiB");
    }

    #[test]
    fn percentages_trim_trailing_zeros() {
        assert_eq!(format_percent(0.5), "50%");
        assert_eq!(format_percent(1.0 / 3.0), "33.3%");
        assert_eq!(format_percent(f64::NAN), "0%");
    }

    #[test]
    fn preview_cuts_on_char_boundaries() {
        assert_eq!(preview("héllo\nworld", 7), "héllo w…");
        assert_eq!(preview("short", 10), "short");
    }
}
