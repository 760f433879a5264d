//! Byte counts to human-readable sizes and back.
//!
//! Sizes are 1024-based, matching what the hosting sites themselves
//! display next to their files.

const UNITS: &[(&str, u64)] = &[
    ("B", 1),
    ("KB", 1 << 10),
    ("MB", 1 << 20),
    ("GB", 1 << 30),
    ("TB", 1u64 << 40),
];

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let (unit, factor) = UNITS
        .iter()
        .rev()
        .find(|(_, factor)| bytes >= *factor)
        .unwrap_or(&UNITS[0]);

    if *factor == 1 {
        return format!("{bytes} B");
    }

    let value = bytes as f64 / *factor as f64;

    if (value - value.round()).abs() < 0.05 {
        format!("{:.0} {}", value.round(), unit)
    } else {
        format!("{value:.1} {unit}")
    }
}

/// Parse a `"1.9 GB"`-style size string into a byte count.
///
/// Returns `None` for anything that does not look like a size.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let split_at = text
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != ',')
        .unwrap_or(text.len());

    let (number, unit) = text.split_at(split_at);
    let number: f64 = number.replace(',', "").parse().ok()?;
    let unit = unit.trim().to_ascii_uppercase();

    let factor = UNITS
        .iter()
        .find(|(name, _)| *name == unit || unit.is_empty() && *name == "B")?
        .1;

    Some((number * factor as f64).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_common_sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_size(1_073_741_824), "1 GB");
    }

    #[test]
    fn parses_what_it_formats() {
        for bytes in [1536_u64, 10 << 20, 3 << 30, 2u64 << 40] {
            let formatted = format_size(bytes);
            let parsed = parse_size(&formatted).expect("round trip failed");

            let tolerance = bytes / 10;
            assert!(
                parsed.abs_diff(bytes) <= tolerance.max(1),
                "{bytes} -> {formatted} -> {parsed}"
            );
        }
    }

    #[test]
    fn parses_site_style_sizes() {
        assert_eq!(parse_size("1.9 GB"), Some(2_040_109_466));
        assert_eq!(parse_size("700MB"), Some(700 << 20));
        assert_eq!(parse_size("  15 KB "), Some(15 << 10));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("large"), None);
        assert_eq!(parse_size("12 XB"), None);
    }
}
