//! Time formatting helpers.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render a countdown in its two largest units, e.g. `"2h 5m"`. Zero renders as `"now"`.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "now".to_string();
    }
    let mut rest = secs;
    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in UNITS {
        if parts.is_empty() && rest < size {
            continue;
        }
        parts.push(format!("{}{}", rest / size, suffix));
        rest %= size;
        if parts.len() == 2 {
            break;
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_two_largest_units() {
        assert_eq!(format_duration(0), "now");
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3 * 3600 + 25 * 60 + 7), "3h 25m");
        assert_eq!(format_duration(2 * 86400 + 5 * 3600), "2d 5h");
        assert_eq!(format_duration(86400), "1d 0h");
    }
}
