//! Duration strings (`10s`, `1h30m`, `2d`)

use std::time::Duration;

/// Minimum accepted step timeout
pub const MIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse a duration string made of `<number><unit>` parts
///
/// Units: `ms`, `s`, `m`, `h`, `d`, `w`. Whitespace between parts is allowed.
///
/// # Errors
/// Returns [`DurationError`] on empty input, a missing or unknown unit, or
/// overflow.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    let bytes = s.as_bytes();
    let mut total = Duration::ZERO;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let num_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if num_start == i {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let amount: u64 = s[num_start..i]
            .parse()
            .map_err(|_| DurationError::Overflow(input.to_string()))?;

        let unit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        let secs_per_unit = match &s[unit_start..i] {
            "ms" => {
                total = total
                    .checked_add(Duration::from_millis(amount))
                    .ok_or_else(|| DurationError::Overflow(input.to_string()))?;
                continue;
            }
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            "w" => 604_800,
            "" => return Err(DurationError::MissingUnit(input.to_string())),
            other => return Err(DurationError::UnknownUnit(other.to_string())),
        };
        let part = amount
            .checked_mul(secs_per_unit)
            .map(Duration::from_secs)
            .ok_or_else(|| DurationError::Overflow(input.to_string()))?;
        total = total
            .checked_add(part)
            .ok_or_else(|| DurationError::Overflow(input.to_string()))?;
    }
    Ok(total)
}

/// Format a duration using the largest whole units
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    let millis = duration.subsec_millis();
    if secs == 0 && millis == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    for (unit, size) in [("w", 604_800), ("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{unit}", secs / size));
            secs %= size;
        }
    }
    if millis > 0 {
        out.push_str(&format!("{millis}ms"));
    }
    out
}

/// Duration parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    /// Nothing to parse
    #[error("duration is empty")]
    Empty,

    /// Garbage where a number was expected
    #[error("invalid duration: '{0}'")]
    Invalid(String),

    /// Number without a unit
    #[error("duration '{0}' is missing a unit")]
    MissingUnit(String),

    /// Unit not recognised
    #[error("unknown duration unit: '{0}'")]
    UnknownUnit(String),

    /// Value does not fit
    #[error("duration '{0}' is too large")]
    Overflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7_200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn parses_compound() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_duration("1m 5s").unwrap(), Duration::from_secs(65));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("10"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(parse_duration("10y"), Err(DurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("abc"), Err(DurationError::Invalid(_))));
    }

    #[test]
    fn format_round_trips_whole_units() {
        assert_eq!(format_duration(Duration::from_secs(5_400)), "1h30m");
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(MIN_TIMEOUT), "10s");
    }
}
