//! The WebVTT timestamp grammar: `[hours:]minutes:seconds.milliseconds`.

use std::sync::LazyLock;

use regex::Regex;

static TIMESTAMP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})").unwrap());

/// Parse a timestamp at the start of `input`, returning it in seconds together with the number of
/// bytes it occupied. Returns `None` if `input` does not start with a timestamp.
#[must_use]
pub fn parse_timestamp_prefix(input: &str) -> Option<(f64, usize)> {
    let captures = TIMESTAMP_REGEX.captures(input)?;
    let length = captures.get(0)?.end();

    let hours = match captures.get(1) {
        Some(hours) => hours.as_str().parse::<u64>().ok()?,
        None => 0,
    };
    let minutes = captures[2].parse::<u64>().ok()?;
    let seconds = captures[3].parse::<u64>().ok()?;
    let milliseconds = captures[4].parse::<u64>().ok()?;

    if minutes > 59 || seconds > 59 {
        return None;
    }

    let total = hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1000 + milliseconds)?;

    #[allow(
        clippy::cast_precision_loss,
        reason = "exact for any timestamp shorter than a few hundred thousand years"
    )]
    let seconds = total as f64 / 1000.0;
    Some((seconds, length))
}

/// Parse `input` as a timestamp, ignoring anything that follows it.
///
/// Returns `None` for anything that is not a timestamp, which is distinct from `Some(0.0)` for
/// `00:00.000`.
#[must_use]
pub fn parse_timestamp(input: &str) -> Option<f64> {
    parse_timestamp_prefix(input).map(|(seconds, _)| seconds)
}

/// Parse `input` as a timestamp that must span the whole string.
#[must_use]
pub fn parse_exact_timestamp(input: &str) -> Option<f64> {
    parse_timestamp_prefix(input)
        .and_then(|(seconds, length)| (length == input.len()).then_some(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_minutes_seconds() {
        assert_eq!(parse_timestamp("00:01:14.815"), Some(74.815));
        assert_eq!(parse_timestamp("02:00:00.000"), Some(7200.0));
        assert_eq!(parse_timestamp("123:00:00.001"), Some(442_800.001));
    }

    #[test]
    fn minutes_seconds() {
        assert_eq!(parse_timestamp("01:14.815"), Some(74.815));
        assert_eq!(parse_timestamp("00:00.000"), Some(0.0));
    }

    #[test]
    fn malformed() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("1:14.815"), None);
        assert_eq!(parse_timestamp("00:60.000"), None);
        assert_eq!(parse_timestamp("00:00:60.000"), None);
        assert_eq!(parse_timestamp("00:00.00"), None);
        assert_eq!(parse_timestamp("00:00,000"), None);
        assert_eq!(parse_timestamp(" 00:00.000"), None);
    }

    #[test]
    fn prefix_and_exact() {
        assert_eq!(
            parse_timestamp_prefix("00:00:01.500 --> 00:00:02.000"),
            Some((1.5, 12))
        );
        assert_eq!(parse_timestamp("00:01.500abc"), Some(1.5));
        assert_eq!(parse_exact_timestamp("00:01.500abc"), None);
        assert_eq!(parse_exact_timestamp("00:01.500"), Some(1.5));
    }
}
