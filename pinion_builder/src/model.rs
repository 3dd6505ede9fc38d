use std::str::FromStr;
use thiserror::Error;

/// Where a clause's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// Given on the command line.
    Explicit,
    /// Read from an environment variable.
    Envar,
    /// Supplied by a registered [`Resolver`](crate::Resolver).
    Resolver,
    /// The declared static default.
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Explicit => write!(f, "command line"),
            ValueSource::Envar => write!(f, "environment"),
            ValueSource::Resolver => write!(f, "resolver"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// The kind of clause a [`ParseElement`](crate::ParseElement) matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    /// A `--flag` or `-f`.
    Flag,
    /// A positional argument.
    Argument,
    /// A (sub-)command.
    Command,
}

/// Shell completion candidates for a partially typed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// The shell should offer directory names.
    pub directories: bool,
    /// The shell should offer file names.
    pub files: bool,
    /// Candidate words.
    pub words: Vec<String>,
}

impl Completion {
    pub(crate) fn words(words: Vec<String>) -> Self {
        Self {
            directories: false,
            files: false,
            words,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.directories && !self.files && self.words.is_empty()
    }
}

/// A span of time written the way Go's `time.ParseDuration` reads it: `"300ms"`, `"1.5s"`, `"1h30m"`.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
/// The bare string `"0"` is also accepted.
///
/// ### Example
/// ```
/// # use pinion_builder as pinion;
/// use pinion::Duration;
/// use std::str::FromStr;
///
/// let duration = Duration::from_str("1h30m").unwrap();
/// assert_eq!(duration.as_std(), std::time::Duration::from_secs(5400));
/// assert_eq!(duration.to_string(), "1h30m0s");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(std::time::Duration);

/// The error for a string that does not read as a [`Duration`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid duration '{0}'")]
pub struct InvalidDuration(String);

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;
// Fraction digits beyond this are below nanosecond precision for every unit.
const MAX_FRACTION_DIGITS: usize = 18;

impl Duration {
    /// Wrap a [`std::time::Duration`].
    pub fn new(duration: std::time::Duration) -> Self {
        Self(duration)
    }

    /// A duration of whole seconds.
    pub fn from_secs(seconds: u64) -> Self {
        Self(std::time::Duration::from_secs(seconds))
    }

    /// A duration of whole milliseconds.
    pub fn from_millis(milliseconds: u64) -> Self {
        Self(std::time::Duration::from_millis(milliseconds))
    }

    /// The underlying [`std::time::Duration`].
    pub fn as_std(&self) -> std::time::Duration {
        self.0
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        Self(value)
    }
}

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

fn unit_scale(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

fn is_numeric(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn component_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let mut nanos = whole.checked_mul(scale)?;

    if !fraction.is_empty() {
        let fraction = &fraction[..std::cmp::min(fraction.len(), MAX_FRACTION_DIGITS)];
        let numerator: u128 = fraction.parse().ok()?;
        let denominator = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(numerator * scale / denominator)?;
    }

    Some(nanos)
}

impl FromStr for Duration {
    type Err = InvalidDuration;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDuration(value.to_string());
        let unsigned = value.strip_prefix('+').unwrap_or(value);

        if unsigned == "0" {
            return Ok(Duration::default());
        }

        if unsigned.is_empty() {
            return Err(invalid());
        }

        let mut rest = unsigned;
        let mut total: u128 = 0;

        while !rest.is_empty() {
            let number_end = rest.find(|c: char| !is_numeric(c)).ok_or_else(invalid)?;
            let (number, remainder) = rest.split_at(number_end);
            let unit_end = remainder.find(is_numeric).unwrap_or(remainder.len());
            let (unit, remainder) = remainder.split_at(unit_end);
            let scale = unit_scale(unit).ok_or_else(invalid)?;
            let nanos = component_nanos(number, scale).ok_or_else(invalid)?;
            total = total.checked_add(nanos).ok_or_else(invalid)?;
            rest = remainder;
        }

        let seconds = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| invalid())?;
        let nanos = (total % NANOS_PER_SECOND) as u32;
        Ok(Duration(std::time::Duration::new(seconds, nanos)))
    }
}

fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let fraction = value % unit;

    if fraction == 0 {
        whole.to_string()
    } else {
        let width = unit.to_string().len() - 1;
        let digits = format!("{fraction:0width$}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.0.as_nanos();

        if total == 0 {
            write!(f, "0s")
        } else if total < NANOS_PER_MICRO {
            write!(f, "{total}ns")
        } else if total < NANOS_PER_MILLI {
            write!(f, "{}µs", decimal(total, NANOS_PER_MICRO))
        } else if total < NANOS_PER_SECOND {
            write!(f, "{}ms", decimal(total, NANOS_PER_MILLI))
        } else {
            let hours = total / NANOS_PER_HOUR;
            let minutes = (total % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
            let seconds = decimal(total % NANOS_PER_MINUTE, NANOS_PER_SECOND);

            if hours > 0 {
                write!(f, "{hours}h{minutes}m{seconds}s")
            } else if minutes > 0 {
                write!(f, "{minutes}m{seconds}s")
            } else {
                write!(f, "{seconds}s")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", 0)]
    #[case("0s", 0)]
    #[case("5s", 5_000_000_000)]
    #[case("10ms", 10_000_000)]
    #[case("1.5s", 1_500_000_000)]
    #[case(".5s", 500_000_000)]
    #[case("1h30m", 5_400_000_000_000)]
    #[case("2m3s", 123_000_000_000)]
    #[case("300us", 300_000)]
    #[case("300µs", 300_000)]
    #[case("42ns", 42)]
    #[case("1h1m1s1ms1us1ns", 3_661_001_001_001)]
    #[case("+5s", 5_000_000_000)]
    #[case("+0", 0)]
    fn parse_duration(#[case] input: &str, #[case] expected_nanos: u128) {
        // Execute
        let duration = Duration::from_str(input).unwrap();

        // Verify
        assert_eq!(duration.as_std().as_nanos(), expected_nanos);
    }

    #[rstest]
    #[case("")]
    #[case("5")]
    #[case("s")]
    #[case("notaduration")]
    #[case("5x")]
    #[case("1.2.3s")]
    #[case(".s")]
    #[case("-5s")]
    #[case("+")]
    #[case("++5s")]
    fn parse_duration_invalid(#[case] input: &str) {
        // Execute
        let error = Duration::from_str(input).unwrap_err();

        // Verify
        assert_eq!(error, InvalidDuration(input.to_string()));
    }

    #[rstest]
    #[case(Duration::default(), "0s")]
    #[case(Duration::from_secs(5), "5s")]
    #[case(Duration::from_millis(1500), "1.5s")]
    #[case(Duration::from_millis(10), "10ms")]
    #[case(Duration::from_secs(90), "1m30s")]
    #[case(Duration::from_secs(5400), "1h30m0s")]
    #[case(Duration::new(std::time::Duration::from_nanos(1500)), "1.5µs")]
    #[case(Duration::new(std::time::Duration::from_nanos(7)), "7ns")]
    fn display_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(duration.to_string(), expected);
    }

    #[test]
    fn display_inverts_parse() {
        for input in ["5s", "1m30s", "1h30m0s", "250ms", "1.25s"] {
            assert_eq!(Duration::from_str(input).unwrap().to_string(), input);
        }
    }
}
