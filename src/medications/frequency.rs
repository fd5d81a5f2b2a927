//! Frequency descriptors: free text such as "2x daily with food" or
//! "every 8 hours" parsed into a dosing interval.
//!
//! Matching is a case-insensitive search, so a pattern may sit inside longer
//! instructions. An as-needed marker anywhere in the text wins over any
//! interval pattern. Among interval patterns the order is: `<n>x daily` /
//! `<n> times daily`, then the named daily forms, then `every <n> hours`.

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use thiserror::Error;

static AS_NEEDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bas\s+needed\b|\bprn\b").expect("as-needed pattern"));

static COUNT_DAILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*x\s+daily\b|\b(\d+)\s+times\s+daily\b").expect("count pattern")
});

static NAMED_DAILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(once|twice|three\s+times)\s+daily\b").expect("named pattern")
});

static EVERY_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bevery\s+(\d+)\s+hours?\b").expect("hours pattern"));

/// More than one dose per minute is not a schedule.
const MAX_DAILY_COUNT: u32 = 1440;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrequencyError {
    #[error("Unrecognized frequency '{0}'. Use a form like '2x daily', 'every 8 hours' or 'as needed'")]
    Unrecognized(String),

    #[error("Frequency '{0}' must name a count of at least 1")]
    ZeroCount(String),

    #[error("Frequency '{0}' asks for more doses than can be scheduled")]
    OutOfRange(String),
}

/// How often a medication is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// A fixed interval between doses.
    Every(Duration),
    /// PRN: taken on demand, never scheduled for reminders.
    AsNeeded,
}

impl Frequency {
    pub fn parse(text: &str) -> Result<Self, FrequencyError> {
        if AS_NEEDED.is_match(text) {
            return Ok(Self::AsNeeded);
        }

        if let Some(caps) = COUNT_DAILY.captures(text) {
            let digits = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            let count = parse_count(digits, text)?;
            if count > MAX_DAILY_COUNT {
                return Err(FrequencyError::OutOfRange(text.to_string()));
            }
            return Ok(Self::Every(Duration::seconds(86_400 / i64::from(count))));
        }

        if let Some(caps) = NAMED_DAILY.captures(text) {
            let name = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
            let hours = match name.split_whitespace().next() {
                Some("once") => 24,
                Some("twice") => 12,
                _ => 8,
            };
            return Ok(Self::Every(Duration::hours(hours)));
        }

        if let Some(caps) = EVERY_HOURS.captures(text) {
            let digits = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let hours = parse_count(digits, text)?;
            return Ok(Self::Every(Duration::hours(i64::from(hours))));
        }

        Err(FrequencyError::Unrecognized(text.to_string()))
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::Every(interval) => Some(*interval),
            Self::AsNeeded => None,
        }
    }

    pub fn is_as_needed(&self) -> bool {
        matches!(self, Self::AsNeeded)
    }
}

fn parse_count(digits: &str, text: &str) -> Result<u32, FrequencyError> {
    match digits.parse::<u32>() {
        Ok(0) => Err(FrequencyError::ZeroCount(text.to_string())),
        Ok(n) => Ok(n),
        Err(_) => Err(FrequencyError::OutOfRange(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(text: &str) -> Duration {
        Frequency::parse(text).unwrap().interval().unwrap()
    }

    #[test]
    fn count_daily_forms() {
        assert_eq!(interval("2x daily"), Duration::hours(12));
        assert_eq!(interval("3X DAILY"), Duration::hours(8));
        assert_eq!(interval("4 times daily"), Duration::hours(6));
        assert_eq!(interval("1x daily"), Duration::hours(24));
    }

    #[test]
    fn named_daily_forms() {
        assert_eq!(interval("once daily"), Duration::hours(24));
        assert_eq!(interval("Twice Daily"), Duration::hours(12));
        assert_eq!(interval("three times daily"), Duration::hours(8));
    }

    #[test]
    fn every_n_hours() {
        assert_eq!(interval("every 8 hours"), Duration::hours(8));
        assert_eq!(interval("Every 1 hour"), Duration::hours(1));
    }

    #[test]
    fn uneven_daily_counts_keep_second_precision() {
        assert_eq!(interval("7x daily"), Duration::seconds(12_342));
    }

    #[test]
    fn as_needed_forms_have_no_interval() {
        for text in ["PRN", "prn", "as needed", "As Needed for pain"] {
            let freq = Frequency::parse(text).unwrap();
            assert!(freq.is_as_needed(), "{text}");
            assert!(freq.interval().is_none());
        }
    }

    #[test]
    fn as_needed_wins_over_interval() {
        assert_eq!(
            Frequency::parse("every 6 hours as needed").unwrap(),
            Frequency::AsNeeded
        );
    }

    #[test]
    fn pattern_may_sit_inside_instructions() {
        assert_eq!(interval("take 2x daily with food"), Duration::hours(12));
    }

    #[test]
    fn unrecognized_text_is_rejected() {
        assert!(matches!(
            Frequency::parse("sometimes"),
            Err(FrequencyError::Unrecognized(_))
        ));
        assert!(Frequency::parse("").is_err());
        // "prn" must be a whole word.
        assert!(Frequency::parse("sprnkle").is_err());
    }

    #[test]
    fn zero_and_huge_counts_are_rejected() {
        assert!(matches!(
            Frequency::parse("0x daily"),
            Err(FrequencyError::ZeroCount(_))
        ));
        assert!(matches!(
            Frequency::parse("every 0 hours"),
            Err(FrequencyError::ZeroCount(_))
        ));
        assert!(matches!(
            Frequency::parse("5000x daily"),
            Err(FrequencyError::OutOfRange(_))
        ));
        assert!(matches!(
            Frequency::parse("every 99999999999 hours"),
            Err(FrequencyError::OutOfRange(_))
        ));
    }
}
