//! Recovers a [`TestOutcome`] from one raw log segment.

use super::{Status, TestOutcome};
use chrono::NaiveDateTime;
use regex::Regex;
use std::time::Duration;

/// Identity used when a segment carries no `Preparing` line.
pub const UNKNOWN_TEST_NAME: &str = "unknown_test_name";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LINE_PATTERN: &str = r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) (.*)$";

/// Segment parser. Never fails: anything it cannot make sense of degrades
/// to a default.
pub struct RecordExtractor {
    line_re: Regex,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordExtractor {
    pub fn new() -> Self {
        Self {
            line_re: Regex::new(LINE_PATTERN).expect("log line pattern is valid"),
        }
    }

    /// Parse one segment into exactly one outcome.
    pub fn extract(&self, segment: Vec<String>) -> TestOutcome {
        let mut identity: Option<String> = None;
        let mut seen_preparing = false;
        let mut error_line: Option<&str> = None;
        let mut first_ts: Option<&str> = None;
        let mut last_ts: Option<&str> = None;

        for line in &segment {
            let Some(caps) = self.line_re.captures(line) else {
                continue;
            };
            let (Some(ts), Some(message)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let message = message.as_str();

            first_ts.get_or_insert(ts.as_str());
            last_ts = Some(ts.as_str());

            if !seen_preparing && message.starts_with("Preparing") {
                seen_preparing = true;
                identity = identity_from_preparing(message);
            }
            if message.starts_with("Error") {
                error_line = Some(line.as_str());
            }
        }

        let duration = match (first_ts, last_ts) {
            (Some(first), Some(last)) => elapsed(first, last),
            _ => Duration::ZERO,
        };
        let (status, message) = match error_line {
            Some(line) => (Status::Fail, line.to_string()),
            None => (Status::Pass, String::new()),
        };

        TestOutcome {
            identity: identity.unwrap_or_else(|| UNKNOWN_TEST_NAME.to_string()),
            status,
            duration,
            message,
            raw_segment: segment,
        }
    }
}

/// `Preparing external:foo:tests/bar/baz...` -> `tests/bar/baz`
fn identity_from_preparing(message: &str) -> Option<String> {
    let tail = match message.rfind(':') {
        Some(idx) => &message[idx + 1..],
        None => message.trim_start_matches("Preparing"),
    };
    let name = tail.trim().trim_end_matches("...").trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Whole seconds from `first` to `last`; zero if either fails to parse or
/// the clock went backwards.
fn elapsed(first: &str, last: &str) -> Duration {
    let (Ok(start), Ok(end)) = (
        NaiveDateTime::parse_from_str(first, TIMESTAMP_FORMAT),
        NaiveDateTime::parse_from_str(last, TIMESTAMP_FORMAT),
    ) else {
        return Duration::ZERO;
    };
    let secs = (end - start).num_seconds();
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_identity_from_preparing_line() {
        let outcome = RecordExtractor::new().extract(seg(&[
            "2024-03-01 10:00:00 Executing external:foo:tests/bar/baz (1/3)...",
            "2024-03-01 10:00:01 Preparing external:foo:tests/bar/baz...",
            "2024-03-01 10:00:02 Preparing external:foo:tests/other...",
            "2024-03-01 10:00:03 Restoring external:foo:tests/bar/baz...",
        ]));
        assert_eq!(outcome.identity, "tests/bar/baz");
        assert_eq!(outcome.status, Status::Pass);
        assert!(outcome.message.is_empty());
        assert_eq!(outcome.duration, Duration::from_secs(3));
        assert_eq!(outcome.raw_segment.len(), 4);
    }

    #[test]
    fn test_missing_preparing_defaults_identity() {
        let outcome = RecordExtractor::new().extract(seg(&[
            "2024-03-01 10:00:00 Executing something",
            "2024-03-01 10:00:00 Restoring something",
        ]));
        assert_eq!(outcome.identity, UNKNOWN_TEST_NAME);
    }

    #[test]
    fn test_last_error_line_wins() {
        let outcome = RecordExtractor::new().extract(seg(&[
            "2024-03-01 10:00:00 Executing x",
            "2024-03-01 10:00:01 Error: first problem",
            "2024-03-01 10:00:02 Error: second problem",
            "2024-03-01 10:00:04 Restoring x",
        ]));
        assert_eq!(outcome.status, Status::Fail);
        assert_eq!(outcome.message, "2024-03-01 10:00:02 Error: second problem");
        assert_eq!(outcome.duration, Duration::from_secs(4));
    }

    #[test]
    fn test_untimestamped_lines_are_ignored() {
        let outcome = RecordExtractor::new().extract(seg(&[
            "Executing x",
            "Error: this line has no timestamp",
            "Preparing external:foo:tests/ignored...",
            "Restoring x",
        ]));
        assert_eq!(outcome.status, Status::Pass);
        assert_eq!(outcome.identity, UNKNOWN_TEST_NAME);
        assert_eq!(outcome.duration, Duration::ZERO);
    }

    #[test]
    fn test_single_timestamp_has_zero_duration() {
        let outcome = RecordExtractor::new().extract(seg(&[
            "Executing x",
            "2024-03-01 10:00:00 Preparing external:foo:tests/one...",
            "Restoring x",
        ]));
        assert_eq!(outcome.identity, "tests/one");
        assert_eq!(outcome.duration, Duration::ZERO);
    }

    #[test]
    fn test_malformed_or_backwards_timestamps_clamp_to_zero() {
        let extractor = RecordExtractor::new();
        let bad = extractor.extract(seg(&[
            "2024-13-45 10:00:00 Executing x",
            "2024-03-01 10:00:09 Restoring x",
        ]));
        assert_eq!(bad.duration, Duration::ZERO);

        let backwards = extractor.extract(seg(&[
            "2024-03-01 10:00:09 Executing x",
            "2024-03-01 10:00:00 Restoring x",
        ]));
        assert_eq!(backwards.duration, Duration::ZERO);
    }

    #[test]
    fn test_identity_without_colon() {
        assert_eq!(
            identity_from_preparing("Preparing tests/plain..."),
            Some("tests/plain".to_string())
        );
        assert_eq!(identity_from_preparing("Preparing external:foo:..."), None);
    }
}
