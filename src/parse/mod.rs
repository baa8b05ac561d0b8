//! Log parsing: segmenting a run log and recovering per-test outcomes.

pub mod extract;
pub mod run;
pub mod segment;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use extract::RecordExtractor;
pub use run::{RunAssembler, RunSummary};
pub use segment::LogSegmenter;

/// Outcome of a single test in a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Skip,
}

impl Status {
    /// All statuses, in report order.
    pub const ALL: [Status; 3] = [Status::Fail, Status::Skip, Status::Pass];

    /// One-character encoding used in history glyph-strings.
    pub const fn glyph(self) -> char {
        match self {
            Status::Pass => '.',
            Status::Fail => 'F',
            Status::Skip => 's',
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pass => write!(f, "pass"),
            Status::Fail => write!(f, "fail"),
            Status::Skip => write!(f, "skip"),
        }
    }
}

/// One test's result recovered from a log segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub identity: String,
    pub status: Status,
    pub duration: Duration,
    /// Failure detail; empty unless the test failed.
    pub message: String,
    /// Original log lines of the segment, kept for diagnostics.
    pub raw_segment: Vec<String>,
}

impl TestOutcome {
    pub fn new(identity: impl Into<String>, status: Status) -> Self {
        Self {
            identity: identity.into(),
            status,
            duration: Duration::ZERO,
            message: String::new(),
            raw_segment: Vec::new(),
        }
    }

    /// The captured segment as a single newline-joined block.
    pub fn raw_text(&self) -> String {
        self.raw_segment.join("\n")
    }
}
