//! Flakiness diff: current outcomes against each test's recent history.
//!
//! A test is notable when any status in its history window differs from its
//! current status, or when it has no history at all. Separately, a run is
//! flagged as newly unstable when a skip is fresh or a failure is not a
//! chronic full-window failure. Passing tests never raise the flag.

use crate::history::{HistoryStore, HISTORY_WINDOW};
use crate::parse::Status;

/// Width of a full glyph-string: the history window plus the current run.
pub const GLYPH_WIDTH: usize = HISTORY_WINDOW + 1;

/// One notable test and its glyph-string, oldest run first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotableTest {
    pub identity: String,
    pub glyphs: String,
}

/// Notable tests of one status class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotabilityReport {
    pub status: Status,
    pub notable: Vec<NotableTest>,
    /// Whether anything in this class counts as new instability.
    pub new_instability: bool,
}

impl NotabilityReport {
    pub fn is_empty(&self) -> bool {
        self.notable.is_empty()
    }

    /// One line per notable test: glyphs right-aligned to [`GLYPH_WIDTH`],
    /// then the identity.
    pub fn render_lines(&self) -> Vec<String> {
        self.notable
            .iter()
            .map(|t| format!("{:>width$} {}", t.glyphs, t.identity, width = GLYPH_WIDTH))
            .collect()
    }
}

/// Encode a status sequence as glyphs.
pub fn glyph_string(statuses: impl IntoIterator<Item = Status>) -> String {
    statuses.into_iter().map(Status::glyph).collect()
}

/// Whether one test's glyph-string (history plus current) counts as new
/// instability for its class.
pub fn is_new_instability(status: Status, glyphs: &str) -> bool {
    match status {
        Status::Skip => {
            let tail: Vec<char> = glyphs.chars().rev().take(2).collect();
            tail.len() < 2 || tail[0] != tail[1]
        }
        Status::Fail => {
            glyphs.chars().count() != GLYPH_WIDTH || glyphs.chars().any(|c| c != Status::Fail.glyph())
        }
        Status::Pass => false,
    }
}

/// Evaluate the tests of one current status class against history.
pub fn evaluate<'a>(
    identities: impl IntoIterator<Item = &'a str>,
    history: &HistoryStore,
    status: Status,
) -> NotabilityReport {
    let mut notable = Vec::new();
    let mut new_instability = false;

    for identity in identities {
        let past = history.get(identity);
        let window = &past[past.len().saturating_sub(HISTORY_WINDOW)..];
        let glyphs = glyph_string(window.iter().copied().chain([status]));

        if is_new_instability(status, &glyphs) {
            new_instability = true;
        }
        if window.is_empty() || window.iter().any(|s| *s != status) {
            notable.push(NotableTest {
                identity: identity.to_string(),
                glyphs,
            });
        }
    }

    NotabilityReport {
        status,
        notable,
        new_instability,
    }
}
