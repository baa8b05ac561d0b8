//! Triage summary formatting and the JUnit test-suite renderer.

pub mod junit;

use crate::diff::{self, NotabilityReport};
use crate::history::HistoryStore;
use crate::parse::{RunAssembler, RunSummary, Status};
use crate::results::hints::KnownFailures;
use serde::Serialize;

/// Everything the summary needs: current counts, the previous run's counts
/// and one notability report per status class.
#[derive(Debug, Clone)]
pub struct Triage {
    pub summary: RunSummary,
    pub previous: RunSummary,
    pub failed: Vec<String>,
    pub reports: Vec<NotabilityReport>,
}

impl Triage {
    pub fn evaluate(run: &RunAssembler, history: &HistoryStore) -> Self {
        let reports = Status::ALL
            .iter()
            .map(|&status| diff::evaluate(run.identities_with(status), history, status))
            .collect();
        Self {
            summary: run.summary(),
            previous: history.last_counts(),
            failed: run.identities_with(Status::Fail).map(str::to_string).collect(),
            reports,
        }
    }

    /// Whether any failure or skip is new compared to history.
    pub fn new_instability(&self) -> bool {
        self.reports.iter().any(|r| r.new_instability)
    }

    fn report(&self, status: Status) -> Option<&NotabilityReport> {
        self.reports.iter().find(|r| r.status == status)
    }
}

/// Machine-readable digest of a triage, printed with `--json`.
#[derive(Debug, Serialize)]
pub struct TriageDigest {
    pub summary: RunSummary,
    pub previous: RunSummary,
    pub new_instability: bool,
    pub notable: Vec<DigestEntry>,
}

#[derive(Debug, Serialize)]
pub struct DigestEntry {
    pub id: String,
    pub status: Status,
    pub history: String,
}

impl From<&Triage> for TriageDigest {
    fn from(triage: &Triage) -> Self {
        let notable = triage
            .reports
            .iter()
            .flat_map(|r| {
                r.notable.iter().map(move |t| DigestEntry {
                    id: t.identity.clone(),
                    status: r.status,
                    history: t.glyphs.clone(),
                })
            })
            .collect();
        Self {
            summary: triage.summary,
            previous: triage.previous,
            new_instability: triage.new_instability(),
            notable,
        }
    }
}

fn delta(current: usize, previous: usize) -> String {
    let diff = current as i64 - previous as i64;
    format!("{diff:+}")
}

fn section_header(status: Status) -> &'static str {
    match status {
        Status::Fail => "Failed tests with a changed history (oldest to newest):",
        Status::Skip => "Skipped tests with a changed history (oldest to newest):",
        Status::Pass => "Passing tests with a changed history (oldest to newest):",
    }
}

/// Format the human-readable triage summary.
pub fn format_summary(triage: &Triage, hints: &KnownFailures, results_link: Option<&str>) -> String {
    let mut out = String::new();

    if let Some(link) = results_link {
        out.push_str(&format!("Results: {link}\n\n"));
    }

    let (cur, prev) = (triage.summary, triage.previous);
    for (label, status) in [("PASS:", Status::Pass), ("FAIL:", Status::Fail), ("SKIP:", Status::Skip)] {
        let n = cur.count(status);
        out.push_str(&format!("{label}  {n} ({})\n", delta(n, prev.count(status))));
    }
    out.push_str(&format!("TOTAL: {} ({})\n", cur.total, delta(cur.total, prev.total)));

    if !triage.failed.is_empty() {
        out.push_str("\nFailed tests:\n");
        for id in &triage.failed {
            match hints.reason(id) {
                Some(reason) => out.push_str(&format!("  {id} - {reason}\n")),
                None => out.push_str(&format!("  {id}\n")),
            }
        }
    }

    if cur.total <= 1 {
        out.push_str(&format!(
            "\nWARNING: only {} test(s) ran, the run probably aborted early\n",
            cur.total
        ));
    }

    for status in Status::ALL {
        let Some(report) = triage.report(status).filter(|r| !r.is_empty()) else {
            continue;
        };
        out.push('\n');
        out.push_str(section_header(status));
        out.push('\n');
        for line in report.render_lines() {
            out.push_str(&line);
            out.push('\n');
        }
    }

    if !triage.new_instability() {
        out.push_str("\nNo new failed or skipped tests.\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::TestOutcome;
    use crate::results::{ResultDocument, ResultEntry};

    fn run(entries: &[(&str, Status)]) -> RunAssembler {
        entries
            .iter()
            .map(|(id, status)| TestOutcome::new(*id, *status))
            .collect()
    }

    fn previous(entries: &[(&str, Status)]) -> ResultDocument {
        ResultDocument {
            results: entries
                .iter()
                .map(|(id, status)| ResultEntry {
                    id: id.to_string(),
                    status: *status,
                    summary: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_counts_with_signed_deltas() {
        let history = HistoryStore::from_documents([previous(&[
            ("a", Status::Pass),
            ("b", Status::Pass),
            ("c", Status::Pass),
        ])]);
        let current = run(&[("a", Status::Pass), ("b", Status::Fail), ("c", Status::Pass)]);
        let text = format_summary(&Triage::evaluate(&current, &history), &KnownFailures::default(), None);
        assert!(text.contains("PASS:  2 (-1)"));
        assert!(text.contains("FAIL:  1 (+1)"));
        assert!(text.contains("TOTAL: 3 (+0)"));
        assert!(text.contains("Failed tests with a changed history"));
        assert!(text.contains("         .F b"));
        assert!(!text.contains("No new failed or skipped tests."));
        assert!(!text.contains("Passing tests with a changed history"));
    }

    #[test]
    fn test_known_failure_reasons_and_link() {
        let hints: KnownFailures = [("b".to_string(), "LP: #42".to_string())].into_iter().collect();
        let current = run(&[("a", Status::Fail), ("b", Status::Fail)]);
        let text = format_summary(
            &Triage::evaluate(&current, &HistoryStore::empty()),
            &hints,
            Some("https://ci.example/run/7"),
        );
        assert!(text.starts_with("Results: https://ci.example/run/7\n"));
        assert!(text.contains("\n  a\n"));
        assert!(text.contains("\n  b - LP: #42\n"));
    }

    #[test]
    fn test_stable_run_says_nothing_new() {
        let history = HistoryStore::from_documents([
            previous(&[("a", Status::Pass), ("s", Status::Skip)]),
            previous(&[("a", Status::Pass), ("s", Status::Skip)]),
        ]);
        let current = run(&[("a", Status::Pass), ("s", Status::Skip)]);
        let text = format_summary(&Triage::evaluate(&current, &history), &KnownFailures::default(), None);
        assert!(text.ends_with("No new failed or skipped tests.\n"));
        assert!(!text.contains("WARNING"));
        assert!(!text.contains("changed history"));
    }

    #[test]
    fn test_tiny_run_warns() {
        let current = run(&[("only", Status::Pass)]);
        let text = format_summary(
            &Triage::evaluate(&current, &HistoryStore::empty()),
            &KnownFailures::default(),
            None,
        );
        assert!(text.contains("WARNING: only 1 test(s) ran"));
        assert!(text.contains("Passing tests with a changed history"));
        assert!(text.contains("No new failed or skipped tests."));
    }

    #[test]
    fn test_digest_lists_notable_tests() {
        let current = run(&[("x", Status::Skip)]);
        let triage = Triage::evaluate(&current, &HistoryStore::empty());
        let digest = TriageDigest::from(&triage);
        assert!(digest.new_instability);
        assert_eq!(digest.notable.len(), 1);
        assert_eq!(digest.notable[0].history, "s");
        let json = serde_json::to_value(&digest).unwrap();
        assert_eq!(json["notable"][0]["status"], "skip");
    }
}
