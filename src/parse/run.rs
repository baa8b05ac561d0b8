//! Assembles per-test outcomes into a run with aggregate counts.

use super::{LogSegmenter, RecordExtractor, Status, TestOutcome};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Aggregate counts for one run. `pass + fail + skip == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Pass => self.pass += 1,
            Status::Fail => self.fail += 1,
            Status::Skip => self.skip += 1,
        }
        self.total += 1;
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Pass => self.pass,
            Status::Fail => self.fail,
            Status::Skip => self.skip,
        }
    }

    pub fn from_statuses(statuses: impl IntoIterator<Item = Status>) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            summary.record(status);
        }
        summary
    }
}

/// All outcomes of one run, in encounter order.
#[derive(Debug, Clone, Default)]
pub struct RunAssembler {
    outcomes: Vec<TestOutcome>,
    summary: RunSummary,
}

impl RunAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: TestOutcome) {
        self.summary.record(outcome.status);
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Identities of the outcomes with `status`, in encounter order.
    pub fn identities_with(&self, status: Status) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(move |o| o.status == status)
            .map(|o| o.identity.as_str())
    }

    /// Segment, extract and assemble a whole log in one streaming pass.
    pub fn from_log<R: BufRead>(reader: R) -> Self {
        let extractor = RecordExtractor::new();
        let mut segmenter = LogSegmenter::new(reader);
        let mut run = Self::new();
        for segment in segmenter.by_ref() {
            let outcome = extractor.extract(segment);
            debug!(identity = %outcome.identity, status = %outcome.status, "parsed test segment");
            run.push(outcome);
        }
        if segmenter.dropped_partial() {
            warn!("trailing test segment was incomplete and has been left out");
        }
        info!(
            total = run.summary.total,
            fail = run.summary.fail,
            "assembled run from log"
        );
        run
    }
}

impl FromIterator<TestOutcome> for RunAssembler {
    fn from_iter<I: IntoIterator<Item = TestOutcome>>(iter: I) -> Self {
        let mut run = Self::new();
        for outcome in iter {
            run.push(outcome);
        }
        run
    }
}
