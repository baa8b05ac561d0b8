//! JUnit XML rendering of an assembled run.

use crate::parse::{RunAssembler, Status};
use quick_junit::{NonSuccessKind, Report, SerializeError, TestCase, TestCaseStatus, TestSuite};
use std::time::Duration;

/// Suite and report name identifying this tool in downstream dashboards.
pub const SUITE_NAME: &str = "runtriage";

pub fn to_report(run: &RunAssembler) -> Report {
    let mut suite = TestSuite::new(SUITE_NAME);
    let mut elapsed = Duration::ZERO;

    for outcome in run.outcomes() {
        elapsed += outcome.duration;
        let status = match outcome.status {
            Status::Pass => TestCaseStatus::success(),
            Status::Skip => TestCaseStatus::skipped(),
            Status::Fail => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                status.set_message(outcome.message.as_str());
                status
            }
        };
        let mut testcase = TestCase::new(outcome.identity.as_str(), status);
        testcase.set_time(outcome.duration);
        if !outcome.raw_segment.is_empty() {
            testcase.set_system_out(outcome.raw_text());
        }
        suite.add_test_case(testcase);
    }
    suite.set_time(elapsed);

    let mut report = Report::new(SUITE_NAME);
    report.set_time(elapsed).add_test_suite(suite);
    report
}

/// Serialize the run as a JUnit XML document.
pub fn render(run: &RunAssembler) -> Result<String, SerializeError> {
    to_report(run).to_string()
}
