//! runtriage -- turns sequential test-run logs into structured results and
//! triages them against prior runs.
//!
//! The pipeline is: log -> [`parse::LogSegmenter`] -> [`parse::RecordExtractor`]
//! -> [`parse::RunAssembler`], then either the JUnit renderer or the history
//! diff ([`history::HistoryStore`] + [`diff`]) feeding the text summary.

pub mod config;
pub mod diff;
pub mod history;
pub mod parse;
pub mod report;
pub mod results;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use config::TriageConfig;
use history::{FileHistorySource, HistoryStore, HttpHistorySource};
use parse::RunAssembler;
use report::Triage;
use results::hints::KnownFailures;
use results::ResultDocument;

/// Load a run from a log, or from a result document when `from_results` is
/// set. A missing input is not an error: it means the upstream run produced
/// nothing, and `None` is returned.
pub fn load_run(path: &Path, from_results: bool) -> Result<Option<RunAssembler>> {
    if !path.exists() {
        warn!(path = %path.display(), "input not found, upstream run probably failed");
        return Ok(None);
    }

    if from_results {
        let run = match ResultDocument::load(path) {
            Ok(doc) => doc.into_run(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable result document, treating run as empty");
                RunAssembler::new()
            }
        };
        return Ok(Some(run));
    }

    let file = File::open(path).with_context(|| format!("failed to open log {}", path.display()))?;
    Ok(Some(RunAssembler::from_log(BufReader::new(file))))
}

/// Inputs of a full triage pass.
#[derive(Debug, Clone, Default)]
pub struct TriageOptions {
    pub input: PathBuf,
    pub from_results: bool,
    /// History key (run/job identity) for the history service.
    pub key: Option<String>,
    /// Read history from this file instead of the service.
    pub history_file: Option<PathBuf>,
    pub hints: Option<PathBuf>,
    pub results_link: Option<String>,
    /// Where to write the current run's result document.
    pub output: Option<PathBuf>,
}

/// Result of a triage pass.
#[derive(Debug)]
pub struct TriageOutput {
    pub triage: Triage,
    pub summary: String,
}

/// Fetch history the way the options ask for it; empty when neither a key
/// nor a history file is given, or when the source is unusable.
pub async fn fetch_history(opts: &TriageOptions, config: &TriageConfig) -> HistoryStore {
    if let Some(path) = &opts.history_file {
        let key = opts.key.as_deref().unwrap_or("local");
        return HistoryStore::fetch(&FileHistorySource::new(path), key).await;
    }
    let Some(key) = opts.key.as_deref() else {
        info!("no history key given, every test is treated as new");
        return HistoryStore::empty();
    };
    match HttpHistorySource::new(&config.history.base_url, config.history.timeout()) {
        Ok(source) => HistoryStore::fetch(&source, key).await,
        Err(e) => {
            warn!(error = %e, "could not build history client");
            HistoryStore::empty()
        }
    }
}

/// Run the whole pipeline. `Ok(None)` when the input does not exist.
pub async fn triage(opts: &TriageOptions, config: &TriageConfig) -> Result<Option<TriageOutput>> {
    let Some(run) = load_run(&opts.input, opts.from_results)? else {
        return Ok(None);
    };

    if let Some(output) = &opts.output {
        ResultDocument::from_run(&run).save(output)?;
    }

    let history = fetch_history(opts, config).await;
    let hints = opts
        .hints
        .as_deref()
        .or(config.report.hints_file.as_deref().map(Path::new))
        .map(KnownFailures::load)
        .unwrap_or_default();
    let link = opts.results_link.as_deref().or(config.report.results_link.as_deref());

    let triage = Triage::evaluate(&run, &history);
    let summary = report::format_summary(&triage, &hints, link);
    Ok(Some(TriageOutput { triage, summary }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
2024-03-01 10:00:00 Executing external:vm:tests/a (1/2)...
2024-03-01 10:00:01 Preparing external:vm:tests/a...
2024-03-01 10:00:05 Restoring external:vm:tests/a...
2024-03-01 10:00:06 Executing external:vm:tests/b (2/2)...
2024-03-01 10:00:06 Preparing external:vm:tests/b...
2024-03-01 10:00:07 Error: test binary crashed
2024-03-01 10:00:08 Restoring external:vm:tests/b...
";

    #[tokio::test]
    async fn test_missing_input_is_soft_success() {
        let opts = TriageOptions {
            input: PathBuf::from("/nonexistent/run.log"),
            ..Default::default()
        };
        let out = triage(&opts, &TriageConfig::default()).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_log_with_file_history() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");
        let results_path = dir.path().join("results.json");
        let history = dir.path().join("history.json");
        std::fs::write(&log, LOG).unwrap();

        // The previous run had both tests passing.
        let prior: ResultDocument = serde_json::from_str(
            r#"{"results": [{"id": "tests/a", "status": "pass"}, {"id": "tests/b", "status": "pass"}]}"#,
        )
        .unwrap();
        results::HistoricalDocument::bundle([&prior]).unwrap().save(&history).unwrap();

        let opts = TriageOptions {
            input: log,
            history_file: Some(history),
            output: Some(results_path.clone()),
            ..Default::default()
        };
        let out = triage(&opts, &TriageConfig::default()).await.unwrap().unwrap();
        assert_eq!(out.triage.summary.fail, 1);
        assert!(out.triage.new_instability());
        assert!(out.summary.contains("FAIL:  1 (+1)"));
        assert!(out.summary.contains("         .F tests/b"));

        let written = ResultDocument::load(&results_path).unwrap();
        assert_eq!(written.results.len(), 2);
        assert_eq!(
            written.results[1].summary.as_deref(),
            Some("2024-03-01 10:00:07 Error: test binary crashed")
        );
    }

    #[test]
    fn test_malformed_result_document_is_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("results.json");
        std::fs::write(&input, "{ not json").unwrap();
        let run = load_run(&input, true).unwrap().unwrap();
        assert_eq!(run.summary().total, 0);
    }
}
