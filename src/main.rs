use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use runtriage::config::TriageConfig;
use runtriage::report::{junit, TriageDigest};
use runtriage::results::{HistoricalDocument, ResultDocument};
use runtriage::TriageOptions;

#[derive(Parser)]
#[command(
    name = "runtriage",
    about = "Turns sequential test-run logs into structured results and triages them against run history",
    version,
    long_about = None
)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a run log into a result document
    Parse {
        /// Run log to parse
        log: PathBuf,

        /// Write the result document (JSON) here
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write a JUnit XML test-suite document here
        #[arg(long = "junit")]
        junit_out: Option<PathBuf>,
    },

    /// Render a run log as a JUnit XML test-suite document
    Junit {
        /// Run log to parse
        log: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare a run against its history and print the triage summary
    Triage {
        /// Run log, or result document with --from-results
        input: PathBuf,

        /// Treat the input as a result document instead of a log
        #[arg(long)]
        from_results: bool,

        /// History key (job/run identity) to query the history service with
        #[arg(long)]
        key: Option<String>,

        /// Read history from a historical document instead of the service
        #[arg(long)]
        history_file: Option<PathBuf>,

        /// Known-failure hints file (JSON object of test id -> reason)
        #[arg(long)]
        hints: Option<PathBuf>,

        /// Link to the full results, printed at the top of the summary
        #[arg(long)]
        results_link: Option<String>,

        /// Write the current run's result document here
        #[arg(long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print a JSON digest instead of the text summary
        #[arg(long)]
        json: bool,
    },

    /// Bundle result documents (oldest first) into a historical document
    Bundle {
        /// Result documents, oldest first
        #[arg(required = true)]
        results: Vec<PathBuf>,

        /// Output file
        #[arg(long)]
        output: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Parse {
            log,
            output,
            junit_out,
        } => {
            let Some(run) = runtriage::load_run(&log, false)? else {
                return Ok(());
            };
            if let Some(path) = output {
                ResultDocument::from_run(&run).save(&path)?;
            }
            if let Some(path) = junit_out {
                let xml = junit::render(&run).context("failed to render JUnit document")?;
                std::fs::write(&path, xml)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote JUnit document");
            }
            let s = run.summary();
            println!(
                "pass: {}, fail: {}, skip: {}, total: {}",
                s.pass, s.fail, s.skip, s.total
            );
        }
        Commands::Junit { log, output } => {
            let Some(run) = runtriage::load_run(&log, false)? else {
                return Ok(());
            };
            let xml = junit::render(&run).context("failed to render JUnit document")?;
            match output {
                Some(path) => std::fs::write(&path, xml)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{}", xml),
            }
        }
        Commands::Triage {
            input,
            from_results,
            key,
            history_file,
            hints,
            results_link,
            output,
            config,
            json,
        } => {
            let config = TriageConfig::resolve(config.as_deref());
            let opts = TriageOptions {
                input,
                from_results,
                key,
                history_file,
                hints,
                results_link,
                output,
            };
            tracing::info!(input = %opts.input.display(), key = ?opts.key, "Running triage");
            let Some(out) = runtriage::triage(&opts, &config).await? else {
                return Ok(());
            };
            if json {
                let digest = TriageDigest::from(&out.triage);
                println!("{}", serde_json::to_string_pretty(&digest)?);
            } else {
                print!("{}", out.summary);
            }
        }
        Commands::Bundle { results, output } => {
            let mut docs = Vec::with_capacity(results.len());
            for path in &results {
                match ResultDocument::load(path) {
                    Ok(doc) => docs.push(doc),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable result document"),
                }
            }
            HistoricalDocument::bundle(&docs)?.save(&output)?;
            println!("Bundled {} of {} result documents.", docs.len(), results.len());
        }
    }

    Ok(())
}
