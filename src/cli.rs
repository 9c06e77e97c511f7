use clap::{Parser, ValueEnum};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::SpawnError;
use crate::limits;
use crate::report::Sample;
use crate::spawner::RunSummary;

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Spawn short-lived tasks forever, never more than a fixed number at once
#[derive(Parser, Debug)]
#[command(name = "spawngate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Maximum number of tasks holding a slot at the same time
    #[arg(short, long, env = "SPAWNGATE_CAPACITY", default_value_t = limits::DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// How long each task sleeps before releasing its slot, in milliseconds
    #[arg(long, env = "SPAWNGATE_HOLD_MS", default_value_t = limits::DEFAULT_HOLD_MS)]
    pub hold_ms: u64,

    /// Stop after admitting this many tasks (default: run until Ctrl-C)
    #[arg(short = 'n', long, env = "SPAWNGATE_LIMIT")]
    pub limit: Option<u64>,

    /// Show a progress bar instead of one line per task
    #[arg(long)]
    pub progress: bool,

    /// Print a summary table when the run stops
    #[arg(long)]
    pub summary: bool,

    /// Log output format (logs go to stderr, filtered by RUST_LOG)
    #[arg(long, env = "SPAWNGATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct Console {
    bar: ProgressBar,
}

/// Bar of `limit` steps when bounded, a spinner otherwise.
pub fn console(limit: Option<u64>) -> Result<Console, SpawnError> {
    let bar = match limit {
        Some(total) => {
            let bar = ProgressBar::new(total);
            let style = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("##-");
            bar.set_style(style);
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(ProgressStyle::with_template("{spinner} {pos} admitted {msg}")?);
            bar
        }
    };

    Ok(Console { bar })
}

/// Same as `console`, drawing nowhere.
#[cfg(test)]
pub fn hidden_console(limit: Option<u64>) -> Result<Console, SpawnError> {
    let console = console(limit)?;
    console
        .bar
        .set_draw_target(indicatif::ProgressDrawTarget::hidden());
    Ok(console)
}

#[cfg(test)]
impl Console {
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

pub fn progress(console: &Console, sample: &Sample) {
    console.bar.inc(1);
    console
        .bar
        .set_message(format!("(in flight {}, cpus {})", sample.in_flight, sample.cpus));
}

pub fn finish(console: &Console) {
    console.bar.finish();
}

pub fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["capacity", "admitted", "released", "peak", "elapsed", "stop"]);
    table.add_row(vec![
        summary.capacity.to_string(),
        summary.admitted.to_string(),
        summary.released.to_string(),
        summary.peak_in_flight.to_string(),
        format!("{:?}", summary.elapsed),
        format!("{:?}", summary.reason),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use crate::spawner::StopReason;

    // Parsing reads the process environment; tests that parse hold this.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn no_arguments_keeps_defaults() {
        let _env = ENV_LOCK.lock().unwrap();
        let cli = Cli::try_parse_from(["spawngate"]).unwrap();
        assert_eq!(cli.capacity, 10);
        assert_eq!(cli.hold_ms, 1000);
        assert_eq!(cli.limit, None);
        assert!(!cli.progress);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn flags_override_defaults() {
        let _env = ENV_LOCK.lock().unwrap();
        let cli = Cli::try_parse_from([
            "spawngate",
            "-c",
            "3",
            "--hold-ms",
            "50",
            "-n",
            "9",
            "--log-format",
            "json",
            "--summary",
        ])
        .unwrap();
        assert_eq!(cli.capacity, 3);
        assert_eq!(cli.hold_ms, 50);
        assert_eq!(cli.limit, Some(9));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.summary);
    }

    #[test]
    fn env_vars_fill_in_and_flags_win() {
        let _env = ENV_LOCK.lock().unwrap();
        // SAFETY: every test that reads the environment holds ENV_LOCK.
        unsafe {
            std::env::set_var("SPAWNGATE_CAPACITY", "7");
            std::env::set_var("SPAWNGATE_HOLD_MS", "250");
            std::env::set_var("SPAWNGATE_LIMIT", "40");
            std::env::set_var("SPAWNGATE_LOG_FORMAT", "json");
        }

        let from_env = Cli::try_parse_from(["spawngate"]);
        let overridden = Cli::try_parse_from(["spawngate", "--capacity", "3", "--log-format", "text"]);

        unsafe {
            std::env::remove_var("SPAWNGATE_CAPACITY");
            std::env::remove_var("SPAWNGATE_HOLD_MS");
            std::env::remove_var("SPAWNGATE_LIMIT");
            std::env::remove_var("SPAWNGATE_LOG_FORMAT");
        }

        let from_env = from_env.unwrap();
        assert_eq!(from_env.capacity, 7);
        assert_eq!(from_env.hold_ms, 250);
        assert_eq!(from_env.limit, Some(40));
        assert_eq!(from_env.log_format, LogFormat::Json);

        let overridden = overridden.unwrap();
        assert_eq!(overridden.capacity, 3);
        assert_eq!(overridden.log_format, LogFormat::Text);
        assert_eq!(overridden.hold_ms, 250);
    }

    #[test]
    fn console_builds_for_both_modes() {
        assert!(console(Some(5)).is_ok());
        assert!(console(None).is_ok());
    }

    #[test]
    fn summary_table_lists_counters() {
        let summary = RunSummary {
            capacity: 10,
            admitted: 42,
            released: 42,
            peak_in_flight: 10,
            elapsed: Duration::from_secs(5),
            reason: StopReason::LimitReached,
        };
        let rendered = summary_table(&summary).to_string();
        assert!(rendered.contains("42"));
        assert!(rendered.contains("LimitReached"));
    }
}
