use std::fmt;

use crate::cli::Console;

/// What a task observes right after it is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Admission order, starting at 1.
    pub seq: u64,
    /// Tasks holding a slot, this one included.
    pub in_flight: usize,
    pub cpus: usize,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Number of goroutine: {}, Number of CPU: {}",
            self.in_flight, self.cpus
        )
    }
}

/// Sink for task samples. Called concurrently from every task.
pub trait Report: Send + Sync {
    fn report(&self, sample: Sample);

    /// Called once after the last task has released its slot.
    fn finish(&self) {}
}

/// One line per sample on stdout.
pub struct StdoutReport;

impl Report for StdoutReport {
    fn report(&self, sample: Sample) {
        println!("{sample}");
    }
}

/// Samples drive the progress console instead of printing lines.
pub struct ConsoleReport {
    console: Console,
}

impl ConsoleReport {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl Report for ConsoleReport {
    fn report(&self, sample: Sample) {
        crate::cli::progress(&self.console, &sample);
    }

    fn finish(&self) {
        crate::cli::finish(&self.console);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_renders_as_report_line() {
        let sample = Sample {
            seq: 7,
            in_flight: 10,
            cpus: 8,
        };
        assert_eq!(
            sample.to_string(),
            "Number of goroutine: 10, Number of CPU: 8"
        );
    }

    #[test]
    fn console_report_advances_and_finishes() {
        let reporter = ConsoleReport::new(crate::cli::hidden_console(Some(2)).unwrap());
        let sample = Sample {
            seq: 1,
            in_flight: 1,
            cpus: 4,
        };

        reporter.report(sample);
        reporter.report(Sample { seq: 2, ..sample });
        assert_eq!(reporter.console.position(), 2);
        assert!(!reporter.console.is_finished());

        reporter.finish();
        assert!(reporter.console.is_finished());
    }
}
