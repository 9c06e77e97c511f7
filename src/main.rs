use std::error::Error;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;
mod error;
mod limits;
mod logger;
mod pool;
mod report;
mod spawner;

use report::{ConsoleReport, Report, StdoutReport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = cli::parse_args();
    logger::init_tracing(args.log_format);

    let config = spawner::config(args.capacity, args.hold_ms, args.limit)?;
    let pool = pool::SlotPool::new(config.capacity);

    let reporter: Arc<dyn Report> = if args.progress {
        Arc::new(ConsoleReport::new(cli::console(config.limit)?))
    } else {
        Arc::new(StdoutReport)
    };

    let stop = CancellationToken::new();
    watch_ctrl_c(stop.clone());

    let summary = spawner::run(&config, pool, reporter, stop).await?;
    if args.summary {
        println!("{}", cli::summary_table(&summary));
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// A second interrupt arrived while in-flight tasks were draining.
    Forced,
    /// The signal source failed; interrupts are no longer observed.
    Unavailable,
}

fn watch_ctrl_c(stop: CancellationToken) {
    tokio::spawn(async move {
        if watch_interrupts(stop, tokio::signal::ctrl_c).await == Interrupt::Forced {
            std::process::exit(130);
        }
    });
}

/// First interrupt cancels `stop`; the second one is reported as `Forced`.
async fn watch_interrupts<F, Fut>(stop: CancellationToken, mut next: F) -> Interrupt
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next().await {
        warn!("failed to listen for ctrl-c: {}", e);
        return Interrupt::Unavailable;
    }
    info!("ctrl-c received, stopping admission");
    stop.cancel();

    if let Err(e) = next().await {
        warn!("failed to listen for ctrl-c: {}", e);
        return Interrupt::Unavailable;
    }
    warn!("second ctrl-c received, exiting without draining");
    Interrupt::Forced
}
