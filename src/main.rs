use args::{Args, Command};
use chart::ChartCanvas;
use clap::Parser;
use compute::prepare;
use prompt::{track, Session};
use read::aggregate;
use tracing::{debug, trace};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use write::{append, reset};

mod args;
mod chart;
mod compute;
mod data;
mod prompt;
mod read;
mod write;

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logger(args.common().log_level());
    trace!("{args:?}");
    let store = args.common().store();
    let style = args.common().chart_style();
    match args.command() {
        Command::Add(add) => {
            let record = append(add.date(), add.amount(), add.category(), add.note(), store)?;
            println!(
                "Saved {} {} ({}) to {}",
                record.date,
                record.amount,
                record.category,
                store.display()
            );
        }
        Command::Track(track_args) => {
            if track_args.fresh() {
                debug!("Emptying {}", store.display());
                reset(store)?;
            }
            let mut canvas = ChartCanvas::new(track_args.chart(), style);
            let stdin = std::io::stdin();
            let mut session = Session::new(stdin.lock(), std::io::stdout());
            let saved = track(&mut session, store, &mut canvas)?;
            debug!("Session over, {saved} expense(s) saved");
        }
        Command::Summary => {
            print!("{}", prepare(&aggregate(store)?, &style.thresholds));
        }
        Command::Chart(chart_args) => {
            let mut canvas = ChartCanvas::new(chart_args.output(), style);
            let data = canvas.refresh(&aggregate(store)?)?;
            println!(
                "Chart of {} written to {}",
                data.labels().join(", "),
                canvas.output().display()
            );
        }
    }
    Ok(())
}

/// Initializes the tracing subscriber.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG exists; use it.
        Some(_) => EnvFilter::from_default_env(),
        // RUST_LOG does not exist; use default log level for this crate only.
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
