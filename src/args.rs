//! Command line interface of the `expenses` binary.

use crate::{chart::ChartStyle, compute::Thresholds};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// expenses: record your expenses in a CSV file and see where the money goes.
///
/// Each expense (date, amount, category, note) is appended to the record store. The
/// store is then summed up by category and drawn as an SVG pie chart.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate one expense and append it to the store.
    Add(AddArgs),
    /// Enter expenses one after the other, redrawing the chart after each of them.
    ///
    /// Type q as the date to stop.
    Track(TrackArgs),
    /// Print the totals by category.
    Summary,
    /// Draw the pie chart of the store.
    Chart(ChartArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    /// The CSV file holding the expenses.
    #[arg(long, env = "EXPENSES_STORE", default_value = "expenses.csv")]
    store: PathBuf,

    /// Font family used for the chart labels, e.g. one able to show CJK category names.
    #[arg(long, env = "EXPENSES_LABEL_FONT")]
    label_font: Option<String>,

    /// Slices below this percentage get no percentage/amount annotation.
    #[arg(long, default_value = "3.0")]
    min_label_pct: Decimal,

    /// Categories below this percentage are grouped into "Other".
    #[arg(long, default_value = "2.0")]
    other_pct: Decimal,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn store(&self) -> &Path {
        &self.store
    }

    pub fn chart_style(&self) -> ChartStyle {
        ChartStyle {
            label_font: self.label_font.clone(),
            thresholds: Thresholds {
                min_pct_for_label: self.min_label_pct,
                other_pct: self.other_pct,
            },
            ..ChartStyle::default()
        }
    }
}

/// Args for the `expenses add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// Day of the expense, YYYY-MM-DD.
    #[arg(long)]
    date: String,

    /// How much was spent; a non-negative number.
    #[arg(long, allow_hyphen_values = true)]
    amount: String,

    #[arg(long)]
    category: String,

    #[arg(long, default_value = "")]
    note: String,
}

impl AddArgs {
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

/// Args for the `expenses track` command.
#[derive(Debug, Parser, Clone)]
pub struct TrackArgs {
    /// Empty the store before starting.
    #[arg(long)]
    fresh: bool,

    /// Where the live chart is written.
    #[arg(long, default_value = "expenses.svg")]
    chart: PathBuf,
}

impl TrackArgs {
    pub fn fresh(&self) -> bool {
        self.fresh
    }

    pub fn chart(&self) -> &Path {
        &self.chart
    }
}

/// Args for the `expenses chart` command.
#[derive(Debug, Parser, Clone)]
pub struct ChartArgs {
    /// Where the chart is written.
    #[arg(long, default_value = "expenses.svg")]
    output: PathBuf,
}

impl ChartArgs {
    pub fn output(&self) -> &Path {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::{Args, Command};
    use clap::Parser;
    use rust_decimal_macros::dec;
    use std::path::Path;

    #[test]
    fn parse_add() {
        let args = Args::try_parse_from([
            "expenses",
            "--store",
            "money.csv",
            "add",
            "--date",
            "2024-03-01",
            "--amount",
            "-5",
            "--category",
            "Food",
        ])
        .unwrap();
        assert_eq!(args.common().store(), Path::new("money.csv"));
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.date(), "2024-03-01");
                assert_eq!(add.amount(), "-5");
                assert_eq!(add.category(), "Food");
                assert_eq!(add.note(), "");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
    #[test]
    fn parse_chart_style() {
        let args = Args::try_parse_from([
            "expenses",
            "--label-font",
            "Noto Sans CJK TC",
            "--other-pct",
            "5",
            "summary",
        ])
        .unwrap();
        let style = args.common().chart_style();
        assert_eq!(style.label_font.as_deref(), Some("Noto Sans CJK TC"));
        assert_eq!(style.thresholds.other_pct, dec!(5));
        assert_eq!(style.thresholds.min_pct_for_label, dec!(3));
        assert!(matches!(args.command(), Command::Summary));
    }
    #[test]
    fn parse_track() {
        let args = Args::try_parse_from(["expenses", "track", "--fresh"]).unwrap();
        match args.command() {
            Command::Track(track) => {
                assert!(track.fresh());
                assert_eq!(track.chart(), Path::new("expenses.svg"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
