use crate::{
    compute::{format_amount, format_pct, prepare, CategoryTotals, ChartData, Thresholds},
    data::OTHER_LABEL,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::f64::consts::TAU;
use std::path::{Path as FsPath, PathBuf};
use svg::{
    node::element::{path::Data, Circle, Path, Rectangle, Text},
    Document,
};
use tracing::{debug, info};

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 600.0;
const CX: f64 = 300.0;
const CY: f64 = 320.0;
const RADIUS: f64 = 200.0;
const HOLE: f64 = 0.45;
const LEGEND_X: f64 = 580.0;
const LEGEND_Y: f64 = 120.0;
const LEGEND_STEP: f64 = 24.0;
const DEFAULT_FONT: &str = "sans-serif";
const PLACEHOLDER: &str = "No expenses recorded yet";

/// Everything about how the chart looks, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartStyle {
    pub title: String,
    /// Font family for every label; needed for categories written in scripts the
    /// default font can't show.
    pub label_font: Option<String>,
    pub thresholds: Thresholds,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title: "Expenses by Category".into(),
            label_font: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl ChartStyle {
    fn font_family(&self) -> &str {
        self.label_font.as_deref().unwrap_or(DEFAULT_FONT)
    }
}

/// The chart the user is looking at. Owned by whoever drives the session and handed
/// the fresh totals each time the store changes.
#[derive(Debug)]
pub(crate) struct ChartCanvas {
    output: PathBuf,
    style: ChartStyle,
    refreshes: usize,
}

impl ChartCanvas {
    pub fn new(output: impl Into<PathBuf>, style: ChartStyle) -> Self {
        Self {
            output: output.into(),
            style,
            refreshes: 0,
        }
    }

    pub fn output(&self) -> &FsPath {
        &self.output
    }

    /// How many times the chart has been redrawn.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    /// Redraws the chart from `totals` and writes it out.
    pub fn refresh(&mut self, totals: &CategoryTotals) -> Result<ChartData, anyhow::Error> {
        let data = prepare(totals, &self.style.thresholds);
        svg::save(&self.output, &render(&data, &self.style))?;
        self.refreshes += 1;
        debug!("Slice sizes {:?}", data.sizes());
        info!(
            "Chart with {} slice(s) written to {}",
            data.slices.len(),
            self.output.display()
        );
        Ok(data)
    }
}

/// Draws `data` as a donut chart: one wedge per slice starting at 12 o'clock going
/// clockwise, the total in the middle and a legend on the right.
pub(crate) fn render(data: &ChartData, style: &ChartStyle) -> Document {
    let mut document = Document::new()
        .set("viewBox", (0.0, 0.0, WIDTH, HEIGHT))
        .set("width", WIDTH)
        .set("height", HEIGHT)
        .add(
            Rectangle::new()
                .set("width", WIDTH)
                .set("height", HEIGHT)
                .set("fill", "white"),
        )
        .add(label(&style.title, WIDTH / 2.0, 50.0, style).set("font-size", 24.0));
    if data.is_empty() {
        debug!("Nothing to draw, showing placeholder");
        return document
            .add(label(PLACEHOLDER, WIDTH / 2.0, HEIGHT / 2.0, style).set("font-size", 20.0));
    }

    let total = to_f64(data.total());
    let mut start = 0.0;
    for (i, slice) in data.slices.iter().enumerate() {
        let end = start + to_f64(slice.size) / total * TAU;
        let color = color(i, &slice.label, data.slices.len());
        document = if data.slices.len() == 1 {
            document.add(
                Circle::new()
                    .set("cx", CX)
                    .set("cy", CY)
                    .set("r", RADIUS)
                    .set("fill", color),
            )
        } else {
            document.add(
                Path::new()
                    .set("fill", color)
                    .set("stroke", "white")
                    .set("stroke-width", 2.0)
                    .set("d", wedge(start, end)),
            )
        };

        let middle = (start + end) / 2.0;
        let (x, y) = point(middle, RADIUS * 1.1);
        let anchor = if middle.sin() >= 0.0 { "start" } else { "end" };
        document = document.add(label(&slice.label, x, y, style).set("text-anchor", anchor));
        if slice.annotated {
            let (x, y) = point(middle, RADIUS * (1.0 + HOLE) / 2.0);
            document = document
                .add(label(&format_pct(slice.pct), x, y - 3.0, style).set("font-size", 12.0))
                .add(
                    label(&format!("${}", format_amount(slice.size)), x, y + 11.0, style)
                        .set("font-size", 12.0),
                );
        }

        let y = LEGEND_Y + i as f64 * LEGEND_STEP;
        document = document
            .add(
                Rectangle::new()
                    .set("x", LEGEND_X)
                    .set("y", y)
                    .set("width", 14.0)
                    .set("height", 14.0)
                    .set("fill", color),
            )
            .add(
                label(
                    &format!("{}  (${})", slice.label, format_amount(slice.size)),
                    LEGEND_X + 22.0,
                    y + 12.0,
                    style,
                )
                .set("text-anchor", "start"),
            );
        start = end;
    }

    document
        .add(
            Circle::new()
                .set("cx", CX)
                .set("cy", CY)
                .set("r", RADIUS * HOLE)
                .set("fill", "white"),
        )
        .add(label("Total", CX, CY - 6.0, style).set("font-size", 16.0))
        .add(
            label(&format!("${}", format_amount(data.total)), CX, CY + 18.0, style)
                .set("font-size", 20.0)
                .set("font-weight", "bold"),
        )
}

fn label(content: &str, x: f64, y: f64, style: &ChartStyle) -> Text {
    Text::new()
        .set("x", x)
        .set("y", y)
        .set("font-family", style.font_family())
        .set("font-size", 14.0)
        .set("text-anchor", "middle")
        .add(svg::node::Text::new(content))
}

/// Point at `angle` radians clockwise from 12 o'clock, `radius` away from the center.
fn point(angle: f64, radius: f64) -> (f64, f64) {
    (CX + radius * angle.sin(), CY - radius * angle.cos())
}

/// Closed outline of a wedge, the arc approximated with one segment per degree.
fn wedge(start: f64, end: f64) -> Data {
    let steps = ((end - start).to_degrees().ceil() as usize).max(1);
    let data = (0..=steps)
        .map(|i| start + (end - start) * i as f64 / steps as f64)
        .fold(Data::new().move_to((CX, CY)), |data, angle| {
            data.line_to(point(angle, RADIUS))
        });
    data.close()
}

fn color(index: usize, label: &str, count: usize) -> &'static str {
    if index + 1 == count && label == OTHER_LABEL {
        return OTHER_COLOR;
    }
    COLORS[index % COLORS.len()]
}

fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

const OTHER_COLOR: &str = "#bbbbbb";

const COLORS: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
    "#bcbd22",
];
