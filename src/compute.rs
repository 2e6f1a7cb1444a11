use crate::{
    data::{ExpenseRecord, RowError, OTHER_LABEL},
    read::RecordUser,
};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::{collections::HashMap, fmt};
use tracing::warn;

/// Sum of the amounts per category; built on the fly from the record store and thrown
/// away after use, there's no incremental update.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct CategoryTotals {
    totals: HashMap<String, Decimal>,
    /// Sum over every category; bounds each of them, so no per-category sum can
    /// overflow once this one didn't.
    grand_total: Decimal,
}

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total for `category`, zero when it has no record.
    pub fn get(&self, category: &str) -> Decimal {
        self.totals.get(category).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.totals.iter().map(|(category, amount)| (category.as_str(), *amount))
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for CategoryTotals {
    fn from_iter<I: IntoIterator<Item = (S, Decimal)>>(iter: I) -> Self {
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        let mut grand_total = Decimal::ZERO;
        for (category, amount) in iter {
            let total = totals.entry(category.into()).or_default();
            *total = total.saturating_add(amount);
            if amount > Decimal::ZERO {
                grand_total = grand_total.saturating_add(amount);
            }
        }
        Self {
            totals,
            grand_total,
        }
    }
}

/// Only strictly positive amounts are counted: a zero expense is a valid record but
/// doesn't deserve a slice. A record that would push the sum past what `Decimal`
/// holds is refused and leaves the totals untouched.
impl RecordUser for CategoryTotals {
    fn use_record(&mut self, record: ExpenseRecord) -> Result<(), RowError> {
        if record.amount <= Decimal::ZERO {
            return Err(RowError::NotPositive(record.amount));
        }
        self.grand_total = self
            .grand_total
            .checked_add(record.amount)
            .ok_or_else(|| RowError::Overflow {
                category: record.category.clone(),
                amount: record.amount,
            })?;
        *self.totals.entry(record.category).or_default() += record.amount;
        Ok(())
    }
}

/// Percentages driving the chart layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Slices below this share get no percentage/amount annotation.
    pub min_pct_for_label: Decimal,
    /// Categories below this share are folded into the "Other" slice.
    pub other_pct: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_pct_for_label: dec!(3.0),
            other_pct: dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slice {
    pub label: String,
    pub size: Decimal,
    /// Share of the chart total, in percent.
    pub pct: Decimal,
    pub annotated: bool,
}

impl Slice {
    fn new(label: &str, size: Decimal, total: Decimal, thresholds: &Thresholds) -> Self {
        let pct = percent(size, total);
        Self {
            label: label.to_string(),
            size,
            pct,
            annotated: pct >= thresholds.min_pct_for_label,
        }
    }
}

/// Plotting-ready view of `CategoryTotals`: slices by decreasing size, the "Other"
/// bucket (if any) last.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ChartData {
    pub slices: Vec<Slice>,
    pub total: Decimal,
}

impl ChartData {
    pub fn labels(&self) -> Vec<&str> {
        self.slices.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn sizes(&self) -> Vec<Decimal> {
        self.slices.iter().map(|s| s.size).collect()
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

fn percent(amount: Decimal, total: Decimal) -> Decimal {
    amount / total * dec!(100)
}

/// Amounts as shown to the user: cents at most, halves rounded up, no trailing zeros.
pub(crate) fn format_amount(amount: Decimal) -> String {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

pub(crate) fn format_pct(pct: Decimal) -> String {
    format!(
        "{:.1}%",
        pct.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Turns category totals into chart slices. Non-positive totals are dropped, ties on
/// the amount are ordered by category name so the result doesn't depend on hashing.
pub(crate) fn prepare(totals: &CategoryTotals, thresholds: &Thresholds) -> ChartData {
    let mut entries = totals
        .iter()
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .collect::<Vec<_>>();
    entries.sort_by(|(la, a), (lb, b)| b.cmp(a).then_with(|| la.cmp(lb)));
    let mut total = Decimal::ZERO;
    entries.retain(|(label, amount)| match total.checked_add(*amount) {
        Some(sum) => {
            total = sum;
            true
        }
        None => {
            warn!("Leaving \"{label}\" out of the chart: the total would overflow");
            false
        }
    });
    if total.is_zero() {
        return ChartData::default();
    }
    let mut slices = Vec::new();
    let mut other = Decimal::ZERO;
    for (label, amount) in entries {
        if percent(amount, total) < thresholds.other_pct {
            other += amount;
        } else {
            slices.push(Slice::new(label, amount, total, thresholds));
        }
    }
    if other > Decimal::ZERO {
        slices.push(Slice::new(OTHER_LABEL, other, total, thresholds));
    }
    ChartData { slices, total }
}

impl fmt::Display for ChartData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No expenses recorded yet.");
        }
        let width = self
            .slices
            .iter()
            .map(|s| s.label.chars().count())
            .max()
            .unwrap_or_default()
            .max("Category".len());
        writeln!(f, "{:<width$}  {:>12}  {:>7}", "Category", "Amount", "Share")?;
        writeln!(f, "{}", "-".repeat(width + 23))?;
        for slice in &self.slices {
            writeln!(
                f,
                "{:<width$}  {:>12}  {:>7}",
                slice.label,
                format_amount(slice.size),
                format_pct(slice.pct)
            )?;
        }
        writeln!(f, "{}", "-".repeat(width + 23))?;
        writeln!(f, "{:<width$}  {:>12}", "Total", format_amount(self.total()))
    }
}

#[cfg(test)]
mod tests {
    use super::{format_amount, format_pct, prepare, CategoryTotals, ChartData, Thresholds};
    use crate::{
        data::{ExpenseRecord, RowError},
        read::RecordUser,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn expense(category: &str, amount: Decimal) -> ExpenseRecord {
        ExpenseRecord {
            date: "2024-03-01".into(),
            amount,
            category: category.into(),
            note: String::new(),
        }
    }

    #[test]
    fn test_totals_accumulate() {
        let mut totals = CategoryTotals::new();
        totals.use_record(expense("Food", dec!(10))).unwrap();
        totals.use_record(expense("Food", dec!(2.5))).unwrap();
        totals.use_record(expense("Rent", dec!(700))).unwrap();
        assert_eq!(totals.get("Food"), dec!(12.5));
        assert_eq!(totals.get("Rent"), dec!(700));
        assert_eq!(totals.get("Travel"), dec!(0));
        assert_eq!(totals.len(), 2);
    }
    #[test]
    fn test_totals_refuse_zero() {
        let mut totals = CategoryTotals::new();
        assert_eq!(
            totals.use_record(expense("Food", dec!(0))),
            Err(RowError::NotPositive(dec!(0)))
        );
        assert!(totals.is_empty());
    }
    #[test]
    fn test_totals_refuse_overflow() {
        let mut totals = CategoryTotals::new();
        totals.use_record(expense("Food", Decimal::MAX)).unwrap();
        assert_eq!(
            totals.use_record(expense("Rent", dec!(1))),
            Err(RowError::Overflow {
                category: "Rent".into(),
                amount: dec!(1),
            })
        );
        assert_eq!(totals.get("Food"), Decimal::MAX);
        assert_eq!(totals.get("Rent"), dec!(0));
        assert_eq!(totals.len(), 1);
    }
    #[test]
    fn test_prepare_survives_overflowing_total() {
        let totals = CategoryTotals::from_iter([("Food", Decimal::MAX), ("Rent", dec!(10))]);
        let chart = prepare(&totals, &Thresholds::default());
        assert_eq!(chart.labels(), ["Food"]);
        assert_eq!(chart.total(), Decimal::MAX);
    }
    #[test]
    fn test_prepare_no_other() {
        let totals = CategoryTotals::from_iter([
            ("Food", dec!(70)),
            ("Transport", dec!(20)),
            ("Misc", dec!(10)),
        ]);
        let chart = prepare(&totals, &Thresholds::default());
        assert_eq!(chart.labels(), ["Food", "Transport", "Misc"]);
        assert_eq!(chart.sizes(), [dec!(70), dec!(20), dec!(10)]);
        assert_eq!(chart.total(), dec!(100));
    }
    #[test]
    fn test_prepare_collapses_other() {
        let totals = CategoryTotals::from_iter([
            ("A", dec!(95)),
            ("B", dec!(1)),
            ("C", dec!(1)),
            ("D", dec!(1)),
            ("E", dec!(1)),
            ("F", dec!(1)),
        ]);
        let chart = prepare(&totals, &Thresholds::default());
        assert_eq!(chart.labels(), ["A", "Other"]);
        assert_eq!(chart.sizes(), [dec!(95), dec!(5)]);
        assert_eq!(chart.total(), dec!(100));
    }
    #[test]
    fn test_prepare_empty() {
        let chart = prepare(&CategoryTotals::new(), &Thresholds::default());
        assert!(chart.labels().is_empty());
        assert!(chart.sizes().is_empty());
        assert_eq!(chart.total(), dec!(0));
        assert_eq!(chart, ChartData::default());
    }
    #[test]
    fn test_prepare_ignores_non_positive() {
        let totals = CategoryTotals::from_iter([("Refund", dec!(-20)), ("Gift", dec!(0))]);
        assert_eq!(prepare(&totals, &Thresholds::default()), ChartData::default());

        let totals = CategoryTotals::from_iter([("Refund", dec!(-20)), ("Food", dec!(5))]);
        let chart = prepare(&totals, &Thresholds::default());
        assert_eq!(chart.labels(), ["Food"]);
        assert_eq!(chart.total(), dec!(5));
    }
    #[test]
    fn test_prepare_tie_break() {
        let totals =
            CategoryTotals::from_iter([("Rent", dec!(10)), ("Food", dec!(10)), ("Bar", dec!(30))]);
        let chart = prepare(&totals, &Thresholds::default());
        assert_eq!(chart.labels(), ["Bar", "Food", "Rent"]);
    }
    #[test]
    fn test_annotation_threshold() {
        let totals = CategoryTotals::from_iter([
            ("A", dec!(90)),
            ("B", dec!(3)),
            ("C", dec!(2.5)),
            ("D", dec!(2.5)),
            ("E", dec!(2)),
        ]);
        let chart = prepare(&totals, &Thresholds::default());
        assert_eq!(chart.labels(), ["A", "B", "C", "D", "E"]);
        assert_eq!(
            chart.slices.iter().map(|s| s.annotated).collect::<Vec<_>>(),
            [true, true, false, false, false]
        );
        assert_eq!(chart.slices[0].pct, dec!(90));
    }
    #[test]
    fn test_custom_thresholds() {
        let totals = CategoryTotals::from_iter([("A", dec!(80)), ("B", dec!(15)), ("C", dec!(5))]);
        let thresholds = Thresholds {
            min_pct_for_label: dec!(50),
            other_pct: dec!(10),
        };
        let chart = prepare(&totals, &thresholds);
        assert_eq!(chart.labels(), ["A", "B", "Other"]);
        assert_eq!(chart.sizes(), [dec!(80), dec!(15), dec!(5)]);
        assert_eq!(
            chart.slices.iter().map(|s| s.annotated).collect::<Vec<_>>(),
            [true, false, false]
        );
    }
    #[test]
    fn test_formatting() {
        assert_eq!(format_amount(dec!(12.500)), "12.5");
        assert_eq!(format_amount(dec!(3.14159)), "3.14");
        assert_eq!(format_amount(dec!(70)), "70");
        assert_eq!(format_amount(dec!(0.125)), "0.13");
        assert_eq!(format_amount(dec!(2.345)), "2.35");
        assert_eq!(format_pct(dec!(70)), "70.0%");
        assert_eq!(format_pct(dec!(33.3333)), "33.3%");
    }
    #[test]
    fn test_display_table() {
        let totals = CategoryTotals::from_iter([("Food", dec!(75)), ("Rent", dec!(25))]);
        let table = prepare(&totals, &Thresholds::default()).to_string();
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with("Food"));
        assert!(lines[2].ends_with("75    75.0%"));
        assert!(lines[5].starts_with("Total"));
        assert!(lines[5].ends_with("100"));
        assert_eq!(
            ChartData::default().to_string(),
            "No expenses recorded yet.\n"
        );
    }
}
