use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// Column names of the record store, in file order.
pub const HEADER: [&str; 4] = ["date", "amount", "category", "note"];

/// Category given to records whose category field is blank in the store.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Label of the slice collecting every category under the "other" threshold.
pub const OTHER_LABEL: &str = "Other";

/// One line of the record store. Field order matters: `csv` derives both the header
/// and the column order from it, so it must stay in sync with `HEADER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ExpenseRecord {
    pub date: String,
    pub amount: Decimal,
    pub category: String,
    pub note: String,
}

impl ExpenseRecord {
    /// Builds a record from raw user input. Every field is trimmed; the note is the
    /// only one allowed to be empty.
    pub fn validate(
        date: &str,
        amount: &str,
        category: &str,
        note: &str,
    ) -> Result<Self, ValidationError> {
        let date = date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        let amount = parse_amount(amount)?;
        let category = category.trim();
        if category.is_empty() {
            return Err(ValidationError::MissingCategory);
        }
        Ok(Self {
            date: date.to_string(),
            amount,
            category: category.to_string(),
            note: note.trim().to_string(),
        })
    }
}

/// Parses a user supplied amount: plain decimal first, scientific notation as a
/// fallback. Negative amounts are refused, and `-0` comes back as plain zero.
pub(crate) fn parse_amount(text: &str) -> Result<Decimal, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::MissingAmount);
    }
    let amount = parse_decimal(text).ok_or_else(|| ValidationError::InvalidAmount(text.into()))?;
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if amount.is_sign_negative() {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(amount.normalize())
}

/// Lenient number parsing shared by the writer and the aggregator.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Why a candidate record was refused. These are meant to be shown to the user, who
/// can fix the input and try again.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Date is required")]
    MissingDate,
    #[error("Category is required")]
    MissingCategory,
    #[error("Amount is required")]
    MissingAmount,
    #[error("Amount must be a number (got \"{0}\")")]
    InvalidAmount(String),
    #[error("Amount can't be negative (got {0})")]
    NegativeAmount(Decimal),
}

/// Why a record read back from the store is left out of the totals.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("only positive amounts are counted (got {0})")]
    NotPositive(Decimal),
    #[error("adding {amount} to \"{category}\" overflows the totals")]
    Overflow { category: String, amount: Decimal },
}

/// Failure of `write::append`: either the input was refused or the store could not be
/// written to.
#[derive(Error, Debug)]
pub enum AppendError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Can't write to record store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Can't write to record store: {0}")]
    Csv(#[from] csv::Error),
}
