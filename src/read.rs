use crate::{
    compute::CategoryTotals,
    data::{parse_decimal, ExpenseRecord, RowError, HEADER, UNCATEGORIZED},
};
use std::{io::ErrorKind, path::Path};
use tracing::{debug, warn};

/// Trait for doing something with an `ExpenseRecord` read from the store. Used to
/// build `CategoryTotals`, but also by tests to check what the reader hands over.
pub(crate) trait RecordUser {
    fn use_record(&mut self, record: ExpenseRecord) -> Result<(), RowError>;
}

/// Sums the store at `path` by category. A store that doesn't exist yet is simply
/// empty.
pub(crate) fn aggregate(path: &Path) -> Result<CategoryTotals, anyhow::Error> {
    let mut totals = CategoryTotals::new();
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No record store at {} yet", path.display());
            return Ok(totals);
        }
        Err(e) => return Err(e.into()),
    };
    read_records(file, &mut totals);
    debug!("{} categories in {}", totals.len(), path.display());
    Ok(totals)
}

/// Lenient CSV importer for `ExpenseRecord`s. Rows that don't look like a record are
/// logged and skipped; nothing here fails.
pub(crate) fn read_records<R: std::io::Read, U: RecordUser>(reader: R, user: &mut U) {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    for (index, result) in rdr.records().enumerate() {
        let line = index + 1;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable line {line}: {e}");
                continue;
            }
        };
        if row.len() < 3 {
            warn!("Skipping line {line}: expected 4 fields, found {}", row.len());
            continue;
        }
        if index == 0 && is_header(&row) {
            debug!("Skipping header line");
            continue;
        }
        let amount = match parse_decimal(&row[1]) {
            Some(amount) => amount,
            None => {
                warn!("Skipping line {line}: can't parse amount \"{}\"", &row[1]);
                continue;
            }
        };
        let category = match &row[2] {
            "" => UNCATEGORIZED,
            category => category,
        };
        let record = ExpenseRecord {
            date: row[0].to_string(),
            amount,
            category: category.to_string(),
            note: row.get(3).unwrap_or_default().to_string(),
        };
        match user.use_record(record) {
            Ok(()) => {}
            Err(e @ RowError::NotPositive(_)) => debug!("Line {line} not counted: {e}"),
            Err(e) => warn!("Skipping line {line}: {e}"),
        }
    }
}

/// The header is recognised by name: a first line with a garbled amount is still a
/// record, and gets reported as such.
fn is_header(row: &csv::StringRecord) -> bool {
    row.get(1)
        .map_or(false, |field| field.eq_ignore_ascii_case(HEADER[1]))
}
