use crate::data::{AppendError, ExpenseRecord, HEADER};
use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};
use tracing::debug;

/// Validates the raw fields and appends the resulting record to the store at `path`.
/// Nothing touches the disk unless validation succeeds.
pub(crate) fn append(
    date: &str,
    amount: &str,
    category: &str,
    note: &str,
    path: &Path,
) -> Result<ExpenseRecord, AppendError> {
    let record = ExpenseRecord::validate(date, amount, category, note)?;
    append_record(path, &record)?;
    Ok(record)
}

/// Appends one already-validated record, creating the store and its header first if
/// the file is missing or empty. A last line left without its newline is terminated
/// first so the record starts a line of its own.
pub(crate) fn append_record(path: &Path, record: &ExpenseRecord) -> Result<(), AppendError> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    let with_header = file.metadata()?.len() == 0;
    if with_header {
        debug!("Starting new record store at {}", path.display());
    } else if !ends_with_newline(&mut file)? {
        debug!("Terminating last line of {}", path.display());
        file.write_all(b"\n")?;
    }
    write_record(file, record, with_header)?;
    debug!("Appended {record:?} to {}", path.display());
    Ok(())
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Basic CSV exporter for a single `ExpenseRecord`
pub(crate) fn write_record<W: std::io::Write>(
    writer: W,
    record: &ExpenseRecord,
    with_header: bool,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(writer);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

/// Truncates the store down to its header line.
pub(crate) fn reset(path: &Path) -> Result<(), AppendError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(HEADER)?;
    wtr.flush()?;
    Ok(())
}
