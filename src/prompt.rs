use crate::{
    chart::ChartCanvas,
    data::{parse_amount, AppendError},
    read::aggregate,
    write::append,
};
use std::{
    io::{BufRead, Write},
    path::Path,
};
use tracing::debug;

/// Fields of one expense as typed by the user, before validation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub date: String,
    pub amount: String,
    pub category: String,
    pub note: String,
}

/// Line oriented question/answer dialog. Generic over its streams so tests can feed
/// it canned answers.
pub(crate) struct Session<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `question` and returns the trimmed answer, `None` once input is exhausted.
    fn ask(&mut self, question: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks for one expense. `None` means the user typed `q` at the date prompt or
    /// closed the input: the session is over.
    pub fn next_entry(&mut self) -> std::io::Result<Option<RawEntry>> {
        writeln!(self.output, "\n--- New Expense ---")?;
        let Some(date) = self.ask("Date (YYYY-MM-DD) (or q to quit): ")? else {
            return Ok(None);
        };
        if date.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        let amount = loop {
            let Some(amount) = self.ask("Amount: ")? else {
                return Ok(None);
            };
            match parse_amount(&amount) {
                Ok(_) => break amount,
                Err(e) => writeln!(self.output, "{e}. Please try again.")?,
            }
        };
        let Some(category) = self.ask("Category: ")? else {
            return Ok(None);
        };
        let Some(note) = self.ask("Note (optional): ")? else {
            return Ok(None);
        };
        Ok(Some(RawEntry {
            date,
            amount,
            category,
            note,
        }))
    }
}

/// Console input loop: every saved expense is followed by a chart refresh from the
/// whole store. Returns how many expenses were saved.
pub(crate) fn track<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    store: &Path,
    canvas: &mut ChartCanvas,
) -> Result<usize, anyhow::Error> {
    writeln!(
        session.output,
        "Start entering your expenses. Type 'q' as the date to quit."
    )?;
    canvas.refresh(&aggregate(store)?)?;
    let mut saved = 0;
    while let Some(entry) = session.next_entry()? {
        match append(
            &entry.date,
            &entry.amount,
            &entry.category,
            &entry.note,
            store,
        ) {
            Ok(record) => {
                saved += 1;
                debug!("Saved {record:?}");
                writeln!(session.output, "Expense saved to {}!", store.display())?;
                canvas.refresh(&aggregate(store)?)?;
            }
            Err(AppendError::Invalid(e)) => {
                writeln!(session.output, "{e}. Expense not saved, please enter it again.")?
            }
            Err(e) => return Err(e.into()),
        }
    }
    writeln!(
        session.output,
        "\nExit input. Final pie chart is in {}.",
        canvas.output().display()
    )?;
    Ok(saved)
}
