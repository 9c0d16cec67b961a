//! Line-oriented CSV tokenizer
//!
//! Records are separated by `\n` with an optional trailing `\r`. Quoted
//! fields may contain commas and doubled quotes but never span lines:
//! lines are split first, then each line goes through the `csv` reader on
//! its own. Malformed quoting never fails; it just yields best-effort
//! fields.

/// Split raw text into non-blank lines
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Split one line into fields
///
/// Each line is read as a single headerless, flexible record. Anything the
/// reader cannot make sense of yields a single empty field.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = ::csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_string).collect(),
        Ok(false) => vec![String::new()],
        Err(e) => {
            tracing::debug!("Unreadable CSV line: {}", e);
            vec![String::new()]
        }
    }
}
