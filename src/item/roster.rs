use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use std::{cell::RefCell, fs::File, io::Read, path::Path};

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
    provision::record::UserRecord,
};

/// Columns every roster must declare in its header row.
pub const REQUIRED_COLUMNS: [&str; 3] = ["username", "email", "role"];

/// Reads [`UserRecord`]s from a CSV roster, one row at a time.
///
/// Fields are trimmed and matched to the record by header name, so column
/// order does not matter and extra columns are ignored. A row with the wrong
/// number of fields is returned as an error and reading continues with the
/// next row.
///
/// ```
/// use jenkins_provisioner::core::item::ItemReader;
/// use jenkins_provisioner::item::roster::RosterReaderBuilder;
///
/// let data = "username,email,role\nalice,alice@example.com,Developer\n";
/// let reader = RosterReaderBuilder::new().from_reader(data.as_bytes()).unwrap();
///
/// let record = reader.read().unwrap().unwrap();
/// assert_eq!(record.username, "alice");
/// assert_eq!(record.role, "Developer");
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct RosterReader<R> {
    headers: StringRecord,
    records: RefCell<StringRecordsIntoIter<R>>,
}

impl<R: Read> ItemReader<UserRecord> for RosterReader<R> {
    fn read(&self) -> ItemReaderResult<UserRecord> {
        match self.records.borrow_mut().next() {
            Some(Ok(record)) => record
                .deserialize(Some(&self.headers))
                .map(Some)
                .map_err(|error| BatchError::ItemReader(error.to_string())),
            Some(Err(error)) => Err(BatchError::ItemReader(error.to_string())),
            None => Ok(None),
        }
    }
}

pub struct RosterReaderBuilder {
    delimiter: u8,
}

impl Default for RosterReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterReaderBuilder {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Creates a roster reader over any byte source.
    ///
    /// Fails when the header row is missing one of [`REQUIRED_COLUMNS`].
    pub fn from_reader<R: Read>(self, rdr: R) -> Result<RosterReader<R>, BatchError> {
        Self::into_roster(self.csv_builder().from_reader(rdr))
    }

    /// Creates a roster reader over the file at `path`.
    ///
    /// Fails when the file cannot be opened or its header is incomplete.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<RosterReader<File>, BatchError> {
        let path = path.as_ref();
        let rdr = self.csv_builder().from_path(path).map_err(|error| {
            BatchError::ItemReader(format!("cannot open roster {}: {}", path.display(), error))
        })?;
        Self::into_roster(rdr)
    }

    fn csv_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false);
        builder
    }

    fn into_roster<R: Read>(mut rdr: csv::Reader<R>) -> Result<RosterReader<R>, BatchError> {
        let headers = rdr
            .headers()
            .map_err(|error| BatchError::ItemReader(error.to_string()))?
            .clone();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|header| header == *column))
            .collect();

        if !missing.is_empty() {
            return Err(BatchError::ItemReader(format!(
                "roster header is missing column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(RosterReader {
            headers,
            records: RefCell::new(rdr.into_records()),
        })
    }
}
