//! CSV record sink
//!
//! Writes the fixed header on creation and one row per record afterwards.

use crate::output::traits::{RecordSink, SinkError, SinkResult};
use crate::record::{Record, CSV_HEADER};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// [`RecordSink`] writing a CSV file
///
/// The writer sits behind a mutex held for a whole batch, so concurrent
/// pages never interleave rows. `finish` flushes and drops the writer;
/// later appends fail with [`SinkError::Closed`].
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<Option<csv::Writer<File>>>,
}

impl CsvSink {
    /// Creates (truncating) the file at `path` and writes the header row
    ///
    /// # Example
    ///
    /// ```no_run
    /// use deface_harvest::output::{CsvSink, RecordSink};
    /// use std::path::Path;
    ///
    /// let sink = CsvSink::create(Path::new("info_web_deface.csv")).unwrap();
    /// sink.finish().unwrap();
    /// ```
    pub fn create(path: &Path) -> SinkResult<Self> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;

        tracing::debug!("Opened CSV output at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(Some(writer)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn append(&self, records: &[Record]) -> SinkResult<()> {
        let mut guard = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        let writer = guard.as_mut().ok_or(SinkError::Closed)?;

        for record in records {
            writer.write_record(record.as_row())?;
        }

        Ok(())
    }

    fn finish(&self) -> SinkResult<()> {
        let mut guard = self.writer.lock().map_err(|_| SinkError::Poisoned)?;

        match guard.take() {
            Some(mut writer) => {
                writer.flush()?;
                tracing::debug!("Closed CSV output at {}", self.path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }
}
