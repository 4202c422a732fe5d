//! Append-only CSV lead store.
//!
//! One row per accepted lead, header written once when the file is new or
//! empty. Each append holds an exclusive advisory lock on the file so two
//! processes cannot interleave rows.

use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use super::model::{HEADER, Lead, LeadRow, is_header};
use crate::error::StorageError;

/// CSV-backed lead store. Cheap to clone; holds only the path.
#[derive(Debug, Clone)]
pub struct LeadStore {
    path: PathBuf,
}

impl LeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Append one lead. Blocking; call from `spawn_blocking` in async code.
    pub fn append(&self, lead: &Lead) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        file.lock_exclusive().map_err(|e| self.io_err(e))?;
        let result = self.write_locked(&mut file, lead);
        if let Err(e) = FileExt::unlock(&file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release lead file lock");
        }
        result
    }

    fn write_locked(&self, file: &mut File, lead: &Lead) -> Result<(), StorageError> {
        let len = file.metadata().map_err(|e| self.io_err(e))?.len();
        let needs_header = len == 0;
        let needs_newline = len > 0 && !self.ends_with_newline(file)?;
        if needs_newline {
            warn!(path = %self.path.display(), "Lead file did not end in a newline, terminating last line");
        }

        // Serialize the whole chunk first so a failure never leaves half a row.
        let mut bytes = Vec::new();
        if needs_newline {
            bytes.push(b'\n');
        }
        let mut writer = csv::Writer::from_writer(bytes);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record(lead.to_record())?;
        let bytes = writer
            .into_inner()
            .map_err(|e| self.io_err(std::io::Error::other(e.to_string())))?;

        file.write_all(&bytes).map_err(|e| self.io_err(e))?;
        file.sync_data().map_err(|e| self.io_err(e))?;

        debug!(
            path = %self.path.display(),
            header = needs_header,
            bytes = bytes.len(),
            "Lead row appended"
        );
        Ok(())
    }

    fn ends_with_newline(&self, file: &mut File) -> Result<bool, StorageError> {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(|e| self.io_err(e))?;
        file.read_exact(&mut last).map_err(|e| self.io_err(e))?;
        Ok(last[0] == b'\n')
    }

    /// Read every stored row in file order.
    ///
    /// Tolerant of a missing header, legacy seven-column rows, ragged lines
    /// and invalid UTF-8 (replaced with U+FFFD). A missing file is an empty
    /// store.
    pub fn read_all(&self) -> Result<Vec<LeadRow>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = Vec::new();
        for (i, record) in reader.byte_records().enumerate() {
            let record = record?;
            if std::str::from_utf8(record.as_slice()).is_err() {
                warn!(path = %self.path.display(), record = i, "Lead row is not valid UTF-8");
            }
            let decoded: Vec<Cow<'_, str>> =
                record.iter().map(String::from_utf8_lossy).collect();
            let fields: Vec<&str> = decoded.iter().map(|f| f.as_ref()).collect();
            if i == 0 && is_header(&fields) {
                continue;
            }
            rows.push(LeadRow::from_fields(&fields));
        }
        Ok(rows)
    }

    /// Raw file contents for download, or `None` if nothing was stored yet.
    pub fn raw_bytes(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }
}
