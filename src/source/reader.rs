use chrono::{DateTime, Utc};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One logical record as it sits in the file, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Exact content of the record's lines, terminators included.
    pub text: String,
    pub start_offset: u64,
    /// Offset just past the record. Resuming here starts the next record.
    pub end_offset: u64,
}

#[derive(Debug)]
struct BufferedRecord {
    text: String,
    start_offset: u64,
}

impl BufferedRecord {
    fn finish(self, end_offset: u64) -> RawRecord {
        RawRecord {
            text: self.text,
            start_offset: self.start_offset,
            end_offset,
        }
    }
}

/// Reads a closed log file forward from an offset and groups physical lines
/// into records. A line matching the start pattern begins a new record; any
/// other line continues the current one.
pub struct MultilineReader {
    start_pattern: Regex,
    file: Option<BufReader<File>>,
    current_offset: u64,
    buffered: Option<BufferedRecord>,
    last_modified: Option<DateTime<Utc>>,
}

impl MultilineReader {
    /// Open `path` and seek to `offset`.
    pub fn open(path: &Path, offset: u64, start_pattern: Regex) -> Result<Self, ReaderError> {
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let last_modified = file
            .metadata()
            .and_then(|metadata| metadata.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let mut buf_reader = BufReader::new(file);
        buf_reader.seek(SeekFrom::Start(offset))?;

        Ok(Self {
            start_pattern,
            file: Some(buf_reader),
            current_offset: offset,
            buffered: None,
            last_modified,
        })
    }

    /// Bytes consumed so far, including any line still being buffered.
    pub fn offset(&self) -> u64 {
        self.current_offset
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Read the next complete record.
    ///
    /// Returns Ok(None) once the file is exhausted; the file handle is
    /// dropped at that point. A read error ends the sequence and discards the
    /// partially buffered record.
    pub fn next_record(&mut self) -> Result<Option<RawRecord>, ReaderError> {
        loop {
            let Some(file) = self.file.as_mut() else {
                return Ok(None);
            };

            let mut line = Vec::new();
            let bytes_read = match file.read_until(b'\n', &mut line) {
                Ok(n) => n,
                Err(e) => {
                    self.file = None;
                    self.buffered = None;
                    return Err(e.into());
                }
            };

            if bytes_read == 0 {
                self.file = None;
                return Ok(self
                    .buffered
                    .take()
                    .map(|buffered| buffered.finish(self.current_offset)));
            }

            let line_start_offset = self.current_offset;
            self.current_offset += bytes_read as u64;
            let line = String::from_utf8_lossy(&line).into_owned();

            if self.buffered.is_some() && self.starts_record(&line) {
                let next = BufferedRecord {
                    text: line,
                    start_offset: line_start_offset,
                };
                if let Some(done) = self.buffered.replace(next) {
                    return Ok(Some(done.finish(line_start_offset)));
                }
            } else if let Some(buffered) = self.buffered.as_mut() {
                buffered.text.push_str(&line);
            } else {
                self.buffered = Some(BufferedRecord {
                    text: line,
                    start_offset: line_start_offset,
                });
            }
        }
    }

    fn starts_record(&self, line: &str) -> bool {
        self.start_pattern
            .is_match(line.trim_end_matches(&['\n', '\r'][..]))
    }
}

impl Iterator for MultilineReader {
    type Item = Result<RawRecord, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
