use crate::attempt::budget::event_size;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A single event as it will be sent to the log service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl LogEvent {
    pub fn wire_size(&self) -> usize {
        event_size(&self.message)
    }
}

/// Progress made on one file within one stream of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCheckpoint {
    /// Offset the file was opened at for this attempt.
    pub start_position: u64,
    /// Bytes committed past `start_position`.
    pub bytes_read: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileCheckpoint {
    pub fn new(start_position: u64, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            start_position,
            bytes_read: 0,
            last_modified,
        }
    }

    pub fn commit(&mut self, offset: u64) {
        self.bytes_read = offset.saturating_sub(self.start_position);
    }

    /// Where the next attempt should resume reading.
    pub fn resume_offset(&self) -> u64 {
        self.start_position + self.bytes_read
    }
}

/// Events bound for one stream, plus the file progress they represent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBucket {
    pub component_name: String,
    pub log_events: Vec<LogEvent>,
    pub file_checkpoints: BTreeMap<PathBuf, FileCheckpoint>,
}

impl StreamBucket {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            log_events: Vec::new(),
            file_checkpoints: BTreeMap::new(),
        }
    }

    /// Checkpoint for `path`, created at `start_position` on first use.
    pub fn checkpoint_mut(
        &mut self,
        path: &Path,
        start_position: u64,
        last_modified: Option<DateTime<Utc>>,
    ) -> &mut FileCheckpoint {
        self.file_checkpoints
            .entry(path.to_path_buf())
            .or_insert_with(|| FileCheckpoint::new(start_position, last_modified))
    }

    pub fn total_bytes(&self) -> usize {
        self.log_events.iter().map(LogEvent::wire_size).sum()
    }
}

/// The outcome of one pass over a component's files: batched events per
/// stream, not yet delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub attempt_id: Uuid,
    pub log_group_name: String,
    pub log_streams: BTreeMap<String, StreamBucket>,
}

impl Attempt {
    pub fn new(log_group_name: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            log_group_name: log_group_name.into(),
            log_streams: BTreeMap::new(),
        }
    }

    /// Bucket for `stream_name`, created on first use.
    pub fn bucket_mut(&mut self, stream_name: String, component_name: &str) -> &mut StreamBucket {
        self.log_streams
            .entry(stream_name)
            .or_insert_with(|| StreamBucket::new(component_name))
    }

    pub fn event_count(&self) -> usize {
        self.log_streams.values().map(|b| b.log_events.len()).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.log_streams.values().map(StreamBucket::total_bytes).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    /// Furthest committed offset for `path` across all streams.
    pub fn resume_offset(&self, path: &Path) -> Option<u64> {
        self.log_streams
            .values()
            .filter_map(|bucket| bucket.file_checkpoints.get(path))
            .map(FileCheckpoint::resume_offset)
            .max()
    }
}
