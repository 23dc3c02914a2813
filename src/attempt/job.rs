use crate::config::types::{ComponentConfig, ComponentType};
use crate::source::level::LogLevel;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;

/// One rotated file waiting to be read, starting at `offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReadJob {
    pub path: PathBuf,
    pub offset: u64,
    /// Modification time observed when the job was created. Filled in from
    /// the file's metadata at open time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileReadJob {
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            last_modified: None,
        }
    }
}

/// Files for one component, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobQueue {
    jobs: VecDeque<FileReadJob>,
}

impl JobQueue {
    pub fn from_jobs(jobs: impl IntoIterator<Item = FileReadJob>) -> Self {
        Self {
            jobs: jobs.into_iter().collect(),
        }
    }

    pub fn front(&self) -> Option<&FileReadJob> {
        self.jobs.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut FileReadJob> {
        self.jobs.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<FileReadJob> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileReadJob> {
        self.jobs.iter()
    }
}

/// Everything a pass needs to know about one component.
#[derive(Debug, Clone)]
pub struct ComponentLogFiles {
    pub name: String,
    pub component_type: ComponentType,
    pub min_level: LogLevel,
    pub multiline_start: Regex,
    pub queue: JobQueue,
}

impl ComponentLogFiles {
    pub fn from_config(config: &ComponentConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            name: config.name.clone(),
            component_type: config.component_type,
            min_level: config.min_level,
            multiline_start: Regex::new(&config.multiline_start)?,
            queue: JobQueue::from_jobs(
                config
                    .files
                    .iter()
                    .map(|file| FileReadJob::new(file.path.clone(), file.offset)),
            ),
        })
    }
}

/// Device identity used for naming destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    pub thing_name: String,
    pub region: String,
}
