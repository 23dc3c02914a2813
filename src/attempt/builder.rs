use crate::attempt::budget::{Admission, BatchBudget, MAX_BATCH_SIZE};
use crate::attempt::job::{ComponentLogFiles, DeviceContext, FileReadJob};
use crate::attempt::model::{Attempt, LogEvent};
use crate::attempt::stream::{log_group_name, StreamGrouper};
use crate::source::classify::LineClassifier;
use crate::source::level::LogLevel;
use crate::source::reader::{MultilineReader, ReaderError};
use regex::Regex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassStatus {
    Running,
    CapReached,
    QueueEmpty,
}

#[derive(Debug)]
enum FileOutcome {
    Exhausted,
    CapReached { resume_offset: u64 },
    Failed(ReaderError),
}

/// State owned by a single pass.
struct PassState<'a> {
    component_name: &'a str,
    min_level: LogLevel,
    classifier: &'a LineClassifier,
    grouper: StreamGrouper,
    budget: BatchBudget,
    attempt: Attempt,
}

impl PassState<'_> {
    fn consume_file(&mut self, job: &FileReadJob, start_pattern: &Regex) -> FileOutcome {
        let mut reader = match MultilineReader::open(&job.path, job.offset, start_pattern.clone())
        {
            Ok(reader) => reader,
            Err(e) => return FileOutcome::Failed(e),
        };
        let last_modified = job.last_modified.or_else(|| reader.last_modified());
        let mut committed = job.offset;

        loop {
            let raw = match reader.next_record() {
                Ok(Some(raw)) => raw,
                Ok(None) => return FileOutcome::Exhausted,
                Err(e) => return FileOutcome::Failed(e),
            };

            let record = self.classifier.classify(raw.text);
            let stream_name = self.grouper.stream_name(record.timestamp);

            let event = if record.is_below(self.min_level) {
                None
            } else {
                let event = LogEvent {
                    timestamp: record.timestamp_millis(),
                    message: record.text,
                };
                if self.budget.admit(event.wire_size()) == Admission::CapReached {
                    if event.wire_size() > self.budget.cap() {
                        warn!(
                            path = %job.path.display(),
                            offset = committed,
                            size = event.wire_size(),
                            "Record is larger than a whole batch"
                        );
                    }
                    return FileOutcome::CapReached {
                        resume_offset: committed,
                    };
                }
                Some(event)
            };

            let bucket = self.attempt.bucket_mut(stream_name, self.component_name);
            if let Some(event) = event {
                bucket.log_events.push(event);
            }
            bucket
                .checkpoint_mut(&job.path, job.offset, last_modified)
                .commit(raw.end_offset);
            committed = raw.end_offset;
        }
    }
}

/// Turns a component's queue of rotated files into one size-bounded attempt.
#[derive(Debug, Clone)]
pub struct AttemptBuilder {
    device: DeviceContext,
    classifier: LineClassifier,
    max_batch_size: usize,
}

impl AttemptBuilder {
    pub fn new(device: DeviceContext) -> Self {
        Self {
            device,
            classifier: LineClassifier::default(),
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Lower the batch cap. Values above the service limit are clamped.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.min(MAX_BATCH_SIZE);
        self
    }

    /// Run one pass over `component.queue`.
    ///
    /// Fully read files and files that fail to open or read are removed from
    /// the queue. If the batch fills up, the file being read stays at the
    /// front with its offset moved to the last committed record.
    pub fn process(&self, component: &mut ComponentLogFiles) -> Attempt {
        let group_name = log_group_name(
            component.component_type,
            &self.device.region,
            &component.name,
        );
        let mut pass = PassState {
            component_name: &component.name,
            min_level: component.min_level,
            classifier: &self.classifier,
            grouper: StreamGrouper::new(&self.device.thing_name),
            budget: BatchBudget::with_cap(self.max_batch_size),
            attempt: Attempt::new(group_name),
        };

        let mut status = PassStatus::Running;
        while status == PassStatus::Running {
            let Some(job) = component.queue.front().cloned() else {
                status = PassStatus::QueueEmpty;
                continue;
            };

            match pass.consume_file(&job, &component.multiline_start) {
                FileOutcome::Exhausted => {
                    debug!(path = %job.path.display(), "Finished reading file");
                    component.queue.pop_front();
                }
                FileOutcome::Failed(e) => {
                    error!(path = %job.path.display(), error = %e, "Unable to read file");
                    component.queue.pop_front();
                }
                FileOutcome::CapReached { resume_offset } => {
                    debug!(
                        path = %job.path.display(),
                        resume_offset,
                        "Batch size limit reached"
                    );
                    if let Some(front) = component.queue.front_mut() {
                        front.offset = resume_offset;
                    }
                    status = PassStatus::CapReached;
                }
            }
        }

        let attempt = pass.attempt;
        let cap_reached = status == PassStatus::CapReached;
        info!(
            component = %component.name,
            events = attempt.event_count(),
            bytes = attempt.total_bytes(),
            streams = attempt.log_streams.len(),
            pending_files = component.queue.len(),
            cap_reached,
            "Attempt assembled"
        );
        attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::job::JobQueue;
    use crate::config::types::{ComponentType, DEFAULT_MULTILINE_PATTERN};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn device() -> DeviceContext {
        DeviceContext {
            thing_name: "test-thing".to_string(),
            region: "us-west-2".to_string(),
        }
    }

    fn component(jobs: Vec<FileReadJob>) -> ComponentLogFiles {
        ComponentLogFiles {
            name: "com.example.App".to_string(),
            component_type: ComponentType::User,
            min_level: LogLevel::Info,
            multiline_start: Regex::new(DEFAULT_MULTILINE_PATTERN).unwrap(),
            queue: JobQueue::from_jobs(jobs),
        }
    }

    #[test]
    fn test_group_name() {
        let mut component = component(vec![]);

        let attempt = AttemptBuilder::new(device()).process(&mut component);

        assert_eq!(
            attempt.log_group_name,
            "/aws/greengrass/UserComponent/us-west-2/com.example.App"
        );
        assert!(attempt.log_streams.is_empty());
    }

    #[test]
    fn test_structured_records_grouped_by_own_date() {
        let mut temp_file = NamedTempFile::new().unwrap();
        // 2020-12-15T00:00:00Z and 2020-12-16T00:00:00Z
        writeln!(temp_file, r#"{{"level":"INFO","timestamp":1607990400000,"message":"a"}}"#).unwrap();
        writeln!(temp_file, r#"{{"level":"INFO","timestamp":1608076800000,"message":"b"}}"#).unwrap();
        temp_file.flush().unwrap();

        let mut component = component(vec![FileReadJob::new(temp_file.path(), 0)]);
        let attempt = AttemptBuilder::new(device()).process(&mut component);

        let streams: Vec<&String> = attempt.log_streams.keys().collect();
        assert_eq!(
            streams,
            vec!["/2020/12/15/thing/test-thing", "/2020/12/16/thing/test-thing"]
        );
        let first = &attempt.log_streams["/2020/12/15/thing/test-thing"];
        assert_eq!(first.log_events[0].timestamp, 1607990400000);
        assert!(component.queue.is_empty());
    }

    #[test]
    fn test_cap_keeps_job_at_committed_offset() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "aaaa").unwrap();
        writeln!(temp_file, "bbbb").unwrap();
        writeln!(temp_file, "cccc").unwrap();
        temp_file.flush().unwrap();

        // each record is 5 bytes of text + 34 of overhead
        let mut component = component(vec![FileReadJob::new(temp_file.path(), 0)]);
        let attempt = AttemptBuilder::new(device())
            .with_max_batch_size(39 * 2)
            .process(&mut component);

        assert_eq!(attempt.event_count(), 2);
        assert_eq!(attempt.total_bytes(), 78);
        assert_eq!(component.queue.len(), 1);
        assert_eq!(component.queue.front().unwrap().offset, 10);
        assert_eq!(attempt.resume_offset(temp_file.path()), Some(10));
    }

    #[test]
    fn test_max_batch_size_clamped() {
        let builder = AttemptBuilder::new(device()).with_max_batch_size(usize::MAX);
        assert_eq!(builder.max_batch_size, MAX_BATCH_SIZE);
    }
}
