pub mod budget;
pub mod builder;
pub mod job;
pub mod model;
pub mod stream;

pub use budget::{Admission, BatchBudget};
pub use builder::AttemptBuilder;
pub use job::{ComponentLogFiles, DeviceContext, FileReadJob, JobQueue};
pub use model::{Attempt, FileCheckpoint, LogEvent, StreamBucket};
pub use stream::StreamGrouper;
