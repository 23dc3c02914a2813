pub mod classify;
pub mod level;
pub mod reader;
pub mod timestamp;

pub use classify::{ClassifiedRecord, LineClassifier};
pub use level::LogLevel;
pub use reader::{MultilineReader, RawRecord, ReaderError};
