use crate::source::level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A line that does not start with whitespace opens a new record.
pub const DEFAULT_MULTILINE_PATTERN: &str = r"^[^\s]+(\s+[^\s]+)*$";

/// Stream names are capped at 512 characters; the date takes 10 and the
/// separators 3, which leaves room for a thing name of up to 128.
pub const MAX_THING_NAME_LEN: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Falls back to the host name when omitted.
    #[serde(default)]
    pub thing_name: Option<String>,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub component_type: ComponentType,
    #[serde(default)]
    pub min_level: LogLevel,
    #[serde(default = "default_multiline_start")]
    pub multiline_start: String,
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

fn default_multiline_start() -> String {
    DEFAULT_MULTILINE_PATTERN.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    System,
    #[default]
    User,
}

impl ComponentType {
    /// Name used in the log group path.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::System => "GreengrassSystemComponent",
            ComponentType::User => "UserComponent",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub offset: u64,
}
