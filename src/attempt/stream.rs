use crate::config::types::ComponentType;
use chrono::{DateTime, Utc};

pub const DEFAULT_LOG_GROUP_NAME: &str = "/aws/greengrass/{componentType}/{region}/{componentName}";
/// Example: `/2020/12/15/thing/thing-name`
pub const DEFAULT_LOG_STREAM_NAME: &str = "/{date}/thing/{thingName}";
pub const MAX_LOG_STREAM_NAME_LEN: usize = 512;

const STREAM_DATE_FORMAT: &str = "%Y/%m/%d";

pub fn log_group_name(component_type: ComponentType, region: &str, component_name: &str) -> String {
    DEFAULT_LOG_GROUP_NAME
        .replace("{componentType}", component_type.as_str())
        .replace("{region}", region)
        .replace("{componentName}", component_name)
}

/// Picks the stream for a record from the calendar date of its own timestamp.
#[derive(Debug, Clone)]
pub struct StreamGrouper {
    template: String,
}

impl StreamGrouper {
    pub fn new(thing_name: &str) -> Self {
        // Thing names may contain ':', stream names may not.
        let template = DEFAULT_LOG_STREAM_NAME
            .replace("{thingName}", thing_name)
            .replace(':', "+");
        Self { template }
    }

    pub fn stream_name(&self, timestamp: DateTime<Utc>) -> String {
        self.template
            .replace("{date}", &timestamp.format(STREAM_DATE_FORMAT).to_string())
    }
}
