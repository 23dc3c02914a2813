use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Contiguous run of word characters, `:`, `.`, `+` and `-`. The first such
/// run in a plain record is the timestamp candidate.
const TOKEN_PATTERN: &str = r"[\w:.+\-]+";

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("failed to parse timestamp '{value}' with format '{format}': {source}")]
    ParseError {
        value: String,
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Formats tried, in order, against the timestamp candidate of a plain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// UTC instant with a literal `Z`, e.g. `2020-12-15T10:00:00.123Z`.
    Instant,
    /// Date-time with a numeric offset, e.g. `2020-12-15T10:00:00+01:00`.
    OffsetDateTime,
}

pub const PLAIN_TIMESTAMP_FORMATS: &[TimestampFormat] =
    &[TimestampFormat::Instant, TimestampFormat::OffsetDateTime];

impl TimestampFormat {
    pub fn name(&self) -> &'static str {
        match self {
            TimestampFormat::Instant => "instant",
            TimestampFormat::OffsetDateTime => "offset_date_time",
        }
    }

    pub fn parse(&self, value: &str) -> Result<DateTime<Utc>, TimestampError> {
        match self {
            TimestampFormat::Instant => self.parse_instant(value),
            TimestampFormat::OffsetDateTime => self.parse_offset_date_time(value),
        }
    }

    fn parse_instant(&self, value: &str) -> Result<DateTime<Utc>, TimestampError> {
        // Seconds are optional in ISO local times.
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%MZ"))
            .map(|ndt| Utc.from_utc_datetime(&ndt))
            .map_err(|e| self.error(value, e))
    }

    fn parse_offset_date_time(&self, value: &str) -> Result<DateTime<Utc>, TimestampError> {
        DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%:z")
            .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z"))
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| self.error(value, e))
    }

    fn error(&self, value: &str, source: chrono::ParseError) -> TimestampError {
        TimestampError::ParseError {
            value: value.to_string(),
            format: self.name(),
            source: Box::new(source),
        }
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

/// Heuristic timestamp extraction for records that are not structured.
#[derive(Debug, Clone)]
pub struct TimestampExtractor {
    formats: Vec<TimestampFormat>,
}

impl Default for TimestampExtractor {
    fn default() -> Self {
        Self::new(PLAIN_TIMESTAMP_FORMATS)
    }
}

impl TimestampExtractor {
    pub fn new(formats: &[TimestampFormat]) -> Self {
        Self {
            formats: formats.to_vec(),
        }
    }

    /// Extract a timestamp from free text.
    ///
    /// Only the first token is considered. Returns None when there is no
    /// token or no format accepts it.
    pub fn extract(&self, text: &str) -> Option<DateTime<Utc>> {
        let candidate = token_regex().find(text)?.as_str();

        for format in &self.formats {
            match format.parse(candidate) {
                Ok(timestamp) => return Some(timestamp),
                Err(e) => {
                    tracing::trace!(error = %e, "Unable to parse timestamp");
                }
            }
        }

        None
    }
}
