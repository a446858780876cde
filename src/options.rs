//! Conversion options configuration.

use chrono::{DateTime, FixedOffset, Local};

/// Title used when none can be derived from the input file name.
pub const DEFAULT_TITLE: &str = "Title 1";

/// Options for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Title heading text; derived from the input file stem when unset
    pub title: Option<String>,

    /// Title used when no title is set or derivable
    pub default_title: String,

    /// Generation time; the current local time when unset
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// Link the output to its template with an attachedTemplate relationship
    pub attach_template: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            title: None,
            default_title: DEFAULT_TITLE.to_string(),
            timestamp: None,
            attach_template: true,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title heading text.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the fallback title.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Pin the generation time.
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Enable or disable the template link.
    pub fn with_template_link(mut self, attach: bool) -> Self {
        self.attach_template = attach;
        self
    }

    /// Generation time for this run.
    pub fn generated_at(&self) -> DateTime<FixedOffset> {
        self.timestamp
            .unwrap_or_else(|| Local::now().fixed_offset())
    }

    /// The text of the timestamp paragraph.
    pub fn timestamp_line(&self) -> String {
        format!(
            "Document generated on {}. ",
            round_trip_timestamp(&self.generated_at())
        )
    }
}

/// Format a time as `YYYY-MM-DDTHH:MM:SS.fffffff+HH:MM` (100 ns precision).
pub fn round_trip_timestamp(time: &DateTime<FixedOffset>) -> String {
    let ticks = time.timestamp_subsec_nanos().min(999_999_999) / 100;
    format!(
        "{}.{:07}{}",
        time.format("%Y-%m-%dT%H:%M:%S"),
        ticks,
        time.format("%:z")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::new();
        assert_eq!(options.title, None);
        assert_eq!(options.default_title, "Title 1");
        assert!(options.attach_template);
    }

    #[test]
    fn test_builder() {
        let options = ConvertOptions::new()
            .with_title("Report")
            .with_default_title("Untitled")
            .with_template_link(false)
            .with_timestamp(fixed("2024-03-01T09:30:00+01:00"));
        assert_eq!(options.title.as_deref(), Some("Report"));
        assert_eq!(options.default_title, "Untitled");
        assert!(!options.attach_template);
        assert_eq!(options.generated_at(), fixed("2024-03-01T09:30:00+01:00"));
    }

    #[test]
    fn test_round_trip_timestamp() {
        assert_eq!(
            round_trip_timestamp(&fixed("2024-03-01T09:30:05.123456789+01:00")),
            "2024-03-01T09:30:05.1234567+01:00"
        );
        assert_eq!(
            round_trip_timestamp(&fixed("2024-12-31T23:59:59-05:30")),
            "2024-12-31T23:59:59.0000000-05:30"
        );
    }

    #[test]
    fn test_timestamp_line() {
        let options = ConvertOptions::new().with_timestamp(fixed("2024-03-01T09:30:00Z"));
        assert_eq!(
            options.timestamp_line(),
            "Document generated on 2024-03-01T09:30:00.0000000+00:00. "
        );
    }
}
