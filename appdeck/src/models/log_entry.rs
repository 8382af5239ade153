//! Structured log entries received over the log stream

use serde::{Deserialize, Serialize};

/// One structured log line from the app's log multiplexer.
///
/// Every field is optional; frames that do not parse as JSON are kept
/// as raw text instead of being forced into this shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl LogEntry {
    /// Render as `"{timestamp} {source} {severity}: {message}"`.
    ///
    /// Empty leading fields are omitted along with their separating
    /// space; when no prefix field is present the message is returned
    /// bare, without the colon.
    pub fn render(&self) -> String {
        let prefix = [&self.timestamp, &self.source, &self.severity]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let message = self.message.as_deref().unwrap_or("");
        if prefix.is_empty() {
            message.to_string()
        } else {
            format!("{}: {}", prefix, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full_entry() {
        let entry = LogEntry {
            timestamp: Some("t1".to_string()),
            source: Some("s1".to_string()),
            severity: Some("INFO".to_string()),
            message: Some("m1".to_string()),
        };
        assert_eq!(entry.render(), "t1 s1 INFO: m1");
    }

    #[test]
    fn test_render_skips_empty_fields() {
        let entry = LogEntry {
            timestamp: Some(String::new()),
            source: None,
            severity: Some("WARN".to_string()),
            message: Some("disk almost full".to_string()),
        };
        assert_eq!(entry.render(), "WARN: disk almost full");
    }

    #[test]
    fn test_render_message_only() {
        let entry = LogEntry {
            message: Some("bare message".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.render(), "bare message");
    }
}
