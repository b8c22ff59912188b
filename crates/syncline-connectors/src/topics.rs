//! Bidirectional mapping between webhook topics and event types.
//!
//! The event service names entities as `{event_type}.{event_version}` while
//! the webhook API names them by vendor topic. The map translates in both
//! directions so the two listings can be correlated under one key space.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use syncline_core::AdapterError;

/// One configured topic mapping entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicMapping {
    /// Vendor-side webhook topic, e.g. `surveys.responses`.
    pub topic: String,
    /// Event type the topic publishes as.
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Event type version.
    #[serde(rename = "eventVersion")]
    pub event_version: String,
}

/// Bidirectional topic/event index loaded from a JSON config file.
///
/// Lookups return `None` for unmapped values; callers decide whether that is
/// a skip (listings) or an error (payload resolution). Duplicate entries keep
/// the last occurrence.
#[derive(Debug, Default)]
pub struct TopicMap {
    topic_by_event: HashMap<String, String>,
    event_by_topic: HashMap<String, String>,
}

impl TopicMap {
    /// Builds the map from already-parsed entries.
    #[must_use]
    pub fn from_entries(entries: Vec<TopicMapping>) -> Self {
        let mut topic_by_event = HashMap::with_capacity(entries.len());
        let mut event_by_topic = HashMap::with_capacity(entries.len());

        for entry in entries {
            let event_key = format!("{}.{}", entry.event_type, entry.event_version);
            topic_by_event.insert(event_key.clone(), entry.topic.clone());
            event_by_topic.insert(entry.topic, event_key);
        }

        Self {
            topic_by_event,
            event_by_topic,
        }
    }

    /// Parses the map from a JSON array of `{topic, eventType, eventVersion}`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the document is not valid mapping JSON.
    pub fn from_json(json: &str) -> Result<Self, AdapterError> {
        let entries: Vec<TopicMapping> = serde_json::from_str(json).map_err(|e| {
            AdapterError::invalid_config(format!("topic map config is not valid JSON: {e}"))
        })?;
        Ok(Self::from_entries(entries))
    }

    /// Loads the map from a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::invalid_config(format!(
                "cannot read topic map config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }

    /// Resolves the webhook topic for a combined `{event_type}.{version}` key.
    #[must_use]
    pub fn topic_for_event(&self, event_key: &str) -> Option<&str> {
        self.topic_by_event.get(event_key).map(String::as_str)
    }

    /// Resolves the combined `{event_type}.{version}` key for a webhook topic.
    #[must_use]
    pub fn event_for_topic(&self, topic: &str) -> Option<&str> {
        self.event_by_topic.get(topic).map(String::as_str)
    }

    /// Number of configured mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topic_by_event.len()
    }

    /// Whether the map holds no mappings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topic_by_event.is_empty()
    }
}
