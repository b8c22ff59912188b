use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier correlating one logical entity across the source and
/// target systems.
///
/// Keys are opaque strings (a connector instance id, an
/// `eventType.eventVersion` pair). Matching is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for CorrelationKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Opaque blob a target adapter needs to create a mirror entity.
///
/// For the registry instantiation this is an OpenAPI document; for the
/// webhook instantiation it is the mapped topic string. Payloads may be
/// large and are never logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for Payload {
    fn from(payload: &str) -> Self {
        Self(payload.to_string())
    }
}

impl From<String> for Payload {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}

/// Identifier assigned by the target system when a mirror entity is created.
///
/// Required for deletion; has no meaning in the source system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One entity as reported by the source system.
///
/// A record with `payload: None` defers payload retrieval to apply time via
/// `SourceAdapter::fetch_payload`; `Some` means the listing already folded
/// the payload in. Records are immutable within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub key: CorrelationKey,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl SourceRecord {
    pub fn new(key: impl Into<CorrelationKey>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            description: None,
            payload: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Returns `true` when the payload was folded into the listing.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

/// One mirror entity as reported by the target system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub key: CorrelationKey,
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
}

impl TargetRecord {
    pub fn new(key: impl Into<CorrelationKey>, target_id: impl Into<TargetId>) -> Self {
        Self {
            key: key.into(),
            target_id: target_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_key_display() {
        let key = CorrelationKey::new("order.created.v1");
        assert_eq!(key.to_string(), "order.created.v1");
        assert_eq!(key.as_str(), "order.created.v1");
    }

    #[test]
    fn test_correlation_key_equality_is_exact() {
        assert_eq!(CorrelationKey::from("abc"), CorrelationKey::new("abc"));
        assert_ne!(CorrelationKey::new("abc"), CorrelationKey::new("Abc"));
    }

    #[test]
    fn test_correlation_key_serde_transparent() {
        let key = CorrelationKey::new("1234");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"1234\"");

        let back: CorrelationKey = serde_json::from_str("\"1234\"").unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_payload_into_inner() {
        let payload = Payload::new("{\"openapi\":\"3.0.0\"}");
        assert_eq!(payload.as_str(), "{\"openapi\":\"3.0.0\"}");
        assert_eq!(payload.into_inner(), "{\"openapi\":\"3.0.0\"}");
    }

    #[test]
    fn test_source_record_builders() {
        let record = SourceRecord::new("42", "commerce-42")
            .with_description("Commerce connector instance")
            .with_payload("spec body");

        assert_eq!(record.key, CorrelationKey::new("42"));
        assert_eq!(record.display_name, "commerce-42");
        assert_eq!(
            record.description.as_deref(),
            Some("Commerce connector instance")
        );
        assert!(record.has_payload());
    }

    #[test]
    fn test_source_record_deferred_payload() {
        let record = SourceRecord::new("42", "commerce-42");
        assert!(!record.has_payload());
        assert!(record.description.is_none());
    }

    #[test]
    fn test_target_record_new() {
        let record = TargetRecord::new("42", "app-6f2c");
        assert_eq!(record.key, CorrelationKey::new("42"));
        assert_eq!(record.target_id, TargetId::new("app-6f2c"));
    }

    #[test]
    fn test_source_record_serialization() {
        let record = SourceRecord::new("42", "commerce-42").with_description("desc");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["key"], "42");
        assert_eq!(json["displayName"], "commerce-42");
        assert_eq!(json["description"], "desc");
        assert!(json.get("payload").is_none());
    }
}
