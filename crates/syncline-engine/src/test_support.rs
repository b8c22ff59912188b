//! Recording fake adapters shared by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use syncline_core::{
    AdapterError, CorrelationKey, Payload, SourceAdapter, SourceRecord, TargetAdapter, TargetId,
    TargetRecord,
};

/// Source fake returning a configurable listing and payload table.
#[derive(Default)]
pub(crate) struct FakeSource {
    pub records: Mutex<Vec<SourceRecord>>,
    pub payloads: Mutex<HashMap<String, String>>,
    pub fail_listing: AtomicBool,
    pub fail_payload_for: Mutex<HashSet<String>>,
    pub list_calls: AtomicUsize,
    pub payload_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_records(records: Vec<SourceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn set_records(&self, records: Vec<SourceRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_payload(&self, key: &str, payload: &str) {
        self.payloads
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
    }

    pub fn fail_payload(&self, key: &str) {
        self.fail_payload_for
            .lock()
            .unwrap()
            .insert(key.to_string());
    }
}

#[async_trait]
impl SourceAdapter for FakeSource {
    async fn list_entities(&self) -> Result<Vec<SourceRecord>, AdapterError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(AdapterError::transport("source listing unavailable"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn fetch_payload(&self, key: &CorrelationKey) -> Result<Payload, AdapterError> {
        self.payload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_payload_for.lock().unwrap().contains(key.as_str()) {
            return Err(AdapterError::status(503, "payload unavailable"));
        }
        match self.payloads.lock().unwrap().get(key.as_str()) {
            Some(payload) => Ok(Payload::new(payload)),
            None => Err(AdapterError::status(404, "no payload")),
        }
    }

    fn system_name(&self) -> &'static str {
        "fake-source"
    }
}

/// Target fake recording every mutation it is asked to perform.
#[derive(Default)]
pub(crate) struct FakeTarget {
    pub records: Mutex<Vec<TargetRecord>>,
    pub fail_listing: AtomicBool,
    pub fail_create_for: Mutex<HashSet<String>>,
    pub panic_create_for: Mutex<HashSet<String>>,
    pub fail_delete_for: Mutex<HashSet<String>>,
    pub created: Mutex<Vec<(String, Option<String>)>>,
    pub deleted: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    pub create_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    pub max_in_flight_seen: AtomicUsize,
}

impl FakeTarget {
    pub fn with_records(records: Vec<TargetRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn fail_create(&self, key: &str) {
        self.fail_create_for.lock().unwrap().insert(key.to_string());
    }

    pub fn panic_on_create(&self, key: &str) {
        self.panic_create_for
            .lock()
            .unwrap()
            .insert(key.to_string());
    }

    pub fn fail_delete(&self, target_id: &str) {
        self.fail_delete_for
            .lock()
            .unwrap()
            .insert(target_id.to_string());
    }

    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    pub fn created_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .created
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        let mut ids = self.deleted.lock().unwrap().clone();
        ids.sort();
        ids
    }
}

#[async_trait]
impl TargetAdapter for FakeTarget {
    async fn list_entities(&self) -> Result<Vec<TargetRecord>, AdapterError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(AdapterError::transport("target listing unavailable"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_entity(&self, record: &SourceRecord) -> Result<TargetId, AdapterError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_seen
            .fetch_max(current, Ordering::SeqCst);

        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let panics = self
            .panic_create_for
            .lock()
            .unwrap()
            .contains(record.key.as_str());
        if panics {
            panic!("injected panic creating {}", record.key);
        }

        if self
            .fail_create_for
            .lock()
            .unwrap()
            .contains(record.key.as_str())
        {
            return Err(AdapterError::status(502, "create rejected"));
        }

        self.created.lock().unwrap().push((
            record.key.as_str().to_string(),
            record.payload.as_ref().map(|p| p.as_str().to_string()),
        ));
        Ok(TargetId::new(format!("tid-{}", record.key)))
    }

    async fn delete_entity(&self, id: &TargetId) -> Result<(), AdapterError> {
        if self.fail_delete_for.lock().unwrap().contains(id.as_str()) {
            return Err(AdapterError::status(502, "delete rejected"));
        }
        self.deleted.lock().unwrap().push(id.as_str().to_string());
        Ok(())
    }

    fn system_name(&self) -> &'static str {
        "fake-target"
    }
}
