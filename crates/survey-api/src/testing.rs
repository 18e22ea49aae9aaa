//! In-process doubles for router tests.

use crate::persistence::{SessionPatch, SessionStore, StoreError, Table};
use crate::webhook::{EventSink, WebhookEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<(Table, Value)>>,
    updates: Mutex<Vec<(String, SessionPatch)>>,
    insert_failure: Mutex<Option<String>>,
    update_failure: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn fail_inserts(&self, message: &str) {
        *self.insert_failure.lock() = Some(message.to_string());
    }

    pub fn fail_updates(&self, message: &str) {
        *self.update_failure.lock() = Some(message.to_string());
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.rows
            .lock()
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    pub fn updates(&self) -> Vec<(String, SessionPatch)> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, table: Table, row: Value) -> Result<Vec<Value>, StoreError> {
        if let Some(message) = self.insert_failure.lock().clone() {
            return Err(StoreError::Rejected {
                status: 400,
                message,
            });
        }
        self.rows.lock().push((table, row.clone()));
        Ok(vec![row])
    }

    async fn update_session(
        &self,
        session_id: &str,
        patch: &SessionPatch,
    ) -> Result<(), StoreError> {
        if let Some(message) = self.update_failure.lock().clone() {
            return Err(StoreError::Rejected {
                status: 404,
                message,
            });
        }
        self.updates
            .lock()
            .push((session_id.to_string(), patch.clone()));
        Ok(())
    }
}

/// Records events synchronously instead of posting them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WebhookEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<WebhookEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn forward(&self, event: WebhookEvent) {
        self.events.lock().push(event);
    }
}
