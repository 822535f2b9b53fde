//! In-memory client directory for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use vitaerp_clients::{ClientDirectory, ClientId, ClientKind, ClientRecord};

#[derive(Debug, Default)]
pub struct InMemoryClientDirectory {
    records: RwLock<HashMap<(ClientKind, ClientId), ClientRecord>>,
}

impl InMemoryClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ClientRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert((record.kind(), record.id()), record);
        }
    }
}

impl ClientDirectory for InMemoryClientDirectory {
    fn fetch(&self, kind: ClientKind, id: ClientId) -> Option<ClientRecord> {
        let records = self.records.read().ok()?;
        records.get(&(kind, id)).cloned()
    }
}
