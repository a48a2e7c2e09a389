//! In-memory exchange
//!
//! Stands in for the shared directory and lets a test play the launcher's
//! part through [`InMemoryExchange::respond`]. Clones share the same storage.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::RequestId;
use crate::error::ExchangeError;
use crate::ports::RequestExchange;

#[derive(Debug, Default)]
struct Inner {
    requests: HashMap<RequestId, Vec<u8>>,
    request_order: Vec<RequestId>,
    responses: HashMap<RequestId, Vec<u8>>,
    fail_writes: bool,
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryExchange {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `write_request` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.write().fail_writes = fail;
    }

    /// Ids of all requests written so far, oldest first.
    pub fn request_ids(&self) -> Vec<RequestId> {
        self.inner.read().request_order.clone()
    }

    /// Most recently written request id.
    pub fn last_request_id(&self) -> Option<RequestId> {
        self.inner.read().request_order.last().copied()
    }

    /// Decoded payload of a written request.
    pub fn request_payload(&self, id: &RequestId) -> Option<serde_json::Value> {
        let inner = self.inner.read();
        let bytes = inner.requests.get(id)?;
        serde_json::from_slice(bytes).ok()
    }

    /// Write a JSON response, as the launcher would.
    pub fn respond(&self, id: &RequestId, response: &serde_json::Value) {
        let bytes = serde_json::to_vec(response).unwrap_or_default();
        self.respond_raw(id, bytes);
    }

    /// Write raw response bytes (e.g. a truncated document).
    pub fn respond_raw(&self, id: &RequestId, bytes: impl Into<Vec<u8>>) {
        self.inner.write().responses.insert(*id, bytes.into());
    }

    pub fn has_response(&self, id: &RequestId) -> bool {
        self.inner.read().responses.contains_key(id)
    }
}

impl RequestExchange for InMemoryExchange {
    fn write_request(&self, id: &RequestId, payload: &[u8]) -> Result<(), ExchangeError> {
        let mut inner = self.inner.write();
        if inner.fail_writes {
            return Err(ExchangeError::Unavailable(
                "request writes disabled".to_string(),
            ));
        }
        inner.requests.insert(*id, payload.to_vec());
        inner.request_order.push(*id);
        Ok(())
    }

    fn read_response(&self, id: &RequestId) -> Result<Option<Vec<u8>>, ExchangeError> {
        Ok(self.inner.read().responses.get(id).cloned())
    }

    fn remove_response(&self, id: &RequestId) -> Result<(), ExchangeError> {
        self.inner.write().responses.remove(id);
        Ok(())
    }
}
