//! In-memory transport serving canned responses

use super::transport::{Request, Transport, TransportError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Transport answering from a fixed table keyed by the request's display form
///
/// Unknown requests answer `Ok(None)`, just like a 404 upstream.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: HashMap<String, Value>,
    failures: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, request: &str, body: Value) -> Self {
        self.responses.insert(request.to_string(), body);
        self
    }

    /// Lets the next `times` calls for `request` time out
    pub fn fail(self, request: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(request.to_string(), times);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls_to(&self, request: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == request)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for FakeTransport {
    fn get_json(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError> {
        let key = request.to_string();
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled { url: key });
        }
        self.calls.lock().unwrap().push(key.clone());

        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }

        if let Some(remaining) = self.failures.lock().unwrap().get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Timeout { url: key });
            }
        }

        Ok(self.responses.get(&key).cloned())
    }
}
