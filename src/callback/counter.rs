use crate::callback::{BytesTransform, CallContext, StringTransform};
use crate::error::CallbackError;
use crate::tracing_shim::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefixes each payload with the number of requests this instance has processed so far.
///
/// The count starts at zero, so the first payload is tagged `1`. It lives for as long as the
/// instance does and is never persisted. Concurrent requests each get a distinct number, but
/// the order in which they are handed out follows scheduling, not arrival.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    /// Start counting from `start`; the next request is tagged `start + 1`.
    #[inline]
    pub const fn starting_at(start: u64) -> Self {
        Self {
            count: AtomicU64::new(start),
        }
    }

    /// How many requests have been processed.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Count one request and return its tag.
    fn next(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl StringTransform for Counter {
    async fn transform(
        &self,
        payload: String,
        _context: &CallContext,
    ) -> Result<String, CallbackError> {
        let count = self.next();
        info!(count, %payload, "string payload received");
        Ok(format!("{count} {payload}"))
    }
}

impl BytesTransform for Counter {
    async fn transform(
        &self,
        payload: Vec<u8>,
        _context: &CallContext,
    ) -> Result<Vec<u8>, CallbackError> {
        let count = self.next();
        info!(count, len = payload.len(), "bytes payload received");
        let mut tagged = format!("{count} ").into_bytes();
        tagged.extend_from_slice(&payload);
        Ok(tagged)
    }
}
