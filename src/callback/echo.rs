use crate::callback::{BytesTransform, CallContext, StringTransform};
use crate::error::CallbackError;

/// Returns every payload unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Echo;

impl StringTransform for Echo {
    async fn transform(
        &self,
        payload: String,
        _context: &CallContext,
    ) -> Result<String, CallbackError> {
        Ok(payload)
    }
}

impl BytesTransform for Echo {
    async fn transform(
        &self,
        payload: Vec<u8>,
        _context: &CallContext,
    ) -> Result<Vec<u8>, CallbackError> {
        Ok(payload)
    }
}
