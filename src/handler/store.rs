//! The `BytesSimpleStore` service handler.

use crate::callback::{CallContext, ReadWriteHandler, Unconfigured};
use crate::error::CallbackError;
use crate::interop::{callback_fault_to_status, into_tonic_status};
use crate::proto::simplestore::read_response::Outcome;
use crate::proto::simplestore::simple_store_error::Kind;
use crate::proto::simplestore::{
    NotExistError, ReadRequest, ReadResponse, SimpleStoreError, WriteRequest, WriteResponse,
};
use crate::service::store::StoreRpc;
use crate::tracing_shim::{debug, info_span, Instrument as _};
use crate::{RpcResponse, StorageRoot};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Resolves keys under a [`StorageRoot`] and hands them to a [`ReadWriteHandler`].
///
/// A read of a key with nothing stored answers in-band with a `NotExistError` carrying the key
/// exactly as the client sent it. Keys that would escape the root are `INVALID_ARGUMENT`.
#[must_use]
#[derive(Debug)]
pub struct StoreHandler<H = Unconfigured> {
    root: StorageRoot,
    handler: Arc<H>,
}

impl<H> StoreHandler<H>
where
    H: ReadWriteHandler,
{
    /// Serve objects under `root` through `handler`.
    ///
    /// The root is not created here; [`crate::server::serve_store`] does that on startup.
    #[inline]
    pub fn new(root: impl Into<StorageRoot>, handler: H) -> Self {
        Self {
            root: root.into(),
            handler: Arc::new(handler),
        }
    }
}

impl<H> StoreHandler<H> {
    /// The directory keys are resolved against.
    #[inline]
    pub const fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// The read/write handler.
    #[inline]
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Map a failure that happened before or inside the handler to a status.
fn store_fault_to_status(err: CallbackError) -> Status {
    match err {
        CallbackError::InvalidArgument(_) => into_tonic_status(err),
        other => callback_fault_to_status(other),
    }
}

#[tonic::async_trait]
impl<H> StoreRpc for StoreHandler<H>
where
    H: ReadWriteHandler,
{
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    async fn read(&self, request: Request<ReadRequest>) -> RpcResponse<ReadResponse> {
        let context = CallContext::from_request(&request);
        let ReadRequest { key } = request.into_inner();
        let store_key = self.root.resolve(key.as_str()).map_err(store_fault_to_status)?;
        debug!(key = %key, path = %store_key.path().display(), "read");

        let handler = Arc::clone(&self.handler);
        let task = async move { handler.read(&store_key, &context).await };
        let result = tokio::spawn(task.instrument(info_span!("store_read")))
            .await
            .map_err(into_tonic_status)?;

        let outcome = match result {
            Ok(bytes) => Outcome::BytesContent(bytes),
            Err(CallbackError::NotExist { .. }) => Outcome::Error(SimpleStoreError {
                message: format!("no object exists for key `{key}`"),
                kind: Some(Kind::NotExist(NotExistError { key: key.clone() })),
            }),
            Err(err) => return Err(store_fault_to_status(err)),
        };

        Ok(Response::new(ReadResponse {
            key,
            outcome: Some(outcome),
        }))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    async fn write(&self, request: Request<WriteRequest>) -> RpcResponse<WriteResponse> {
        let context = CallContext::from_request(&request);
        let WriteRequest { key, bytes_content } = request.into_inner();
        let store_key = self.root.resolve(key.as_str()).map_err(store_fault_to_status)?;
        debug!(key = %key, path = %store_key.path().display(), "write");

        let handler = Arc::clone(&self.handler);
        let task = async move { handler.write(&store_key, bytes_content, &context).await };
        tokio::spawn(task.instrument(info_span!("store_write")))
            .await
            .map_err(into_tonic_status)?
            .map_err(store_fault_to_status)?;

        Ok(Response::new(WriteResponse { key }))
    }
}
