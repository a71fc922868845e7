//! User callbacks: the business logic a handler delegates each request to.
//!
//! A handler owns exactly one implementation of each trait it needs and never looks at its
//! concrete type. [`Unconfigured`] implements every trait by refusing with
//! [`CallbackError::NotImplemented`], so a handler only needs to be given the callbacks it
//! actually serves.
//!
//! Callbacks may keep their own state. They are shared between concurrent requests, so any
//! mutable state must be synchronized by the callback itself (see [`Counter`]).

mod counter;
mod echo;
mod fs_store;
mod hl7_ack;

pub use self::counter::Counter;
pub use self::echo::Echo;
pub use self::fs_store::FsStore;
pub use self::hl7_ack::{AckCode, Hl7Ack, PatientIdentifier};
use crate::error::CallbackError;
use crate::internal_macros::future_send;
use crate::StoreKey;
use std::net::SocketAddr;
use tonic::metadata::MetadataMap;

/// Per-request information made available to callbacks.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    remote_addr: Option<SocketAddr>,
    metadata: MetadataMap,
}

impl CallContext {
    /// Capture the context of an incoming request.
    pub fn from_request<T>(request: &tonic::Request<T>) -> Self {
        Self {
            remote_addr: request.remote_addr(),
            metadata: request.metadata().clone(),
        }
    }

    /// The peer address, if the transport knows it.
    #[inline]
    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// The request's gRPC metadata (headers).
    #[inline]
    pub const fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }
}

/// Transforms a string payload into another string.
pub trait StringTransform: Send + Sync + 'static {
    /// Transform one payload.
    fn transform(
        &self,
        payload: String,
        context: &CallContext,
    ) -> future_send!(Result<String, CallbackError>);
}

/// Transforms a byte payload into another byte payload.
pub trait BytesTransform: Send + Sync + 'static {
    /// Transform one payload.
    fn transform(
        &self,
        payload: Vec<u8>,
        context: &CallContext,
    ) -> future_send!(Result<Vec<u8>, CallbackError>);
}

/// Reads and writes stored objects.
///
/// Keys arrive already resolved against the storage root. A missing object must be reported
/// as [`CallbackError::NotExist`] so the store can answer with an in-band error.
pub trait ReadWriteHandler: Send + Sync + 'static {
    /// Read the object stored for `key`.
    fn read(
        &self,
        key: &StoreKey,
        context: &CallContext,
    ) -> future_send!(Result<Vec<u8>, CallbackError>);

    /// Store `payload` for `key`, replacing any existing object.
    fn write(
        &self,
        key: &StoreKey,
        payload: Vec<u8>,
        context: &CallContext,
    ) -> future_send!(Result<(), CallbackError>);
}

/// The callback used when none was configured. Every call fails with
/// [`CallbackError::NotImplemented`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Unconfigured;

impl StringTransform for Unconfigured {
    async fn transform(
        &self,
        _payload: String,
        _context: &CallContext,
    ) -> Result<String, CallbackError> {
        Err(CallbackError::NotImplemented(
            "no string transform is configured".to_owned(),
        ))
    }
}

impl BytesTransform for Unconfigured {
    async fn transform(
        &self,
        _payload: Vec<u8>,
        _context: &CallContext,
    ) -> Result<Vec<u8>, CallbackError> {
        Err(CallbackError::NotImplemented(
            "no bytes transform is configured".to_owned(),
        ))
    }
}

impl ReadWriteHandler for Unconfigured {
    async fn read(&self, _key: &StoreKey, _context: &CallContext) -> Result<Vec<u8>, CallbackError> {
        Err(CallbackError::NotImplemented(
            "no store handler is configured".to_owned(),
        ))
    }

    async fn write(
        &self,
        _key: &StoreKey,
        _payload: Vec<u8>,
        _context: &CallContext,
    ) -> Result<(), CallbackError> {
        Err(CallbackError::NotImplemented(
            "no store handler is configured".to_owned(),
        ))
    }
}
