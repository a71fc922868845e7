use crate::callback::{CallContext, ReadWriteHandler};
use crate::error::CallbackError;
use crate::tracing_shim::debug;
use crate::StoreKey;
use std::io;

/// Stores each object as a file at the path its key resolves to.
///
/// Writes create any missing parent directories and overwrite existing files. Reading a key
/// that resolves to a directory, or to a path below a regular file, is treated as a miss.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FsStore;

/// Whether a failed read means there is no object at the path.
fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::IsADirectory
    )
}

impl ReadWriteHandler for FsStore {
    async fn read(&self, key: &StoreKey, _context: &CallContext) -> Result<Vec<u8>, CallbackError> {
        debug!(path = %key.path().display(), "reading object");
        match tokio::fs::read(key.path()).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if is_missing(&err) => Err(CallbackError::NotExist {
                key: key.key().to_owned(),
            }),
            Err(err) => Err(CallbackError::internal(err)),
        }
    }

    async fn write(
        &self,
        key: &StoreKey,
        payload: Vec<u8>,
        _context: &CallContext,
    ) -> Result<(), CallbackError> {
        debug!(path = %key.path().display(), len = payload.len(), "writing object");
        if let Some(parent) = key.path().parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(CallbackError::internal)?;
        }
        tokio::fs::write(key.path(), payload)
            .await
            .map_err(CallbackError::internal)
    }
}
