//! Error types shared by callbacks, handlers and the server.

use std::io;

/// A failure reported by a callback, or by a handler before the callback is reached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    /// The callback does not support this kind of request.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// No stored object exists for the key.
    #[error("no object exists for key `{key}`")]
    NotExist {
        /// The key as the client sent it.
        key: String,
    },
    /// The request is malformed or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CallbackError {
    /// Shorthand for [`CallbackError::Internal`] from any displayable error.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A server configuration that cannot be served. These are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Neither an insecure nor a secure address was given.
    #[error("at least one of an insecure or a secure address must be specified")]
    NoAddress,
    /// A secure address was requested.
    #[error("secure address `{addr}` requested, but secure ports are not implemented")]
    SecureUnsupported {
        /// The requested secure address.
        addr: String,
    },
    /// Both an insecure and a secure address were given.
    #[error("exactly one of an insecure or a secure address must be specified, not both")]
    Conflicting,
    /// The insecure address did not resolve to any socket address.
    #[error("could not resolve address `{addr}`")]
    Unresolvable {
        /// The address that failed to resolve.
        addr: String,
        /// The resolver error, if there was one.
        #[source]
        source: Option<io::Error>,
    },
}

/// An error that stopped a server from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The storage root could not be created.
    #[error("could not prepare storage root")]
    StorageRoot(#[source] io::Error),
    /// The reflection service could not be built from the descriptor set.
    #[error(transparent)]
    Reflection(#[from] tonic_reflection::server::Error),
    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),
}
