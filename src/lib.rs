//! Pluggable gRPC services: a payload `Transformer` and a bytes `BytesSimpleStore`.
//!
//! Both services follow the same shape. A handler implements the generated tonic trait,
//! normalizes the request, and hands the payload to a user-supplied callback (see
//! [`callback`]). The callback's result is wrapped into the reply message, and failures are
//! mapped onto [`tonic::Status`] codes.
//!
//! ```no_run
//! use etl_grpc::callback::{Counter, Echo};
//! use etl_grpc::handler::TransformHandler;
//! use etl_grpc::server::{serve_transform, ServerConfig};
//!
//! # async fn run() -> Result<(), etl_grpc::error::ServeError> {
//! let handler = TransformHandler::new()
//!     .with_string(Counter::default())
//!     .with_bytes(Echo);
//! serve_transform(&ServerConfig::insecure("[::1]:50051"), handler).await
//! # }
//! ```

pub mod callback;
pub mod error;
pub mod handler;
mod internal_macros;
pub mod interop;
mod location;
pub mod server;
mod tracing_shim;
pub mod transitive;

/// Protobuf messages and tonic stubs generated from the `.proto` files.
#[allow(
    missing_docs,
    unreachable_pub,
    unused_qualifications,
    clippy::missing_docs_in_private_items,
    clippy::all,
    clippy::nursery
)]
pub mod proto {
    /// The `Transformer` service and its payload types.
    pub mod transform {
        tonic::include_proto!("etl_grpc.transformers.transform");

        /// Encoded file descriptor set, used for server reflection.
        pub const FILE_DESCRIPTOR_SET: &[u8] =
            tonic::include_file_descriptor_set!("transform_descriptor");
    }

    /// The `BytesSimpleStore` service and its request/response types.
    pub mod simplestore {
        tonic::include_proto!("etl_grpc.simplestore.bytes_store");

        /// Encoded file descriptor set, used for server reflection.
        pub const FILE_DESCRIPTOR_SET: &[u8] =
            tonic::include_file_descriptor_set!("simplestore_descriptor");
    }
}

/// Re-exports of the generated server traits and clients under shorter names.
pub mod service {
    /// The `Transformer` service.
    pub mod transform {
        pub use crate::proto::transform::transformer_client::TransformerClient;
        pub use crate::proto::transform::transformer_server::{
            Transformer as TransformRpc, TransformerServer,
        };
    }

    /// The `BytesSimpleStore` service.
    pub mod store {
        pub use crate::proto::simplestore::bytes_simple_store_client::BytesSimpleStoreClient;
        pub use crate::proto::simplestore::bytes_simple_store_server::{
            BytesSimpleStore as StoreRpc, BytesSimpleStoreServer,
        };
    }
}

/// The result of a unary RPC.
pub type RpcResponse<T> = Result<tonic::Response<T>, tonic::Status>;

pub use self::location::{StorageRoot, StoreKey};
