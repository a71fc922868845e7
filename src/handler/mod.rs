//! Service handlers: the glue between tonic's generated traits and user callbacks.

mod store;
mod transform;

pub use self::store::StoreHandler;
pub use self::transform::TransformHandler;
