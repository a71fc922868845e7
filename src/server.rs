//! Binding, reflection and serving.

use crate::callback::{BytesTransform, ReadWriteHandler, StringTransform};
use crate::error::{ConfigError, ServeError};
use crate::handler::{StoreHandler, TransformHandler};
use crate::service::store::BytesSimpleStoreServer;
use crate::service::transform::TransformerServer;
use crate::tracing_shim::{error, info};
use std::net::SocketAddr;
use tonic::transport::Server;
use tonic_reflection::server::Builder;

/// How a server listens. Immutable once built.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    insecure_addr: Option<String>,
    secure_addr: Option<String>,
    enable_reflection: bool,
}

impl ServerConfig {
    /// Build a configuration from its parts. Validation is deferred to [`Self::listen_addr`].
    pub const fn new(
        insecure_addr: Option<String>,
        secure_addr: Option<String>,
        enable_reflection: bool,
    ) -> Self {
        Self {
            insecure_addr,
            secure_addr,
            enable_reflection,
        }
    }

    /// Listen without TLS on `addr` (`host:port`), with reflection disabled.
    pub fn insecure(addr: impl Into<String>) -> Self {
        Self::new(Some(addr.into()), None, false)
    }

    /// The same configuration with reflection turned on or off.
    pub fn with_reflection(self, enable_reflection: bool) -> Self {
        Self {
            enable_reflection,
            ..self
        }
    }

    /// Whether the reflection service is registered alongside the served service.
    #[inline]
    pub const fn reflection_enabled(&self) -> bool {
        self.enable_reflection
    }

    /// Validate the configuration and resolve the address to bind.
    ///
    /// Exactly one address must be given, and it must be the insecure one: secure ports are not
    /// implemented.
    pub async fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = match (&self.insecure_addr, &self.secure_addr) {
            (None, None) => return Err(ConfigError::NoAddress),
            (Some(_), Some(_)) => return Err(ConfigError::Conflicting),
            (None, Some(addr)) => {
                return Err(ConfigError::SecureUnsupported { addr: addr.clone() });
            }
            (Some(addr), None) => addr,
        };

        match tokio::net::lookup_host(addr.as_str()).await {
            Ok(mut addrs) => addrs.next().ok_or_else(|| ConfigError::Unresolvable {
                addr: addr.clone(),
                source: None,
            }),
            Err(source) => Err(ConfigError::Unresolvable {
                addr: addr.clone(),
                source: Some(source),
            }),
        }
    }
}

/// A reflection builder for one encoded file descriptor set, if reflection is enabled.
fn reflection(config: &ServerConfig, file_descriptor_set: &'static [u8]) -> Option<Builder<'static>> {
    if !config.reflection_enabled() {
        info!("not enabling reflection");
        return None;
    }
    info!("enabling reflection");
    Some(Builder::configure().register_encoded_file_descriptor_set(file_descriptor_set))
}

/// Validate `config`, logging a rejection before it is returned.
async fn bind(config: &ServerConfig) -> Result<SocketAddr, ServeError> {
    match config.listen_addr().await {
        Ok(addr) => Ok(addr),
        Err(err) => {
            error!(%err, "not starting server");
            Err(err.into())
        }
    }
}

/// Resolves once Ctrl-C is received.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

/// Serve the `Transformer` service until Ctrl-C.
///
/// The configuration is validated before anything is bound; an invalid configuration is
/// returned as [`ServeError::Config`].
pub async fn serve_transform<S, B>(
    config: &ServerConfig,
    handler: TransformHandler<S, B>,
) -> Result<(), ServeError>
where
    S: StringTransform,
    B: BytesTransform,
{
    let addr = bind(config).await?;
    let reflection = reflection(config, crate::proto::transform::FILE_DESCRIPTOR_SET)
        .map(Builder::build_v1)
        .transpose()?;

    info!(%addr, "transformer listening");
    info!("list services: grpcurl -plaintext {addr} list");
    info!(
        "call it: grpcurl -d '{{\"string_content\": \"somestring\"}}' -plaintext {addr} \
         etl_grpc.transformers.transform.Transformer/Transform"
    );

    Server::builder()
        .add_service(TransformerServer::new(handler))
        .add_optional_service(reflection)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;
    Ok(())
}

/// Serve the `BytesSimpleStore` service until Ctrl-C.
///
/// The storage root is created first if it does not exist.
pub async fn serve_store<H>(config: &ServerConfig, handler: StoreHandler<H>) -> Result<(), ServeError>
where
    H: ReadWriteHandler,
{
    let addr = bind(config).await?;
    handler
        .root()
        .create()
        .await
        .map_err(ServeError::StorageRoot)?;
    let reflection = reflection(config, crate::proto::simplestore::FILE_DESCRIPTOR_SET)
        .map(Builder::build_v1)
        .transpose()?;

    info!(%addr, root = %handler.root().path().display(), "simple store listening");
    info!(
        "call it: grpcurl -d '{{\"key\": \"somestring\"}}' -plaintext {addr} \
         etl_grpc.simplestore.bytes_store.BytesSimpleStore/Read"
    );

    Server::builder()
        .add_service(BytesSimpleStoreServer::new(handler))
        .add_optional_service(reflection)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn no_address_is_rejected() {
        let config = ServerConfig::default();
        assert!(matches!(
            config.listen_addr().await,
            Err(ConfigError::NoAddress)
        ));
    }

    #[tokio::test]
    async fn secure_address_is_unsupported() {
        let config = ServerConfig::new(None, Some("0.0.0.0:50051".to_owned()), false);
        assert!(matches!(
            config.listen_addr().await,
            Err(ConfigError::SecureUnsupported { addr }) if addr == "0.0.0.0:50051"
        ));
    }

    #[tokio::test]
    async fn both_addresses_conflict() {
        let config = ServerConfig::new(
            Some("0.0.0.0:50051".to_owned()),
            Some("0.0.0.0:50052".to_owned()),
            false,
        );
        assert!(matches!(
            config.listen_addr().await,
            Err(ConfigError::Conflicting)
        ));
    }

    #[tokio::test]
    async fn resolves_literal_addresses() -> Result<(), ConfigError> {
        let addr = ServerConfig::insecure("0.0.0.0:50051").listen_addr().await?;
        assert_eq!(addr, SocketAddr::from(([0, 0, 0, 0], 50051)));

        let addr = ServerConfig::insecure("[::]:50051").listen_addr().await?;
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 50051);
        Ok(())
    }

    #[tokio::test]
    async fn missing_port_is_unresolvable() {
        let config = ServerConfig::insecure("0.0.0.0");
        assert!(matches!(
            config.listen_addr().await,
            Err(ConfigError::Unresolvable { .. })
        ));
    }

    #[test]
    fn reflection_is_off_by_default() {
        let config = ServerConfig::insecure("[::1]:50051");
        assert!(!config.reflection_enabled());
        assert!(reflection(&config, crate::proto::transform::FILE_DESCRIPTOR_SET).is_none());
        assert!(reflection(&config, crate::proto::simplestore::FILE_DESCRIPTOR_SET).is_none());
    }

    #[test]
    fn reflection_builds_from_both_descriptor_sets() -> Result<(), tonic_reflection::server::Error> {
        let config = ServerConfig::insecure("[::1]:50051").with_reflection(true);
        for file_descriptor_set in [
            crate::proto::transform::FILE_DESCRIPTOR_SET,
            crate::proto::simplestore::FILE_DESCRIPTOR_SET,
        ] {
            let service = reflection(&config, file_descriptor_set)
                .map(Builder::build_v1)
                .transpose()?;
            assert!(service.is_some());
        }
        Ok(())
    }

    #[tokio::test]
    async fn invalid_config_fails_before_serving() {
        let handler = TransformHandler::new();
        let result = serve_transform(&ServerConfig::default(), handler).await;
        assert!(matches!(
            result,
            Err(ServeError::Config(ConfigError::NoAddress))
        ));

        let handler = StoreHandler::new(std::env::temp_dir(), crate::callback::FsStore);
        let config = ServerConfig::new(None, Some("[::1]:50051".to_owned()), true);
        let result = serve_store(&config, handler).await;
        assert!(matches!(
            result,
            Err(ServeError::Config(ConfigError::SecureUnsupported { .. }))
        ));
    }
}
