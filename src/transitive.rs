//! In-process clients.
//!
//! Each client talks to a server running on a background task over an in-memory duplex pipe,
//! so handlers can be exercised end to end without binding a port.

use crate::callback::{BytesTransform, ReadWriteHandler, StringTransform};
use crate::handler::{StoreHandler, TransformHandler};
use crate::service::store::{BytesSimpleStoreClient, BytesSimpleStoreServer};
use crate::service::transform::{TransformerClient, TransformerServer};
use hyper_util::rt::TokioIo;
use std::ops::{Deref, DerefMut};
use tokio::io::DuplexStream;
use tonic::transport::{Channel, Endpoint, Server};

const DUPLEX_SIZE: usize = 1024;

/// A client whose server lives on a background task of the current runtime.
///
/// The server stops once the client and every clone of its channel are dropped.
#[derive(Debug)]
pub struct Transitive<T> {
    client: T,
}

impl<T> Deref for Transitive<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl<T> DerefMut for Transitive<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.client
    }
}

/// Connect a channel over the client end of a duplex pipe.
async fn connect(client: DuplexStream) -> Result<Channel, tonic::transport::Error> {
    // The URI is never dialed; the connector hands over the pipe instead.
    let mut client = Some(client);
    Endpoint::try_from("http://[::]:50051")?
        .connect_with_connector(tower::service_fn(move |_| {
            let client = client.take();
            async move {
                if let Some(client) = client {
                    Ok(TokioIo::new(client))
                } else {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "duplex client already taken",
                    ))
                }
            }
        }))
        .await
}

/// A `Transformer` client served by `handler`.
pub async fn transform_client<S, B>(
    handler: TransformHandler<S, B>,
) -> Result<Transitive<TransformerClient<Channel>>, tonic::transport::Error>
where
    S: StringTransform,
    B: BytesTransform,
{
    let (client, server) = tokio::io::duplex(DUPLEX_SIZE);
    let _join_handle = tokio::spawn(async move {
        Server::builder()
            .add_service(TransformerServer::new(handler))
            .serve_with_incoming(tokio_stream::once(Ok::<_, std::io::Error>(server)))
            .await
    });

    let channel = connect(client).await?;
    Ok(Transitive {
        client: TransformerClient::new(channel),
    })
}

/// A `BytesSimpleStore` client served by `handler`.
///
/// Unlike [`crate::server::serve_store`], the storage root is not created up front.
pub async fn store_client<H>(
    handler: StoreHandler<H>,
) -> Result<Transitive<BytesSimpleStoreClient<Channel>>, tonic::transport::Error>
where
    H: ReadWriteHandler,
{
    let (client, server) = tokio::io::duplex(DUPLEX_SIZE);
    let _join_handle = tokio::spawn(async move {
        Server::builder()
            .add_service(BytesSimpleStoreServer::new(handler))
            .serve_with_incoming(tokio_stream::once(Ok::<_, std::io::Error>(server)))
            .await
    });

    let channel = connect(client).await?;
    Ok(Transitive {
        client: BytesSimpleStoreClient::new(channel),
    })
}
