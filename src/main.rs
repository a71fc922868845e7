//! A command-line interface for serving and calling the etl-grpc services.
//!
//! For usage, run `cargo run --features binary -- --help`.

mod cli;

use crate::cli::{Args, CallArgs, CallCommand, Callback, Command, StoreArgs, TransformArgs};
use clap::Parser as _;
use etl_grpc::callback::{Counter, Echo, FsStore, Hl7Ack};
use etl_grpc::handler::{StoreHandler, TransformHandler};
use etl_grpc::proto::simplestore::read_response::Outcome;
use etl_grpc::proto::simplestore::{ReadRequest, WriteRequest};
use etl_grpc::proto::transform::transform_payload::Content;
use etl_grpc::proto::transform::TransformPayload;
use etl_grpc::server::{serve_store, serve_transform, ServerConfig};
use etl_grpc::service::store::BytesSimpleStoreClient;
use etl_grpc::service::transform::TransformerClient;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::fs;
use tokio::io::{self, AsyncReadExt as _, AsyncWriteExt as _};
use tracing_subscriber::filter::EnvFilter;

/// A custom error message.
#[derive(Debug)]
struct ErrStr(&'static str);

impl std::error::Error for ErrStr {}

impl std::fmt::Display for ErrStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Args { command } = Args::parse();

    let future = async {
        match command {
            Command::Transform(args) => transform(args).await,
            Command::Store(args) => store(args).await,
            Command::Call(args) => call(args).await,
        }
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}

/// Serve the transformer with the chosen callbacks. Blocks until Ctrl-C.
///
/// `echo` and `counter` handle both payload kinds. `hl7` handles bytes only; string payloads
/// are answered with `UNIMPLEMENTED`.
async fn transform(
    TransformArgs {
        listen,
        callback,
        application,
        facility,
    }: TransformArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = ServerConfig::from(listen);
    let handler = TransformHandler::new();
    match callback {
        Callback::Echo => {
            serve_transform(&config, handler.with_string(Echo).with_bytes(Echo)).await?;
        }
        Callback::Counter => {
            // Each kind keeps its own count.
            let handler = handler
                .with_string(Counter::default())
                .with_bytes(Counter::default());
            serve_transform(&config, handler).await?;
        }
        Callback::Hl7 => {
            let handler = handler.with_bytes(Hl7Ack::new(application, facility));
            serve_transform(&config, handler).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Serve the simple store over the filesystem. Blocks until Ctrl-C.
async fn store(
    StoreArgs {
        listen,
        storage_root,
    }: StoreArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = ServerConfig::from(listen);
    serve_store(&config, StoreHandler::new(storage_root, FsStore)).await?;
    Ok(ExitCode::SUCCESS)
}

/// Make one call against a running server.
///
/// # stdout
///
/// The transformed payload, or the bytes read from the store. Nothing is written for a write.
async fn call(
    CallArgs { endpoint, command }: CallArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        CallCommand::Transform { text, file } => {
            let content = match (text, file) {
                (Some(text), _) => Content::StringContent(text),
                (None, Some(file)) => Content::BytesContent(read_file_or_stdin(file).await?),
                (None, None) => return Err(Box::new(ErrStr("expected text or a file"))),
            };

            let mut client = TransformerClient::connect(endpoint).await?;
            let response = client
                .transform(TransformPayload {
                    content: Some(content),
                })
                .await?
                .into_inner();

            let mut stdout = io::stdout();
            match response.result.and_then(|payload| payload.content) {
                Some(Content::StringContent(text)) => stdout.write_all(text.as_bytes()).await?,
                Some(Content::BytesContent(bytes)) => stdout.write_all(&bytes).await?,
                None => return Err(Box::new(ErrStr("server returned an empty payload"))),
            }
            stdout.flush().await?;
        }
        CallCommand::Read { key } => {
            let mut client = BytesSimpleStoreClient::connect(endpoint).await?;
            let response = client.read(ReadRequest { key }).await?.into_inner();
            match response.outcome {
                Some(Outcome::BytesContent(bytes)) => {
                    let mut stdout = io::stdout();
                    stdout.write_all(&bytes).await?;
                    stdout.flush().await?;
                }
                Some(Outcome::Error(error)) => {
                    tracing::error!(key = %response.key, "{}", error.message);
                    return Ok(ExitCode::FAILURE);
                }
                None => return Err(Box::new(ErrStr("server returned an empty read response"))),
            }
        }
        CallCommand::Write { key, file_path } => {
            let mut client = BytesSimpleStoreClient::connect(endpoint).await?;
            let bytes_content = read_file_or_stdin(file_path).await?;
            let response = client
                .write(WriteRequest { key, bytes_content })
                .await?
                .into_inner();
            tracing::info!(key = %response.key, "stored");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Given a path, read from stdin if the path is "-". Otherwise, read the file at that path.
async fn read_file_or_stdin(file_path: PathBuf) -> io::Result<Vec<u8>> {
    if file_path == PathBuf::from("-") {
        let mut bytes = Vec::new();
        let _num_bytes = io::stdin().read_to_end(&mut bytes).await?;
        Ok(bytes)
    } else {
        fs::read(file_path).await
    }
}
