//! Command-line interface for etl-grpc.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use etl_grpc::server::ServerConfig;

/// Command-line arguments for etl-grpc.
#[derive(Debug, Parser)]
#[command(version, propagate_version = true)]
pub(crate) struct Args {
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// What operation to perform.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Serve the `Transformer` service.
    ///
    /// Payloads are handed to the chosen callback. The server listens until it receives Ctrl-C.
    Transform(TransformArgs),
    /// Serve the `BytesSimpleStore` service, keeping objects as files under a storage root.
    #[clap(alias = "simplestore")]
    Store(StoreArgs),
    /// Call a running server.
    Call(CallArgs),
}

/// Where and how a server listens.
#[derive(Debug, ClapArgs)]
pub(crate) struct ListenArgs {
    /// The address to listen on without TLS.
    #[arg(long, env = "ETL_GRPC_INSECURE_ADDR")]
    pub(crate) insecure_addr: Option<String>,
    /// The address to listen on with TLS. Not supported; giving it is a startup error.
    #[arg(long, env = "ETL_GRPC_SECURE_ADDR")]
    pub(crate) secure_addr: Option<String>,
    /// Register the gRPC reflection service.
    #[arg(long, env = "ETL_GRPC_REFLECTION")]
    pub(crate) reflection: bool,
}

impl From<ListenArgs> for ServerConfig {
    fn from(args: ListenArgs) -> Self {
        Self::new(args.insecure_addr, args.secure_addr, args.reflection)
    }
}

/// Which callbacks the transform server uses.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum Callback {
    /// Return every payload unchanged.
    #[default]
    Echo,
    /// Prefix every payload with a running count.
    Counter,
    /// Answer HL7 v2 messages (bytes only) with a JSON acknowledgment envelope.
    Hl7,
}

/// Run the transform server.
#[derive(Debug, Parser)]
pub(crate) struct TransformArgs {
    #[command(flatten)]
    pub(crate) listen: ListenArgs,
    /// The callback payloads are handed to.
    #[arg(value_enum, long, default_value_t)]
    pub(crate) callback: Callback,
    /// The sending application named in HL7 acknowledgments.
    #[arg(long, default_value = "APPLICATION")]
    pub(crate) application: String,
    /// The sending facility named in HL7 acknowledgments.
    #[arg(long, default_value = "FACILITY")]
    pub(crate) facility: String,
}

/// Run the simple store server.
#[derive(Debug, Parser)]
pub(crate) struct StoreArgs {
    #[command(flatten)]
    pub(crate) listen: ListenArgs,
    /// The directory keys are resolved against. Created if it does not exist.
    #[arg(long, env = "ETL_GRPC_STORAGE_ROOT", default_value = "./storage")]
    pub(crate) storage_root: PathBuf,
}

/// Call a running server.
#[derive(Debug, Parser)]
pub(crate) struct CallArgs {
    /// The server to connect to.
    #[arg(short, long, default_value = "http://[::1]:50051")]
    pub(crate) endpoint: String,
    /// The call to make.
    #[command(subcommand)]
    pub(crate) command: CallCommand,
}

/// A single RPC.
#[derive(Debug, Subcommand)]
pub(crate) enum CallCommand {
    /// Transform a payload and write the result to stdout.
    Transform {
        /// Send this text as a string payload.
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Send the contents of this file as a bytes payload.
        ///
        /// If `-`, the data is read from stdin.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Read the object stored under a key and write it to stdout.
    ///
    /// If nothing is stored under the key, the process exits with a failure status code.
    #[clap(alias = "get")]
    Read {
        /// The key to read.
        key: String,
    },
    /// Store a file under a key.
    #[clap(aliases = ["put", "set"])]
    Write {
        /// The key to write.
        key: String,
        /// The file to store.
        ///
        /// If `-`, the data is read from stdin.
        file_path: PathBuf,
    },
}
