use crate::core::engine::{Engine, ExternalEngine, UnavailableEngine};
use crate::error::BridgeError;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Large files produce large issue lists, so the default is well above tonic's 4MB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "analysis-bridge", version, about = "Streams static-analysis issues over gRPC")]
pub struct Config {
    /// Port the gRPC service listens on
    #[arg(long, env = "BRIDGE_PORT")]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "BRIDGE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Analysis engine executable, invoked once per file
    #[arg(long, env = "BRIDGE_ENGINE")]
    pub engine: Option<PathBuf>,

    /// Extra argument passed to the engine executable (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Maximum encoded or decoded gRPC message size in bytes
    #[arg(long, env = "BRIDGE_MAX_MESSAGE_SIZE", default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,

    /// Responses buffered per call before the session waits for the caller
    #[arg(long, env = "BRIDGE_STREAM_BUFFER", default_value_t = 16,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub stream_buffer: u16,
}

impl Config {
    pub fn socket_addr(&self) -> Result<SocketAddr, BridgeError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| BridgeError::InvalidAddress(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn engine(&self) -> Box<dyn Engine> {
        match &self.engine {
            Some(program) => Box::new(ExternalEngine::new(program, self.engine_args.clone())),
            None => Box::new(UnavailableEngine),
        }
    }
}
