use std::net::SocketAddr;

use thiserror::Error;

use gamebot_config::ConfigError;
use gamebot_engine::EngineError;
use gamebot_protocol::ProtocolError;
use gamebot_telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0}")]
    GenericIO(#[from] std::io::Error),

    #[error("Unable to listen on {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection with {peer} failed: {source}")]
    Connection {
        peer: SocketAddr,
        #[source]
        source: ProtocolError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}
