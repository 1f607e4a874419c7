use std::time::Duration;
use thiserror::Error;

use super::protocol::Phase;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no answer from device within {0:?}")]
    Timeout(Duration),
    #[error("link closed by device")]
    Closed,
    #[error("cancelled: {0}")]
    Cancelled(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("cannot open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("plan declares {declared} points but {actual} were packed")]
    PointCountMismatch { declared: u32, actual: usize },
    #[error("{field} = {value} does not fit its {phase} wire field")]
    Encoding {
        phase: Phase,
        field: &'static str,
        value: i64,
    },
    #[error("{phase} phase failed after {bytes_sent} bytes sent: {source}")]
    Link {
        phase: Phase,
        bytes_sent: usize,
        #[source]
        source: LinkError,
    },
    #[error("protocol desynchronization: unexpected result byte 0x{byte:02x}")]
    Desync { byte: u8 },
}
