//! Routing error types

use dvmesh_core::{Addr, PacketError, QueueError};
use thiserror::Error;

/// Errors raised on the router's processing path
///
/// All of these are local and non-fatal: the run-loop logs the failure,
/// drops the packet involved, and keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Inbound frame did not decode
    #[error("malformed packet: {0}")]
    Packet(#[from] PacketError),

    /// Chosen outbound queue rejected the frame
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// No direct-neighbor row with a finite cost for the destination
    #[error("no route to {0}")]
    NoRoute(Addr),

    /// A packet arrived on an interface with no configured neighbor
    #[error("no neighbor configured on interface {0}")]
    UnknownInterface(usize),

    /// Control payload did not parse as a distance vector
    #[error("malformed advertisement: {0}")]
    MalformedAdvertisement(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_error_display() {
        assert!(format!("{}", RouterError::NoRoute(Addr(7))).contains("7"));
        assert!(format!("{}", RouterError::UnknownInterface(2)).contains("interface 2"));

        let err: RouterError = QueueError::Full.into();
        assert!(format!("{}", err).contains("full"));

        let err: RouterError = PacketError::UnknownProtocol(b'9').into();
        assert!(format!("{}", err).contains("malformed packet"));
    }
}
