//! Error types for dvmesh core

use thiserror::Error;

/// Errors decoding a packet from its wire bytes
///
/// Encoding is total and never fails; every variant here is a decode-side
/// rejection. Callers drop the offending frame and log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Destination field contains non-digit bytes or overflows the field
    #[error("malformed destination field: {0:?}")]
    BadDestination(String),

    /// Protocol tag byte is neither data nor control
    #[error("unknown protocol tag: {0:#04x}")]
    UnknownProtocol(u8),

    /// Frame shorter than the fixed-width header
    #[error("truncated frame: {got} bytes, header needs {needed}")]
    Truncated { needed: usize, got: usize },
}

/// Errors enqueuing onto a packet queue
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Bounded queue at capacity and the caller asked for a non-blocking put
    #[error("queue full")]
    Full,

    /// Blocking enqueue did not find space within its timeout
    #[error("enqueue timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The paired dequeuer is gone
    #[error("queue closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_error_display() {
        let err = PacketError::BadDestination("00H42".to_string());
        assert!(format!("{}", err).contains("00H42"));

        let err = PacketError::UnknownProtocol(b'9');
        assert!(format!("{}", err).contains("0x39"));

        let err = PacketError::Truncated { needed: 6, got: 3 };
        let msg = format!("{}", err);
        assert!(msg.contains("6"));
        assert!(msg.contains("3"));
    }

    #[test]
    fn test_queue_error_display() {
        assert!(format!("{}", QueueError::Full).contains("full"));
        assert!(format!("{}", QueueError::Closed).contains("closed"));
        let err = QueueError::Timeout(std::time::Duration::from_millis(50));
        assert!(format!("{}", err).contains("50ms"));
    }
}
