//! Host endpoint
//!
//! A [`Host`] is a leaf node with a single interface: it sources data
//! packets toward the network and sinks the ones addressed to it. Hosts do
//! not participate in the advertisement protocol; the router they hang off
//! learns their address from its cost table.

use std::time::Duration;

use bytes::Bytes;
use tracing::{trace, warn};

use dvmesh_core::{Addr, Interface, Packet, PacketKind, QueueError, QueueSelector};

/// An application endpoint with one unbounded interface
pub struct Host {
    addr: Addr,
    intf: Interface,
}

impl Host {
    pub fn new(addr: Addr) -> Self {
        Self {
            addr,
            intf: Interface::new(0),
        }
    }

    pub fn addr(&self) -> Addr {
        self.addr
    }

    /// Shared handle to the host's interface, for the link layer
    pub fn intf(&self) -> &Interface {
        &self.intf
    }

    /// Emit a data packet toward `dst`
    pub fn send(&self, dst: Addr, payload: impl Into<Bytes>) -> Result<(), QueueError> {
        let frame = Packet::data(dst, payload).encode();
        self.intf.enqueue(QueueSelector::Out, frame)
    }

    /// Emit a data packet, waiting up to `timeout` for queue space
    pub async fn send_blocking(
        &self,
        dst: Addr,
        payload: impl Into<Bytes>,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        let frame = Packet::data(dst, payload).encode();
        self.intf
            .enqueue_blocking(QueueSelector::Out, frame, timeout)
            .await
    }

    /// Take the next delivered data packet, if any
    ///
    /// The attached router advertises on every interface, host links
    /// included; those control frames are discarded here. Malformed frames
    /// are dropped with a warning. Never blocks.
    pub fn poll_receive(&self) -> Option<Packet> {
        while let Some(frame) = self.intf.dequeue(QueueSelector::In) {
            match Packet::decode(&frame) {
                Ok(packet) if packet.kind == PacketKind::Data => return Some(packet),
                Ok(_) => {
                    trace!(host = %self.addr, "control frame ignored");
                }
                Err(e) => {
                    warn!(host = %self.addr, error = %e, "malformed frame dropped");
                }
            }
        }
        None
    }
}
