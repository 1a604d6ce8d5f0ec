//! Point-to-point links
//!
//! A [`Link`] shuttles raw frames between two interface endpoints: each pump
//! moves at most one frame per direction, which gives the simulation a
//! well-defined per-tick bandwidth. A frame that arrives at a full inbound
//! queue is lost, exactly as the protocol expects.

use tracing::{trace, warn};

use dvmesh_core::{Addr, Interface, QueueSelector};

/// A bidirectional link between two node interfaces
pub struct Link {
    a: Addr,
    b: Addr,
    a_end: Interface,
    b_end: Interface,
    frames_moved: u64,
    frames_dropped: u64,
}

impl Link {
    /// Connect two interface endpoints
    ///
    /// The interfaces are shared handles: each node keeps its own clone and
    /// the link moves frames from one side's outbound queue to the other
    /// side's inbound queue.
    pub fn new(a: Addr, a_end: Interface, b: Addr, b_end: Interface) -> Self {
        Self {
            a,
            b,
            a_end,
            b_end,
            frames_moved: 0,
            frames_dropped: 0,
        }
    }

    pub fn endpoints(&self) -> (Addr, Addr) {
        (self.a, self.b)
    }

    pub fn frames_moved(&self) -> u64 {
        self.frames_moved
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Move at most one frame in each direction
    ///
    /// Returns the number of frames taken off the outbound queues; a frame
    /// lost to a full receiver still counts, the link was not idle.
    pub fn pump(&mut self) -> u64 {
        let mut moved = 0;
        moved += self.carry_one(true);
        moved += self.carry_one(false);
        moved
    }

    fn carry_one(&mut self, a_to_b: bool) -> u64 {
        let (from_addr, from, to_addr, to) = if a_to_b {
            (self.a, &self.a_end, self.b, &self.b_end)
        } else {
            (self.b, &self.b_end, self.a, &self.a_end)
        };
        let Some(frame) = from.dequeue(QueueSelector::Out) else {
            return 0;
        };
        match to.enqueue(QueueSelector::In, frame) {
            Ok(()) => {
                self.frames_moved += 1;
                trace!(from = %from_addr, to = %to_addr, "frame carried");
                1
            }
            Err(e) => {
                self.frames_dropped += 1;
                warn!(from = %from_addr, to = %to_addr, error = %e, "frame lost on link");
                1
            }
        }
    }
}
