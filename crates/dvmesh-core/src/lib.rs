//! # dvmesh Core
//!
//! Core types for the dvmesh packet-switched network simulator.
//!
//! This crate provides the pieces every other layer builds on:
//!
//! - [`Addr`]: numeric node address, the map key for every table
//! - [`Packet`]: the fixed-width ASCII wire encoding for data and control packets
//! - [`Interface`]: a pair of bounded FIFO queues, the only concurrency
//!   boundary between a node and the link layer
//!
//! Routing logic lives in `dvmesh-routing`; run-loops in `dvmesh-node`.

pub mod addr;
pub mod error;
pub mod packet;
pub mod queue;

// Re-export main types
pub use addr::{Addr, NodeKind};
pub use error::{PacketError, QueueError};
pub use packet::{Packet, PacketKind};
pub use queue::{Interface, PacketQueue, QueueSelector};
