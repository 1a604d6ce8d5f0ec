//! # dvmesh Node
//!
//! The execution layer: wraps the synchronous routing engine in cooperative
//! async run-loops and provides the host endpoint that sources and sinks
//! application traffic.
//!
//! Every node runs as its own tokio task and touches only its own state;
//! nodes communicate exclusively through interface queues. Cancellation is
//! cooperative: a shared stop flag, checked once per sweep, so the tick in
//! flight always completes before the loop exits.

pub mod host;
pub mod node;

// Re-export main types
pub use host::Host;
pub use node::{RouterNode, StopHandle};
