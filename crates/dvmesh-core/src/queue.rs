//! Queue-pair interfaces
//!
//! An [`Interface`] is one endpoint of a link: a pair of independent FIFO
//! queues of raw packet byte strings, one inbound and one outbound. Queues
//! are the only concurrency boundary in the system — a node mutates its own
//! state from a single loop and talks to the rest of the world exclusively
//! through these queues.
//!
//! Dequeue is non-blocking and never errors. Enqueue either fails fast with
//! [`QueueError::Full`] or, in the blocking form, suspends until space frees
//! or an explicit timeout elapses. Capacity 0 means unbounded.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::QueueError;

/// Which queue of an interface an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSelector {
    /// Frames delivered to this node, awaiting processing
    In,
    /// Frames this node has emitted, awaiting pickup by the link layer
    Out,
}

enum FrameTx {
    Bounded(mpsc::Sender<Bytes>),
    Unbounded(mpsc::UnboundedSender<Bytes>),
}

impl Clone for FrameTx {
    fn clone(&self) -> Self {
        match self {
            Self::Bounded(tx) => Self::Bounded(tx.clone()),
            Self::Unbounded(tx) => Self::Unbounded(tx.clone()),
        }
    }
}

enum FrameRx {
    Bounded(mpsc::Receiver<Bytes>),
    Unbounded(mpsc::UnboundedReceiver<Bytes>),
}

/// A single FIFO of raw packet byte strings
///
/// Cheaply cloneable: clones share the same channel, so a producer and a
/// consumer can each hold a handle. The receiver sits behind a lock that is
/// only ever held for a `try_recv`, never across an await.
#[derive(Clone)]
pub struct PacketQueue {
    tx: FrameTx,
    rx: Arc<Mutex<FrameRx>>,
}

impl PacketQueue {
    /// Create a queue with the given capacity; 0 means unbounded
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                tx: FrameTx::Unbounded(tx),
                rx: Arc::new(Mutex::new(FrameRx::Unbounded(rx))),
            }
        } else {
            let (tx, rx) = mpsc::channel(capacity);
            Self {
                tx: FrameTx::Bounded(tx),
                rx: Arc::new(Mutex::new(FrameRx::Bounded(rx))),
            }
        }
    }

    fn rx_guard(&self) -> MutexGuard<'_, FrameRx> {
        // Nothing panics while holding this lock, but recover anyway
        match self.rx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Non-blocking enqueue; fails with [`QueueError::Full`] at capacity
    pub fn enqueue(&self, frame: Bytes) -> Result<(), QueueError> {
        match &self.tx {
            FrameTx::Bounded(tx) => tx.try_send(frame).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            }),
            FrameTx::Unbounded(tx) => tx.send(frame).map_err(|_| QueueError::Closed),
        }
    }

    /// Blocking enqueue with an explicit timeout
    ///
    /// Suspends the calling task until queue space frees; a queue that stays
    /// full for the whole timeout yields [`QueueError::Timeout`] instead of
    /// stalling the producer indefinitely.
    pub async fn enqueue_blocking(
        &self,
        frame: Bytes,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        match &self.tx {
            FrameTx::Bounded(tx) => {
                match tokio::time::timeout(timeout, tx.send(frame)).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(_)) => Err(QueueError::Closed),
                    Err(_) => Err(QueueError::Timeout(timeout)),
                }
            }
            // Unbounded queues always have space
            FrameTx::Unbounded(tx) => tx.send(frame).map_err(|_| QueueError::Closed),
        }
    }

    /// Non-blocking dequeue; `None` when empty. Never errors.
    pub fn dequeue(&self) -> Option<Bytes> {
        match &mut *self.rx_guard() {
            FrameRx::Bounded(rx) => rx.try_recv().ok(),
            FrameRx::Unbounded(rx) => rx.try_recv().ok(),
        }
    }
}

/// One endpoint of a link: an inbound and an outbound [`PacketQueue`]
///
/// The owning node and the external link layer hold clones of the same
/// interface; the node drains `In` and fills `Out`, the link does the
/// opposite on the wire side.
#[derive(Clone)]
pub struct Interface {
    inbound: PacketQueue,
    outbound: PacketQueue,
}

impl Interface {
    /// Create an interface whose queues hold at most `capacity` frames each
    /// (0 = unbounded)
    pub fn new(capacity: usize) -> Self {
        Self {
            inbound: PacketQueue::new(capacity),
            outbound: PacketQueue::new(capacity),
        }
    }

    fn queue(&self, selector: QueueSelector) -> &PacketQueue {
        match selector {
            QueueSelector::In => &self.inbound,
            QueueSelector::Out => &self.outbound,
        }
    }

    /// Non-blocking enqueue on the selected queue
    pub fn enqueue(&self, selector: QueueSelector, frame: Bytes) -> Result<(), QueueError> {
        self.queue(selector).enqueue(frame)
    }

    /// Blocking enqueue with an explicit timeout on the selected queue
    pub async fn enqueue_blocking(
        &self,
        selector: QueueSelector,
        frame: Bytes,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        self.queue(selector).enqueue_blocking(frame, timeout).await
    }

    /// Non-blocking dequeue from the selected queue
    pub fn dequeue(&self, selector: QueueSelector) -> Option<Bytes> {
        self.queue(selector).dequeue()
    }
}
