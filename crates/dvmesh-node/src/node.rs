//! Router run-loop
//!
//! A [`RouterNode`] drives a [`Router`] as a cooperative polling task: each
//! tick it drains every inbound queue once, then checks the stop flag. An
//! empty sweep backs off briefly instead of spinning; a busy sweep only
//! yields, so bursts drain quickly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use dvmesh_routing::Router;

/// Back-off when a sweep found nothing to do
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Shared cancellation flag for a running node
///
/// Cloneable; any holder may stop the node. The loop checks the flag after
/// each sweep, so the tick in flight always completes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the node to exit after its current sweep
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A router driven by its own async task
pub struct RouterNode {
    router: Router,
    stop: StopHandle,
    refresh_every_ticks: Option<u64>,
}

impl RouterNode {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            stop: StopHandle::new(),
            refresh_every_ticks: None,
        }
    }

    /// Re-advertise the full table every `ticks` sweeps, traffic or not
    ///
    /// Off by default: the base protocol only sends triggered updates, so a
    /// lost advertisement leaves stale rows behind. A periodic refresh
    /// papers over such losses at the cost of steady background traffic.
    pub fn with_refresh_every(mut self, ticks: u64) -> Self {
        self.refresh_every_ticks = Some(ticks.max(1));
        self
    }

    /// Handle for stopping the node from outside
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Read-only view of the wrapped router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Run until stopped, then return the router for inspection
    ///
    /// Advertises the initial distance vector before the first sweep.
    pub async fn run(mut self) -> Router {
        let addr = self.router.addr();
        info!(router = %addr, "router node starting");
        self.router.advertise_all();

        let mut tick: u64 = 0;
        loop {
            let handled = self.router.process_queues();
            tick += 1;

            if let Some(every) = self.refresh_every_ticks
                && tick % every == 0
            {
                debug!(router = %addr, tick, "periodic refresh");
                self.router.advertise_all();
            }

            if self.stop.is_stopped() {
                break;
            }
            if handled == 0 {
                tokio::time::sleep(IDLE_POLL).await;
            } else {
                tokio::task::yield_now().await;
            }
        }

        info!(router = %addr, stats = ?self.router.stats(), "router node stopped");
        self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use dvmesh_core::{Addr, NodeKind, Packet, QueueSelector};
    use dvmesh_routing::{CostTable, RouterConfig};

    fn one_link_router(addr: Addr, neighbor: Addr) -> Router {
        let mut costs = CostTable::new();
        costs.insert(neighbor, 0, 1, NodeKind::Router);
        Router::new(RouterConfig::new(addr, costs, 0))
    }

    #[tokio::test]
    async fn test_stop_flag_terminates_run() {
        let node = RouterNode::new(one_link_router(Addr(1), Addr(2)));
        let stop = node.stop_handle();

        let task = tokio::spawn(node.run());
        stop.stop();

        let router = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("node did not stop")
            .unwrap();
        assert_eq!(router.addr(), Addr(1));
    }

    #[tokio::test]
    async fn test_run_advertises_then_forwards() {
        let router = one_link_router(Addr(1), Addr(2));
        let intf = router.intf(0).unwrap().clone();

        let node = RouterNode::new(router);
        let stop = node.stop_handle();
        let task = tokio::spawn(node.run());

        let data = Packet::data(Addr(2), Bytes::from_static(b"ping"));
        intf.enqueue(QueueSelector::In, data.encode()).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.stop();
        let router = task.await.unwrap();

        // First the startup advertisement, then the forwarded data packet
        let first = Packet::decode(&intf.dequeue(QueueSelector::Out).unwrap()).unwrap();
        assert_eq!(first.kind, dvmesh_core::PacketKind::Control);
        let second = Packet::decode(&intf.dequeue(QueueSelector::Out).unwrap()).unwrap();
        assert_eq!(second, data);
        assert_eq!(router.stats().data_forwarded, 1);
    }

    #[tokio::test]
    async fn test_periodic_refresh_emits_without_traffic() {
        let router = one_link_router(Addr(1), Addr(2));
        let intf = router.intf(0).unwrap().clone();

        let node = RouterNode::new(router).with_refresh_every(1);
        let stop = node.stop_handle();
        let task = tokio::spawn(node.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.stop();
        let router = task.await.unwrap();

        let mut ads = 0;
        while intf.dequeue(QueueSelector::Out).is_some() {
            ads += 1;
        }
        assert!(ads >= 2, "expected refresh advertisements, got {ads}");
        assert_eq!(router.stats().advertisements_dropped, 0);
    }

    #[tokio::test]
    async fn test_refresh_disabled_by_default() {
        let router = one_link_router(Addr(1), Addr(2));
        let intf = router.intf(0).unwrap().clone();

        let node = RouterNode::new(router);
        let stop = node.stop_handle();
        let task = tokio::spawn(node.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.stop();
        task.await.unwrap();

        let mut ads = 0;
        while intf.dequeue(QueueSelector::Out).is_some() {
            ads += 1;
        }
        assert_eq!(ads, 1, "only the startup advertisement is expected");
    }
}
