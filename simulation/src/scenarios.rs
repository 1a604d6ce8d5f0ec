//! Canned demonstration scenarios
//!
//! Each scenario builds a topology, lets the protocol converge, pushes some
//! traffic through, and reports what happened. The tick-driven scenarios are
//! fully deterministic; the live scenario runs every node as its own tokio
//! task to show the cooperative run-loop in action.

use std::time::Duration;

use anyhow::{Context, bail};
use bytes::Bytes;
use rand::SeedableRng;
use tracing::info;

use dvmesh_core::Addr;
use dvmesh_node::RouterNode;

use crate::sim::Simulation;
use crate::topology::Topology;

/// Three routers in a line with a host on each end
pub fn run_line(routers: u32) -> anyhow::Result<()> {
    if routers < 2 {
        bail!("a line needs at least 2 routers");
    }
    let host_a = Addr(101);
    let host_b = Addr(102);
    let topology = Topology::line(routers, 1)
        .with_host(host_a, Addr(1), 1)?
        .with_host(host_b, Addr(routers), 1)?;

    let mut sim = Simulation::new(&topology, 0)?;
    sim.start();
    let tick = sim.run_until_quiet(10_000)?;
    info!(tick, "line converged");
    report_tables(&sim, (1..=routers).map(Addr));

    sim.send(host_a, host_b, Bytes::from_static(b"hello from the near end"))?;
    let packet = deliver(&mut sim, host_b, 10 * routers as u64 + 20)?;
    info!(
        dst = %packet.dst,
        payload = %String::from_utf8_lossy(&packet.payload),
        stats = ?sim.stats(),
        "delivered"
    );
    Ok(())
}

/// A triangle where the direct link is more expensive than the detour
pub fn run_triangle() -> anyhow::Result<()> {
    let topology = Topology::builder()
        .router(Addr(1))
        .router(Addr(2))
        .router(Addr(3))
        .link(Addr(1), Addr(2), 1)
        .link(Addr(2), Addr(3), 1)
        .link(Addr(1), Addr(3), 5)
        .build()?;

    let mut sim = Simulation::new(&topology, 0)?;
    sim.start();
    let tick = sim.run_until_quiet(10_000)?;
    info!(tick, "triangle converged");
    report_tables(&sim, (1..=3).map(Addr));

    let cost = sim.route_cost(Addr(1), Addr(3)).context("no route 1 -> 3")?;
    info!(cost, "router 1 routes around the expensive direct link");
    Ok(())
}

/// A seeded random mesh, converged and spot-checked for reachability
pub fn run_random(routers: u32, probability: f64, seed: u64) -> anyhow::Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let topology = Topology::random(routers, probability, &mut rng);
    info!(routers, links = topology.edges().len(), seed, "random mesh built");

    let mut sim = Simulation::new(&topology, 0)?;
    sim.start();
    let tick = sim.run_until_quiet(100_000)?;
    info!(tick, stats = ?sim.stats(), "random mesh converged");
    report_tables(&sim, (1..=routers).map(Addr));
    Ok(())
}

/// The line scenario again, but every node runs as its own tokio task
pub async fn run_live(routers: u32) -> anyhow::Result<()> {
    if routers < 2 {
        bail!("a line needs at least 2 routers");
    }
    let host_a = Addr(101);
    let host_b = Addr(102);
    let topology = Topology::line(routers, 1)
        .with_host(host_a, Addr(1), 1)?
        .with_host(host_b, Addr(routers), 1)?;

    let (router_map, hosts, mut links) = Simulation::new(&topology, 0)?.into_parts();

    let mut stops = Vec::new();
    let mut tasks = Vec::new();
    for (_, router) in router_map {
        let node = RouterNode::new(router);
        stops.push(node.stop_handle());
        tasks.push(tokio::spawn(node.run()));
    }

    let pump_stop = dvmesh_node::StopHandle::new();
    let pump_flag = pump_stop.clone();
    let pump = tokio::spawn(async move {
        while !pump_flag.is_stopped() {
            for link in &mut links {
                link.pump();
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        links
    });

    let sender = hosts.get(&host_a).context("missing sending host")?;
    let receiver = hosts.get(&host_b).context("missing receiving host")?;

    // Give the advertisements time to propagate, then push traffic through
    tokio::time::sleep(Duration::from_millis(200)).await;
    sender.send(host_b, Bytes::from_static(b"hello over live tasks"))?;

    let mut delivered = None;
    for _ in 0..500 {
        if let Some(packet) = receiver.poll_receive() {
            delivered = Some(packet);
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    for stop in &stops {
        stop.stop();
    }
    pump_stop.stop();
    pump.await.context("link pump task failed")?;
    for task in tasks {
        let router = task.await.context("router task failed")?;
        info!(router = %router.addr(), stats = ?router.stats(), "router stopped");
    }

    let packet = delivered.context("packet never delivered")?;
    info!(
        dst = %packet.dst,
        payload = %String::from_utf8_lossy(&packet.payload),
        "delivered over live tasks"
    );
    Ok(())
}

fn report_tables(sim: &Simulation, routers: impl Iterator<Item = Addr>) {
    for addr in routers {
        if let Some(router) = sim.router(addr) {
            info!(router = %addr, table = %router.table(), "converged table");
        }
    }
}

fn deliver(
    sim: &mut Simulation,
    at: Addr,
    max_ticks: u64,
) -> anyhow::Result<dvmesh_core::Packet> {
    for _ in 0..max_ticks {
        if let Some(packet) = sim.receive(at) {
            return Ok(packet);
        }
        sim.step();
    }
    bail!("no packet delivered to {at} within {max_ticks} ticks")
}
