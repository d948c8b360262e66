//! 运行结果汇总

use std::net::Ipv4Addr;
use std::path::PathBuf;

use serde::Serialize;

use super::config::ScenarioConfig;
use super::driver::Topology;
use crate::net::{Medium, NetWorld, Stats, WifiStats};
use crate::sim::RunSummary;

#[derive(Debug, Clone, Serialize)]
pub struct SinkReport {
    pub node: usize,
    pub address: Option<Ipv4Addr>,
    pub port: u16,
    pub received_pkts: u64,
    pub received_bytes: u64,
    pub lost_pkts: u64,
    pub mean_delay_ns: Option<u64>,
    pub first_rx_ns: Option<u64>,
    pub last_rx_ns: Option<u64>,
    /// 收到的总字节 / (最晚接收 − 所有源中最早的发送)
    pub throughput_bytes_per_sec: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub node: usize,
    pub address: Option<Ipv4Addr>,
    pub sent_pkts: u64,
    pub sent_bytes: u64,
    pub first_tx_ns: Option<u64>,
    pub last_tx_ns: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    pub events: u64,
    pub final_time_ns: u64,
    pub pending_at_stop: usize,
    pub discarded_at_teardown: usize,
    pub routing_populations: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub n_csma: usize,
    pub n_wifi: usize,
    pub cw_min: u32,
    pub packet_size: u32,
    pub interval_ns: u64,
    pub horizon_ns: u64,
    pub sinks: Vec<SinkReport>,
    pub sources: Vec<SourceReport>,
    pub wifi: WifiStats,
    pub network: Stats,
    pub unbound_drops: u64,
    pub engine: EngineReport,
    pub captures: Vec<PathBuf>,
}

impl ScenarioReport {
    pub(crate) fn collect(
        cfg: &ScenarioConfig,
        world: &NetWorld,
        topo: &Topology,
        run: RunSummary,
        discarded: usize,
        captures: &[PathBuf],
    ) -> Self {
        let earliest_tx = world.apps.clients().filter_map(|c| c.first_tx()).min();
        let sinks = world
            .apps
            .servers()
            .map(|s| SinkReport {
                node: s.node().0,
                address: world.net.primary_address(s.node()),
                port: s.port(),
                received_pkts: s.received_pkts(),
                received_bytes: s.received_bytes(),
                lost_pkts: s.lost_pkts(),
                mean_delay_ns: s.mean_delay().map(|d| d.as_nanos()),
                first_rx_ns: s.first_rx().map(|t| t.as_nanos()),
                last_rx_ns: s.last_rx().map(|t| t.as_nanos()),
                throughput_bytes_per_sec: earliest_tx.and_then(|tx| s.throughput_since(tx)),
            })
            .collect();
        let sources = world
            .apps
            .clients()
            .map(|c| SourceReport {
                node: c.node().0,
                address: world.net.primary_address(c.node()),
                sent_pkts: c.sent(),
                sent_bytes: c.sent_bytes(),
                first_tx_ns: c.first_tx().map(|t| t.as_nanos()),
                last_tx_ns: c.last_tx().map(|t| t.as_nanos()),
            })
            .collect();
        let wifi = world
            .net
            .device(topo.cell.ap)
            .and_then(|dev| world.net.segment(dev.segment))
            .ok()
            .and_then(|seg| match &seg.medium {
                Medium::Wifi(ch) => Some(ch.stats),
                _ => None,
            })
            .unwrap_or_default();
        let interval_ns = world
            .apps
            .clients()
            .next()
            .map(|c| c.interval().as_nanos())
            .unwrap_or(0);

        Self {
            n_csma: cfg.n_csma,
            n_wifi: cfg.n_wifi,
            cw_min: cfg.cw_min,
            packet_size: cfg.packet_size,
            interval_ns,
            horizon_ns: run.final_time_ns,
            sinks,
            sources,
            wifi,
            network: world.net.stats,
            unbound_drops: world.apps.unbound_drops,
            engine: EngineReport {
                events: run.events,
                final_time_ns: run.final_time_ns,
                pending_at_stop: run.pending_at_stop,
                discarded_at_teardown: discarded,
                routing_populations: world.net.routing_populations(),
            },
            captures: captures.to_vec(),
        }
    }

    pub fn total_received_pkts(&self) -> u64 {
        self.sinks.iter().map(|s| s.received_pkts).sum()
    }

    pub fn total_sent_pkts(&self) -> u64 {
        self.sources.iter().map(|s| s.sent_pkts).sum()
    }

    /// 一行摘要，便于批量扫参时 grep
    pub fn summary_line(&self) -> String {
        let throughput = self
            .sinks
            .first()
            .and_then(|s| s.throughput_bytes_per_sec)
            .unwrap_or(0.0);
        format!(
            "scenario n_wifi={} cw_min={} packet_size={} sent={} received={} collisions={} retry_drops={} throughput={:.2} bytes/s",
            self.n_wifi,
            self.cw_min,
            self.packet_size,
            self.total_sent_pkts(),
            self.total_received_pkts(),
            self.wifi.collisions,
            self.wifi.retry_drops,
            throughput
        )
    }
}
