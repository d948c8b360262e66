//! UDP 汇应用
//!
//! 统计收到的包数/字节数、按每个源的序号空洞估计丢包、累计单向时延。

use std::collections::HashMap;
use std::net::Ipv4Addr;

use tracing::info;

use crate::net::{NodeId, Packet};
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, Default)]
struct SeqTracker {
    highest: Option<u32>,
    received: u64,
}

#[derive(Debug, Clone)]
pub struct UdpServer {
    node: NodeId,
    port: u16,
    running: bool,
    received_pkts: u64,
    received_bytes: u64,
    delay_sum_ns: u128,
    first_rx: Option<SimTime>,
    last_rx: Option<SimTime>,
    per_source: HashMap<(Ipv4Addr, u16), SeqTracker>,
    log_packets: bool,
}

impl UdpServer {
    pub fn new(node: NodeId, port: u16) -> Self {
        Self {
            node,
            port,
            running: false,
            received_pkts: 0,
            received_bytes: 0,
            delay_sum_ns: 0,
            first_rx: None,
            last_rx: None,
            per_source: HashMap::new(),
            log_packets: true,
        }
    }

    pub fn with_packet_log(mut self, enabled: bool) -> Self {
        self.log_packets = enabled;
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn received_pkts(&self) -> u64 {
        self.received_pkts
    }

    /// 收到的载荷字节数
    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }

    /// 按序号空洞估计的丢包数（各源最大序号 + 1 − 已收包数）
    pub fn lost_pkts(&self) -> u64 {
        self.per_source
            .values()
            .map(|t| {
                t.highest
                    .map(|h| (h as u64 + 1).saturating_sub(t.received))
                    .unwrap_or(0)
            })
            .sum()
    }

    pub fn sources_seen(&self) -> usize {
        self.per_source.len()
    }

    pub fn mean_delay(&self) -> Option<SimTime> {
        (self.received_pkts > 0)
            .then(|| SimTime((self.delay_sum_ns / self.received_pkts as u128) as u64))
    }

    pub fn first_rx(&self) -> Option<SimTime> {
        self.first_rx
    }

    pub fn last_rx(&self) -> Option<SimTime> {
        self.last_rx
    }

    /// 吞吐量（字节/秒）：收到的总字节 / (最晚接收 − `earliest_tx`)
    ///
    /// `earliest_tx` 取所有源的首个发送时刻，丢掉的包也算在内。
    pub fn throughput_since(&self, earliest_tx: SimTime) -> Option<f64> {
        let (tx, rx) = (earliest_tx, self.last_rx?);
        if rx <= tx {
            return None;
        }
        Some(self.received_bytes as f64 / (rx.saturating_sub(tx)).as_secs_f64())
    }

    pub fn logs_packets(&self) -> bool {
        self.log_packets
    }

    pub(crate) fn start(&mut self, now: SimTime) {
        self.running = true;
        if self.log_packets {
            info!(node = %self.node, port = self.port, "UdpServer started at {now}");
        }
    }

    pub(crate) fn stop(&mut self, now: SimTime) {
        if self.running && self.log_packets {
            info!(
                node = %self.node,
                received = self.received_pkts,
                lost = self.lost_pkts(),
                "UdpServer stopped at {now}"
            );
        }
        self.halt();
    }

    pub(crate) fn halt(&mut self) {
        self.running = false;
    }

    pub(crate) fn on_packet(&mut self, pkt: &Packet, now: SimTime) {
        self.received_pkts += 1;
        self.received_bytes += pkt.payload_bytes as u64;
        let delay = now.saturating_sub(pkt.sent_at);
        self.delay_sum_ns += delay.as_nanos() as u128;
        self.first_rx.get_or_insert(now);
        self.last_rx = Some(now);

        let t = self.per_source.entry((pkt.src, pkt.src_port)).or_default();
        t.received += 1;
        t.highest = Some(t.highest.map_or(pkt.seq, |h| h.max(pkt.seq)));

        if !self.log_packets {
            return;
        }
        info!(
            node = %self.node,
            "TraceDelay: RX {} bytes from {} Sequence Number: {} Uid: {} TXtime: +{}ns RXtime: +{}ns Delay: +{}ns",
            pkt.payload_bytes,
            pkt.src,
            pkt.seq,
            pkt.id,
            pkt.sent_at.as_nanos(),
            now.as_nanos(),
            delay.as_nanos()
        );
    }
}
