//! UDP 源应用
//!
//! 以固定间隔发送定长包，每个包携带序号与发送时间戳。

use std::net::Ipv4Addr;

use tracing::info;

use super::TrafficError;
use crate::net::{Network, NodeId, Packet};
use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct UdpClient {
    node: NodeId,
    src: Option<Ipv4Addr>,
    src_port: u16,
    dst: Ipv4Addr,
    dst_port: u16,
    payload_bytes: u32,
    /// 0 表示不限包数
    max_packets: u64,
    interval: SimTime,
    running: bool,
    epoch: u64,
    sent: u64,
    sent_bytes: u64,
    first_tx: Option<SimTime>,
    last_tx: Option<SimTime>,
    log_packets: bool,
}

impl UdpClient {
    pub fn new(
        node: NodeId,
        src_port: u16,
        dst: Ipv4Addr,
        dst_port: u16,
        payload_bytes: u32,
        max_packets: u64,
        interval: SimTime,
    ) -> Self {
        Self {
            node,
            src: None,
            src_port,
            dst,
            dst_port,
            payload_bytes,
            max_packets,
            interval,
            running: false,
            epoch: 0,
            sent: 0,
            sent_bytes: 0,
            first_tx: None,
            last_tx: None,
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

    pub fn destination(&self) -> (Ipv4Addr, u16) {
        (self.dst, self.dst_port)
    }

    pub fn payload_bytes(&self) -> u32 {
        self.payload_bytes
    }

    pub fn interval(&self) -> SimTime {
        self.interval
    }

    pub fn max_packets(&self) -> u64 {
        self.max_packets
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn sent_bytes(&self) -> u64 {
        self.sent_bytes
    }

    pub fn first_tx(&self) -> Option<SimTime> {
        self.first_tx
    }

    pub fn last_tx(&self) -> Option<SimTime> {
        self.last_tx
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn logs_packets(&self) -> bool {
        self.log_packets
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn start(&mut self, net: &Network) -> Result<(), TrafficError> {
        let src = net
            .primary_address(self.node)
            .ok_or(TrafficError::NoSourceAddress(self.node))?;
        self.src = Some(src);
        self.running = true;
        self.epoch = self.epoch.wrapping_add(1);
        Ok(())
    }

    pub(crate) fn stop(&mut self, now: SimTime) {
        if self.running && self.log_packets {
            info!(node = %self.node, sent = self.sent, "UdpClient stopped at {now}");
        }
        self.halt();
    }

    pub(crate) fn halt(&mut self) {
        self.running = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// 生成下一个包，并返回下一次发送时间（若还有）
    pub(crate) fn next_packet(
        &mut self,
        net: &mut Network,
        now: SimTime,
    ) -> Option<(Packet, Option<SimTime>)> {
        if self.max_packets != 0 && self.sent >= self.max_packets {
            return None;
        }
        let src = self.src?;
        let pkt = Packet {
            id: net.next_packet_id(),
            src,
            src_port: self.src_port,
            dst: self.dst,
            dst_port: self.dst_port,
            payload_bytes: self.payload_bytes,
            seq: self.sent as u32,
            sent_at: now,
            hops: 0,
        };
        self.sent += 1;
        self.sent_bytes += self.payload_bytes as u64;
        self.first_tx.get_or_insert(now);
        self.last_tx = Some(now);
        if self.log_packets {
            info!(
                node = %self.node,
                seq = pkt.seq,
                "TraceDelay TX {} bytes to {} Uid: {} Time: {}",
                self.payload_bytes,
                self.dst,
                pkt.id,
                now
            );
        }

        let more = self.max_packets == 0 || self.sent < self.max_packets;
        let next = more.then(|| now + self.interval);
        Some((pkt, next))
    }
}
