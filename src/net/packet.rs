//! 数据包类型
//!
//! 仿真中只有 UDP/IPv4 流量；载荷内容不建模，只记录长度与序号/时间戳头。

use std::net::Ipv4Addr;

use super::id::DeviceId;
use crate::sim::SimTime;

/// IPv4 (20) + UDP (8) 头部长度
pub const UDP_IP_HEADER_BYTES: u32 = 28;

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub src: Ipv4Addr,
    pub src_port: u16,
    pub dst: Ipv4Addr,
    pub dst_port: u16,
    pub payload_bytes: u32,
    /// 源应用写入的序号，接收端据此统计丢包
    pub seq: u32,
    /// 源应用发送时刻，接收端据此计算单向时延
    pub sent_at: SimTime,
    pub hops: u32,
}

impl Packet {
    /// 线上长度（含 IP/UDP 头）
    pub fn wire_bytes(&self) -> u32 {
        self.payload_bytes.saturating_add(UDP_IP_HEADER_BYTES)
    }

    /// 稳定的流标识，用于路由选择
    pub fn flow_key(&self) -> u64 {
        (u32::from(self.src) as u64) << 32
            ^ (u32::from(self.dst) as u64)
            ^ ((self.src_port as u64) << 16)
            ^ self.dst_port as u64
    }
}

/// 链路层帧：一个数据包加上同一链路段上的接收设备。
#[derive(Debug, Clone)]
pub struct Frame {
    pub pkt: Packet,
    pub to: DeviceId,
}
