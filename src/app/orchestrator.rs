//! 流量编排：安装 sink / source 应用并登记启停时间

use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::info;

use super::udp_client::UdpClient;
use super::udp_server::UdpServer;
use super::{AppId, AppStart, AppStop, TrafficError};
use crate::net::{NetWorld, NodeId};
use crate::sim::{SimTime, Simulator};

/// 源应用的临时端口起点
const EPHEMERAL_PORT_BASE: u16 = 49153;
/// 序号（4 字节）+ 时间戳（8 字节）
const MIN_PAYLOAD_BYTES: u32 = 12;

/// 应用活动窗口 [start, stop]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveWindow {
    pub start: SimTime,
    pub stop: SimTime,
}

impl ActiveWindow {
    pub fn new(start: SimTime, stop: SimTime) -> Result<Self, TrafficError> {
        if stop <= start {
            return Err(TrafficError::InvalidWindow { start, stop });
        }
        Ok(Self { start, stop })
    }

    pub fn from_secs(start: f64, stop: f64) -> Result<Self, TrafficError> {
        Self::new(SimTime::from_secs_f64(start), SimTime::from_secs_f64(stop))
    }

    /// `other` 完全落在本窗口内
    pub fn contains(&self, other: &ActiveWindow) -> bool {
        self.start <= other.start && other.stop <= self.stop
    }
}

impl fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.stop)
    }
}

/// 发送节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRate {
    /// 不限包数，固定间隔发送直到窗口结束
    Unlimited { interval: SimTime },
    /// 最多发送 `packets` 个包
    Count { packets: u64, interval: SimTime },
}

impl SendRate {
    /// 由目标比特率推导不限包数的发送节奏
    pub fn from_bitrate(packet_bytes: u32, rate_bps: u64) -> Result<Self, TrafficError> {
        Ok(SendRate::Unlimited {
            interval: interval_for_rate(packet_bytes, rate_bps)?,
        })
    }

    pub fn interval(&self) -> SimTime {
        match *self {
            SendRate::Unlimited { interval } | SendRate::Count { interval, .. } => interval,
        }
    }

    /// 0 表示不限
    fn max_packets(&self) -> u64 {
        match *self {
            SendRate::Unlimited { .. } => 0,
            SendRate::Count { packets, .. } => packets,
        }
    }
}

/// 发包间隔 = S * 8 / R 秒，用整数纳秒精确计算。
///
/// 结果不是整数纳秒时返回 `InexactInterval`，不做近似。
pub fn interval_for_rate(packet_bytes: u32, rate_bps: u64) -> Result<SimTime, TrafficError> {
    if rate_bps == 0 {
        return Err(TrafficError::ZeroRate);
    }
    let num = (packet_bytes as u128) * 8 * 1_000_000_000;
    let rate = rate_bps as u128;
    if num % rate != 0 {
        return Err(TrafficError::InexactInterval {
            packet_bytes,
            rate_bps,
        });
    }
    let ns = num / rate;
    if ns == 0 {
        return Err(TrafficError::ZeroInterval);
    }
    u64::try_from(ns)
        .map(SimTime)
        .map_err(|_| TrafficError::IntervalOverflow {
            packet_bytes,
            rate_bps,
        })
}

/// 检查 sink 窗口包含每个 source 窗口，否则尾部流量会被静默丢弃
pub fn check_containment(
    sink: &ActiveWindow,
    sources: &[ActiveWindow],
) -> Result<(), TrafficError> {
    match sources.iter().find(|s| !sink.contains(s)) {
        Some(source) => Err(TrafficError::WindowNotContained {
            sink: *sink,
            source_window: *source,
        }),
        None => Ok(()),
    }
}

/// 已安装的 sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkHandle {
    id: AppId,
    window: ActiveWindow,
}

impl SinkHandle {
    pub fn id(&self) -> AppId {
        self.id
    }

    pub fn window(&self) -> ActiveWindow {
        self.window
    }
}

/// 已安装的 source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceHandle {
    id: AppId,
    window: ActiveWindow,
}

impl SourceHandle {
    pub fn id(&self) -> AppId {
        self.id
    }

    pub fn window(&self) -> ActiveWindow {
        self.window
    }
}

/// 在 `node` 上安装 UDP sink 并登记启停
pub fn install_sink(
    world: &mut NetWorld,
    sim: &mut Simulator,
    node: NodeId,
    port: u16,
    window: ActiveWindow,
) -> Result<SinkHandle, TrafficError> {
    world.net.node(node)?;
    let id = world
        .apps
        .add_server(UdpServer::new(node, port).with_packet_log(world.apps.packet_logging()))?;
    sim.schedule(window.start, AppStart { app: id });
    sim.schedule(window.stop, AppStop { app: id });
    info!(node = %node, port, %window, "📥 安装 UDP sink");
    Ok(SinkHandle { id, window })
}

/// 在每个节点上安装一个发往 `destination:port` 的 UDP source
#[allow(clippy::too_many_arguments)]
pub fn install_sources(
    world: &mut NetWorld,
    sim: &mut Simulator,
    nodes: &[NodeId],
    destination: Ipv4Addr,
    port: u16,
    window: ActiveWindow,
    packet_bytes: u32,
    rate: SendRate,
) -> Result<Vec<SourceHandle>, TrafficError> {
    if packet_bytes < MIN_PAYLOAD_BYTES {
        return Err(TrafficError::PacketTooSmall(packet_bytes));
    }
    if rate.interval() == SimTime::ZERO {
        return Err(TrafficError::ZeroInterval);
    }
    if world.net.owner_of(destination).is_none() {
        return Err(TrafficError::UnknownDestination(destination));
    }
    for &node in nodes {
        world.net.node(node)?;
    }

    let mut handles = Vec::with_capacity(nodes.len());
    for &node in nodes {
        let src_port = EPHEMERAL_PORT_BASE.wrapping_add(world.apps.len() as u16);
        let client = UdpClient::new(
            node,
            src_port,
            destination,
            port,
            packet_bytes,
            rate.max_packets(),
            rate.interval(),
        )
        .with_packet_log(world.apps.packet_logging());
        let id = world.apps.add_client(client);
        sim.schedule(window.start, AppStart { app: id });
        sim.schedule(window.stop, AppStop { app: id });
        handles.push(SourceHandle { id, window });
    }
    info!(
        sources = handles.len(),
        dst = %destination,
        port,
        %window,
        packet_bytes,
        interval = %rate.interval(),
        "📤 安装 UDP sources"
    );
    Ok(handles)
}
