//! 网络拓扑管理
//!
//! `Network` 以 arena 方式持有节点、设备与链路段，负责地址表、全局路由、
//! 逐跳转发以及点对点/共享总线的串行化发送。无线信道的竞争见 `wifi_dcf`。

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use super::device::{Device, DeviceKind};
use super::error::ConfigError;
use super::events::{CsmaRetry, DeliverFrame, TxComplete, WifiContention};
use super::id::{DeviceId, NodeId, SegmentId};
use super::node::Node;
use super::packet::{Frame, Packet};
use super::routing::{Hop, RoutingTable};
use super::segment::{Medium, Segment, serialization_time};
use super::stats::Stats;
use crate::mobility::Position;
use crate::sim::{SimTime, Simulator};
use crate::trace::PcapWriter;

/// 转发结果
#[derive(Debug)]
pub enum Delivery {
    /// 目的地址属于当前节点，交给上层应用
    Local { node: NodeId, pkt: Packet },
    /// 已放入下一跳设备的发送队列
    Forwarded,
    Dropped,
}

/// 网络拓扑
pub struct Network {
    pub(super) nodes: Vec<Node>,
    pub(super) devices: Vec<Device>,
    pub(super) segments: Vec<Segment>,
    addresses: HashMap<Ipv4Addr, DeviceId>,
    routing: RoutingTable,
    routing_populations: u32,
    sealed: bool,
    pub(crate) captures: Vec<PcapWriter>,
    pub(crate) rng: StdRng,
    next_pkt_id: u64,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Network {
    /// 创建空网络；`seed` 决定无线退避等随机过程
    pub fn new(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            devices: Vec::new(),
            segments: Vec::new(),
            addresses: HashMap::new(),
            routing: RoutingTable::new(seed),
            routing_populations: 0,
            sealed: false,
            captures: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            next_pkt_id: 0,
            stats: Stats::default(),
        }
    }

    fn ensure_unsealed(&self) -> Result<(), ConfigError> {
        if self.sealed {
            return Err(ConfigError::TopologySealed);
        }
        Ok(())
    }

    /// 批量创建节点
    pub fn create_nodes(&mut self, prefix: &str, n: usize) -> Result<Vec<NodeId>, ConfigError> {
        (0..n)
            .map(|i| self.add_node(format!("{prefix}{i}")))
            .collect()
    }

    /// 添加节点
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<NodeId, ConfigError> {
        self.ensure_unsealed()?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, name));
        Ok(id)
    }

    /// 添加链路段（尚未挂设备）
    pub(crate) fn add_segment(&mut self, medium: Medium) -> Result<SegmentId, ConfigError> {
        self.ensure_unsealed()?;
        let id = SegmentId(self.segments.len());
        self.segments.push(Segment {
            id,
            devices: Vec::new(),
            medium,
        });
        Ok(id)
    }

    /// 在节点上创建设备并挂到链路段
    pub(crate) fn add_device(
        &mut self,
        node: NodeId,
        segment: SegmentId,
        kind: DeviceKind,
        queue_pkts: usize,
    ) -> Result<DeviceId, ConfigError> {
        self.ensure_unsealed()?;
        if node.0 >= self.nodes.len() {
            return Err(ConfigError::UnknownNode(node));
        }
        let id = DeviceId(self.devices.len());
        let seg = self
            .segments
            .get_mut(segment.0)
            .ok_or(ConfigError::UnknownSegment(segment))?;
        seg.devices.push(id);
        self.devices
            .push(Device::new(id, node, segment, kind, queue_pkts));
        self.nodes[node.0].attach(id);
        trace!(device = %id, node = %node, segment = segment.0, "挂载设备");
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, ConfigError> {
        self.nodes.get(id.0).ok_or(ConfigError::UnknownNode(id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn device(&self, id: DeviceId) -> Result<&Device, ConfigError> {
        self.devices.get(id.0).ok_or(ConfigError::UnknownDevice(id))
    }

    pub(crate) fn device_mut(&mut self, id: DeviceId) -> Result<&mut Device, ConfigError> {
        self.devices
            .get_mut(id.0)
            .ok_or(ConfigError::UnknownDevice(id))
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn segment(&self, id: SegmentId) -> Result<&Segment, ConfigError> {
        self.segments.get(id.0).ok_or(ConfigError::UnknownSegment(id))
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment, ConfigError> {
        self.segments
            .get_mut(id.0)
            .ok_or(ConfigError::UnknownSegment(id))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 给设备登记地址（由地址分配器调用）
    pub(crate) fn set_address(
        &mut self,
        dev: DeviceId,
        addr: Ipv4Addr,
        prefix_len: u8,
    ) -> Result<(), ConfigError> {
        self.ensure_unsealed()?;
        let d = self.device_mut(dev)?;
        d.address = Some(addr);
        d.prefix_len = prefix_len;
        self.addresses.insert(addr, dev);
        Ok(())
    }

    /// 设置节点的固定位置
    pub fn set_position(&mut self, node: NodeId, pos: Position) -> Result<(), ConfigError> {
        self.ensure_unsealed()?;
        self.nodes
            .get_mut(node.0)
            .ok_or(ConfigError::UnknownNode(node))?
            .set_position(pos);
        Ok(())
    }

    pub fn address_of(&self, dev: DeviceId) -> Option<Ipv4Addr> {
        self.devices.get(dev.0).and_then(|d| d.address)
    }

    /// 地址所属的设备
    pub fn owner_of(&self, addr: Ipv4Addr) -> Option<DeviceId> {
        self.addresses.get(&addr).copied()
    }

    /// 节点上第一个已分配地址的设备的地址，作为应用的源地址
    pub fn primary_address(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.nodes
            .get(node.0)?
            .devices()
            .iter()
            .find_map(|d| self.address_of(*d))
    }

    pub(crate) fn distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let pa = self.nodes.get(a.0)?.position()?;
        let pb = self.nodes.get(b.0)?.position()?;
        Some(pa.distance(&pb))
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// 路由表被计算的次数
    pub fn routing_populations(&self) -> u32 {
        self.routing_populations
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// 基于完整拓扑计算全局路由表，并冻结拓扑。
    ///
    /// 要求每个设备都已分配地址，每个无线节点都已放置。
    #[tracing::instrument(skip(self), fields(nodes = self.nodes.len(), devices = self.devices.len()))]
    pub fn populate_routing_tables(&mut self) -> Result<(), ConfigError> {
        for d in &self.devices {
            if d.address.is_none() {
                return Err(ConfigError::Unaddressed {
                    device: d.id,
                    node: d.node,
                });
            }
            if matches!(d.kind, DeviceKind::Wifi(_)) && self.nodes[d.node.0].position().is_none() {
                return Err(ConfigError::Unplaced(d.node));
            }
        }

        let mut adj: Vec<Vec<Hop>> = vec![Vec::new(); self.nodes.len()];
        for seg in &self.segments {
            let ap = match &seg.medium {
                Medium::Wifi(ch) => ch.ap,
                _ => None,
            };
            for &a in &seg.devices {
                for &b in &seg.devices {
                    let (da, db) = (&self.devices[a.0], &self.devices[b.0]);
                    if da.node == db.node {
                        continue;
                    }
                    // 基础设施模式：站点之间不直接通信，只与 AP 互通
                    if let Some(ap) = ap {
                        if a != ap && b != ap {
                            continue;
                        }
                    }
                    adj[da.node.0].push(Hop {
                        next: db.node,
                        out: a,
                        to: b,
                    });
                }
            }
        }

        self.routing.rebuild(&adj);
        self.routing_populations += 1;
        self.sealed = true;
        info!(
            routes = self.routing.len(),
            populations = self.routing_populations,
            "🧭 全局路由表已计算"
        );
        Ok(())
    }

    /// 分配全局唯一的包 id
    pub(crate) fn next_packet_id(&mut self) -> u64 {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        id
    }

    /// 从 `from` 节点发送（或转发）数据包
    #[tracing::instrument(level = "trace", skip(self, pkt, sim), fields(pkt_id = pkt.id, dst = %pkt.dst))]
    pub fn send_from(&mut self, from: NodeId, mut pkt: Packet, sim: &mut Simulator) -> Delivery {
        let Some(dst_dev) = self.owner_of(pkt.dst) else {
            self.stats.no_route_drops += 1;
            debug!(from = %from, "目的地址不存在，丢弃");
            return Delivery::Dropped;
        };
        let dst_node = self.devices[dst_dev.0].node;
        if dst_node == from {
            self.stats.local_deliveries += 1;
            return Delivery::Local { node: from, pkt };
        }

        let Some(hop) = self.routing.lookup(from, dst_node, pkt.flow_key()) else {
            self.stats.no_route_drops += 1;
            debug!(from = %from, to = %dst_node, "无路由，丢弃");
            return Delivery::Dropped;
        };
        pkt.hops += 1;
        self.stats.forwarded_pkts += 1;
        trace!(next = %hop.next, out = %hop.out, "转发到下一跳");

        if self.enqueue(hop.out, Frame { pkt, to: hop.to }, sim) {
            Delivery::Forwarded
        } else {
            Delivery::Dropped
        }
    }

    /// 帧放入设备队列并尝试发送；队列满时丢弃并返回 false
    pub(crate) fn enqueue(&mut self, dev: DeviceId, frame: Frame, sim: &mut Simulator) -> bool {
        let d = &mut self.devices[dev.0];
        if let Err(frame) = d.queue.enqueue(frame) {
            d.stats.queue_drops += 1;
            self.stats.queue_drops += 1;
            debug!(device = %dev, pkt_id = frame.pkt.id, "队列已满，尾丢弃");
            return false;
        }
        self.kick(dev, sim);
        true
    }

    /// 设备空闲且有待发帧时启动发送
    pub(crate) fn kick(&mut self, dev: DeviceId, sim: &mut Simulator) {
        let now = sim.now();
        let d = &mut self.devices[dev.0];
        let seg = d.segment;
        match &mut self.segments[seg.0].medium {
            Medium::PointToPoint {
                data_rate_bps,
                delay,
            } => {
                if d.tx_busy {
                    return;
                }
                let Some(frame) = d.queue.dequeue() else {
                    return;
                };
                let (rate, delay) = (*data_rate_bps, *delay);
                self.start_tx(dev, frame, rate, delay, sim);
            }
            Medium::Csma {
                data_rate_bps,
                delay,
                busy_until,
            } => {
                if d.tx_busy || d.queue.is_empty() {
                    return;
                }
                if *busy_until > now {
                    // 总线被占用：等到空闲时再尝试
                    d.tx_busy = true;
                    sim.schedule(*busy_until, CsmaRetry { device: dev });
                    return;
                }
                let Some(frame) = d.queue.dequeue() else {
                    return;
                };
                let (rate, delay) = (*data_rate_bps, *delay);
                *busy_until = now + serialization_time(frame.pkt.wire_bytes(), rate);
                self.start_tx(dev, frame, rate, delay, sim);
            }
            Medium::Wifi(ch) => {
                if !ch.round_pending {
                    ch.round_pending = true;
                    sim.schedule(now, WifiContention { segment: seg });
                }
            }
        }
    }

    fn start_tx(
        &mut self,
        dev: DeviceId,
        frame: Frame,
        rate_bps: u64,
        delay: SimTime,
        sim: &mut Simulator,
    ) {
        let now = sim.now();
        let tx = serialization_time(frame.pkt.wire_bytes(), rate_bps);
        let d = &mut self.devices[dev.0];
        d.tx_busy = true;
        d.stats.tx_pkts += 1;
        self.capture(dev, &frame.pkt, now);

        let depart = now + tx;
        let arrive = depart + delay;
        trace!(
            device = %dev,
            pkt_id = frame.pkt.id,
            depart = %depart,
            arrive = %arrive,
            "开始串行化发送"
        );
        sim.schedule(depart, TxComplete { device: dev });
        sim.schedule(
            arrive,
            DeliverFrame {
                to: frame.to,
                pkt: frame.pkt,
            },
        );
    }

    pub(crate) fn on_tx_complete(&mut self, dev: DeviceId, sim: &mut Simulator) {
        self.devices[dev.0].tx_busy = false;
        self.kick(dev, sim);
    }

    /// 帧到达接收设备：记账后交给所在节点转发或本地交付
    pub(crate) fn on_frame_arrival(
        &mut self,
        dev: DeviceId,
        pkt: Packet,
        sim: &mut Simulator,
    ) -> Delivery {
        let d = &mut self.devices[dev.0];
        d.stats.rx_pkts += 1;
        let node = d.node;
        self.capture(dev, &pkt, sim.now());
        self.send_from(node, pkt, sim)
    }

    /// 在设备上开启抓包，文件名为 `<label>-<node>-<index>.pcap`
    pub fn enable_capture(
        &mut self,
        dev: DeviceId,
        label: &str,
        dir: &Path,
    ) -> Result<PathBuf, ConfigError> {
        let d = self.device(dev)?;
        let node = d.node;
        let index = self.nodes[node.0]
            .devices()
            .iter()
            .position(|x| *x == dev)
            .unwrap_or(0);
        let path = dir.join(format!("{label}-{}-{index}.pcap", node.0));
        let writer = PcapWriter::create(&path).map_err(|e| ConfigError::Capture {
            device: dev,
            reason: e.to_string(),
        })?;
        self.captures.push(writer);
        let idx = self.captures.len() - 1;
        self.device_mut(dev)?.capture = Some(idx);
        info!(device = %dev, path = %path.display(), "📼 开启抓包");
        Ok(path)
    }

    pub(crate) fn capture(&mut self, dev: DeviceId, pkt: &Packet, at: SimTime) {
        let Some(idx) = self.devices[dev.0].capture else {
            return;
        };
        if let Err(err) = self.captures[idx].record(at, pkt) {
            warn!(device = %dev, %err, "写入抓包失败，关闭该设备的抓包");
            self.devices[dev.0].capture = None;
        }
    }

    /// 刷新并关闭所有抓包文件
    pub(crate) fn close_captures(&mut self) -> Result<(), String> {
        let mut errors = Vec::new();
        for w in self.captures.drain(..) {
            if let Err(err) = w.finish() {
                errors.push(err.to_string());
            }
        }
        for d in &mut self.devices {
            d.capture = None;
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}
