//! 网络设备（接口）

use std::net::Ipv4Addr;

use super::id::{DeviceId, NodeId, SegmentId};
use super::wifi::WifiMac;
use crate::queue::{DropTailQueue, FrameQueue};

/// 设备类型；无线设备携带自己的 MAC 对象
#[derive(Debug)]
pub enum DeviceKind {
    PointToPoint,
    Csma,
    Wifi(WifiMac),
}

/// 单个设备的收发计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStats {
    pub tx_pkts: u64,
    pub rx_pkts: u64,
    pub queue_drops: u64,
}

/// 网络设备：把节点绑定到唯一的链路段上
#[derive(Debug)]
pub struct Device {
    pub id: DeviceId,
    pub node: NodeId,
    pub segment: SegmentId,
    pub kind: DeviceKind,
    pub address: Option<Ipv4Addr>,
    pub prefix_len: u8,
    pub queue: Box<dyn FrameQueue>,
    /// 正在发送，或正在等待共享介质空闲
    pub(crate) tx_busy: bool,
    pub(crate) capture: Option<usize>,
    pub stats: DeviceStats,
}

impl Device {
    pub(crate) fn new(
        id: DeviceId,
        node: NodeId,
        segment: SegmentId,
        kind: DeviceKind,
        queue_pkts: usize,
    ) -> Self {
        Self {
            id,
            node,
            segment,
            kind,
            address: None,
            prefix_len: 0,
            queue: Box::new(DropTailQueue::new(queue_pkts)),
            tx_busy: false,
            capture: None,
            stats: DeviceStats::default(),
        }
    }

    pub fn wifi_mac(&self) -> Option<&WifiMac> {
        match &self.kind {
            DeviceKind::Wifi(mac) => Some(mac),
            _ => None,
        }
    }

    pub(crate) fn wifi_mac_mut(&mut self) -> Option<&mut WifiMac> {
        match &mut self.kind {
            DeviceKind::Wifi(mac) => Some(mac),
            _ => None,
        }
    }
}
