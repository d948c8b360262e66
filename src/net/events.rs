//! 网络层事件

use super::id::{DeviceId, SegmentId};
use super::net_world::NetWorld;
use super::network::Delivery;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 取出 `NetWorld`；类型不符属于引擎内部故障
pub(crate) fn net_world<'a>(
    world: &'a mut dyn World,
    sim: &mut Simulator,
) -> Option<&'a mut NetWorld> {
    let w = world.as_any_mut().downcast_mut::<NetWorld>();
    if w.is_none() {
        sim.fault("world must be NetWorld");
    }
    w
}

/// 事件：帧到达接收设备
#[derive(Debug)]
pub struct DeliverFrame {
    pub to: DeviceId,
    pub pkt: Packet,
}

impl Event for DeliverFrame {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverFrame { to, pkt } = *self;
        let Some(w) = net_world(world, sim) else {
            return;
        };
        trace!(pkt_id = pkt.id, to = %to, now = %sim.now(), "📨 帧到达");
        if let Delivery::Local { node, pkt } = w.net.on_frame_arrival(to, pkt, sim) {
            w.apps.on_receive(node, pkt, sim);
        }
    }
}

/// 事件：设备完成一次串行化发送，可以发送队列中的下一帧
#[derive(Debug)]
pub struct TxComplete {
    pub device: DeviceId,
}

impl Event for TxComplete {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        if let Some(w) = net_world(world, sim) {
            w.net.on_tx_complete(self.device, sim);
        }
    }
}

/// 事件：共享总线预计空闲，等待中的设备重新尝试
#[derive(Debug)]
pub struct CsmaRetry {
    pub device: DeviceId,
}

impl Event for CsmaRetry {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        if let Some(w) = net_world(world, sim) {
            w.net.on_tx_complete(self.device, sim);
        }
    }
}

/// 事件：无线信道进入一轮竞争
#[derive(Debug)]
pub struct WifiContention {
    pub segment: SegmentId,
}

impl Event for WifiContention {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        if let Some(w) = net_world(world, sim) {
            w.net.wifi_contend(self.segment, sim);
        }
    }
}
