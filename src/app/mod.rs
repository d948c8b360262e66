//! 应用层：UDP 源（client）与汇（server）
//!
//! 应用只在自己的活动窗口 [start, stop] 内收发；启动/停止通过引擎事件调度。

mod events;
mod orchestrator;
mod udp_client;
mod udp_server;

pub use events::{AppStart, AppStop, ClientSend};
pub use orchestrator::{
    ActiveWindow, SendRate, SinkHandle, SourceHandle, check_containment, install_sink,
    install_sources, interval_for_rate,
};
pub use udp_client::UdpClient;
pub use udp_server::UdpServer;

use std::collections::HashMap;
use std::net::Ipv4Addr;

use thiserror::Error;
use tracing::debug;

use crate::net::{ConfigError, Delivery, Network, NodeId, Packet};
use crate::sim::{SimTime, Simulator};

/// 应用标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppId(pub usize);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrafficError {
    #[error("invalid active window [{start}, {stop}]")]
    InvalidWindow { start: SimTime, stop: SimTime },
    #[error("sink window {sink} does not contain source window {source_window}")]
    WindowNotContained {
        sink: ActiveWindow,
        source_window: ActiveWindow,
    },
    #[error("{packet_bytes} bytes at {rate_bps} bit/s is not a whole number of nanoseconds")]
    InexactInterval { packet_bytes: u32, rate_bps: u64 },
    #[error("send rate must be positive")]
    ZeroRate,
    #[error("{packet_bytes} bytes at {rate_bps} bit/s overflows the nanosecond clock")]
    IntervalOverflow { packet_bytes: u32, rate_bps: u64 },
    #[error("send interval must be positive")]
    ZeroInterval,
    #[error("packet size {0} is below the 12-byte sequence/timestamp header")]
    PacketTooSmall(u32),
    #[error("port {port} already bound on node {node}")]
    PortInUse { node: NodeId, port: u16 },
    #[error("node {0} has no address to send from")]
    NoSourceAddress(NodeId),
    #[error("destination {0} is not assigned to any interface")]
    UnknownDestination(Ipv4Addr),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 安装在节点上的应用
#[derive(Debug)]
pub enum Application {
    Sink(UdpServer),
    Source(UdpClient),
}

/// 所有应用与端口绑定表
#[derive(Debug, Default)]
pub struct Applications {
    apps: Vec<Application>,
    sockets: HashMap<(NodeId, u16), AppId>,
    /// 目的端口上没有运行中的 sink 而被丢弃的包
    pub unbound_drops: u64,
    /// 关闭逐包 TX/RX 日志
    quiet: bool,
}

impl Applications {
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.quiet = !enabled;
    }

    pub fn packet_logging(&self) -> bool {
        !self.quiet
    }

    pub fn get(&self, id: AppId) -> Option<&Application> {
        self.apps.get(id.0)
    }

    pub fn server(&self, handle: SinkHandle) -> Option<&UdpServer> {
        match self.apps.get(handle.id().0)? {
            Application::Sink(s) => Some(s),
            Application::Source(_) => None,
        }
    }

    pub fn client(&self, handle: SourceHandle) -> Option<&UdpClient> {
        match self.apps.get(handle.id().0)? {
            Application::Source(c) => Some(c),
            Application::Sink(_) => None,
        }
    }

    pub fn servers(&self) -> impl Iterator<Item = &UdpServer> {
        self.apps.iter().filter_map(|a| match a {
            Application::Sink(s) => Some(s),
            Application::Source(_) => None,
        })
    }

    pub fn clients(&self) -> impl Iterator<Item = &UdpClient> {
        self.apps.iter().filter_map(|a| match a {
            Application::Source(c) => Some(c),
            Application::Sink(_) => None,
        })
    }

    pub(crate) fn add_server(&mut self, server: UdpServer) -> Result<AppId, TrafficError> {
        let key = (server.node(), server.port());
        if self.sockets.contains_key(&key) {
            return Err(TrafficError::PortInUse {
                node: key.0,
                port: key.1,
            });
        }
        let id = AppId(self.apps.len());
        self.apps.push(Application::Sink(server));
        self.sockets.insert(key, id);
        Ok(id)
    }

    pub(crate) fn add_client(&mut self, client: UdpClient) -> AppId {
        let id = AppId(self.apps.len());
        self.apps.push(Application::Source(client));
        id
    }

    pub(crate) fn start(&mut self, id: AppId, net: &mut Network, sim: &mut Simulator) {
        match self.apps.get_mut(id.0) {
            Some(Application::Sink(s)) => s.start(sim.now()),
            Some(Application::Source(c)) => {
                if let Err(err) = c.start(net) {
                    sim.fault(err.to_string());
                    return;
                }
                let epoch = c.epoch();
                sim.schedule(sim.now(), ClientSend { app: id, epoch });
            }
            None => sim.fault(format!("unknown application {id:?}")),
        }
    }

    pub(crate) fn stop(&mut self, id: AppId, sim: &mut Simulator) {
        match self.apps.get_mut(id.0) {
            Some(Application::Sink(s)) => s.stop(sim.now()),
            Some(Application::Source(c)) => c.stop(sim.now()),
            None => sim.fault(format!("unknown application {id:?}")),
        }
    }

    /// 源应用按周期发送下一个包；`epoch` 不匹配说明应用已停止或重启过
    pub(crate) fn send_next(
        &mut self,
        id: AppId,
        epoch: u64,
        net: &mut Network,
        sim: &mut Simulator,
    ) {
        let Some(Application::Source(c)) = self.apps.get_mut(id.0) else {
            sim.fault(format!("application {id:?} is not a source"));
            return;
        };
        if !c.is_running() || c.epoch() != epoch {
            return;
        }
        let Some((pkt, next)) = c.next_packet(net, sim.now()) else {
            return;
        };
        if let Some(at) = next {
            sim.schedule(at, ClientSend { app: id, epoch });
        }
        if let Delivery::Local { node, pkt } = net.send_from(c.node(), pkt, sim) {
            self.on_receive(node, pkt, sim);
        }
    }

    /// 数据包送达目的节点：按目的端口分发给 sink
    pub(crate) fn on_receive(&mut self, node: NodeId, pkt: Packet, sim: &mut Simulator) {
        let app = self.sockets.get(&(node, pkt.dst_port)).copied();
        match app.and_then(|id| self.apps.get_mut(id.0)) {
            Some(Application::Sink(s)) if s.is_running() => s.on_packet(&pkt, sim.now()),
            _ => {
                self.unbound_drops += 1;
                debug!(node = %node, port = pkt.dst_port, pkt_id = pkt.id, "端口无接收者，丢弃");
            }
        }
    }

    /// 引擎销毁时停止所有应用
    pub(crate) fn stop_all(&mut self) {
        for app in &mut self.apps {
            match app {
                Application::Sink(s) => s.halt(),
                Application::Source(c) => c.halt(),
            }
        }
    }
}
