//! 网络模拟模块
//!
//! 节点、设备、链路段（点对点 / 共享总线 / 无线信道）、地址表、全局路由与转发。

mod device;
mod error;
mod events;
mod id;
mod net_world;
mod network;
mod node;
mod packet;
mod routing;
mod segment;
mod stats;
mod wifi;
mod wifi_dcf;

pub use device::{Device, DeviceKind, DeviceStats};
pub use error::ConfigError;
pub use events::{CsmaRetry, DeliverFrame, TxComplete, WifiContention};
pub(crate) use events::net_world;
pub use id::{DeviceId, NodeId, SegmentId};
pub use net_world::NetWorld;
pub use network::{Delivery, Network};
pub use node::Node;
pub use packet::{Frame, Packet, UDP_IP_HEADER_BYTES};
pub use routing::{Hop, RoutingTable};
pub use segment::{Medium, Segment};
pub use stats::Stats;
pub use wifi::{Txop, WifiChannel, WifiMac, WifiPhy, WifiRole, WifiStandard, WifiStats};
