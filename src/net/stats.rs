//! 网络层统计

use serde::Serialize;

/// 网络层转发统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub forwarded_pkts: u64,
    pub local_deliveries: u64,
    pub queue_drops: u64,
    pub no_route_drops: u64,
}
