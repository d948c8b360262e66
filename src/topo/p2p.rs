//! 点对点链路

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::net::{ConfigError, DeviceId, DeviceKind, Medium, Network, NodeId};
use crate::queue::DEFAULT_QUEUE_PKTS;
use crate::sim::SimTime;

/// 点对点链路配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointToPointConfig {
    pub data_rate_bps: u64,
    /// 单向传播时延（微秒）
    pub delay_us: u64,
    pub queue_pkts: usize,
}

impl Default for PointToPointConfig {
    fn default() -> Self {
        Self {
            data_rate_bps: 100_000_000,
            delay_us: 2_000,
            queue_pkts: DEFAULT_QUEUE_PKTS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointToPointHelper {
    pub config: PointToPointConfig,
}

impl PointToPointHelper {
    pub fn new(config: PointToPointConfig) -> Self {
        Self { config }
    }

    /// 在 `a`、`b` 之间创建一条全双工链路，返回两端设备
    pub fn install(
        &self,
        net: &mut Network,
        a: NodeId,
        b: NodeId,
    ) -> Result<(DeviceId, DeviceId), ConfigError> {
        super::check_rate(self.config.data_rate_bps)?;
        if a == b {
            return Err(ConfigError::DuplicateNode(a));
        }
        net.node(a)?;
        net.node(b)?;
        let seg = net.add_segment(Medium::PointToPoint {
            data_rate_bps: self.config.data_rate_bps,
            delay: SimTime::from_micros(self.config.delay_us),
        })?;
        let da = net.add_device(a, seg, DeviceKind::PointToPoint, self.config.queue_pkts)?;
        let db = net.add_device(b, seg, DeviceKind::PointToPoint, self.config.queue_pkts)?;
        info!(
            a = %a,
            b = %b,
            data_rate_bps = self.config.data_rate_bps,
            delay_us = self.config.delay_us,
            "🔗 点对点链路"
        );
        Ok((da, db))
    }
}
