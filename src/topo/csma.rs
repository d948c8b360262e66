//! 共享总线（CSMA）链路段

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::net::{ConfigError, DeviceId, DeviceKind, Medium, Network, NodeId};
use crate::queue::DEFAULT_QUEUE_PKTS;
use crate::sim::SimTime;

/// 共享总线配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsmaConfig {
    pub data_rate_bps: u64,
    /// 总线传播时延（微秒）
    pub delay_us: u64,
    pub queue_pkts: usize,
}

impl Default for CsmaConfig {
    fn default() -> Self {
        Self {
            data_rate_bps: 100_000_000,
            delay_us: 6,
            queue_pkts: DEFAULT_QUEUE_PKTS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsmaHelper {
    pub config: CsmaConfig,
}

impl CsmaHelper {
    pub fn new(config: CsmaConfig) -> Self {
        Self { config }
    }

    /// 把 `nodes`（至少 2 个）接到同一条总线上，按输入顺序返回设备
    pub fn install(
        &self,
        net: &mut Network,
        nodes: &[NodeId],
    ) -> Result<Vec<DeviceId>, ConfigError> {
        super::check_rate(self.config.data_rate_bps)?;
        if nodes.len() < 2 {
            return Err(ConfigError::SegmentTooSmall {
                kind: "csma",
                nodes: nodes.len(),
                min: 2,
            });
        }
        let mut seen = HashSet::new();
        for &n in nodes {
            net.node(n)?;
            if !seen.insert(n) {
                return Err(ConfigError::DuplicateNode(n));
            }
        }

        let seg = net.add_segment(Medium::Csma {
            data_rate_bps: self.config.data_rate_bps,
            delay: SimTime::from_micros(self.config.delay_us),
            busy_until: SimTime::ZERO,
        })?;
        let devices = nodes
            .iter()
            .map(|&n| net.add_device(n, seg, DeviceKind::Csma, self.config.queue_pkts))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            nodes = nodes.len(),
            data_rate_bps = self.config.data_rate_bps,
            delay_us = self.config.delay_us,
            "🚌 共享总线"
        );
        Ok(devices)
    }
}
