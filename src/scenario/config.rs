//! 场景配置
//!
//! 所有字段都有默认值，缺省即为参考场景：3 个有线节点、4 个站点、
//! CWmin 63、1500 字节载荷、每个源 10 Mbps。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ScenarioError;
use crate::addr::AddressRange;
use crate::mobility::GridConfig;
use crate::topo::{CsmaConfig, PointToPointConfig, WifiConfig};

/// 应用活动窗口（秒）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start_s: f64,
    pub stop_s: f64,
}

/// 三个链路段使用的地址段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressPlan {
    pub p2p: AddressRange,
    pub csma: AddressRange,
    pub wifi: AddressRange,
}

impl Default for AddressPlan {
    fn default() -> Self {
        Self {
            p2p: AddressRange::slash24(10, 1, 1),
            csma: AddressRange::slash24(10, 1, 2),
            wifi: AddressRange::slash24(10, 1, 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// 共享总线上除路由器外的节点数
    pub n_csma: usize,
    /// 无线站点数（不含 AP）
    pub n_wifi: usize,
    /// AP 的最小竞争窗口
    pub cw_min: u32,
    /// UDP 载荷字节数
    pub packet_size: u32,
    /// 每个源的目标比特率
    pub source_rate_bps: u64,
    /// 每个源最多发送的包数，0 表示不限
    pub max_packets: u64,
    pub port: u16,
    pub sink_window: WindowSpec,
    pub source_window: WindowSpec,
    pub horizon_s: f64,
    pub seed: u64,
    pub verbose: bool,
    pub tracing: bool,
    pub pcap_dir: PathBuf,
    pub pcap_prefix: String,
    /// 单次运行的事件数上限，超出视为引擎故障
    pub event_limit: Option<u64>,
    pub addresses: AddressPlan,
    pub p2p: PointToPointConfig,
    pub csma: CsmaConfig,
    pub wifi: WifiConfig,
    pub grid: GridConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            n_csma: 3,
            n_wifi: 4,
            cw_min: 63,
            packet_size: 1500,
            source_rate_bps: 10_000_000,
            max_packets: 0,
            port: 9,
            sink_window: WindowSpec {
                start_s: 1.0,
                stop_s: 31.0,
            },
            source_window: WindowSpec {
                start_s: 2.0,
                stop_s: 22.0,
            },
            horizon_s: 31.0,
            seed: 1,
            verbose: true,
            tracing: false,
            pcap_dir: PathBuf::from("."),
            pcap_prefix: "third".to_string(),
            event_limit: None,
            addresses: AddressPlan::default(),
            p2p: PointToPointConfig::default(),
            csma: CsmaConfig::default(),
            wifi: WifiConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// 从 JSON 文件加载，缺失字段取默认值
    pub fn from_json_file(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// 只检查与具体组件无关的数值；组件自身的约束在装配时报告
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.horizon_s.is_finite() || self.horizon_s <= 0.0 {
            return Err(ScenarioError::Invalid(format!(
                "horizon_s must be positive, got {}",
                self.horizon_s
            )));
        }
        for (name, w) in [("sink_window", self.sink_window), ("source_window", self.source_window)] {
            if !(w.start_s.is_finite() && w.stop_s.is_finite()) || w.start_s < 0.0 {
                return Err(ScenarioError::Invalid(format!(
                    "{name} must be finite and non-negative"
                )));
            }
        }
        Ok(())
    }
}
