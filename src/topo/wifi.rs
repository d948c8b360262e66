//! 无线服务集构建与竞争窗口配置
//!
//! `WifiHelper::install` 一次性创建站点与 AP 的 MAC，并直接返回 AP 的
//! MAC 句柄。句柄只能由构建器产生，因此竞争窗口只能在服务集安装之后设置。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::net::{
    ConfigError, DeviceId, DeviceKind, Medium, Network, NodeId, Txop, WifiChannel, WifiMac,
    WifiPhy, WifiRole, WifiStandard,
};

/// 无线服务集配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    pub standard: WifiStandard,
    /// 覆盖标准默认的数据速率
    pub data_rate_bps: Option<u64>,
    /// 超出该距离的帧无法被接收（米）
    pub max_range_m: f64,
    pub retry_limit: u32,
    pub queue_pkts: usize,
    pub min_cw: u32,
    pub max_cw: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "ns-3-ssid".to_string(),
            standard: WifiStandard::Ieee80211g,
            data_rate_bps: None,
            max_range_m: 100.0,
            retry_limit: 7,
            queue_pkts: 500,
            min_cw: 15,
            max_cw: 1023,
        }
    }
}

/// AP 的 MAC 句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApMacHandle {
    device: DeviceId,
}

impl ApMacHandle {
    pub fn device(&self) -> DeviceId {
        self.device
    }
}

/// 已安装的服务集
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCell {
    pub stations: Vec<DeviceId>,
    pub ap: DeviceId,
    pub ap_mac: ApMacHandle,
}

impl WifiCell {
    /// 站点在前、AP 在后的全部设备，便于一次性分配地址
    pub fn all_devices(&self) -> Vec<DeviceId> {
        let mut v = self.stations.clone();
        v.push(self.ap);
        v
    }
}

#[derive(Debug, Clone, Default)]
pub struct WifiHelper {
    pub config: WifiConfig,
}

impl WifiHelper {
    pub fn new(config: WifiConfig) -> Self {
        Self { config }
    }

    fn mac(&self, role: WifiRole) -> WifiMac {
        WifiMac {
            role,
            ssid: self.config.ssid.clone(),
            active_probing: false,
            qos_supported: false,
            txop: Txop::new(self.config.min_cw, self.config.max_cw),
        }
    }

    /// 在所有站点与 AP 上安装无线 MAC，共享同一信道
    #[tracing::instrument(skip(self, net, stations), fields(ssid = %self.config.ssid, stations = stations.len()))]
    pub fn install(
        &self,
        net: &mut Network,
        stations: &[NodeId],
        ap: NodeId,
    ) -> Result<WifiCell, ConfigError> {
        if stations.is_empty() {
            return Err(ConfigError::NoStations);
        }
        let mut seen = HashSet::new();
        for &n in stations.iter().chain(std::iter::once(&ap)) {
            net.node(n)?;
            if !seen.insert(n) {
                return Err(ConfigError::DuplicateNode(n));
            }
        }
        let mut phy = WifiPhy::for_standard(self.config.standard);
        if let Some(rate) = self.config.data_rate_bps {
            super::check_rate(rate)?;
            phy.data_rate_bps = rate;
        }
        let channel = WifiChannel::new(
            phy,
            self.config.ssid.clone(),
            self.config.max_range_m,
            self.config.retry_limit,
        );
        let seg = net.add_segment(Medium::Wifi(channel))?;

        let sta_devices = stations
            .iter()
            .map(|&n| {
                net.add_device(
                    n,
                    seg,
                    DeviceKind::Wifi(self.mac(WifiRole::Station)),
                    self.config.queue_pkts,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ap_device = net.add_device(
            ap,
            seg,
            DeviceKind::Wifi(self.mac(WifiRole::AccessPoint)),
            self.config.queue_pkts,
        )?;
        if let Medium::Wifi(ch) = &mut net.segment_mut(seg)?.medium {
            ch.ap = Some(ap_device);
        }

        info!(
            standard = ?self.config.standard,
            ap = %ap,
            "📶 无线服务集已安装"
        );
        Ok(WifiCell {
            stations: sta_devices,
            ap: ap_device,
            ap_mac: ApMacHandle { device: ap_device },
        })
    }
}

/// 竞争窗口配置器
pub struct ContentionConfigurator;

impl ContentionConfigurator {
    /// 覆盖 AP 的最小竞争窗口。取值原样传给 MAC，不做范围检查。
    pub fn set_min_cw(net: &mut Network, mac: &ApMacHandle, value: u32) -> Result<(), ConfigError> {
        if net.is_sealed() {
            return Err(ConfigError::TopologySealed);
        }
        let wifi = net
            .device_mut(mac.device)?
            .wifi_mac_mut()
            .ok_or(ConfigError::NotWifi(mac.device))?;
        let old = wifi.txop.min_cw();
        wifi.txop.set_min_cw(value);
        debug!(device = %mac.device, old, new = value, "设置 CWmin");
        info!(cw_min = value, "⏱️  竞争窗口已配置");
        Ok(())
    }

    pub fn min_cw(net: &Network, mac: &ApMacHandle) -> Result<u32, ConfigError> {
        net.device(mac.device)?
            .wifi_mac()
            .map(|m| m.txop.min_cw())
            .ok_or(ConfigError::NotWifi(mac.device))
    }
}
