//! 无线 MAC/PHY 参考模型
//!
//! 只为场景层提供一个可调的参数（最小竞争窗口），其余行为是简化的 DCF：
//! 时隙化退避、冻结计数、同时到期即碰撞、失败后窗口翻倍。

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::id::DeviceId;
use crate::sim::SimTime;

/// 光速（米/纳秒）
const METERS_PER_NS: f64 = 0.299_792_458;

/// 物理层标准，决定时隙、帧间隔与速率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiStandard {
    Ieee80211b,
    Ieee80211g,
    Ieee80211a,
}

/// 物理层时间参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WifiPhy {
    pub slot: SimTime,
    pub sifs: SimTime,
    /// 前导码 + PLCP 头
    pub preamble: SimTime,
    pub data_rate_bps: u64,
    pub ack_rate_bps: u64,
    /// MAC 头 + LLC/SNAP + FCS
    pub mac_overhead_bytes: u32,
    pub ack_bytes: u32,
}

impl WifiPhy {
    pub fn for_standard(standard: WifiStandard) -> Self {
        match standard {
            WifiStandard::Ieee80211b => Self {
                slot: SimTime::from_micros(20),
                sifs: SimTime::from_micros(10),
                preamble: SimTime::from_micros(192),
                data_rate_bps: 11_000_000,
                ack_rate_bps: 2_000_000,
                mac_overhead_bytes: 36,
                ack_bytes: 14,
            },
            WifiStandard::Ieee80211g | WifiStandard::Ieee80211a => Self {
                slot: SimTime::from_micros(9),
                sifs: SimTime::from_micros(10),
                preamble: SimTime::from_micros(20),
                data_rate_bps: 54_000_000,
                ack_rate_bps: 24_000_000,
                mac_overhead_bytes: 36,
                ack_bytes: 14,
            },
        }
    }

    /// DIFS = SIFS + 2 * slot
    pub fn difs(&self) -> SimTime {
        self.sifs + self.slot + self.slot
    }

    /// 数据帧占用信道的时间
    pub fn data_duration(&self, wire_bytes: u32) -> SimTime {
        self.preamble
            + super::segment::serialization_time(
                wire_bytes.saturating_add(self.mac_overhead_bytes),
                self.data_rate_bps,
            )
    }

    pub fn ack_duration(&self) -> SimTime {
        self.preamble + super::segment::serialization_time(self.ack_bytes, self.ack_rate_bps)
    }

    /// 发送方等待 ACK 的超时时间
    pub fn ack_timeout(&self) -> SimTime {
        self.sifs + self.ack_duration() + self.slot
    }
}

/// 按距离计算传播时延
pub(crate) fn propagation_delay(distance_m: f64) -> SimTime {
    SimTime((distance_m.max(0.0) / METERS_PER_NS).round() as u64)
}

/// MAC 角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiRole {
    Station,
    AccessPoint,
}

/// 信道接入状态（DCF 竞争窗口与退避计数）
#[derive(Debug, Clone)]
pub struct Txop {
    min_cw: u32,
    max_cw: u32,
    cw: Option<u32>,
    backoff: Option<u32>,
    retries: u32,
}

impl Txop {
    pub fn new(min_cw: u32, max_cw: u32) -> Self {
        Self {
            min_cw,
            max_cw,
            cw: None,
            backoff: None,
            retries: 0,
        }
    }

    pub fn min_cw(&self) -> u32 {
        self.min_cw
    }

    pub fn max_cw(&self) -> u32 {
        self.max_cw
    }

    /// 覆盖最小竞争窗口。不做范围检查，取值的效果由 DCF 模型决定。
    pub fn set_min_cw(&mut self, value: u32) {
        self.min_cw = value;
        self.cw = None;
        self.backoff = None;
    }

    /// 当前竞争窗口；`min_cw` 是该 MAC 实际采用的最小窗口（站点采用 AP 通告的值）
    pub fn current_cw(&self, min_cw: u32) -> u32 {
        self.cw.unwrap_or(min_cw)
    }

    pub fn backoff(&self) -> Option<u32> {
        self.backoff
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// 没有进行中的退避时，在 [0, cw] 内均匀抽取新的退避时隙数
    pub(crate) fn draw_backoff<R: Rng>(&mut self, min_cw: u32, rng: &mut R) -> u32 {
        if let Some(b) = self.backoff {
            return b;
        }
        let b = rng.gen_range(0..=self.current_cw(min_cw));
        self.backoff = Some(b);
        b
    }

    /// 信道空闲了 `slots` 个时隙：冻结式倒计时
    pub(crate) fn elapse(&mut self, slots: u32) {
        if let Some(b) = self.backoff.as_mut() {
            *b = b.saturating_sub(slots);
        }
    }

    pub(crate) fn on_success(&mut self) {
        self.cw = None;
        self.backoff = None;
        self.retries = 0;
    }

    /// 发送失败：窗口翻倍（不超过上限）。超过重传上限时复位并返回 true，调用方丢弃该帧。
    pub(crate) fn on_failure(&mut self, min_cw: u32, retry_limit: u32) -> bool {
        self.retries += 1;
        self.backoff = None;
        if self.retries > retry_limit {
            self.on_success();
            return true;
        }
        let ceiling = self.max_cw.max(min_cw);
        let next = self.current_cw(min_cw).saturating_mul(2).saturating_add(1);
        self.cw = Some(next.min(ceiling));
        false
    }
}

/// 无线 MAC：服务集成员身份与接入参数
#[derive(Debug, Clone)]
pub struct WifiMac {
    pub role: WifiRole,
    pub ssid: String,
    pub active_probing: bool,
    pub qos_supported: bool,
    pub txop: Txop,
}

/// 信道级统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WifiStats {
    pub contention_rounds: u64,
    pub transmissions: u64,
    pub successes: u64,
    pub collisions: u64,
    pub out_of_range: u64,
    pub retry_drops: u64,
}

/// 一个服务集共享的无线信道
#[derive(Debug)]
pub struct WifiChannel {
    pub phy: WifiPhy,
    pub ssid: String,
    pub max_range_m: f64,
    pub retry_limit: u32,
    pub ap: Option<DeviceId>,
    pub(crate) round_pending: bool,
    pub stats: WifiStats,
}

impl WifiChannel {
    pub fn new(phy: WifiPhy, ssid: impl Into<String>, max_range_m: f64, retry_limit: u32) -> Self {
        Self {
            phy,
            ssid: ssid.into(),
            max_range_m,
            retry_limit,
            ap: None,
            round_pending: false,
            stats: WifiStats::default(),
        }
    }
}
