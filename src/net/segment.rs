//! 链路段
//!
//! 一个链路段把两个或多个设备连到同一传输介质上。属性（速率、传播时延）
//! 在创建时确定，之后不再改变；运行期只有介质占用状态会变化。

use super::id::{DeviceId, SegmentId};
use super::wifi::WifiChannel;
use crate::sim::SimTime;

/// 传输介质
#[derive(Debug)]
pub enum Medium {
    /// 全双工点对点链路：每个方向独立串行化
    PointToPoint { data_rate_bps: u64, delay: SimTime },
    /// 半双工共享总线：同一时刻只允许一个设备发送
    Csma {
        data_rate_bps: u64,
        delay: SimTime,
        busy_until: SimTime,
    },
    /// 无线信道（一个服务集）
    Wifi(WifiChannel),
}

impl Medium {
    pub fn kind(&self) -> &'static str {
        match self {
            Medium::PointToPoint { .. } => "point-to-point",
            Medium::Csma { .. } => "csma",
            Medium::Wifi(_) => "wifi",
        }
    }
}

/// 链路段
#[derive(Debug)]
pub struct Segment {
    pub id: SegmentId,
    pub devices: Vec<DeviceId>,
    pub medium: Medium,
}

/// 以 `bandwidth_bps` 发送 `bytes` 字节所需的时间：ceil(bytes*8 / bps) 秒，按纳秒取整。
pub(crate) fn serialization_time(bytes: u32, bandwidth_bps: u64) -> SimTime {
    if bandwidth_bps == 0 {
        return SimTime(u64::MAX / 4);
    }
    let bits = (bytes as u128).saturating_mul(8);
    let nanos = (bits.saturating_mul(1_000_000_000u128) + (bandwidth_bps as u128 - 1))
        / bandwidth_bps as u128;
    SimTime(nanos.min(u64::MAX as u128) as u64)
}
