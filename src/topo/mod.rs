//! 拓扑构建器
//!
//! 点对点链路、共享总线与无线服务集。每个构建器由一个类型化配置驱动，
//! 每次调用都创建一个新的独立链路段。

pub mod csma;
pub mod p2p;
pub mod wifi;

pub use csma::{CsmaConfig, CsmaHelper};
pub use p2p::{PointToPointConfig, PointToPointHelper};
pub use wifi::{ApMacHandle, ContentionConfigurator, WifiCell, WifiConfig, WifiHelper};

use crate::net::ConfigError;

fn check_rate(data_rate_bps: u64) -> Result<(), ConfigError> {
    if data_rate_bps == 0 {
        return Err(ConfigError::InvalidAttribute(
            "data rate must be positive".into(),
        ));
    }
    Ok(())
}
