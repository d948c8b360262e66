//! 场景驱动
//!
//! 把一组场景参数变成一次完整的仿真运行：链路 → 地址 → 无线服务集 →
//! 竞争窗口 → 放置 → 流量 → 路由 → horizon → 抓包 → 运行 → 销毁。

mod config;
mod driver;
mod report;

pub use config::{AddressPlan, ScenarioConfig, WindowSpec};
pub use driver::{AssembledScenario, Scenario, Topology};
pub use report::{EngineReport, ScenarioReport, SinkReport, SourceReport};

use thiserror::Error;

use crate::addr::AddressError;
use crate::app::TrafficError;
use crate::net::ConfigError;
use crate::sim::{EngineError, SimTime};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("addressing error: {0}")]
    Address(#[from] AddressError),
    #[error("traffic error: {0}")]
    Traffic(#[from] TrafficError),
    #[error("simulation run failed: {0}")]
    Engine(#[from] EngineError),
    #[error("horizon {horizon} ends before the last application stop {latest_stop}")]
    HorizonTooShort {
        horizon: SimTime,
        latest_stop: SimTime,
    },
    #[error("invalid scenario: {0}")]
    Invalid(String),
    #[error("cannot read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse scenario file: {0}")]
    Json(#[from] serde_json::Error),
}
