use super::id::{DeviceId, NodeId, SegmentId};
use thiserror::Error;

/// 拓扑装配阶段的配置错误。全部在仿真时间推进之前报告，且不可恢复。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),
    #[error("unknown segment {0:?}")]
    UnknownSegment(SegmentId),
    #[error("{kind} segment needs at least {min} nodes, got {nodes}")]
    SegmentTooSmall {
        kind: &'static str,
        nodes: usize,
        min: usize,
    },
    #[error("node {0} appears more than once on the same segment")]
    DuplicateNode(NodeId),
    #[error("device {0} has no wifi medium-access controller")]
    NotWifi(DeviceId),
    #[error("wireless cell needs at least one station")]
    NoStations,
    #[error("topology is sealed: routing tables were already populated")]
    TopologySealed,
    #[error("device {device} on node {node} has no address assigned")]
    Unaddressed { device: DeviceId, node: NodeId },
    #[error("wireless node {0} has no position")]
    Unplaced(NodeId),
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("invalid link attribute: {0}")]
    InvalidAttribute(String),
    #[error("capture setup failed for {device}: {reason}")]
    Capture { device: DeviceId, reason: String },
}
