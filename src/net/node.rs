//! 节点类型

use super::id::{DeviceId, NodeId};
use crate::mobility::Position;

/// 仿真节点：只记录挂载的设备与（可选的）固定位置。
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    devices: Vec<DeviceId>,
    position: Option<Position>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            devices: Vec::new(),
            position: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub(crate) fn attach(&mut self, dev: DeviceId) {
        self.devices.push(dev);
    }

    pub(crate) fn set_position(&mut self, pos: Position) {
        self.position = Some(pos);
    }
}
