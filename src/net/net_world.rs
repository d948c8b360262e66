//! 网络世界实现

use super::network::Network;
use crate::app::Applications;
use crate::sim::World;
use std::any::Any;

/// 场景运行时的世界：网络拓扑加上安装在节点上的应用。
#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
    pub apps: Applications,
}

impl NetWorld {
    pub fn new(seed: u64) -> Self {
        Self {
            net: Network::new(seed),
            apps: Applications::default(),
        }
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn teardown(&mut self) -> Result<(), String> {
        self.apps.stop_all();
        self.net.close_captures()
    }
}
