//! 应用生命周期事件

use super::AppId;
use crate::net::net_world;
use crate::sim::{Event, Simulator, World};

/// 事件：应用在活动窗口起点启动
#[derive(Debug)]
pub struct AppStart {
    pub app: AppId,
}

impl Event for AppStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        if let Some(w) = net_world(world, sim) {
            w.apps.start(self.app, &mut w.net, sim);
        }
    }
}

/// 事件：应用在活动窗口终点停止
#[derive(Debug)]
pub struct AppStop {
    pub app: AppId,
}

impl Event for AppStop {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        if let Some(w) = net_world(world, sim) {
            w.apps.stop(self.app, sim);
        }
    }
}

/// 事件：源应用发送下一个包
#[derive(Debug)]
pub struct ClientSend {
    pub app: AppId,
    pub epoch: u64,
}

impl Event for ClientSend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        if let Some(w) = net_world(world, sim) {
            w.apps.send_next(self.app, self.epoch, &mut w.net, sim);
        }
    }
}
