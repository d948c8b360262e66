//! 世界 trait

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：事件执行时操作的业务状态（网络拓扑、应用、统计）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn on_tick(&mut self, _sim: &mut Simulator) {}
    /// 引擎销毁时调用，用于释放世界持有的资源（例如抓包文件）。
    fn teardown(&mut self) -> Result<(), String> {
        Ok(())
    }
}
