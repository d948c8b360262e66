//! 事件 trait

use super::simulator::Simulator;
use super::world::World;

/// 可调度的仿真事件。`self: Box<Self>` 允许事件在执行时移出自身携带的数据（例如 packet）。
///
/// 事件本身不返回错误：遇到无法继续的内部状态时调用 [`Simulator::fault`]，
/// 引擎会在当前事件结束后中止运行。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
