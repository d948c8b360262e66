//! 离散事件仿真引擎
//!
//! 场景层只通过这里的窄接口与引擎交互：调度事件（start-at / stop-at）、
//! 设置停止时间、运行、销毁。

mod error;
mod event;
mod queue;
mod simulator;
mod time;
mod world;

pub use error::EngineError;
pub use event::Event;
pub use simulator::{RunSummary, Simulator};
pub use time::SimTime;
pub use world::World;
