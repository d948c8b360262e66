use super::time::SimTime;
use thiserror::Error;

/// 引擎在运行期间报告的内部故障。场景层无法恢复，只能向上传播。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine fault at {at}: {reason}")]
    Fault { at: SimTime, reason: String },
    #[error("event budget of {limit} events exhausted at {at}")]
    EventBudgetExhausted { at: SimTime, limit: u64 },
    #[error("simulator already destroyed")]
    Destroyed,
}
