//! 仿真器
//!
//! 维护当前时间、事件队列、停止时间与故障状态。

use super::error::EngineError;
use super::event::Event;
use super::queue::Pending;
use super::time::SimTime;
use super::world::World;
use serde::Serialize;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace, warn};

/// 一次 `run` 的结果摘要。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub events: u64,
    pub final_time_ns: u64,
    /// 到达停止时间时仍未执行的事件数
    pub pending_at_stop: usize,
}

/// 事件驱动仿真器。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<Pending>,
    stop_at: Option<SimTime>,
    event_limit: Option<u64>,
    fault: Option<String>,
    executed: u64,
    destroyed: bool,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 已执行的事件总数
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    pub fn stop_time(&self) -> Option<SimTime> {
        self.stop_at
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// 设置仿真停止时间（horizon）：晚于该时刻的事件不会执行。
    pub fn set_stop_time(&mut self, at: SimTime) {
        debug!(stop_at = %at, "设置停止时间");
        self.stop_at = Some(at);
    }

    /// 限制单次运行最多执行的事件数，超出视为引擎故障。
    pub fn set_event_limit(&mut self, limit: u64) {
        self.event_limit = Some(limit);
    }

    /// 调度事件在指定时间执行。早于当前时间的请求按当前时间处理。
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(
            event_type = std::any::type_name::<E>(),
            now = %self.now,
            at = %at,
            seq,
            "调度事件"
        );
        self.q.push(Pending {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 调度事件在 `delay` 之后执行。
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev);
    }

    /// 由事件报告内部故障；当前事件结束后运行中止。
    pub fn fault(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(now = %self.now, %reason, "引擎故障");
        if self.fault.is_none() {
            self.fault = Some(reason);
        }
    }

    /// 运行直到队列为空、到达停止时间或发生故障。
    #[tracing::instrument(skip(self, world), fields(stop_at = ?self.stop_at))]
    pub fn run(&mut self, world: &mut dyn World) -> Result<RunSummary, EngineError> {
        let until = self.stop_at.unwrap_or(SimTime::MAX);
        self.run_until(until, world)
    }

    /// 运行直到 `until`（含）为止。正好在 `until` 调度的事件会被执行。
    pub fn run_until(
        &mut self,
        until: SimTime,
        world: &mut dyn World,
    ) -> Result<RunSummary, EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        info!(now = %self.now, queue_size = self.q.len(), "▶️  开始运行仿真");

        let mut events = 0_u64;
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else { break };
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
            events += 1;
            self.executed += 1;

            if let Some(reason) = self.fault.take() {
                return Err(EngineError::Fault {
                    at: self.now,
                    reason,
                });
            }
            if let Some(limit) = self.event_limit {
                if self.executed >= limit && !self.q.is_empty() {
                    return Err(EngineError::EventBudgetExhausted {
                        at: self.now,
                        limit,
                    });
                }
            }
        }
        if until != SimTime::MAX {
            self.now = self.now.max(until);
        }

        let summary = RunSummary {
            events,
            final_time_ns: self.now.as_nanos(),
            pending_at_stop: self.q.len(),
        };
        info!(
            total_events = summary.events,
            final_time = %self.now,
            pending = summary.pending_at_stop,
            "✅ 仿真完成"
        );
        Ok(summary)
    }

    /// 销毁引擎：丢弃所有未执行事件并释放世界持有的资源。
    ///
    /// 返回丢弃的事件数；世界的释放失败只记录日志。
    pub fn destroy(&mut self, world: &mut dyn World) -> usize {
        let dropped = self.q.len();
        self.q.clear();
        self.destroyed = true;
        if let Err(err) = world.teardown() {
            warn!(%err, "释放仿真资源失败");
        }
        debug!(dropped, "🧹 仿真器已销毁");
        dropped
    }
}
