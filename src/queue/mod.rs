//! 设备发送队列
//!
//! 每个网络设备一个出口队列；目前只有 DropTail，按包数限制容量。

use crate::net::Frame;

mod drop_tail;

pub use drop_tail::DropTailQueue;

/// 默认队列长度（包）
pub const DEFAULT_QUEUE_PKTS: usize = 100;

/// 帧队列抽象
pub trait FrameQueue: std::fmt::Debug + Send {
    /// 入队：成功返回 Ok；队列已满则返回 Err(frame)
    fn enqueue(&mut self, frame: Frame) -> Result<(), Frame>;
    fn dequeue(&mut self) -> Option<Frame>;
    fn peek(&self) -> Option<&Frame>;

    fn len(&self) -> usize;
    fn bytes(&self) -> u64;
    fn capacity_pkts(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
