//! DropTail（尾丢弃）队列
//!
//! 队列满时直接丢弃新到达的帧。

use std::collections::VecDeque;

use crate::net::Frame;

use super::FrameQueue;

#[derive(Debug)]
pub struct DropTailQueue {
    max_pkts: usize,
    cur_bytes: u64,
    q: VecDeque<Frame>,
}

impl DropTailQueue {
    pub fn new(max_pkts: usize) -> Self {
        Self {
            max_pkts,
            cur_bytes: 0,
            q: VecDeque::new(),
        }
    }
}

impl FrameQueue for DropTailQueue {
    fn enqueue(&mut self, frame: Frame) -> Result<(), Frame> {
        if self.q.len() >= self.max_pkts {
            return Err(frame);
        }
        self.cur_bytes = self
            .cur_bytes
            .saturating_add(frame.pkt.wire_bytes() as u64);
        self.q.push_back(frame);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Frame> {
        let frame = self.q.pop_front()?;
        self.cur_bytes = self
            .cur_bytes
            .saturating_sub(frame.pkt.wire_bytes() as u64);
        Some(frame)
    }

    fn peek(&self) -> Option<&Frame> {
        self.q.front()
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn bytes(&self) -> u64 {
        self.cur_bytes
    }

    fn capacity_pkts(&self) -> usize {
        self.max_pkts
    }
}
