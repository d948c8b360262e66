//! 全局路由表
//!
//! 拓扑装配完成后一次性计算：对每个 (from, dst) 预计算所有等价最短跳数路径的
//! 下一跳集合；多个候选时按流 key 做稳定选择。

use std::collections::{HashMap, VecDeque};

use super::id::{DeviceId, NodeId};

/// 邻接关系中的一条边：经由 `out` 设备发往 `next` 节点上的 `to` 设备
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub next: NodeId,
    pub out: DeviceId,
    pub to: DeviceId,
}

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    next_hops: HashMap<(NodeId, NodeId), Vec<Hop>>,
    hash_salt: u64,
}

impl RoutingTable {
    pub fn new(hash_salt: u64) -> Self {
        Self {
            next_hops: HashMap::new(),
            hash_salt,
        }
    }

    /// 基于邻接表重建路由。`adj[from]` 为从 `from` 出发的所有边。
    pub fn rebuild(&mut self, adj: &[Vec<Hop>]) {
        let n = adj.len();
        self.next_hops.clear();

        let mut rev_adj: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for (from, hops) in adj.iter().enumerate() {
            for h in hops {
                if !rev_adj[h.next.0].contains(&NodeId(from)) {
                    rev_adj[h.next.0].push(NodeId(from));
                }
            }
        }

        // 对每个 dst 在反向图上 BFS 得到最短跳数 dist[*]；
        // 再为每个 from 选出 dist[next] = dist[from] - 1 的边作为候选。
        let mut dist: Vec<u32> = vec![u32::MAX; n];
        let mut q: VecDeque<NodeId> = VecDeque::new();

        for dst_idx in 0..n {
            dist.fill(u32::MAX);
            q.clear();
            dist[dst_idx] = 0;
            q.push_back(NodeId(dst_idx));

            while let Some(v) = q.pop_front() {
                let dv = dist[v.0];
                for &pred in &rev_adj[v.0] {
                    if dist[pred.0] == u32::MAX {
                        dist[pred.0] = dv + 1;
                        q.push_back(pred);
                    }
                }
            }

            for from_idx in 0..n {
                let df = dist[from_idx];
                if from_idx == dst_idx || df == u32::MAX {
                    continue;
                }
                let cands: Vec<Hop> = adj[from_idx]
                    .iter()
                    .filter(|h| dist[h.next.0] == df - 1)
                    .copied()
                    .collect();
                if !cands.is_empty() {
                    self.next_hops.insert((NodeId(from_idx), NodeId(dst_idx)), cands);
                }
            }
        }
    }

    /// (from, dst) 的全部等价下一跳
    pub fn next_hops(&self, from: NodeId, dst: NodeId) -> Option<&[Hop]> {
        self.next_hops.get(&(from, dst)).map(|v| v.as_slice())
    }

    /// 选出 (from, dst) 的下一跳；同一 key 总是得到同一结果。
    pub fn lookup(&self, from: NodeId, dst: NodeId, key: u64) -> Option<Hop> {
        let cands = self.next_hops(from, dst)?;
        if cands.len() == 1 {
            return Some(cands[0]);
        }
        let h = mix64(
            key ^ (from.0 as u64).wrapping_mul(0x9E3779B97F4A7C15)
                ^ (dst.0 as u64)
                ^ self.hash_salt,
        );
        Some(cands[(h as usize) % cands.len()])
    }

    pub fn len(&self) -> usize {
        self.next_hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_hops.is_empty()
    }
}

/// splitmix64：确定性的 64-bit 混合，保证多次运行结果一致
fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
