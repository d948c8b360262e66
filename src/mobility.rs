//! 节点放置
//!
//! 只有固定位置（不移动）。位置只影响无线信道的传播时延与覆盖范围。

use serde::{Deserialize, Serialize};

use crate::net::{ConfigError, Network, NodeId};

/// 三维坐标（米）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// 网格填充顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridLayout {
    /// 先填满一行（`grid_width` 列）再换行
    RowFirst,
    /// 先填满一列（`grid_width` 行）再换列
    ColumnFirst,
}

/// 网格放置参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub min_x: f64,
    pub min_y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    pub grid_width: u32,
    pub layout: GridLayout,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            delta_x: 5.0,
            delta_y: 10.0,
            grid_width: 3,
            layout: GridLayout::RowFirst,
        }
    }
}

impl GridConfig {
    /// 第 `i` 个节点的位置
    pub fn position(&self, i: usize) -> Position {
        let w = self.grid_width.max(1) as usize;
        let (col, row) = match self.layout {
            GridLayout::RowFirst => (i % w, i / w),
            GridLayout::ColumnFirst => (i / w, i % w),
        };
        Position::new(
            self.min_x + self.delta_x * col as f64,
            self.min_y + self.delta_y * row as f64,
            0.0,
        )
    }
}

/// 按网格依次为节点分配固定位置，返回分配结果
pub fn place_grid(
    net: &mut Network,
    nodes: &[NodeId],
    grid: &GridConfig,
) -> Result<Vec<Position>, ConfigError> {
    if grid.grid_width == 0 {
        return Err(ConfigError::InvalidGrid("grid_width must be positive".into()));
    }
    if !(grid.delta_x.is_finite() && grid.delta_y.is_finite()) {
        return Err(ConfigError::InvalidGrid("grid deltas must be finite".into()));
    }
    nodes
        .iter()
        .enumerate()
        .map(|(i, &node)| {
            let pos = grid.position(i);
            net.set_position(node, pos)?;
            tracing::debug!(node = %node, x = pos.x, y = pos.y, "📍 放置节点");
            Ok(pos)
        })
        .collect()
}
