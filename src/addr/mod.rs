//! IPv4 地址分配
//!
//! 每次 `assign` 占用一个地址段；已使用过（或与之重叠）的地址段不能再次使用，
//! 避免两个链路段上出现重复地址。分配器状态属于单个场景，不是进程级全局状态。

mod allocator;
mod range;

pub use allocator::{AddressAllocator, AssignedAddresses};
pub use range::AddressRange;

use crate::net::{ConfigError, DeviceId};
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AddressError {
    #[error("invalid address range {network}/{mask}: {reason}")]
    InvalidRange {
        network: Ipv4Addr,
        mask: Ipv4Addr,
        reason: &'static str,
    },
    #[error("cannot parse address range {0:?}")]
    Parse(String),
    #[error("address range {requested} overlaps range {existing} already in use")]
    RangeConflict {
        requested: AddressRange,
        existing: AddressRange,
    },
    #[error("address range {range} has {hosts} host addresses, {requested} requested")]
    RangeExhausted {
        range: AddressRange,
        hosts: u32,
        requested: usize,
    },
    #[error("device {0} already has an address")]
    AlreadyAssigned(DeviceId),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
