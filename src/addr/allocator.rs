use std::collections::HashSet;
use std::net::Ipv4Addr;

use tracing::{debug, info};

use super::{AddressError, AddressRange};
use crate::net::{DeviceId, Network};

/// 一次分配的结果，按输入顺序保存 (设备, 地址)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedAddresses {
    range: AddressRange,
    entries: Vec<(DeviceId, Ipv4Addr)>,
}

impl AssignedAddresses {
    pub fn range(&self) -> AddressRange {
        self.range
    }

    /// 第 `index` 个接口的地址
    pub fn address(&self, index: usize) -> Option<Ipv4Addr> {
        self.entries.get(index).map(|(_, a)| *a)
    }

    pub fn device(&self, index: usize) -> Option<DeviceId> {
        self.entries.get(index).map(|(d, _)| *d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, Ipv4Addr)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 地址分配器：记录已使用的地址段，保证各段互不重叠
#[derive(Debug, Default, Clone)]
pub struct AddressAllocator {
    used: Vec<AddressRange>,
}

impl AddressAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used_ranges(&self) -> &[AddressRange] {
        &self.used
    }

    /// 从 `range` 中按输入顺序为每个设备分配下一个主机地址。
    ///
    /// 任何检查失败时不修改网络状态。
    #[tracing::instrument(skip(self, net, devices), fields(range = %range, devices = devices.len()))]
    pub fn assign(
        &mut self,
        net: &mut Network,
        range: AddressRange,
        devices: &[DeviceId],
    ) -> Result<AssignedAddresses, AddressError> {
        if let Some(existing) = self.used.iter().find(|r| r.overlaps(&range)) {
            return Err(AddressError::RangeConflict {
                requested: range,
                existing: *existing,
            });
        }
        if devices.len() as u64 > range.host_count() as u64 {
            return Err(AddressError::RangeExhausted {
                range,
                hosts: range.host_count(),
                requested: devices.len(),
            });
        }
        let mut seen = HashSet::new();
        for &dev in devices {
            if !seen.insert(dev) || net.device(dev)?.address.is_some() {
                return Err(AddressError::AlreadyAssigned(dev));
            }
        }

        let mut entries = Vec::with_capacity(devices.len());
        for (i, &dev) in devices.iter().enumerate() {
            let Some(addr) = range.host(i as u32) else {
                break;
            };
            net.set_address(dev, addr, range.prefix_len())?;
            debug!(device = %dev, %addr, "分配地址");
            entries.push((dev, addr));
        }
        self.used.push(range);
        info!(assigned = entries.len(), "🏷️  地址段已分配");
        Ok(AssignedAddresses { range, entries })
    }
}
