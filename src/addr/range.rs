use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::AddressError;

/// 网络前缀 + 掩码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    network: Ipv4Addr,
    mask: Ipv4Addr,
}

impl AddressRange {
    /// 掩码必须连续，网络地址的主机位必须为 0
    pub fn new(network: Ipv4Addr, mask: Ipv4Addr) -> Result<Self, AddressError> {
        let m = u32::from(mask);
        if m.leading_ones() + m.trailing_zeros() != 32 {
            return Err(AddressError::InvalidRange {
                network,
                mask,
                reason: "mask is not contiguous",
            });
        }
        if u32::from(network) & !m != 0 {
            return Err(AddressError::InvalidRange {
                network,
                mask,
                reason: "network has host bits set",
            });
        }
        Ok(Self { network, mask })
    }

    pub fn with_prefix(network: Ipv4Addr, prefix_len: u8) -> Result<Self, AddressError> {
        if prefix_len > 32 {
            return Err(AddressError::Parse(format!("{network}/{prefix_len}")));
        }
        let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
        Self::new(network, Ipv4Addr::from(mask))
    }

    /// `a.b.c.0/24`
    pub fn slash24(a: u8, b: u8, c: u8) -> Self {
        Self {
            network: Ipv4Addr::new(a, b, c, 0),
            mask: Ipv4Addr::new(255, 255, 255, 0),
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn mask(&self) -> Ipv4Addr {
        self.mask
    }

    pub fn prefix_len(&self) -> u8 {
        u32::from(self.mask).leading_ones() as u8
    }

    fn first(&self) -> u32 {
        u32::from(self.network)
    }

    fn last(&self) -> u32 {
        self.first() | !u32::from(self.mask)
    }

    /// 可分配的主机地址数（排除网络地址与广播地址；/31 与 /32 全部可用）
    pub fn host_count(&self) -> u32 {
        match self.prefix_len() {
            32 => 1,
            31 => 2,
            p => ((1_u64 << (32 - p)) - 2).min(u32::MAX as u64) as u32,
        }
    }

    /// 第 `i` 个主机地址（从 0 计）
    pub fn host(&self, i: u32) -> Option<Ipv4Addr> {
        if i >= self.host_count() {
            return None;
        }
        let offset = if self.prefix_len() >= 31 { 0 } else { 1 };
        Some(Ipv4Addr::from(self.first() + offset + i))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & u32::from(self.mask) == self.first()
    }

    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len())
    }
}

impl FromStr for AddressRange {
    type Err = AddressError;

    /// 解析 `10.1.1.0/24` 或 `10.1.1.0/255.255.255.0`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || AddressError::Parse(s.to_string());
        let (net, mask) = s.split_once('/').ok_or_else(parse_err)?;
        let network: Ipv4Addr = net.trim().parse().map_err(|_| parse_err())?;
        let mask = mask.trim();
        if let Ok(prefix) = mask.parse::<u8>() {
            return Self::with_prefix(network, prefix);
        }
        let mask: Ipv4Addr = mask.parse().map_err(|_| parse_err())?;
        Self::new(network, mask)
    }
}

impl serde::Serialize for AddressRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for AddressRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
