//! 抓包输出

mod pcap;

pub use pcap::PcapWriter;
