//! libpcap 文件写入
//!
//! 链路类型为 LINKTYPE_RAW（直接是 IPv4 包）。载荷不建模，每条记录只写出
//! 合成的 IPv4/UDP 头与 12 字节序号/时间戳头，`orig_len` 为真实线上长度。

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::net::Packet;
use crate::sim::SimTime;

const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
const LINKTYPE_RAW: u32 = 101;
const SNAPLEN: u32 = 65_535;
const SEQ_TS_HEADER_BYTES: usize = 12;

pub struct PcapWriter {
    out: BufWriter<File>,
    records: u64,
}

impl std::fmt::Debug for PcapWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcapWriter")
            .field("records", &self.records)
            .finish()
    }
}

impl PcapWriter {
    /// 创建文件并写入全局头
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&PCAP_MAGIC.to_le_bytes())?;
        out.write_all(&2_u16.to_le_bytes())?;
        out.write_all(&4_u16.to_le_bytes())?;
        out.write_all(&0_i32.to_le_bytes())?;
        out.write_all(&0_u32.to_le_bytes())?;
        out.write_all(&SNAPLEN.to_le_bytes())?;
        out.write_all(&LINKTYPE_RAW.to_le_bytes())?;
        Ok(Self { out, records: 0 })
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// 写一条记录
    pub fn record(&mut self, at: SimTime, pkt: &Packet) -> io::Result<()> {
        let bytes = header_bytes(pkt);
        let ns = at.as_nanos();
        let secs = (ns / 1_000_000_000) as u32;
        let usecs = ((ns % 1_000_000_000) / 1_000) as u32;
        self.out.write_all(&secs.to_le_bytes())?;
        self.out.write_all(&usecs.to_le_bytes())?;
        self.out.write_all(&(bytes.len() as u32).to_le_bytes())?;
        self.out.write_all(&pkt.wire_bytes().to_le_bytes())?;
        self.out.write_all(&bytes)?;
        self.records += 1;
        Ok(())
    }

    /// 刷新缓冲并关闭
    pub fn finish(mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn header_bytes(pkt: &Packet) -> Vec<u8> {
    let total_len = pkt.wire_bytes().min(u16::MAX as u32) as u16;
    let udp_len = (pkt.payload_bytes.saturating_add(8)).min(u16::MAX as u32) as u16;
    let mut b = Vec::with_capacity(28 + SEQ_TS_HEADER_BYTES);

    // IPv4 头（无选项）
    b.push(0x45);
    b.push(0);
    b.extend_from_slice(&total_len.to_be_bytes());
    b.extend_from_slice(&(pkt.id as u16).to_be_bytes());
    b.extend_from_slice(&0_u16.to_be_bytes());
    b.push(64_u8.saturating_sub(pkt.hops.min(64) as u8));
    b.push(17);
    b.extend_from_slice(&0_u16.to_be_bytes());
    b.extend_from_slice(&pkt.src.octets());
    b.extend_from_slice(&pkt.dst.octets());
    let csum = ipv4_checksum(&b[..20]);
    b[10..12].copy_from_slice(&csum.to_be_bytes());

    // UDP 头（校验和为 0 表示不校验）
    b.extend_from_slice(&pkt.src_port.to_be_bytes());
    b.extend_from_slice(&pkt.dst_port.to_be_bytes());
    b.extend_from_slice(&udp_len.to_be_bytes());
    b.extend_from_slice(&0_u16.to_be_bytes());

    // 序号 + 发送时间戳（纳秒）
    b.extend_from_slice(&pkt.seq.to_be_bytes());
    b.extend_from_slice(&pkt.sent_at.as_nanos().to_be_bytes());

    let keep = b.len().min(pkt.wire_bytes() as usize);
    b.truncate(keep);
    b
}

fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = header
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]) as u32)
        .sum();
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
