//! 无线信道的一轮 DCF 竞争
//!
//! 每轮：所有有待发帧的设备抽取（或沿用冻结的）退避时隙数，最小者获得信道；
//! 多个设备同时到期即碰撞。一轮结束（数据 + SIFS + ACK，或 ACK 超时）后
//! 若仍有积压则调度下一轮。

use tracing::{debug, trace};

use super::events::{DeliverFrame, WifiContention};
use super::id::{DeviceId, SegmentId};
use super::network::Network;
use super::segment::Medium;
use super::wifi::{WifiRole, propagation_delay};
use crate::sim::{SimTime, Simulator};

impl Network {
    /// 该设备实际采用的最小竞争窗口：站点采用 AP 通告的值
    pub(crate) fn effective_min_cw(&self, dev: DeviceId, advertised: Option<u32>) -> Option<u32> {
        let mac = self.device(dev).ok()?.wifi_mac()?;
        Some(match (mac.role, advertised) {
            (WifiRole::Station, Some(cw)) => cw,
            _ => mac.txop.min_cw(),
        })
    }

    #[tracing::instrument(level = "trace", skip(self, sim), fields(segment = segment.0))]
    pub(crate) fn wifi_contend(&mut self, segment: SegmentId, sim: &mut Simulator) {
        let now = sim.now();
        let (phy, retry_limit, max_range, ap, members) = match self.segment(segment) {
            Ok(seg) => match &seg.medium {
                Medium::Wifi(ch) => (
                    ch.phy,
                    ch.retry_limit,
                    ch.max_range_m,
                    ch.ap,
                    seg.devices.clone(),
                ),
                other => {
                    sim.fault(format!("contention on {} segment", other.kind()));
                    return;
                }
            },
            Err(err) => {
                sim.fault(err.to_string());
                return;
            }
        };
        let advertised = ap.and_then(|ap| self.device(ap).ok()?.wifi_mac().map(|m| m.txop.min_cw()));

        let mut contenders: Vec<(DeviceId, u32, u32)> = Vec::new();
        for dev in members {
            if self.devices()[dev.0].queue.is_empty() {
                continue;
            }
            let Some(min_cw) = self.effective_min_cw(dev, advertised) else {
                continue;
            };
            let Some(mac) = self.devices[dev.0].wifi_mac_mut() else {
                continue;
            };
            let slots = mac.txop.draw_backoff(min_cw, &mut self.rng);
            contenders.push((dev, slots, min_cw));
        }

        let Some(slots) = contenders.iter().map(|(_, s, _)| *s).min() else {
            if let Ok(seg) = self.segment_mut(segment) {
                if let Medium::Wifi(ch) = &mut seg.medium {
                    ch.round_pending = false;
                }
            }
            return;
        };

        for (dev, _, _) in &contenders {
            if let Some(mac) = self.devices[dev.0].wifi_mac_mut() {
                mac.txop.elapse(slots);
            }
        }
        let winners: Vec<(DeviceId, u32)> = contenders
            .iter()
            .filter(|(_, s, _)| *s == slots)
            .map(|(d, _, cw)| (*d, *cw))
            .collect();

        let access = now + phy.difs() + SimTime(phy.slot.0.saturating_mul(slots as u64));
        trace!(contenders = contenders.len(), winners = winners.len(), slots, "竞争结果");

        let mut delivered = None;
        let mut failed: Vec<(DeviceId, u32)> = Vec::new();
        let mut longest = SimTime::ZERO;
        for &(dev, min_cw) in &winners {
            let Some(head) = self.devices[dev.0].queue.peek() else {
                continue;
            };
            longest = longest.max(phy.data_duration(head.pkt.wire_bytes()));
            if winners.len() > 1 {
                failed.push((dev, min_cw));
                continue;
            }
            let from = self.devices[dev.0].node;
            let to = self.devices[head.to.0].node;
            match self.distance(from, to) {
                Some(d) if d <= max_range => delivered = Some((dev, d)),
                Some(_) => failed.push((dev, min_cw)),
                None => {
                    sim.fault(format!("wireless node {from} or {to} has no position"));
                    return;
                }
            }
        }

        let end;
        if let Some((dev, distance)) = delivered {
            let Some(frame) = self.devices[dev.0].queue.dequeue() else {
                return;
            };
            let d = &mut self.devices[dev.0];
            d.stats.tx_pkts += 1;
            if let Some(mac) = d.wifi_mac_mut() {
                mac.txop.on_success();
            }
            self.capture(dev, &frame.pkt, access);
            let duration = phy.data_duration(frame.pkt.wire_bytes());
            let arrive = access + duration + propagation_delay(distance);
            sim.schedule(
                arrive,
                DeliverFrame {
                    to: frame.to,
                    pkt: frame.pkt,
                },
            );
            end = access + duration + phy.sifs + phy.ack_duration();
        } else {
            end = access + longest + phy.ack_timeout();
        }

        let mut retry_drops = 0;
        for &(dev, min_cw) in &failed {
            let d = &mut self.devices[dev.0];
            let give_up = d
                .wifi_mac_mut()
                .map(|mac| mac.txop.on_failure(min_cw, retry_limit))
                .unwrap_or(false);
            if give_up {
                if let Some(frame) = d.queue.dequeue() {
                    debug!(device = %dev, pkt_id = frame.pkt.id, "超过重传上限，丢弃");
                    retry_drops += 1;
                }
            }
        }

        if let Ok(seg) = self.segment_mut(segment) {
            if let Medium::Wifi(ch) = &mut seg.medium {
                ch.stats.contention_rounds += 1;
                ch.stats.transmissions += winners.len() as u64;
                match (delivered.is_some(), winners.len()) {
                    (true, _) => ch.stats.successes += 1,
                    (false, 1) => ch.stats.out_of_range += 1,
                    _ => ch.stats.collisions += 1,
                }
                ch.stats.retry_drops += retry_drops;
            }
        }
        sim.schedule(end, WifiContention { segment });
    }
}
