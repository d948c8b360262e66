//! 场景装配与运行
//!
//! 装配顺序固定。竞争窗口只能通过 `WifiCell` 给出的 AP 句柄设置；路由表在所有
//! 链路、地址、放置与应用就绪后计算一次并冻结拓扑；`AssembledScenario::run`
//! 消费自身，运行后无论成败都会销毁引擎。

use std::path::PathBuf;

use tracing::{error, info, warn};

use super::config::ScenarioConfig;
use super::report::ScenarioReport;
use super::ScenarioError;
use crate::addr::{AddressAllocator, AssignedAddresses};
use crate::app::{
    ActiveWindow, SendRate, SinkHandle, SourceHandle, check_containment, install_sink,
    install_sources,
};
use crate::mobility::place_grid;
use crate::net::{ConfigError, DeviceId, NetWorld, NodeId};
use crate::sim::{SimTime, Simulator};
use crate::topo::{ContentionConfigurator, CsmaHelper, PointToPointHelper, WifiCell, WifiHelper};

/// 装配出的拓扑与应用句柄
#[derive(Debug, Clone)]
pub struct Topology {
    /// [AP, 路由器]
    pub p2p_nodes: [NodeId; 2],
    /// 路由器在前，其余为有线节点
    pub csma_nodes: Vec<NodeId>,
    pub wifi_stations: Vec<NodeId>,
    pub ap: NodeId,
    pub p2p_devices: (DeviceId, DeviceId),
    pub csma_devices: Vec<DeviceId>,
    pub cell: WifiCell,
    pub p2p_addresses: AssignedAddresses,
    pub csma_addresses: AssignedAddresses,
    pub wifi_addresses: AssignedAddresses,
    pub sink: SinkHandle,
    pub sources: Vec<SourceHandle>,
}

impl Topology {
    /// 场景中的节点总数（AP 计入点对点两端）
    pub fn node_count(&self) -> usize {
        2 + (self.csma_nodes.len() - 1) + self.wifi_stations.len()
    }
}

/// 场景：一组不可变的参数
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    config: ScenarioConfig,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// 装配并运行
    pub fn run(&self) -> Result<ScenarioReport, ScenarioError> {
        self.assemble()?.run()
    }

    /// 按固定顺序装配场景；任何错误都在仿真时间推进之前返回
    #[tracing::instrument(skip(self), fields(n_csma = self.config.n_csma, n_wifi = self.config.n_wifi, cw_min = self.config.cw_min))]
    pub fn assemble(&self) -> Result<AssembledScenario, ScenarioError> {
        let cfg = &self.config;
        cfg.validate()?;

        let mut sim = Simulator::default();
        if let Some(limit) = cfg.event_limit {
            sim.set_event_limit(limit);
        }
        let mut world = NetWorld::new(cfg.seed);
        world.apps.set_packet_logging(cfg.verbose);
        let net = &mut world.net;

        // 节点
        let p2p = net.create_nodes("p2p", 2)?;
        let (ap, router) = (p2p[0], p2p[1]);
        let mut csma_nodes = vec![router];
        csma_nodes.extend(net.create_nodes("lan", cfg.n_csma)?);
        let stations = net.create_nodes("sta", cfg.n_wifi)?;

        // 有线链路
        let p2p_devices = PointToPointHelper::new(cfg.p2p).install(net, ap, router)?;
        let csma_devices = CsmaHelper::new(cfg.csma).install(net, &csma_nodes)?;

        // 有线地址
        let mut allocator = AddressAllocator::new();
        let p2p_addresses =
            allocator.assign(net, cfg.addresses.p2p, &[p2p_devices.0, p2p_devices.1])?;
        let csma_addresses = allocator.assign(net, cfg.addresses.csma, &csma_devices)?;

        // 无线服务集与竞争窗口
        let cell = WifiHelper::new(cfg.wifi.clone()).install(net, &stations, ap)?;
        ContentionConfigurator::set_min_cw(net, &cell.ap_mac, cfg.cw_min)?;
        let wifi_addresses = allocator.assign(net, cfg.addresses.wifi, &cell.all_devices())?;

        // 放置：站点在前，AP 紧随其后
        let mut placed = stations.clone();
        placed.push(ap);
        place_grid(net, &placed, &cfg.grid)?;

        // 流量
        let sink_window =
            ActiveWindow::from_secs(cfg.sink_window.start_s, cfg.sink_window.stop_s)?;
        let source_window =
            ActiveWindow::from_secs(cfg.source_window.start_s, cfg.source_window.stop_s)?;
        check_containment(&sink_window, &[source_window])?;

        let sink_node = *csma_nodes.last().ok_or(ConfigError::SegmentTooSmall {
            kind: "csma",
            nodes: 0,
            min: 2,
        })?;
        let sink_addr = csma_addresses
            .address(csma_nodes.len() - 1)
            .ok_or(ConfigError::Unaddressed {
                device: csma_devices[csma_devices.len() - 1],
                node: sink_node,
            })?;
        let sink = install_sink(&mut world, &mut sim, sink_node, cfg.port, sink_window)?;

        let rate = match cfg.max_packets {
            0 => SendRate::from_bitrate(cfg.packet_size, cfg.source_rate_bps)?,
            n => SendRate::Count {
                packets: n,
                interval: crate::app::interval_for_rate(cfg.packet_size, cfg.source_rate_bps)?,
            },
        };
        let sources = install_sources(
            &mut world,
            &mut sim,
            &stations,
            sink_addr,
            cfg.port,
            source_window,
            cfg.packet_size,
            rate,
        )?;

        // 全局路由：拓扑到此为止
        world.net.populate_routing_tables()?;

        // horizon 不早于最后一个应用停止
        let horizon = SimTime::from_secs_f64(cfg.horizon_s);
        let latest_stop = sources
            .iter()
            .map(|s| s.window().stop)
            .chain(std::iter::once(sink.window().stop))
            .max()
            .unwrap_or(SimTime::ZERO);
        if horizon < latest_stop {
            return Err(ScenarioError::HorizonTooShort {
                horizon,
                latest_stop,
            });
        }
        sim.set_stop_time(horizon);

        let topology = Topology {
            p2p_nodes: [ap, router],
            csma_nodes,
            wifi_stations: stations,
            ap,
            p2p_devices,
            csma_devices,
            cell,
            p2p_addresses,
            csma_addresses,
            wifi_addresses,
            sink,
            sources,
        };

        let captures = if cfg.tracing {
            enable_captures(&mut world, &topology, cfg)
        } else {
            Vec::new()
        };

        info!(
            nodes = world.net.nodes().len(),
            devices = world.net.devices().len(),
            applications = world.apps.len(),
            horizon = %horizon,
            "🏗️  场景装配完成"
        );
        Ok(AssembledScenario {
            config: cfg.clone(),
            sim,
            world,
            topology,
            horizon,
            captures,
        })
    }
}

/// 在点对点两端、AP 与总线第一个设备上开启抓包；失败只记录日志
fn enable_captures(world: &mut NetWorld, topo: &Topology, cfg: &ScenarioConfig) -> Vec<PathBuf> {
    let targets = [
        topo.p2p_devices.0,
        topo.p2p_devices.1,
        topo.cell.ap,
        topo.csma_devices[0],
    ];
    targets
        .iter()
        .filter_map(|&dev| {
            match world
                .net
                .enable_capture(dev, &cfg.pcap_prefix, &cfg.pcap_dir)
            {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(%err, "抓包未开启");
                    None
                }
            }
        })
        .collect()
}

/// 装配完成、尚未运行的场景
pub struct AssembledScenario {
    config: ScenarioConfig,
    sim: Simulator,
    world: NetWorld,
    topology: Topology,
    horizon: SimTime,
    captures: Vec<PathBuf>,
}

impl AssembledScenario {
    pub fn world(&self) -> &NetWorld {
        &self.world
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    pub fn captures(&self) -> &[PathBuf] {
        &self.captures
    }

    /// 在运行前注入一个额外事件（用于故障注入等测试场景）
    pub fn schedule<E: crate::sim::Event>(&mut self, at: SimTime, ev: E) {
        self.sim.schedule(at, ev);
    }

    /// 运行到 horizon，然后无条件销毁引擎
    pub fn run(mut self) -> Result<ScenarioReport, ScenarioError> {
        let result = self.sim.run(&mut self.world);
        let discarded = self.sim.destroy(&mut self.world);
        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                error!(%err, discarded, "❌ 仿真运行失败，已销毁引擎");
                return Err(err.into());
            }
        };
        let report = ScenarioReport::collect(
            &self.config,
            &self.world,
            &self.topology,
            summary,
            discarded,
            &self.captures,
        );
        info!("{}", report.summary_line());
        Ok(report)
    }
}
