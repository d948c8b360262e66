use std::net::Ipv4Addr;

use crate::addr::{AddressAllocator, AddressRange};
use crate::app::{
    ActiveWindow, SendRate, TrafficError, UdpServer, check_containment, install_sink,
    install_sources, interval_for_rate,
};
use crate::net::{NetWorld, NodeId, Packet};
use crate::sim::{SimTime, Simulator};
use crate::topo::PointToPointHelper;

/// 两个节点的点对点链路，地址 10.1.1.1 / 10.1.1.2
fn wired_pair(world: &mut NetWorld) -> Vec<NodeId> {
    let nodes = world.net.create_nodes("n", 2).expect("nodes");
    let (da, db) = PointToPointHelper::default()
        .install(&mut world.net, nodes[0], nodes[1])
        .expect("p2p");
    AddressAllocator::new()
        .assign(&mut world.net, AddressRange::slash24(10, 1, 1), &[da, db])
        .expect("addresses");
    nodes
}

fn window() -> ActiveWindow {
    ActiveWindow::from_secs(0.0, 1.0).expect("window")
}

fn every_ms() -> SendRate {
    SendRate::Count {
        packets: 1,
        interval: SimTime::from_millis(1),
    }
}

#[test]
fn interval_for_default_rate_is_exact() {
    let interval = interval_for_rate(1500, 10_000_000).expect("exact");
    assert_eq!(interval, SimTime(1_200_000));
    assert_eq!(interval.as_secs_f64(), 0.0012);

    let rate = SendRate::from_bitrate(1500, 10_000_000).expect("rate");
    assert_eq!(rate, SendRate::Unlimited { interval });
}

#[test]
fn interval_that_is_not_whole_nanoseconds_is_rejected() {
    assert_eq!(
        interval_for_rate(1000, 3),
        Err(TrafficError::InexactInterval {
            packet_bytes: 1000,
            rate_bps: 3
        })
    );
    assert_eq!(interval_for_rate(1500, 0), Err(TrafficError::ZeroRate));
}

#[test]
fn interval_scales_with_packet_size() {
    assert_eq!(interval_for_rate(1000, 8_000_000), Ok(SimTime::from_millis(1)));
    assert_eq!(interval_for_rate(125, 1_000), Ok(SimTime::from_secs(1)));
}

#[test]
fn sink_window_must_contain_every_source_window() {
    let sink = ActiveWindow::from_secs(1.0, 31.0).expect("sink");
    let source = ActiveWindow::from_secs(2.0, 22.0).expect("source");
    assert!(check_containment(&sink, &[source]).is_ok());

    let late = ActiveWindow::from_secs(2.0, 32.0).expect("late");
    assert_eq!(
        check_containment(&sink, &[source, late]),
        Err(TrafficError::WindowNotContained {
            sink,
            source_window: late
        })
    );

    let early = ActiveWindow::from_secs(0.5, 10.0).expect("early");
    assert!(check_containment(&sink, &[early]).is_err());
}

#[test]
fn window_must_end_after_it_starts() {
    assert!(matches!(
        ActiveWindow::from_secs(5.0, 5.0),
        Err(TrafficError::InvalidWindow { .. })
    ));
    let w = ActiveWindow::new(SimTime::from_secs(1), SimTime::from_secs(31)).expect("window");
    assert!(w.contains(&w));
}

#[test]
fn interval_beyond_the_nanosecond_clock_is_an_overflow() {
    assert_eq!(
        interval_for_rate(u32::MAX, 1),
        Err(TrafficError::IntervalOverflow {
            packet_bytes: u32::MAX,
            rate_bps: 1
        })
    );
    // 同样的包长，速率足够时仍可表示
    assert!(interval_for_rate(u32::MAX, 8).is_ok());
}

#[test]
fn port_can_be_bound_once_per_node() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let nodes = wired_pair(&mut world);
    install_sink(&mut world, &mut sim, nodes[1], 9, window()).expect("first sink");

    assert_eq!(
        install_sink(&mut world, &mut sim, nodes[1], 9, window()),
        Err(TrafficError::PortInUse {
            node: nodes[1],
            port: 9
        })
    );
    // 其他端口、其他节点不受影响
    install_sink(&mut world, &mut sim, nodes[1], 10, window()).expect("other port");
    install_sink(&mut world, &mut sim, nodes[0], 9, window()).expect("other node");
    assert_eq!(world.apps.servers().count(), 3);
}

#[test]
fn sources_need_an_assigned_destination() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let nodes = wired_pair(&mut world);
    let nowhere = Ipv4Addr::new(192, 168, 0, 1);

    assert_eq!(
        install_sources(
            &mut world,
            &mut sim,
            &nodes[..1],
            nowhere,
            9,
            window(),
            100,
            every_ms()
        ),
        Err(TrafficError::UnknownDestination(nowhere))
    );
    assert_eq!(world.apps.clients().count(), 0);
}

#[test]
fn packet_must_hold_sequence_and_timestamp() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let nodes = wired_pair(&mut world);
    let dst = Ipv4Addr::new(10, 1, 1, 2);

    assert_eq!(
        install_sources(
            &mut world,
            &mut sim,
            &nodes[..1],
            dst,
            9,
            window(),
            11,
            every_ms()
        ),
        Err(TrafficError::PacketTooSmall(11))
    );
    install_sources(&mut world, &mut sim, &nodes[..1], dst, 9, window(), 12, every_ms())
        .expect("12-byte payload");
    assert_eq!(world.apps.clients().count(), 1);
}

#[test]
fn sink_throughput_counts_lost_leading_packets() {
    let mut server = UdpServer::new(NodeId(1), 9);
    // 序号 0..=2 丢失，只有序号 3 到达
    let pkt = Packet {
        id: 3,
        src: Ipv4Addr::new(10, 1, 3, 1),
        src_port: 49153,
        dst: Ipv4Addr::new(10, 1, 2, 4),
        dst_port: 9,
        payload_bytes: 1000,
        seq: 3,
        sent_at: SimTime::from_millis(500),
        hops: 0,
    };
    server.on_packet(&pkt, SimTime::from_secs(1));

    assert_eq!(server.lost_pkts(), 3);
    let throughput = server
        .throughput_since(SimTime::from_millis(200))
        .expect("throughput");
    assert!((throughput - 1250.0).abs() < 1e-6, "{throughput}");
    assert_eq!(server.throughput_since(SimTime::from_secs(1)), None);
}
