use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::addr::{AddressAllocator, AddressError, AddressRange};
use crate::net::{DeviceId, Network};
use crate::topo::{CsmaHelper, PointToPointHelper};

fn lan(net: &mut Network, n: usize) -> Vec<DeviceId> {
    let nodes = net.create_nodes("lan", n).expect("nodes");
    CsmaHelper::default().install(net, &nodes).expect("csma")
}

#[test]
fn address_range_parses_prefix_and_dotted_mask() {
    let a: AddressRange = "10.1.1.0/24".parse().expect("prefix");
    let b: AddressRange = "10.1.1.0/255.255.255.0".parse().expect("mask");
    assert_eq!(a, b);
    assert_eq!(a, AddressRange::slash24(10, 1, 1));
    assert_eq!(a.prefix_len(), 24);
    assert_eq!(a.host_count(), 254);
    assert_eq!(a.host(0), Some(Ipv4Addr::new(10, 1, 1, 1)));
    assert_eq!(a.host(253), Some(Ipv4Addr::new(10, 1, 1, 254)));
    assert_eq!(a.host(254), None);
    assert_eq!(a.to_string(), "10.1.1.0/24");
}

#[test]
fn address_range_rejects_malformed_input() {
    assert!(matches!(
        "10.1.1.0".parse::<AddressRange>(),
        Err(AddressError::Parse(_))
    ));
    assert!(matches!(
        "10.1.1.0/255.0.255.0".parse::<AddressRange>(),
        Err(AddressError::InvalidRange { .. })
    ));
    assert!(matches!(
        "10.1.1.7/24".parse::<AddressRange>(),
        Err(AddressError::InvalidRange { .. })
    ));
    assert!(matches!(
        "10.1.1.0/33".parse::<AddressRange>(),
        Err(AddressError::Parse(_))
    ));
}

#[test]
fn address_range_host_count_handles_edge_prefixes() {
    let all: AddressRange = "0.0.0.0/0".parse().expect("/0");
    assert_eq!(all.host_count(), u32::MAX - 1);
    let p2p: AddressRange = "10.0.0.0/31".parse().expect("/31");
    assert_eq!(p2p.host_count(), 2);
    assert_eq!(p2p.host(0), Some(Ipv4Addr::new(10, 0, 0, 0)));
}

#[test]
fn allocator_assigns_in_input_order_from_network_plus_one() {
    let mut net = Network::default();
    let devs = lan(&mut net, 4);
    let mut alloc = AddressAllocator::new();

    let assigned = alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 2), &devs)
        .expect("assign");
    assert_eq!(assigned.len(), 4);
    for (i, &dev) in devs.iter().enumerate() {
        let expect = Ipv4Addr::new(10, 1, 2, i as u8 + 1);
        assert_eq!(assigned.address(i), Some(expect));
        assert_eq!(assigned.device(i), Some(dev));
        assert_eq!(net.address_of(dev), Some(expect));
        assert_eq!(net.owner_of(expect), Some(dev));
        assert_eq!(net.device(dev).expect("device").prefix_len, 24);
    }
}

#[test]
fn allocator_keeps_three_segments_disjoint() {
    let mut net = Network::default();
    let nodes = net.create_nodes("n", 2).expect("nodes");
    let (a, b) = PointToPointHelper::default()
        .install(&mut net, nodes[0], nodes[1])
        .expect("p2p");
    let csma = lan(&mut net, 4);
    let more = lan(&mut net, 5);

    let mut alloc = AddressAllocator::new();
    alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 1), &[a, b])
        .expect("p2p range");
    alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 2), &csma)
        .expect("csma range");
    alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 3), &more)
        .expect("third range");

    let ranges = alloc.used_ranges();
    assert_eq!(ranges.len(), 3);
    for (i, r) in ranges.iter().enumerate() {
        for other in &ranges[i + 1..] {
            assert!(!r.overlaps(other));
        }
    }
    let unique: HashSet<Ipv4Addr> = net.devices().iter().filter_map(|d| d.address).collect();
    assert_eq!(unique.len(), net.devices().len());
}

#[test]
fn allocator_rejects_overlapping_range_without_side_effects() {
    let mut net = Network::default();
    let first = lan(&mut net, 2);
    let second = lan(&mut net, 2);
    let mut alloc = AddressAllocator::new();
    alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 2), &first)
        .expect("first");

    let wide: AddressRange = "10.1.0.0/16".parse().expect("range");
    let err = alloc.assign(&mut net, wide, &second).expect_err("conflict");
    assert!(matches!(err, AddressError::RangeConflict { .. }));
    assert!(second.iter().all(|&d| net.address_of(d).is_none()));
    assert_eq!(alloc.used_ranges().len(), 1);
}

#[test]
fn allocator_reports_exhausted_range() {
    let mut net = Network::default();
    let devs = lan(&mut net, 3);
    let tiny: AddressRange = "10.9.9.0/30".parse().expect("range");
    let err = AddressAllocator::new()
        .assign(&mut net, tiny, &devs)
        .expect_err("only 2 hosts");
    assert!(matches!(
        err,
        AddressError::RangeExhausted {
            hosts: 2,
            requested: 3,
            ..
        }
    ));
    assert!(devs.iter().all(|&d| net.address_of(d).is_none()));
}

#[test]
fn allocator_refuses_to_readdress_a_device() {
    let mut net = Network::default();
    let devs = lan(&mut net, 2);
    let mut alloc = AddressAllocator::new();
    alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 2), &devs)
        .expect("first");
    let err = alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 3), &devs[..1])
        .expect_err("already assigned");
    assert_eq!(err, AddressError::AlreadyAssigned(devs[0]));

    let dup = lan(&mut net, 2);
    let err = alloc
        .assign(&mut net, AddressRange::slash24(10, 1, 4), &[dup[0], dup[0]])
        .expect_err("duplicate device");
    assert_eq!(err, AddressError::AlreadyAssigned(dup[0]));
}
