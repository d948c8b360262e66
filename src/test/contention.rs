use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::addr::{AddressAllocator, AddressRange};
use crate::mobility::{GridConfig, place_grid};
use crate::net::{ConfigError, Network, Txop, WifiRole};
use crate::topo::{ContentionConfigurator, WifiCell, WifiHelper};

fn cell(net: &mut Network, stations: usize) -> WifiCell {
    let sta = net.create_nodes("sta", stations).expect("stations");
    let ap = net.add_node("ap").expect("ap");
    WifiHelper::default().install(net, &sta, ap).expect("wifi")
}

#[test]
fn min_cw_set_through_ap_handle_reads_back() {
    let mut net = Network::default();
    let cell = cell(&mut net, 4);
    assert_eq!(ContentionConfigurator::min_cw(&net, &cell.ap_mac), Ok(15));

    ContentionConfigurator::set_min_cw(&mut net, &cell.ap_mac, 63).expect("set");
    assert_eq!(ContentionConfigurator::min_cw(&net, &cell.ap_mac), Ok(63));

    // 取值原样透传，包括 0
    ContentionConfigurator::set_min_cw(&mut net, &cell.ap_mac, 0).expect("set zero");
    assert_eq!(ContentionConfigurator::min_cw(&net, &cell.ap_mac), Ok(0));
}

#[test]
fn stations_adopt_the_advertised_min_cw() {
    let mut net = Network::default();
    let cell = cell(&mut net, 2);
    ContentionConfigurator::set_min_cw(&mut net, &cell.ap_mac, 63).expect("set");

    let advertised = Some(63);
    for &sta in &cell.stations {
        assert_eq!(net.effective_min_cw(sta, advertised), Some(63));
        let mac = net.device(sta).expect("sta").wifi_mac().expect("wifi");
        assert!(!mac.active_probing);
        assert!(!mac.qos_supported);
        assert_eq!(mac.ssid, "ns-3-ssid");
    }
    assert_eq!(net.effective_min_cw(cell.ap, advertised), Some(63));
}

#[test]
fn ap_handle_is_issued_only_for_the_access_point() {
    let mut net = Network::default();
    let cell = cell(&mut net, 3);
    assert_eq!(cell.ap_mac.device(), cell.ap);

    let ap = net.device(cell.ap).expect("ap").wifi_mac().expect("wifi");
    assert_eq!(ap.role, WifiRole::AccessPoint);
    for &sta in &cell.stations {
        assert_ne!(sta, cell.ap_mac.device());
        let mac = net.device(sta).expect("sta").wifi_mac().expect("wifi");
        assert_eq!(mac.role, WifiRole::Station);
    }
}

#[test]
fn wifi_install_requires_stations() {
    let mut net = Network::default();
    let ap = net.add_node("ap").expect("ap");
    assert_eq!(
        WifiHelper::default().install(&mut net, &[], ap),
        Err(ConfigError::NoStations)
    );
}

#[test]
fn min_cw_cannot_change_after_routing_is_populated() {
    let mut net = Network::default();
    let cell = cell(&mut net, 2);
    AddressAllocator::new()
        .assign(&mut net, AddressRange::slash24(10, 1, 3), &cell.all_devices())
        .expect("addresses");
    let placed: Vec<_> = net.nodes().iter().map(|n| n.id()).collect();
    place_grid(&mut net, &placed, &GridConfig::default()).expect("place");
    net.populate_routing_tables().expect("routing");

    assert_eq!(
        ContentionConfigurator::set_min_cw(&mut net, &cell.ap_mac, 63),
        Err(ConfigError::TopologySealed)
    );
    assert_eq!(ContentionConfigurator::min_cw(&net, &cell.ap_mac), Ok(15));
}

#[test]
fn txop_window_doubles_on_failure_up_to_max() {
    let mut txop = Txop::new(15, 1023);
    let mut seen = Vec::new();
    for _ in 0..7 {
        assert!(!txop.on_failure(15, 10));
        seen.push(txop.current_cw(15));
    }
    assert_eq!(seen, vec![31, 63, 127, 255, 511, 1023, 1023]);

    txop.on_success();
    assert_eq!(txop.current_cw(15), 15);
    assert_eq!(txop.retries(), 0);
}

#[test]
fn txop_gives_up_after_retry_limit() {
    let mut txop = Txop::new(15, 1023);
    for _ in 0..3 {
        assert!(!txop.on_failure(15, 3));
    }
    assert!(txop.on_failure(15, 3));
    assert_eq!(txop.retries(), 0);
    assert_eq!(txop.current_cw(15), 15);
}

#[test]
fn txop_min_cw_above_max_raises_the_ceiling() {
    let mut txop = Txop::new(2047, 1023);
    assert!(!txop.on_failure(2047, 7));
    assert_eq!(txop.current_cw(2047), 2047);
}

#[test]
fn txop_backoff_is_drawn_once_and_frozen_between_rounds() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut txop = Txop::new(15, 1023);
    let first = txop.draw_backoff(15, &mut rng);
    assert!(first <= 15);
    assert_eq!(txop.draw_backoff(15, &mut rng), first);

    txop.elapse(first.min(3));
    assert_eq!(txop.backoff(), Some(first - first.min(3)));

    for _ in 0..200 {
        let mut t = Txop::new(63, 1023);
        assert!(t.draw_backoff(63, &mut rng) <= 63);
    }
}
