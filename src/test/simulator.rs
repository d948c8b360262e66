use crate::sim::{EngineError, Event, SimTime, Simulator, World};
use std::any::Any;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DummyWorld {
    ticks: usize,
    teardowns: usize,
    fail_teardown: bool,
}

impl World for DummyWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks = self.ticks.saturating_add(1);
    }

    fn teardown(&mut self) -> Result<(), String> {
        self.teardowns += 1;
        if self.fail_teardown {
            Err("disk full".to_string())
        } else {
            Ok(())
        }
    }
}

struct Push {
    id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for Push {
    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) {
        let Push { id, log } = *self;
        log.lock().expect("log lock").push(id);
    }
}

struct PushThenScheduleNow {
    id: u32,
    next_id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for PushThenScheduleNow {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let PushThenScheduleNow { id, next_id, log } = *self;
        log.lock().expect("log lock").push(id);
        sim.schedule(sim.now(), Push { id: next_id, log });
    }
}

struct Fail;

impl Event for Fail {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        sim.fault("injected");
    }
}

/// 每次执行都在 1ns 之后再调度自己
struct Forever;

impl Event for Forever {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        sim.schedule_in(SimTime(1), Forever);
    }
}

#[test]
fn scheduled_events_order_by_time_then_seq() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(10),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        SimTime(5),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        SimTime(10),
        Push {
            id: 3,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    let summary = sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[2, 1, 3]);
    assert_eq!(world.ticks, 3);
    assert_eq!(summary.events, 3);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn event_scheduled_at_same_time_inside_event_runs_after_current_event() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime::ZERO,
        PushThenScheduleNow {
            id: 1,
            next_id: 2,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), SimTime::ZERO);
}

#[test]
fn run_until_skips_events_after_until_and_advances_time() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime::ZERO,
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        SimTime(10),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run_until(SimTime(5), &mut world).expect("run_until");

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(world.ticks, 1);
    assert_eq!(sim.now(), SimTime(5));

    sim.run(&mut world).expect("run");
    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn run_until_executes_events_scheduled_exactly_at_until() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(5),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run_until(SimTime(5), &mut world).expect("run_until");

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(world.ticks, 1);
    assert_eq!(sim.now(), SimTime(5));
}

#[test]
fn run_until_advances_time_even_if_there_are_no_events() {
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();

    sim.run_until(SimTime(7), &mut world).expect("run_until");
    assert_eq!(sim.now(), SimTime(7));
    assert_eq!(world.ticks, 0);
}

#[test]
fn stop_time_leaves_later_events_pending() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = Simulator::default();
    sim.set_stop_time(SimTime(100));
    for (id, at) in [(1, 50), (2, 100), (3, 101)] {
        sim.schedule(
            SimTime(at),
            Push {
                id,
                log: Arc::clone(&log),
            },
        );
    }

    let mut world = DummyWorld::default();
    let summary = sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(summary.pending_at_stop, 1);
    assert_eq!(summary.final_time_ns, 100);
}

#[test]
fn scheduling_in_the_past_runs_at_now() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();
    sim.run_until(SimTime(20), &mut world).expect("run_until");

    sim.schedule(
        SimTime(3),
        Push {
            id: 9,
            log: Arc::clone(&log),
        },
    );
    sim.run(&mut world).expect("run");
    assert_eq!(&*log.lock().expect("log lock"), &[9]);
    assert_eq!(sim.now(), SimTime(20));
}

#[test]
fn fault_aborts_run_after_current_event() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = Simulator::default();
    sim.schedule(SimTime(5), Fail);
    sim.schedule(
        SimTime(6),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    let err = sim.run(&mut world).expect_err("fault must surface");
    match err {
        EngineError::Fault { at, reason } => {
            assert_eq!(at, SimTime(5));
            assert_eq!(reason, "injected");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(log.lock().expect("log lock").is_empty());
    assert_eq!(sim.pending(), 1);
}

#[test]
fn event_limit_stops_runaway_schedules() {
    let mut sim = Simulator::default();
    sim.set_event_limit(1_000);
    sim.schedule(SimTime::ZERO, Forever);

    let mut world = DummyWorld::default();
    let err = sim.run(&mut world).expect_err("budget must trip");
    assert!(matches!(
        err,
        EngineError::EventBudgetExhausted { limit: 1_000, .. }
    ));
    assert_eq!(sim.executed(), 1_000);
}

#[test]
fn destroy_discards_pending_events_and_refuses_to_run_again() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = Simulator::default();
    for id in 0..3 {
        sim.schedule(
            SimTime(10),
            Push {
                id,
                log: Arc::clone(&log),
            },
        );
    }

    let mut world = DummyWorld {
        fail_teardown: true,
        ..DummyWorld::default()
    };
    assert_eq!(sim.destroy(&mut world), 3);
    assert_eq!(world.teardowns, 1);
    assert!(sim.is_destroyed());
    assert_eq!(sim.pending(), 0);
    assert!(matches!(sim.run(&mut world), Err(EngineError::Destroyed)));
    assert!(log.lock().expect("log lock").is_empty());
}
