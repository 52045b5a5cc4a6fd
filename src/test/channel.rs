use crate::channel::{Direction, Fate, FaultModel, Link, NoFaults, RandomFaults, ScriptedFaults};
use crate::proto::Packet;
use crate::sim::SimTime;

#[test]
fn link_never_reorders_even_if_latency_shrinks() {
    let mut link = Link::new(SimTime(10));
    assert_eq!(link.arrival(SimTime(0)), SimTime(10));
    link.latency = SimTime(1);
    assert_eq!(link.arrival(SimTime(2)), SimTime(10));
    assert_eq!(link.arrival(SimTime(20)), SimTime(21));
}

#[test]
fn scripted_faults_fire_once_per_rule() {
    let mut f = ScriptedFaults::new()
        .drop_nth(Direction::ToReceiver, 2)
        .corrupt_seq(Direction::ToSender, 3);
    let p = Packet::ack(3);

    assert_eq!(f.judge(Direction::ToReceiver, &p), Fate::Deliver);
    assert_eq!(f.judge(Direction::ToReceiver, &p), Fate::Drop);
    assert_eq!(f.judge(Direction::ToReceiver, &p), Fate::Deliver);

    assert_eq!(f.judge(Direction::ToSender, &Packet::ack(1)), Fate::Deliver);
    assert_eq!(f.judge(Direction::ToSender, &p), Fate::Corrupt);
    assert_eq!(f.judge(Direction::ToSender, &p), Fate::Deliver);
}

#[test]
fn injected_corruption_is_always_detectable() {
    let mut scripted = ScriptedFaults::new();
    assert!(scripted.corrupt(Packet::ack(4)).is_corrupt());

    let mut random = RandomFaults::new(7, 0.0, 1.0);
    for seq in 1..200 {
        let p = Packet::ack(seq);
        assert_eq!(random.judge(Direction::ToSender, &p), Fate::Corrupt);
        assert!(random.corrupt(p).is_corrupt(), "corruption of {seq} went unnoticed");
    }
}

#[test]
fn random_faults_are_reproducible_for_a_seed() {
    let p = Packet::ack(1);
    let run = |seed| {
        let mut f = RandomFaults::new(seed, 0.3, 0.3);
        (0..64)
            .map(|_| f.judge(Direction::ToReceiver, &p))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(42), run(42));
    assert!(run(42).contains(&Fate::Drop));
}

#[test]
fn fault_probabilities_are_clamped() {
    let p = Packet::ack(1);
    let mut never = RandomFaults::new(1, -0.5, f64::NAN);
    let mut always = RandomFaults::new(1, 7.0, 0.0);
    for _ in 0..32 {
        assert_eq!(never.judge(Direction::ToReceiver, &p), Fate::Deliver);
        assert_eq!(always.judge(Direction::ToReceiver, &p), Fate::Drop);
    }
    assert_eq!(NoFaults.judge(Direction::ToSender, &p), Fate::Deliver);
}
