use super::ms;
use crate::channel::{
    Direction, FaultModel, NoFaults, RandomFaults, RdtWorld, ScriptedFaults, numbered_message,
    schedule_messages,
};
use crate::proto::{Message, Mode, ProtocolConfig};
use crate::sim::{SimTime, Simulator};
use crate::viz::VizEventKind;

const MODES: [Mode; 3] = [Mode::AlternatingBit, Mode::GoBackN, Mode::SelectiveRepeat];

fn transfer(
    mode: Mode,
    window: u32,
    count: u64,
    interval: SimTime,
    faults: impl FaultModel + 'static,
) -> (Simulator, RdtWorld) {
    let cfg = ProtocolConfig::for_mode(mode, window);
    let mut sim = Simulator::default();
    let mut world = RdtWorld::new(&cfg, ms(5), Box::new(faults));
    world.enable_viz(&cfg);
    schedule_messages(&mut sim, count, SimTime::ZERO, interval);

    let limit = cfg.effective_window() as usize;
    while sim.step(&mut world) {
        assert!(
            world.sender.in_flight_len() <= limit,
            "{mode:?}: {} in flight with window {limit}",
            world.sender.in_flight_len()
        );
    }
    (sim, world)
}

fn expected(count: u64) -> Vec<Message> {
    (1..=count).map(numbered_message).collect()
}

fn assert_complete(world: &RdtWorld, count: u64) {
    assert_eq!(world.delivered(), expected(count).as_slice());
    assert!(world.sender.is_idle());
    assert_eq!(world.sender.backlog_len(), 0);
    assert_eq!(world.receiver.recv_base(), count + 1);
    assert!(!world.timer_armed());
}

fn retransmissions(world: &RdtWorld) -> usize {
    world
        .channel
        .viz
        .as_ref()
        .expect("viz enabled")
        .count(|k| matches!(k, VizEventKind::SendData { retrans: true, .. }))
}

#[test]
fn lossless_channel_delivers_everything_without_retransmission() {
    for mode in MODES {
        let (_, world) = transfer(mode, 4, 20, ms(1), NoFaults);
        assert_complete(&world, 20);
        assert_eq!(world.sender.stats().retransmitted, 0, "{mode:?}");
        assert_eq!(world.sender.stats().timeouts, 0, "{mode:?}");
    }
}

#[test]
fn sr_lost_data_packet_is_the_only_retransmission() {
    let faults = ScriptedFaults::new().drop_seq(Direction::ToReceiver, 1);
    let (_, world) = transfer(Mode::SelectiveRepeat, 4, 6, SimTime::ZERO, faults);
    assert_complete(&world, 6);
    assert_eq!(world.sender.stats().retransmitted, 1);
    assert_eq!(retransmissions(&world), 1);
    assert_eq!(world.receiver.stats().buffered, 6);
}

#[test]
fn gbn_lost_data_packet_resends_the_window() {
    let faults = ScriptedFaults::new().drop_seq(Direction::ToReceiver, 1);
    let (_, world) = transfer(Mode::GoBackN, 4, 6, SimTime::ZERO, faults);
    assert_complete(&world, 6);
    assert_eq!(world.sender.stats().retransmitted, 4);
    assert_eq!(world.receiver.stats().discarded, 3);
}

#[test]
fn sr_lost_ack_is_recovered_by_duplicate_reack() {
    let faults = ScriptedFaults::new().drop_seq(Direction::ToSender, 1);
    let (_, world) = transfer(Mode::SelectiveRepeat, 4, 6, SimTime::ZERO, faults);
    assert_complete(&world, 6);
    assert_eq!(world.sender.stats().retransmitted, 1);
    assert_eq!(world.receiver.stats().duplicates, 1);
    assert_eq!(world.receiver.stats().delivered, 6);
}

#[test]
fn gbn_later_cumulative_ack_covers_a_lost_one() {
    let faults = ScriptedFaults::new().drop_seq(Direction::ToSender, 1);
    let (_, world) = transfer(Mode::GoBackN, 4, 6, SimTime::ZERO, faults);
    assert_complete(&world, 6);
    assert_eq!(world.sender.stats().retransmitted, 0);
}

#[test]
fn corrupted_packets_in_both_directions_are_recovered() {
    for mode in MODES {
        let faults = ScriptedFaults::new()
            .corrupt_nth(Direction::ToReceiver, 3)
            .corrupt_nth(Direction::ToSender, 2)
            .drop_nth(Direction::ToReceiver, 5);
        let (_, world) = transfer(mode, 3, 12, ms(2), faults);
        assert_complete(&world, 12);
        assert!(world.sender.stats().retransmitted > 0, "{mode:?}");
        assert_eq!(world.channel.stats.corrupted, 2);
    }
}

#[test]
fn random_loss_and_corruption_still_deliver_exactly_once_in_order() {
    for mode in MODES {
        for seed in [1, 7, 2024] {
            let (_, world) = transfer(mode, 5, 80, ms(3), RandomFaults::new(seed, 0.2, 0.2));
            assert_complete(&world, 80);
            assert_eq!(world.receiver.stats().delivered, 80, "{mode:?} seed={seed}");
            let rto = world.sender.current_rto();
            assert!(rto >= ms(10) && rto <= ms(36), "{mode:?}: rto {rto:?}");
        }
    }
}

#[test]
fn lossless_run_drains_the_queue_without_timeouts() {
    let (sim, world) = transfer(Mode::SelectiveRepeat, 4, 3, ms(1), NoFaults);
    assert_complete(&world, 3);
    assert_eq!(sim.pending(), 0);
    let timeouts = world
        .channel
        .viz
        .as_ref()
        .expect("viz enabled")
        .count(|k| matches!(k, VizEventKind::Timeout { .. }));
    assert_eq!(timeouts, 0);
}
