//! 信道事件：应用层提交、数据包到达、发送端定时器到期。

use super::faults::Direction;
use super::world::RdtWorld;
use crate::proto::{Message, Packet};
use crate::sim::{Event, SimTime, Simulator, World};

fn rdt_world(world: &mut dyn World) -> &mut RdtWorld {
    world
        .as_any_mut()
        .downcast_mut::<RdtWorld>()
        .expect("world must be RdtWorld")
}

/// 事件：应用层把一条消息交给发送端
#[derive(Debug)]
pub struct AppSubmit {
    pub msg: Message,
}

impl Event for AppSubmit {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let AppSubmit { msg } = *self;
        rdt_world(world).submit(msg, sim);
    }
}

/// 事件：packet 到达链路另一端
#[derive(Debug)]
pub struct PacketArrive {
    pub dir: Direction,
    pub pkt: Packet,
}

impl Event for PacketArrive {
    #[tracing::instrument(level = "trace", skip(self, sim, world), fields(dir = ?self.dir, seqnum = self.pkt.seqnum))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let PacketArrive { dir, pkt } = *self;
        rdt_world(world).deliver(dir, pkt, sim);
    }
}

/// 事件：发送端定时器到期（epoch 不是最新的说明已被重置或停止）
#[derive(Debug)]
pub struct TimerFire {
    pub epoch: u64,
}

impl Event for TimerFire {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TimerFire { epoch } = *self;
        rdt_world(world).fire_timer(epoch, sim);
    }
}

/// 第 i 条消息（从 1 开始）的内容："msg-00001" 之类，补零到 payload 长度
pub fn numbered_message(i: u64) -> Message {
    Message::from(format!("msg-{i:05}").as_str())
}

/// 从 `start` 起每隔 `interval` 提交一条消息，共 `count` 条
pub fn schedule_messages(sim: &mut Simulator, count: u64, start: SimTime, interval: SimTime) {
    for i in 0..count {
        let at = start.saturating_add(interval.saturating_mul(i));
        sim.schedule(
            at,
            AppSubmit {
                msg: numbered_message(i + 1),
            },
        );
    }
}
