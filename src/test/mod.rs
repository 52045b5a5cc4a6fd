mod channel;
mod config;
mod end_to_end;

use crate::proto::{Env, Message, Packet};
use crate::sim::SimTime;

pub(crate) fn ms(v: u64) -> SimTime {
    SimTime::from_millis(v)
}

/// 记录端点所有对外调用的假环境；时间由测试手动推进。
#[derive(Debug, Default)]
pub(crate) struct RecordingEnv {
    pub now: SimTime,
    pub sent: Vec<Packet>,
    pub delivered: Vec<Message>,
    /// 定时器的绝对到期时间
    pub timer: Option<SimTime>,
    pub timer_starts: usize,
    pub timer_stops: usize,
}

impl RecordingEnv {
    pub fn at(&mut self, t: SimTime) -> &mut Self {
        self.now = t;
        self
    }

    pub fn sent_seqnums(&self) -> Vec<i32> {
        self.sent.iter().map(|p| p.seqnum).collect()
    }
}

impl Env for RecordingEnv {
    fn now(&self) -> SimTime {
        self.now
    }

    fn to_channel(&mut self, pkt: Packet) {
        self.sent.push(pkt);
    }

    fn to_application(&mut self, msg: Message) {
        self.delivered.push(msg);
    }

    fn start_timer(&mut self, after: SimTime) {
        self.timer = Some(self.now.saturating_add(after));
        self.timer_starts += 1;
    }

    fn stop_timer(&mut self) {
        self.timer = None;
        self.timer_stops += 1;
    }
}
