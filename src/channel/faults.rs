//! 故障注入：决定每个进入信道的包是正常送达、丢失还是损坏。
//!
//! 损坏只改动一个字段、不修正 checksum，接收方一定能检测出来。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::proto::Packet;
use crate::viz::VizDirection;

/// 信道方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// 发送端 -> 接收端（数据）
    ToReceiver,
    /// 接收端 -> 发送端（ACK）
    ToSender,
}

impl Direction {
    fn index(self) -> usize {
        match self {
            Direction::ToReceiver => 0,
            Direction::ToSender => 1,
        }
    }
}

impl From<Direction> for VizDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::ToReceiver => VizDirection::Forward,
            Direction::ToSender => VizDirection::Reverse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Deliver,
    Drop,
    Corrupt,
}

pub trait FaultModel {
    fn judge(&mut self, dir: Direction, pkt: &Packet) -> Fate;

    /// 对要损坏的包做一次改动；默认把第一个 payload 字节加 1
    fn corrupt(&mut self, mut pkt: Packet) -> Packet {
        pkt.payload[0] = pkt.payload[0].wrapping_add(1);
        pkt
    }
}

/// 理想信道
#[derive(Debug, Default)]
pub struct NoFaults;

impl FaultModel for NoFaults {
    fn judge(&mut self, _dir: Direction, _pkt: &Packet) -> Fate {
        Fate::Deliver
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    /// 该方向上第 n 个包（从 1 开始）
    Nth(usize),
    /// 该方向上第一个 seqnum 等于给定值的包
    FirstSeq(i32),
}

#[derive(Debug, Clone)]
struct Rule {
    dir: Direction,
    trigger: Trigger,
    fate: Fate,
    fired: bool,
}

/// 按脚本注入故障，每条规则只触发一次。
#[derive(Debug, Default)]
pub struct ScriptedFaults {
    rules: Vec<Rule>,
    seen: [usize; 2],
}

impl ScriptedFaults {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(mut self, dir: Direction, trigger: Trigger, fate: Fate) -> Self {
        self.rules.push(Rule {
            dir,
            trigger,
            fate,
            fired: false,
        });
        self
    }

    pub fn drop_nth(self, dir: Direction, n: usize) -> Self {
        self.rule(dir, Trigger::Nth(n), Fate::Drop)
    }

    pub fn corrupt_nth(self, dir: Direction, n: usize) -> Self {
        self.rule(dir, Trigger::Nth(n), Fate::Corrupt)
    }

    pub fn drop_seq(self, dir: Direction, seqnum: i32) -> Self {
        self.rule(dir, Trigger::FirstSeq(seqnum), Fate::Drop)
    }

    pub fn corrupt_seq(self, dir: Direction, seqnum: i32) -> Self {
        self.rule(dir, Trigger::FirstSeq(seqnum), Fate::Corrupt)
    }
}

impl FaultModel for ScriptedFaults {
    fn judge(&mut self, dir: Direction, pkt: &Packet) -> Fate {
        let i = dir.index();
        self.seen[i] += 1;
        let nth = self.seen[i];
        for rule in self.rules.iter_mut().filter(|r| r.dir == dir && !r.fired) {
            let hit = match rule.trigger {
                Trigger::Nth(n) => n == nth,
                Trigger::FirstSeq(s) => s == pkt.seqnum,
            };
            if hit {
                rule.fired = true;
                return rule.fate;
            }
        }
        Fate::Deliver
    }
}

/// 按概率丢包/损坏（两个方向相同），固定种子可复现。
#[derive(Debug)]
pub struct RandomFaults {
    rng: StdRng,
    loss: f64,
    corrupt: f64,
}

impl RandomFaults {
    /// 概率会被截断到 `[0, 1]`
    pub fn new(seed: u64, loss: f64, corrupt: f64) -> Self {
        let clamp = |p: f64| if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            rng: StdRng::seed_from_u64(seed),
            loss: clamp(loss),
            corrupt: clamp(corrupt),
        }
    }
}

impl FaultModel for RandomFaults {
    fn judge(&mut self, _dir: Direction, _pkt: &Packet) -> Fate {
        if self.rng.random_bool(self.loss) {
            Fate::Drop
        } else if self.rng.random_bool(self.corrupt) {
            Fate::Corrupt
        } else {
            Fate::Deliver
        }
    }

    fn corrupt(&mut self, mut pkt: Packet) -> Packet {
        let delta: u8 = self.rng.random_range(1..=255);
        match self.rng.random_range(0..3) {
            0 => pkt.seqnum = pkt.seqnum.wrapping_add(i32::from(delta)),
            1 => pkt.acknum = pkt.acknum.wrapping_add(i32::from(delta)),
            _ => {
                let i = self.rng.random_range(0..pkt.payload.len());
                pkt.payload[i] = pkt.payload[i].wrapping_add(delta);
            }
        }
        pkt
    }
}
