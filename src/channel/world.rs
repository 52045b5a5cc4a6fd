//! 信道世界：持有收发两端、两条单向链路、故障模型与发送端定时器。

use std::any::Any;

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::events::{PacketArrive, TimerFire};
use super::faults::{Direction, Fate, FaultModel};
use super::link::Link;
use crate::proto::{Env, Message, Packet, ProtocolConfig, Receiver, Sender};
use crate::sim::{SimTime, Simulator, World};
use crate::viz::{VizEndpoint, VizEventKind, VizLogger};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelStats {
    pub data_sent: u64,
    pub acks_sent: u64,
    pub dropped: u64,
    pub corrupted: u64,
    pub delivered_to_app: u64,
}

/// 信道本身（不含端点状态），端点通过 [`Port`] 访问它。
pub struct Channel {
    forward: Link,
    reverse: Link,
    faults: Box<dyn FaultModel>,
    /// 每次 start/stop 都加一；到期事件带着启动时的 epoch，对不上即作废
    timer_epoch: u64,
    timer_armed: bool,
    highest_data_seq: i32,
    delivered: Vec<Message>,
    pub stats: ChannelStats,
    pub viz: Option<VizLogger>,
}

impl Channel {
    pub fn new(latency: SimTime, faults: Box<dyn FaultModel>) -> Self {
        Self {
            forward: Link::new(latency),
            reverse: Link::new(latency),
            faults,
            timer_epoch: 0,
            timer_armed: false,
            highest_data_seq: 0,
            delivered: Vec::new(),
            stats: ChannelStats::default(),
            viz: None,
        }
    }

    pub fn latency(&self) -> SimTime {
        self.forward.latency
    }

    fn viz_push(&mut self, now: SimTime, endpoint: VizEndpoint, kind: VizEventKind) {
        if let Some(v) = &mut self.viz {
            v.push(now.0, endpoint, kind);
        }
    }

    fn transmit(&mut self, dir: Direction, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        match dir {
            Direction::ToReceiver => {
                self.stats.data_sent += 1;
                let retrans = pkt.seqnum <= self.highest_data_seq;
                self.highest_data_seq = self.highest_data_seq.max(pkt.seqnum);
                self.viz_push(
                    now,
                    VizEndpoint::Sender,
                    VizEventKind::SendData {
                        seq: pkt.seqnum,
                        retrans,
                    },
                );
            }
            Direction::ToSender => {
                self.stats.acks_sent += 1;
                self.viz_push(now, VizEndpoint::Receiver, VizEventKind::SendAck { ack: pkt.acknum });
            }
        }

        let pkt = match self.faults.judge(dir, &pkt) {
            Fate::Deliver => pkt,
            Fate::Drop => {
                self.stats.dropped += 1;
                debug!(?dir, seqnum = pkt.seqnum, acknum = pkt.acknum, "信道丢包");
                self.viz_push(
                    now,
                    VizEndpoint::Channel,
                    VizEventKind::Drop {
                        dir: dir.into(),
                        seq: pkt.seqnum,
                        acknum: pkt.acknum,
                    },
                );
                return;
            }
            Fate::Corrupt => {
                self.stats.corrupted += 1;
                debug!(?dir, seqnum = pkt.seqnum, acknum = pkt.acknum, "信道损坏数据包");
                self.viz_push(
                    now,
                    VizEndpoint::Channel,
                    VizEventKind::Corrupt {
                        dir: dir.into(),
                        seq: pkt.seqnum,
                        acknum: pkt.acknum,
                    },
                );
                self.faults.corrupt(pkt)
            }
        };

        let link = match dir {
            Direction::ToReceiver => &mut self.forward,
            Direction::ToSender => &mut self.reverse,
        };
        let at = link.arrival(now);
        trace!(?dir, arrive = ?at, "数据包进入链路");
        sim.schedule(at, PacketArrive { dir, pkt });
    }
}

/// 某一端看到的环境：当前时间、向对端发包、向应用层交付、定时器。
pub struct Port<'a> {
    /// 本端发出的包走哪个方向
    outbound: Direction,
    sim: &'a mut Simulator,
    ch: &'a mut Channel,
}

impl Env for Port<'_> {
    fn now(&self) -> SimTime {
        self.sim.now()
    }

    fn to_channel(&mut self, pkt: Packet) {
        self.ch.transmit(self.outbound, pkt, self.sim);
    }

    fn to_application(&mut self, msg: Message) {
        self.ch.delivered.push(msg);
        self.ch.stats.delivered_to_app += 1;
        let seq = self.ch.delivered.len() as u64;
        let now = self.sim.now();
        self.ch.viz_push(now, VizEndpoint::Receiver, VizEventKind::Deliver { seq });
    }

    fn start_timer(&mut self, after: SimTime) {
        if self.outbound != Direction::ToReceiver {
            warn!(outbound = ?self.outbound, "只有发送端使用定时器");
            return;
        }
        self.ch.timer_epoch += 1;
        self.ch.timer_armed = true;
        let epoch = self.ch.timer_epoch;
        self.sim.schedule_in(after, TimerFire { epoch });
    }

    fn stop_timer(&mut self) {
        self.ch.timer_epoch += 1;
        self.ch.timer_armed = false;
    }
}

/// 一次单向传输的完整世界
pub struct RdtWorld {
    pub sender: Sender,
    pub receiver: Receiver,
    pub channel: Channel,
}

impl RdtWorld {
    pub fn new(cfg: &ProtocolConfig, latency: SimTime, faults: Box<dyn FaultModel>) -> Self {
        Self {
            sender: Sender::new(cfg),
            receiver: Receiver::new(cfg),
            channel: Channel::new(latency, faults),
        }
    }

    /// 打开事件记录并写入 meta
    pub fn enable_viz(&mut self, cfg: &ProtocolConfig) {
        let mut v = VizLogger::default();
        let mode = serde_json::to_value(cfg.mode)
            .ok()
            .and_then(|m| m.as_str().map(str::to_owned))
            .unwrap_or_default();
        v.push(
            0,
            VizEndpoint::Channel,
            VizEventKind::Meta {
                mode,
                window: cfg.window,
                base_rto_ns: cfg.base_rto.0,
                latency_ns: self.channel.latency().0,
            },
        );
        self.channel.viz = Some(v);
    }

    /// 应用层按序收到的全部消息
    pub fn delivered(&self) -> &[Message] {
        &self.channel.delivered
    }

    pub fn timer_armed(&self) -> bool {
        self.channel.timer_armed
    }

    pub(crate) fn submit(&mut self, msg: Message, sim: &mut Simulator) {
        if let Ok(seq) = i32::try_from(self.sender.next_seq()) {
            self.channel
                .viz_push(sim.now(), VizEndpoint::Sender, VizEventKind::Submit { seq });
        }
        let mut port = Port {
            outbound: Direction::ToReceiver,
            sim,
            ch: &mut self.channel,
        };
        if let Err(e) = self.sender.submit(&mut port, msg) {
            warn!(error = %e, "消息提交失败");
        }
    }

    pub(crate) fn deliver(&mut self, dir: Direction, pkt: Packet, sim: &mut Simulator) {
        match dir {
            Direction::ToReceiver => {
                let mut port = Port {
                    outbound: Direction::ToSender,
                    sim,
                    ch: &mut self.channel,
                };
                self.receiver.on_packet(&mut port, pkt);
            }
            Direction::ToSender => {
                self.channel
                    .viz_push(sim.now(), VizEndpoint::Sender, VizEventKind::RecvAck { ack: pkt.acknum });
                let mut port = Port {
                    outbound: Direction::ToReceiver,
                    sim,
                    ch: &mut self.channel,
                };
                self.sender.on_packet(&mut port, pkt);
            }
        }
    }

    pub(crate) fn fire_timer(&mut self, epoch: u64, sim: &mut Simulator) {
        if !self.channel.timer_armed || epoch != self.channel.timer_epoch {
            trace!(epoch, current = self.channel.timer_epoch, "过期的定时器事件，忽略");
            return;
        }
        self.channel.timer_armed = false;
        if let Some(seq) = self.sender.expiring_seq().and_then(|s| i32::try_from(s).ok()) {
            self.channel
                .viz_push(sim.now(), VizEndpoint::Sender, VizEventKind::Timeout { seq });
        }
        let mut port = Port {
            outbound: Direction::ToReceiver,
            sim,
            ch: &mut self.channel,
        };
        self.sender.on_timer_expiry(&mut port);
    }
}

impl World for RdtWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
