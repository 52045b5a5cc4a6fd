//! 接收端引擎
//!
//! 每个到达的 packet 先分类（[`Arrival`]），再决定动作：
//! - 损坏：静默丢弃
//! - 重复（`seqnum < recv_base`）：重发当初为它发过的 ACK，不重复交付
//! - 窗口内：SR/ABT 缓存并逐包确认，凑齐连续序号后按序交付；GBN 只接受 `recv_base`
//! - 窗口外（更大）：忽略
//!
//! 交付给应用层的序号严格递增、无空洞、每个只交付一次。

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, trace};

use super::config::{Mode, ProtocolConfig};
use super::env::Env;
use super::packet::Packet;

/// 到达 packet 的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    Corrupt,
    /// 早于 `recv_base`，已经交付过
    Duplicate(u64),
    InWindow(u64),
    AboveWindow(u64),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceiverStats {
    pub delivered: u64,
    pub buffered: u64,
    pub duplicates: u64,
    pub corrupt: u64,
    /// 窗口外或（GBN 下）非期望序号的包
    pub discarded: u64,
    pub acks_sent: u64,
}

#[derive(Debug)]
pub struct Receiver {
    mode: Mode,
    window: u64,
    recv_base: u64,
    /// 已收到、尚未交付的包（都在 `recv_base` 之后）
    buffer: BTreeMap<u64, Packet>,
    /// 为每个序号发过的 ACK，供重复包到达时原样重发
    sent_acks: HashMap<u64, Packet>,
    /// GBN：最近一次发出的累计 ACK
    last_ack: Option<Packet>,
    stats: ReceiverStats,
}

impl Receiver {
    pub fn new(cfg: &ProtocolConfig) -> Self {
        Self {
            mode: cfg.mode,
            window: cfg.effective_window().max(1),
            recv_base: 1,
            buffer: BTreeMap::new(),
            sent_acks: HashMap::new(),
            last_ack: None,
            stats: ReceiverStats::default(),
        }
    }

    pub fn recv_base(&self) -> u64 {
        self.recv_base
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// 当初为 `seq` 发出的 ACK（若仍保留）
    pub fn ack_for(&self, seq: u64) -> Option<&Packet> {
        self.sent_acks.get(&seq)
    }

    pub fn classify(&self, pkt: &Packet) -> Arrival {
        if pkt.is_corrupt() {
            return Arrival::Corrupt;
        }
        // 负序号不可能由发送端产生，只能是“碰巧通过校验”的损坏
        let Ok(seq) = u64::try_from(pkt.seqnum) else {
            return Arrival::Corrupt;
        };
        if seq < self.recv_base {
            Arrival::Duplicate(seq)
        } else if seq < self.recv_base.saturating_add(self.window) {
            Arrival::InWindow(seq)
        } else {
            Arrival::AboveWindow(seq)
        }
    }

    pub fn on_packet(&mut self, env: &mut impl Env, pkt: Packet) {
        let arrival = self.classify(&pkt);
        trace!(?arrival, recv_base = self.recv_base, "数据包到达接收端");
        match arrival {
            Arrival::Corrupt => {
                self.stats.corrupt += 1;
                debug!(seqnum = pkt.seqnum, "数据包损坏，丢弃");
            }
            Arrival::Duplicate(seq) => {
                self.stats.duplicates += 1;
                let ack = if self.mode.cumulative_acks() {
                    self.last_ack
                } else {
                    self.sent_acks.get(&seq).copied()
                };
                if let Some(ack) = ack {
                    debug!(seq, acknum = ack.acknum, "重复包，重发 ACK");
                    self.send_ack(env, ack);
                }
            }
            Arrival::InWindow(seq) if self.mode.cumulative_acks() => {
                if seq == self.recv_base {
                    env.to_application(pkt.message());
                    self.stats.delivered += 1;
                    self.recv_base += 1;
                    let ack = Packet::ack(pkt.seqnum);
                    self.last_ack = Some(ack);
                    self.send_ack(env, ack);
                } else {
                    self.discard(env, seq);
                }
            }
            Arrival::InWindow(seq) => {
                if self.buffer.insert(seq, pkt).is_none() {
                    self.stats.buffered += 1;
                }
                let ack = Packet::ack(pkt.seqnum);
                self.sent_acks.insert(seq, ack);
                self.send_ack(env, ack);
                if seq == self.recv_base {
                    self.deliver_contiguous(env);
                }
            }
            Arrival::AboveWindow(seq) => self.discard(env, seq),
        }
    }

    fn discard(&mut self, env: &mut impl Env, seq: u64) {
        self.stats.discarded += 1;
        debug!(seq, recv_base = self.recv_base, "非期望序号，丢弃");
        if self.mode.cumulative_acks() {
            if let Some(ack) = self.last_ack {
                self.send_ack(env, ack);
            }
        }
    }

    fn send_ack(&mut self, env: &mut impl Env, ack: Packet) {
        self.stats.acks_sent += 1;
        env.to_channel(ack);
    }

    fn deliver_contiguous(&mut self, env: &mut impl Env) {
        while let Some(pkt) = self.buffer.remove(&self.recv_base) {
            env.to_application(pkt.message());
            self.stats.delivered += 1;
            self.recv_base += 1;
        }
        debug!(recv_base = self.recv_base, buffered = self.buffer.len(), "按序交付完成");

        // 不重排的信道上，发送端不会再发 recv_base - W 之前的序号
        let horizon = self.recv_base.saturating_sub(self.window);
        self.sent_acks.retain(|&s, _| s >= horizon);
    }
}
