//! 发送端引擎（滑动窗口）
//!
//! - 窗口 `[send_base, send_base + W)` 内的序号立即发送，窗口外的进入 backlog 排队
//! - 每个在途包有自己的到期时间，所有到期时间复用同一个环境定时器：
//!   定时器总是对准最早到期的那个在途包
//! - GBN 例外：整个窗口共用一个截止时间，每个新的累计 ACK 都把它推迟一个完整 RTO
//! - 超时策略由 [`Mode`] 决定：SR 只重传最早到期的包，GBN/ABT 重传全部在途包
//!
//! 序号从 1 开始、单调递增、不回绕（线上字段为 i32）。

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::config::{Mode, ProtocolConfig};
use super::env::Env;
use super::packet::{Message, Packet};
use super::rto::RtoEstimator;
use crate::sim::SimTime;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("sequence number {seq} does not fit the 32-bit wire field")]
    SeqSpaceExhausted { seq: u64 },
}

/// 一个在途包：从发出开始，直到被确认或因重传被替换为新记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightRecord {
    pub packet: Packet,
    pub sent_at: SimTime,
    pub expires_at: SimTime,
}

/// 在途包集合：按序号索引，同时按 (到期时间, 插入顺序) 排序，
/// 最早到期查询/删除都是 O(log n)。
#[derive(Debug, Default)]
struct InFlight {
    by_seq: BTreeMap<u64, (u64, InFlightRecord)>,
    by_expiry: BTreeMap<(SimTime, u64), u64>,
    next_order: u64,
}

impl InFlight {
    fn insert(&mut self, seq: u64, rec: InFlightRecord) {
        // 同一序号最多一条记录
        self.remove(seq);
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.by_expiry.insert((rec.expires_at, order), seq);
        self.by_seq.insert(seq, (order, rec));
    }

    fn remove(&mut self, seq: u64) -> Option<InFlightRecord> {
        let (order, rec) = self.by_seq.remove(&seq)?;
        self.by_expiry.remove(&(rec.expires_at, order));
        Some(rec)
    }

    fn earliest(&self) -> Option<(u64, &InFlightRecord)> {
        let (_, &seq) = self.by_expiry.first_key_value()?;
        self.by_seq.get(&seq).map(|(_, rec)| (seq, rec))
    }

    fn pop_earliest(&mut self) -> Option<(u64, InFlightRecord)> {
        let (_, seq) = self.by_expiry.pop_first()?;
        let (_, rec) = self.by_seq.remove(&seq)?;
        Some((seq, rec))
    }

    /// 取出所有序号 ≤ `upto` 的记录（按序号升序）
    fn drain_upto(&mut self, upto: u64) -> Vec<(u64, InFlightRecord)> {
        let seqs: Vec<u64> = self.by_seq.range(..=upto).map(|(&s, _)| s).collect();
        seqs.into_iter()
            .filter_map(|s| self.remove(s).map(|rec| (s, rec)))
            .collect()
    }

    fn drain_all(&mut self) -> Vec<(u64, InFlightRecord)> {
        self.by_expiry.clear();
        std::mem::take(&mut self.by_seq)
            .into_iter()
            .map(|(s, (_, rec))| (s, rec))
            .collect()
    }

    fn get(&self, seq: u64) -> Option<&InFlightRecord> {
        self.by_seq.get(&seq).map(|(_, rec)| rec)
    }

    fn len(&self) -> usize {
        self.by_seq.len()
    }

    fn is_empty(&self) -> bool {
        self.by_seq.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SenderStats {
    pub submitted: u64,
    /// 首次发送的数据包数
    pub transmitted: u64,
    pub retransmitted: u64,
    pub timeouts: u64,
    pub acks_accepted: u64,
    pub acks_duplicate: u64,
    pub acks_out_of_window: u64,
    pub acks_corrupt: u64,
}

#[derive(Debug)]
pub struct Sender {
    mode: Mode,
    window: u64,
    send_base: u64,
    next_seq: u64,
    rto: RtoEstimator,
    in_flight: InFlight,
    /// SR：已被乱序确认、但还在 send_base 之后的序号
    acked: BTreeSet<u64>,
    backlog: VecDeque<(u64, Packet)>,
    /// 当前定时器对准的绝对到期时间
    armed: Option<SimTime>,
    /// GBN：整个窗口共用的截止时间
    window_deadline: Option<SimTime>,
    stats: SenderStats,
}

impl Sender {
    pub fn new(cfg: &ProtocolConfig) -> Self {
        Self {
            mode: cfg.mode,
            window: cfg.effective_window().max(1),
            send_base: 1,
            next_seq: 1,
            rto: RtoEstimator::new(cfg.base_rto, cfg.rtt_floor),
            in_flight: InFlight::default(),
            acked: BTreeSet::new(),
            backlog: VecDeque::new(),
            armed: None,
            window_deadline: None,
            stats: SenderStats::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    pub fn send_base(&self) -> u64 {
        self.send_base
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn current_rto(&self) -> SimTime {
        self.rto.timeout()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn in_flight_record(&self, seq: u64) -> Option<&InFlightRecord> {
        self.in_flight.get(seq)
    }

    /// 在途序号，按到期先后排列
    pub fn in_flight_by_expiry(&self) -> Vec<u64> {
        self.in_flight.by_expiry.values().copied().collect()
    }

    /// 已乱序确认、尚未被窗口滑过的序号
    pub fn acked_out_of_order(&self) -> Vec<u64> {
        self.acked.iter().copied().collect()
    }

    pub fn timer_deadline(&self) -> Option<SimTime> {
        self.armed
    }

    /// 定时器到期时第一个要重传的序号
    pub fn expiring_seq(&self) -> Option<u64> {
        if self.mode.retransmits_whole_window() {
            self.in_flight.by_seq.keys().next().copied()
        } else {
            self.in_flight.earliest().map(|(seq, _)| seq)
        }
    }

    /// 所有已提交消息都已被确认
    pub fn is_idle(&self) -> bool {
        self.send_base == self.next_seq
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// 空闲时把序号直接推进到 `seq`
    #[cfg(test)]
    pub(crate) fn skip_to(&mut self, seq: u64) {
        debug_assert!(self.is_idle() && self.backlog.is_empty());
        self.send_base = seq;
        self.next_seq = seq;
    }

    fn window_end(&self) -> u64 {
        self.send_base.saturating_add(self.window)
    }

    /// 应用层提交一条消息。窗口已满时进入 backlog，不会被拒绝。
    pub fn submit(&mut self, env: &mut impl Env, msg: Message) -> Result<u64, SubmitError> {
        let seq = self.next_seq;
        let wire = i32::try_from(seq).map_err(|_| SubmitError::SeqSpaceExhausted { seq })?;
        let pkt = Packet::data(wire, &msg);
        self.next_seq += 1;
        self.stats.submitted += 1;

        if seq < self.window_end() {
            debug_assert!(self.backlog.is_empty(), "backlog must drain before the window");
            self.transmit(env, seq, pkt, false);
            self.rearm(env);
        } else {
            debug!(seq, send_base = self.send_base, backlog = self.backlog.len() + 1, "窗口已满，消息进入 backlog");
            self.backlog.push_back((seq, pkt));
        }
        Ok(seq)
    }

    /// 收到对端发回的 ACK
    pub fn on_packet(&mut self, env: &mut impl Env, pkt: Packet) {
        if pkt.is_corrupt() {
            self.stats.acks_corrupt += 1;
            debug!(acknum = pkt.acknum, "ACK 损坏，丢弃");
            return;
        }
        let ack = match u64::try_from(pkt.acknum) {
            Ok(a) if a >= self.send_base && a < self.window_end() && a < self.next_seq => a,
            _ => {
                self.stats.acks_out_of_window += 1;
                debug!(acknum = pkt.acknum, send_base = self.send_base, "ACK 不在发送窗口内，忽略");
                return;
            }
        };

        let accepted = if self.mode.cumulative_acks() {
            self.on_cumulative_ack(&*env, ack)
        } else {
            self.on_selective_ack(&*env, ack)
        };
        if !accepted {
            self.stats.acks_duplicate += 1;
            return;
        }
        self.stats.acks_accepted += 1;

        self.fill_window(env);
        self.rearm(env);
    }

    fn on_selective_ack(&mut self, env: &impl Env, ack: u64) -> bool {
        let Some(rec) = self.in_flight.remove(ack) else {
            debug!(ack, "重复 ACK 或对应包未在途，忽略");
            return false;
        };
        self.sample_rtt(env.now().saturating_sub(rec.sent_at));
        self.acked.insert(ack);

        if ack == self.send_base {
            while self.acked.remove(&self.send_base) {
                self.send_base += 1;
            }
            debug!(ack, send_base = self.send_base, "窗口前移");
        } else {
            debug!(ack, send_base = self.send_base, "乱序确认，窗口不动");
        }
        true
    }

    fn on_cumulative_ack(&mut self, env: &impl Env, ack: u64) -> bool {
        let sent_at = self.in_flight.get(ack).map(|r| r.sent_at);
        let confirmed = self.in_flight.drain_upto(ack);
        if confirmed.is_empty() {
            return false;
        }
        if let Some(sent_at) = sent_at {
            self.sample_rtt(env.now().saturating_sub(sent_at));
        }
        self.send_base = ack + 1;
        // 有进展：窗口计时从现在重新开始
        self.window_deadline = None;
        debug!(ack, confirmed = confirmed.len(), send_base = self.send_base, "累计确认，窗口前移");
        true
    }

    fn sample_rtt(&mut self, sample: SimTime) {
        if self.rto.update(sample) {
            trace!(sample = ?sample, rto = ?self.rto.timeout(), "RTO 更新");
        }
    }

    /// 定时器到期
    pub fn on_timer_expiry(&mut self, env: &mut impl Env) {
        self.armed = None;
        self.window_deadline = None;
        if self.in_flight.is_empty() {
            warn!(send_base = self.send_base, "定时器到期但没有在途包");
            return;
        }
        self.stats.timeouts += 1;
        self.rto.reset();

        if self.mode.retransmits_whole_window() {
            let lost = self.in_flight.drain_all();
            debug!(count = lost.len(), send_base = self.send_base, "超时，重传整个窗口");
            for (seq, rec) in lost {
                self.transmit(env, seq, rec.packet, true);
            }
        } else if let Some((seq, rec)) = self.in_flight.pop_earliest() {
            debug!(seq, "超时，重传最早到期的包");
            self.transmit(env, seq, rec.packet, true);
        }
        self.rearm(env);
    }

    fn transmit(&mut self, env: &mut impl Env, seq: u64, pkt: Packet, retrans: bool) {
        let now = env.now();
        env.to_channel(pkt);
        if retrans {
            self.stats.retransmitted += 1;
        } else {
            self.stats.transmitted += 1;
        }
        self.in_flight.insert(
            seq,
            InFlightRecord {
                packet: pkt,
                sent_at: now,
                expires_at: now.saturating_add(self.rto.timeout()),
            },
        );
        trace!(seq, retrans, in_flight = self.in_flight.len(), "数据包已发出");
    }

    /// 把落入新窗口的 backlog 依次发出
    fn fill_window(&mut self, env: &mut impl Env) {
        while let Some(&(seq, pkt)) = self.backlog.front() {
            if seq >= self.window_end() {
                break;
            }
            self.backlog.pop_front();
            self.transmit(env, seq, pkt, false);
        }
    }

    /// 让唯一的定时器对准下一个截止时间；没有在途包则停表。
    fn rearm(&mut self, env: &mut impl Env) {
        match self.next_deadline(env.now()) {
            None => {
                if self.armed.take().is_some() {
                    env.stop_timer();
                }
            }
            Some(deadline) if self.armed == Some(deadline) => {}
            Some(deadline) => {
                let delay = deadline.saturating_sub(env.now());
                trace!(deadline = ?deadline, delay = ?delay, "重置定时器");
                env.start_timer(delay);
                self.armed = Some(deadline);
            }
        }
    }

    /// SR/ABT 取最早到期的在途包；GBN 取窗口截止时间，空缺时从 `now` 起算一个 RTO。
    fn next_deadline(&mut self, now: SimTime) -> Option<SimTime> {
        if self.in_flight.is_empty() {
            self.window_deadline = None;
            return None;
        }
        if !self.mode.cumulative_acks() {
            return self.in_flight.earliest().map(|(_, rec)| rec.expires_at);
        }
        let timeout = self.rto.timeout();
        Some(
            *self
                .window_deadline
                .get_or_insert_with(|| now.saturating_add(timeout)),
        )
    }
}
