//! 自适应重传超时（RTO）估计
//!
//! `rto ← 0.875·rto + 0.125·sample`，只接受大于 `rtt_floor` 的样本，
//! 结果若落在 `[rtt_floor, 2·base_rto]` 之外则丢弃、保持原值。

use crate::sim::SimTime;

const ALPHA: f64 = 0.125;

#[derive(Debug, Clone)]
pub struct RtoEstimator {
    base: SimTime,
    floor: SimTime,
    current: SimTime,
}

impl RtoEstimator {
    pub fn new(base_rto: SimTime, rtt_floor: SimTime) -> Self {
        Self {
            base: base_rto,
            floor: rtt_floor,
            current: base_rto,
        }
    }

    pub fn timeout(&self) -> SimTime {
        self.current
    }

    pub fn base(&self) -> SimTime {
        self.base
    }

    /// 估计值允许的上界
    pub fn ceiling(&self) -> SimTime {
        self.base.saturating_mul(2)
    }

    /// 喂入一个 RTT 样本，返回估计值是否发生了变化。
    ///
    /// 小于等于 `rtt_floor` 的样本多半是重传后旧 ACK 的“快速”回应（重传二义性），直接忽略。
    pub fn update(&mut self, sample: SimTime) -> bool {
        if sample <= self.floor {
            return false;
        }
        let next = (1.0 - ALPHA) * self.current.0 as f64 + ALPHA * sample.0 as f64;
        let next = SimTime(next.round() as u64);
        if next < self.floor || next > self.ceiling() {
            return false;
        }
        let changed = next != self.current;
        self.current = next;
        changed
    }

    /// 超时后回到初始值
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}
