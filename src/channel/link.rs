//! 单向链路
//!
//! 固定传播时延；到达时间不早于上一个包的到达时间，因此链路上不会乱序。

use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct Link {
    pub latency: SimTime,
    last_arrival: SimTime,
}

impl Link {
    pub fn new(latency: SimTime) -> Self {
        Self {
            latency,
            last_arrival: SimTime::ZERO,
        }
    }

    /// 在 `now` 发出的包何时到达对端
    pub(crate) fn arrival(&mut self, now: SimTime) -> SimTime {
        let at = now.saturating_add(self.latency).max(self.last_arrival);
        self.last_arrival = at;
        at
    }
}
