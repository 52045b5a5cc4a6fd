//! 协议变体配置
//!
//! 三种模式共用同一套收发引擎，只是策略不同：
//!
//! | 模式 | 窗口 | ACK 语义 | 超时后 |
//! |---|---|---|---|
//! | `AlternatingBit` | 1 | 精确匹配 | 重传唯一在途包 |
//! | `GoBackN` | W | 累计确认 | 重传全部在途包 |
//! | `SelectiveRepeat` | W | 逐包确认 | 只重传最早到期的包 |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// stop-and-wait
    #[value(name = "abt", alias = "alternating-bit")]
    AlternatingBit,
    #[value(name = "gbn", alias = "go-back-n")]
    GoBackN,
    #[value(name = "sr", alias = "selective-repeat")]
    SelectiveRepeat,
}

impl Mode {
    /// ACK 是否为累计确认
    pub fn cumulative_acks(self) -> bool {
        matches!(self, Mode::GoBackN)
    }

    /// 超时是否重传整个窗口
    pub fn retransmits_whole_window(self) -> bool {
        !matches!(self, Mode::SelectiveRepeat)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window size must be at least 1")]
    ZeroWindow,
    #[error("base RTO must be positive")]
    ZeroBaseRto,
    #[error("RTT floor {floor:?} leaves no room below 2 x base RTO {base:?}")]
    FloorTooHigh { floor: SimTime, base: SimTime },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub mode: Mode,
    /// 窗口大小（ABT 下总是按 1 处理）
    pub window: u32,
    /// 初始 RTO，同时决定估计值上界 `2·base_rto`
    pub base_rto: SimTime,
    /// RTT 下限：不大于它的样本被忽略
    pub rtt_floor: SimTime,
}

impl ProtocolConfig {
    /// 各模式的默认参数（单位 ms）：RTT 下限 10，ABT/SR 初始 RTO 12，GBN 18。
    pub fn for_mode(mode: Mode, window: u32) -> Self {
        let base_ms = match mode {
            Mode::GoBackN => 18,
            Mode::AlternatingBit | Mode::SelectiveRepeat => 12,
        };
        Self {
            mode,
            window,
            base_rto: SimTime::from_millis(base_ms),
            rtt_floor: SimTime::from_millis(10),
        }
    }

    pub fn with_base_rto(mut self, base_rto: SimTime) -> Self {
        self.base_rto = base_rto;
        self
    }

    pub fn effective_window(&self) -> u64 {
        match self.mode {
            Mode::AlternatingBit => 1,
            _ => u64::from(self.window),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.base_rto == SimTime::ZERO {
            return Err(ConfigError::ZeroBaseRto);
        }
        if self.rtt_floor >= self.base_rto.saturating_mul(2) {
            return Err(ConfigError::FloorTooHigh {
                floor: self.rtt_floor,
                base: self.base_rto,
            });
        }
        Ok(())
    }
}
