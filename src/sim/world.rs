//! 世界 trait

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由上层实现（例如 `channel::RdtWorld` 持有收发两端与链路）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// 每执行完一个事件后回调一次
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
