//! 仿真核心模块
//!
//! 离散事件内核：仿真时间、事件、世界与仿真器。协议端点本身不依赖这里，
//! 只有 `channel` 用它来驱动收发两端。

mod event;
mod scheduled_event;
mod simulator;
mod time;
mod world;

pub use event::Event;
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
