//! 仿真信道
//!
//! 在 `sim` 内核之上模拟一对不重排的单向链路、故障注入以及发送端的单个定时器，
//! 用来端到端地驱动收发两端（测试与命令行工具都通过它运行）。协议端点本身不依赖本模块。

mod events;
mod faults;
mod link;
mod world;

pub use events::{AppSubmit, PacketArrive, TimerFire, numbered_message, schedule_messages};
pub use faults::{Direction, Fate, FaultModel, NoFaults, RandomFaults, ScriptedFaults};
pub use link::Link;
pub use world::{Channel, ChannelStats, Port, RdtWorld};
