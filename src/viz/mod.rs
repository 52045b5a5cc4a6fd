//! 协议事件记录（结构化 JSON，便于离线回放/排查）
//!
//! - 每条事件带仿真时间与端点（sender/receiver）
//! - 仿真结束后整体序列化写文件，不做流式输出

mod types;

pub use types::{VizDirection, VizEndpoint, VizEvent, VizEventKind, VizLogger};
