//! 可靠传输协议端点
//!
//! 单向（simplex）ARQ：发送端 + 接收端，只共享 packet 类型。
//! 三种变体（ABT / Go-Back-N / Selective Repeat）是同一套引擎的不同配置，见 [`config`]。
//! 端点通过 [`Env`] 与外部信道/定时器交互，本身不依赖仿真内核。

pub mod config;
pub mod env;
pub mod packet;
pub mod receiver;
pub mod rto;
pub mod sender;

pub use config::{ConfigError, Mode, ProtocolConfig};
pub use env::Env;
pub use packet::{Message, PAYLOAD_LEN, Packet, PacketError, WIRE_LEN, encode_checksum, is_corrupt};
pub use receiver::{Arrival, Receiver, ReceiverStats};
pub use rto::RtoEstimator;
pub use sender::{InFlightRecord, Sender, SenderStats, SubmitError};
