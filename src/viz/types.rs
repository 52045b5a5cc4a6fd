use serde::{Deserialize, Serialize};

/// 事件发生在哪一端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VizEndpoint {
    Sender,
    Receiver,
    /// 信道本身（丢包/损坏）
    Channel,
}

/// 信道方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VizDirection {
    /// 发送端 -> 接收端（数据）
    Forward,
    /// 接收端 -> 发送端（ACK）
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 运行参数（作为 t=0 的第一条事件）
    Meta {
        mode: String,
        window: u32,
        base_rto_ns: u64,
        latency_ns: u64,
    },
    /// 应用层提交消息
    Submit { seq: i32 },
    /// 发送端发出数据包
    SendData { seq: i32, retrans: bool },
    /// 接收端发出 ACK（包括重发）
    SendAck { ack: i32 },
    /// 发送端收到 ACK
    RecvAck { ack: i32 },
    /// 发送端定时器到期；`seq` 是第一个被重传的序号
    Timeout { seq: i32 },
    /// 接收端向应用层交付
    Deliver { seq: u64 },
    Drop {
        dir: VizDirection,
        seq: i32,
        acknum: i32,
    },
    Corrupt {
        dir: VizDirection,
        seq: i32,
        acknum: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VizEvent {
    pub t_ns: u64,
    pub endpoint: VizEndpoint,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, t_ns: u64, endpoint: VizEndpoint, kind: VizEventKind) {
        self.events.push(VizEvent {
            t_ns,
            endpoint,
            kind,
        });
    }

    pub fn count(&self, pred: impl Fn(&VizEventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}
