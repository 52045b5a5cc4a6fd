//! Packet 与完整性校验
//!
//! 线上格式固定：`seqnum:i32, acknum:i32, checksum:i32, payload:[u8; 20]`（大端）。
//! 校验和是“取反求和”：所有 payload 字节 + seqnum + acknum 做 32 位回绕加法后按位取反，
//! 接收方把 checksum 一并加回去，结果为全 1（即 -1）则视为未损坏。
//! 恰好保持总和不变的多位翻转检测不到，这是该校验本身的局限。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 一个应用数据单元的大小（字节）
pub const PAYLOAD_LEN: usize = 20;

/// 线上编码后的 packet 长度（字节）
pub const WIRE_LEN: usize = 12 + PAYLOAD_LEN;

/// 应用层交给发送端的消息，固定 `PAYLOAD_LEN` 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Message(pub [u8; PAYLOAD_LEN]);

impl Message {
    /// 按 payload 容量截断或补零
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut buf = [0u8; PAYLOAD_LEN];
        let n = data.len().min(PAYLOAD_LEN);
        buf[..n].copy_from_slice(&data[..n]);
        Self(buf)
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.0
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet truncated: got {len} bytes, need {}", WIRE_LEN)]
    Truncated { len: usize },
    #[error("trailing bytes after packet: got {len} bytes, expected {}", WIRE_LEN)]
    TrailingBytes { len: usize },
}

/// 数据包 / 确认包（两个方向共用同一种格式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Packet {
    pub seqnum: i32,
    pub acknum: i32,
    pub checksum: i32,
    pub payload: [u8; PAYLOAD_LEN],
}

impl Packet {
    /// 数据包：acknum 与 seqnum 相同，checksum 已计算好。
    pub fn data(seqnum: i32, msg: &Message) -> Self {
        Self::sealed(seqnum, seqnum, msg.0)
    }

    /// 确认包：payload 全 0。
    pub fn ack(acknum: i32) -> Self {
        Self::sealed(acknum, acknum, [0u8; PAYLOAD_LEN])
    }

    fn sealed(seqnum: i32, acknum: i32, payload: [u8; PAYLOAD_LEN]) -> Self {
        let mut p = Self {
            seqnum,
            acknum,
            checksum: 0,
            payload,
        };
        p.checksum = encode_checksum(&p);
        p
    }

    pub fn message(&self) -> Message {
        Message(self.payload)
    }

    pub fn is_corrupt(&self) -> bool {
        is_corrupt(self)
    }

    pub fn encode(&self) -> [u8; WIRE_LEN] {
        let mut out = [0u8; WIRE_LEN];
        out[0..4].copy_from_slice(&self.seqnum.to_be_bytes());
        out[4..8].copy_from_slice(&self.acknum.to_be_bytes());
        out[8..12].copy_from_slice(&self.checksum.to_be_bytes());
        out[12..].copy_from_slice(&self.payload);
        out
    }

    /// 解码不做完整性判断：损坏的 packet 照样解出来，交给 `is_corrupt` 处理。
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        match buf.len() {
            n if n < WIRE_LEN => return Err(PacketError::Truncated { len: n }),
            n if n > WIRE_LEN => return Err(PacketError::TrailingBytes { len: n }),
            _ => {}
        }
        let word = |i: usize| i32::from_be_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&buf[12..]);
        Ok(Self {
            seqnum: word(0),
            acknum: word(4),
            checksum: word(8),
            payload,
        })
    }
}

fn field_sum(p: &Packet) -> i32 {
    p.payload
        .iter()
        .fold(p.seqnum.wrapping_add(p.acknum), |acc, &b| {
            acc.wrapping_add(i32::from(b))
        })
}

/// 计算 packet 的校验和（不读 `checksum` 字段本身）
pub fn encode_checksum(p: &Packet) -> i32 {
    !field_sum(p)
}

/// 各字段之和加上 checksum 不等于 -1 即视为损坏
pub fn is_corrupt(p: &Packet) -> bool {
    field_sum(p).wrapping_add(p.checksum) != -1
}
