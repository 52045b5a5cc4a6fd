//! Environment seam between a protocol endpoint and whatever drives it.
//!
//! Each endpoint gets its own `Env`, so the direction / endpoint argument of the
//! underlying channel calls is implicit.

use super::packet::Message;
use super::packet::Packet;
use crate::sim::SimTime;

pub trait Env {
    /// Current simulated time.
    fn now(&self) -> SimTime;
    /// Hand a packet to the (lossy, non-reordering) link toward the peer.
    fn to_channel(&mut self, pkt: Packet);
    /// Pass an in-order payload up to the application. Only the receiver calls this.
    fn to_application(&mut self, msg: Message);
    /// Arm the endpoint's single timer; any pending expiry is superseded.
    fn start_timer(&mut self, after: SimTime);
    fn stop_timer(&mut self);
}
