/*!
oRTP message blocks as Rust values.

A `Packet` is the payload of one RTP packet. Copies share the native data
blocks until one of them writes, and a `Queue` holds packets in arrival order.
*/

mod packet;
mod queue;

pub use self::packet::Packet;
pub use self::queue::Queue;
