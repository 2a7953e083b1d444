use crate::interop::cow::{CopyableHandle, Provenance, ReferenceConvertible};
use crate::interop::handle::Handle;
use crate::rtp::packet::Reference;
use crate::rtp::Packet;
use crate::sys::ortp::msgdsize;
use crate::unsafe_block;
use std::collections::VecDeque;
use std::fmt;

/**
Packets waiting to be processed, oldest first.

Pushing keeps a native duplicate of the packet, so the payload isn't copied
unless the pusher or the popper writes to it later.
 */
#[derive(Default)]
pub struct Queue {
    messages: VecDeque<Reference>,
}

impl Queue {
    pub fn new() -> Self {
        Queue::default()
    }

    pub fn push(&mut self, packet: &Packet) {
        match packet.internal_reference().reference().duplicate() {
            Some(message) => self.messages.push_back(message),
            None => tracing::warn!(len = packet.len(), "could not duplicate packet, dropping it"),
        }
    }

    pub fn pop(&mut self) -> Option<Packet> {
        let message = self.messages.pop_front()?;
        Some(Packet::from_reference(message, Provenance::Owned))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Payload bytes across every queued packet.
    pub fn byte_count(&self) -> usize {
        self.messages
            .iter()
            .map(|message| unsafe_block!("Queued messages are live" => msgdsize(message.as_ptr())))
            .sum()
    }

    /// Drop every queued packet.
    pub fn flush(&mut self) {
        tracing::trace!(count = self.messages.len(), "flushing packet queue");
        self.messages.clear();
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Queue").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn packets_come_out_in_order() {
        let mut queue = Queue::new();
        queue.push(&Packet::from_bytes(b"first"));
        queue.push(&Packet::from_bytes(b"second"));

        assert_eq!(2, queue.len());
        assert_eq!(11, queue.byte_count());

        assert_eq!(b"first".to_vec(), queue.pop().unwrap().to_vec());
        assert_eq!(b"second".to_vec(), queue.pop().unwrap().to_vec());
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn queued_packets_ignore_later_appends() {
        let mut packet = Packet::from_bytes(b"abc");
        let mut queue = Queue::new();
        queue.push(&packet);

        packet.append(b"def");

        assert_eq!(3, queue.byte_count());
        assert_eq!(b"abc".to_vec(), queue.pop().unwrap().to_vec());
        assert_eq!(b"abcdef".to_vec(), packet.to_vec());
    }

    #[test]
    fn popped_packets_copy_before_writing() {
        let packet = Packet::from_bytes(b"abc");
        let mut queue = Queue::new();
        queue.push(&packet);

        let mut popped = queue.pop().unwrap();
        popped.append(b"!");

        assert_eq!(b"abc".to_vec(), packet.to_vec());
        assert_eq!(b"abc!".to_vec(), popped.to_vec());
    }

    #[test]
    #[traced_test]
    fn flush_drops_everything() {
        let mut queue = Queue::new();
        for _ in 0..3 {
            queue.push(&Packet::from_bytes(b"x"));
        }

        queue.flush();

        assert!(queue.is_empty());
        assert_eq!(0, queue.byte_count());
        assert!(logs_contain("flushing packet queue"));
    }
}
