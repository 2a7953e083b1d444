use crate::interop::cow::{CopyOnWrite, CopyableHandle, ReferenceConvertible};
use crate::interop::handle::Handle;
use crate::interop::is_null::expect_non_null;
use crate::sys::ortp::*;
use crate::sys::FALSE;
use crate::unsafe_block;
use libc::c_char;
use std::fmt;
use std::ptr::NonNull;
use std::slice;

/**
The bytes of an RTP packet, stored in a native `mblk_t` chain.

`dupmsg` makes duplicates cheap by sharing data blocks, so a native
duplicate isn't independent on its own. Writes check the data blocks too and
copy the whole message when any of them is shared.
 */
#[derive(Clone)]
pub struct Packet {
    internal: CopyOnWrite<Reference>,
}

/// Owns one message, its data blocks possibly shared with other messages.
#[doc(hidden)]
pub struct Reference {
    raw: NonNull<mblk_t>,
}

impl Handle for Reference {
    type Raw = mblk_t;

    fn as_ptr(&self) -> *mut mblk_t {
        self.raw.as_ptr()
    }
}

impl CopyableHandle for Reference {
    fn duplicate(&self) -> Option<Self> {
        let raw = unsafe_block!("We own the message" => dupmsg(self.raw.as_ptr()));
        NonNull::new(raw).map(|raw| Reference { raw })
    }
}

impl Drop for Reference {
    fn drop(&mut self) {
        unsafe_block!("The message is ours, freeing it drops our share of the data blocks" => {
            freemsg(self.raw.as_ptr())
        })
    }
}

impl ReferenceConvertible for Packet {
    type Reference = Reference;

    fn internal_reference(&self) -> &CopyOnWrite<Reference> {
        &self.internal
    }

    fn internal_reference_mut(&mut self) -> &mut CopyOnWrite<Reference> {
        &mut self.internal
    }

    fn from_internal_reference(internal: CopyOnWrite<Reference>) -> Self {
        Packet { internal }
    }
}

impl Packet {
    /// An empty packet with room for `capacity` bytes before it has to grow.
    pub fn with_capacity(capacity: usize) -> Self {
        let raw = expect_non_null(unsafe_block!("No preconditions" => allocb(capacity, 0)), "mblk_t");

        Packet {
            internal: CopyOnWrite::new(Reference { raw }),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut packet = Packet::with_capacity(data.len());
        packet.append(data);
        packet
    }

    pub fn len(&self) -> usize {
        unsafe_block!("The message is live" => msgdsize(self.internal.as_ptr()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the payload out, across every block of the chain.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        let mut block = self.internal.as_ptr() as *const mblk_t;

        while !block.is_null() {
            unsafe_block!("Every block of a live message points at its readable bytes" => {
                let len = (*block).b_wptr.offset_from((*block).b_rptr) as usize;
                out.extend_from_slice(slice::from_raw_parts((*block).b_rptr, len));
                block = (*block).b_cont;
            });
        }

        out
    }

    pub fn append(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let raw = self.writable();
        unsafe_block!("The message and its data blocks are ours alone" => {
            msgappend(raw, data.as_ptr() as *const c_char, data.len(), FALSE);
        });
    }

    /// The message, after copying it if this value or its data blocks are shared.
    fn writable(&mut self) -> *mut mblk_t {
        let reference = self.internal.reference_mut();

        if unsafe_block!("The message is live" => msg_is_shared(reference.raw.as_ptr())) {
            tracing::debug!(ptr = ?reference.raw, "copying shared packet data before writing");

            let copy = unsafe_block!("The message is live" => copymsg(reference.raw.as_ptr()));
            *reference = Reference {
                raw: expect_non_null(copy, "mblk_t"),
            };
        }

        reference.raw.as_ptr()
    }
}

impl Default for Packet {
    fn default() -> Self {
        Packet::with_capacity(0)
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Packet) -> bool {
        self.to_vec() == other.to_vec()
    }
}

impl Eq for Packet {}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Packet").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::cow::Provenance;

    #[test]
    fn append_grows_past_the_capacity() {
        let mut packet = Packet::with_capacity(4);
        assert!(packet.is_empty());

        packet.append(b"abc");
        packet.append(b"defg");

        assert_eq!(7, packet.len());
        assert_eq!(b"abcdefg".to_vec(), packet.to_vec());
    }

    #[test]
    fn copies_share_until_append() {
        let original = Packet::from_bytes(b"abc");
        let mut copy = original.clone();
        assert!(CopyOnWrite::ptr_eq(original.internal_reference(), copy.internal_reference()));

        copy.append(b"d");

        assert_eq!(b"abc".to_vec(), original.to_vec());
        assert_eq!(b"abcd".to_vec(), copy.to_vec());
        assert_eq!(Provenance::Copied, copy.internal_reference().provenance());
    }

    #[test]
    fn native_duplicates_never_see_writes() {
        let mut packet = Packet::from_bytes(b"abc");

        let duplicate = packet.internal_reference().reference().duplicate().unwrap();
        let duplicate = Packet::from_reference(duplicate, Provenance::Owned);

        // The box is unique but the data block isn't.
        assert!(packet.internal_reference().is_uniquely_referenced());
        packet.append(b"d");

        assert_eq!(b"abc".to_vec(), duplicate.to_vec());
        assert_eq!(b"abcd".to_vec(), packet.to_vec());
    }

    #[test]
    fn unique_packets_append_in_place() {
        let mut packet = Packet::from_bytes(b"abc");
        let before = packet.internal_reference().as_ptr();

        packet.append(b"d");

        assert_eq!(before, packet.internal_reference().as_ptr());
        assert_eq!(Provenance::Owned, packet.internal_reference().provenance());
    }
}
