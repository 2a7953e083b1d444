/*!
oRTP: message blocks, the buffers RTP packets travel in.

A message is a chain of `mblk_t` linked through `b_cont`. Each block points
into a reference counted data block, and `dupmsg` shares those data blocks
instead of copying them, so writing through one message shows in its duplicates.
*/

#[repr(C)]
pub struct mblk_t {
    pub b_prev: *mut mblk_t,
    pub b_next: *mut mblk_t,
    /// The next block of the same message.
    pub b_cont: *mut mblk_t,
    pub b_datap: *mut dblk_t,
    /// Start of the readable bytes.
    pub b_rptr: *mut u8,
    /// End of the readable bytes, where the next write goes.
    pub b_wptr: *mut u8,
    _private: [u8; 0],
}

impl mblk_t {
    #[cfg(any(test, feature = "loopback"))]
    pub(crate) fn new(datap: *mut dblk_t, rptr: *mut u8, wptr: *mut u8) -> Self {
        mblk_t {
            b_prev: std::ptr::null_mut(),
            b_next: std::ptr::null_mut(),
            b_cont: std::ptr::null_mut(),
            b_datap: datap,
            b_rptr: rptr,
            b_wptr: wptr,
            _private: [],
        }
    }
}

#[cfg(not(any(test, feature = "loopback")))]
pub use self::native::*;

#[cfg(any(test, feature = "loopback"))]
pub use super::loopback::ortp::*;

#[cfg(not(any(test, feature = "loopback")))]
mod native {
    use super::mblk_t;
    use crate::sys::bool_t;
    use libc::{c_char, c_int, size_t};

    crate::sys::opaque_types!(dblk_t);

    #[link(name = "ortp")]
    extern "C" {
        /// A new single-block message with room for `size` bytes.
        pub fn allocb(size: size_t, unused: c_int) -> *mut mblk_t;
        /// Another message sharing every data block of `mp`.
        pub fn dupmsg(mp: *mut mblk_t) -> *mut mblk_t;
        /// A deep copy of `mp` in a single block.
        pub fn copymsg(mp: *const mblk_t) -> *mut mblk_t;
        pub fn freemsg(mp: *mut mblk_t);
        /// The number of readable bytes across the chain.
        pub fn msgdsize(mp: *const mblk_t) -> size_t;
        /// Write `size` bytes at the end of the message, growing the chain when full.
        pub fn msgappend(mp: *mut mblk_t, data: *const c_char, size: size_t, pad: bool_t) -> *mut mblk_t;
        pub fn dblk_ref_value(db: *mut dblk_t) -> c_int;
    }
}

/// Whether any data block of the message is shared with another message.
pub unsafe fn msg_is_shared(mut mp: *const mblk_t) -> bool {
    while !mp.is_null() {
        if dblk_ref_value((*mp).b_datap) > 1 {
            return true;
        }

        mp = (*mp).b_cont;
    }

    false
}
