/*!
The native C ABI of bctoolbox, belle-sip, liblinphone, mediastreamer2 and oRTP.

Each module declares the subset of one library the bindings consume. Types
the bindings read field by field are laid out here; everything else is opaque
and only ever reached through raw pointers.

Builds with the `loopback` feature (and every unit test build) link against
an in-process stand-in instead, see `loopback`. It keeps the libraries'
ownership rules so the bindings behave the same on top of either.
*/

#![allow(non_camel_case_types, non_upper_case_globals)]

pub mod belle_sip;
pub mod linphone;
pub mod log;
pub mod mediastreamer;
pub mod ortp;
pub mod toolbox;

#[cfg(any(test, feature = "loopback"))]
pub mod loopback;

use libc::c_uchar;

pub type bool_t = c_uchar;

pub const TRUE: bool_t = 1;
pub const FALSE: bool_t = 0;

pub(crate) fn to_bool_t(value: bool) -> bool_t {
    if value {
        TRUE
    } else {
        FALSE
    }
}

/// Declare an opaque native type, only ever used behind a pointer.
#[cfg(not(any(test, feature = "loopback")))]
macro_rules! opaque_types {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}

#[cfg(not(any(test, feature = "loopback")))]
pub(crate) use opaque_types;
