/*!
Value-semantic Rust bindings over bctoolbox, belle-sip, liblinphone, mediastreamer2 and oRTP.

Native objects are reference counted and mutable through any pointer to them.
The types here wrap them so that copies behave like independent values: a copy
shares the native object until one side mutates it, and then gets its own.
*/

pub mod error;
pub mod interop;
pub mod linphone;
pub mod logging;
pub mod media;
pub mod rtp;
pub mod sip;
pub mod sys;
pub mod toolbox;

pub use crate::error::{Error, Result};
