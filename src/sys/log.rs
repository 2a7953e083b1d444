/*!
The log handler belle-sip installs on bctoolbox, shared by every library.
*/

use libc::{c_char, c_int, c_void};

pub type BctbxLogLevel = c_int;

pub const BCTBX_LOG_DEBUG: BctbxLogLevel = 1;
pub const BCTBX_LOG_TRACE: BctbxLogLevel = 1 << 1;
pub const BCTBX_LOG_MESSAGE: BctbxLogLevel = 1 << 2;
pub const BCTBX_LOG_WARNING: BctbxLogLevel = 1 << 3;
pub const BCTBX_LOG_ERROR: BctbxLogLevel = 1 << 4;
pub const BCTBX_LOG_FATAL: BctbxLogLevel = 1 << 5;

/// A C `va_list`. Every ABI we target passes it to a function as a pointer.
pub type va_list = *mut c_void;

/// Receives a `printf` style format and its arguments.
pub type BctbxLogFunc =
    Option<unsafe extern "C" fn(domain: *const c_char, level: BctbxLogLevel, fmt: *const c_char, args: va_list)>;

#[cfg(not(any(test, feature = "loopback")))]
pub use self::native::*;

#[cfg(any(test, feature = "loopback"))]
pub use super::loopback::log::*;

#[cfg(not(any(test, feature = "loopback")))]
mod native {
    use super::{va_list, BctbxLogFunc};
    use libc::{c_char, c_int, size_t};

    // A `va_list` can only be walked once, so longer messages are cut here.
    const MESSAGE_CAPACITY: usize = 4096;

    #[link(name = "bellesip")]
    extern "C" {
        /// Install the process-wide log handler, or remove it with `None`.
        pub fn belle_sip_set_log_handler(handler: BctbxLogFunc);
    }

    extern "C" {
        fn vsnprintf(buffer: *mut c_char, size: size_t, fmt: *const c_char, args: va_list) -> c_int;
    }

    /// Render the message a log handler received. Consumes `args`.
    pub unsafe fn format_message(fmt: *const c_char, args: va_list) -> Option<String> {
        if fmt.is_null() {
            return None;
        }

        let mut buffer = vec![0u8; MESSAGE_CAPACITY];
        let written = vsnprintf(buffer.as_mut_ptr() as *mut c_char, buffer.len(), fmt, args);

        let written = usize::try_from(written).ok()?;
        buffer.truncate(written.min(MESSAGE_CAPACITY - 1));

        Some(String::from_utf8_lossy(&buffer).into_owned())
    }
}
