/*!
The process-wide log handler.

Messages are formatted on the Rust side, so handlers receive them as an
already rendered format string and no arguments.
*/

pub(crate) use crate::sys::log::{BCTBX_LOG_DEBUG, BCTBX_LOG_ERROR, BCTBX_LOG_MESSAGE, BCTBX_LOG_WARNING};
use crate::sys::log::{va_list, BctbxLogFunc, BctbxLogLevel};
use libc::c_char;
use std::fmt;
use std::ptr;
use std::sync::Mutex;

static HANDLER: Mutex<BctbxLogFunc> = Mutex::new(None);

/// Install the process-wide log handler, or remove it with `None`.
pub unsafe extern "C" fn belle_sip_set_log_handler(handler: BctbxLogFunc) {
    *HANDLER.lock().unwrap_or_else(|e| e.into_inner()) = handler;
}

pub unsafe extern "C" fn belle_sip_get_log_handler() -> BctbxLogFunc {
    *HANDLER.lock().unwrap_or_else(|e| e.into_inner())
}

/// Render the message a log handler received.
pub unsafe fn format_message(fmt: *const c_char, _args: va_list) -> Option<String> {
    super::read_c_string(fmt)
}

pub(crate) fn emit(domain: &str, level: BctbxLogLevel, message: fmt::Arguments) {
    let handler = unsafe { belle_sip_get_log_handler() };

    if let Some(handler) = handler {
        let domain = super::c_string(domain);
        let message = super::c_string(&message.to_string());

        unsafe { handler(domain.as_ptr(), level, message.as_ptr(), ptr::null_mut()) }
    }
}

macro_rules! native_log {
    ($domain:expr, $level:expr, $($arg:tt)*) => {
        $crate::sys::loopback::log::emit($domain, $level, format_args!($($arg)*))
    };
}

pub(crate) use native_log;
