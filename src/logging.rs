/*!
Forwarding native log output to `tracing`.

The native libraries share one process-wide log handler. `install` points it
at a trampoline that renders each `printf` style message and re-emits it as a
`tracing` event with the native domain as a field. Whatever subscriber the
application sets up sees both sides.
*/

use crate::interop::status::catch_callback;
use crate::interop::string;
use crate::sys::log::*;
use crate::unsafe_block;
use libc::c_char;
use std::panic::AssertUnwindSafe;

unsafe extern "C" fn forward(domain: *const c_char, level: BctbxLogLevel, fmt: *const c_char, args: va_list) {
    catch_callback(
        "log_handler",
        (),
        AssertUnwindSafe(|| {
            let (domain, message) = unsafe_block!("Both strings are borrowed for the duration of the call, `args` matches `fmt`" => {
                (string::from_borrowed(domain), format_message(fmt, args))
            });

            let domain = domain.unwrap_or_default();
            let message = message.unwrap_or_default();

            // `tracing::event!` needs a constant level.
            match level {
                BCTBX_LOG_TRACE => tracing::event!(tracing::Level::TRACE, domain = %domain, "{}", message),
                BCTBX_LOG_DEBUG => tracing::event!(tracing::Level::DEBUG, domain = %domain, "{}", message),
                BCTBX_LOG_WARNING => tracing::event!(tracing::Level::WARN, domain = %domain, "{}", message),
                BCTBX_LOG_ERROR | BCTBX_LOG_FATAL => {
                    tracing::event!(tracing::Level::ERROR, domain = %domain, "{}", message)
                }
                _ => tracing::event!(tracing::Level::INFO, domain = %domain, "{}", message),
            }
        }),
    )
}

/// Route native log output to `tracing`, replacing any previous handler.
pub fn install() {
    unsafe_block!("The trampoline matches the handler signature and never unwinds" => {
        belle_sip_set_log_handler(Some(forward))
    })
}

/// Stop forwarding. Native output is dropped afterwards.
pub fn uninstall() {
    unsafe_block!("No preconditions" => belle_sip_set_log_handler(None))
}
