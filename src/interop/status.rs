use std::{
    any::Any,
    cell::RefCell,
    os::raw::c_int,
    panic::{catch_unwind, UnwindSafe},
};

use crate::error::Error;

thread_local! {
    static LAST_CALLBACK_PANIC: RefCell<Option<CallbackPanic>> = RefCell::new(None);
}

/**
The status code returned by a native call.

The native libraries report success as `0` and failure as any other value,
usually `-1`. The bindings never retry; the code is handed back to the caller.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(c_int);

impl Status {
    pub const OK: Status = Status(0);
    pub const ERROR: Status = Status(-1);

    pub fn from_raw(code: c_int) -> Self {
        Status(code)
    }

    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Status::OK
        } else {
            Status::ERROR
        }
    }

    pub fn code(&self) -> c_int {
        self.0
    }

    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    /**
    Convert the status into a `Result`, naming the native call in the error.
     */
    pub fn into_result(self, call: &'static str) -> Result<(), Error> {
        if self.is_ok() {
            Ok(())
        } else {
            tracing::debug!(call, code = self.0, "native call failed");
            Err(Error::Status { call, code: self.0 })
        }
    }
}

/**
A panic that was caught at a native callback boundary.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPanic {
    pub callback: &'static str,
    pub message: Option<String>,
}

/**
Run a Rust handler from inside an `extern "C"` trampoline.

Unwinding into native frames is undefined behaviour, so a panicking handler is
caught here, logged, recorded in a thread-local slot that can be inspected with
`take_last_callback_panic`, and `fallback` is returned to the native caller.
 */
pub fn catch_callback<R>(callback: &'static str, fallback: R, f: impl FnOnce() -> R + UnwindSafe) -> R {
    match catch_unwind(f) {
        Ok(value) => value,
        Err(e) => {
            let message = extract_panic(&e);

            tracing::error!(
                callback,
                message = message.as_deref().unwrap_or("<non-string panic payload>"),
                "panic caught at a native callback boundary"
            );

            LAST_CALLBACK_PANIC.with(|last| {
                *last.borrow_mut() = Some(CallbackPanic { callback, message });
            });

            fallback
        }
    }
}

/**
Take the most recent panic caught by `catch_callback` on this thread.
 */
pub fn take_last_callback_panic() -> Option<CallbackPanic> {
    LAST_CALLBACK_PANIC.with(|last| last.borrow_mut().take())
}

fn extract_panic(err: &Box<dyn Any + Send + 'static>) -> Option<String> {
    if let Some(err) = err.downcast_ref::<String>() {
        Some(err.clone())
    } else if let Some(err) = err.downcast_ref::<&'static str>() {
        Some((*err).to_owned())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert!(Status::OK.is_ok());
        assert!(!Status::ERROR.is_ok());
        assert!(!Status::from_raw(3).is_ok());
        assert_eq!(Status::OK, Status::from_bool(true));
        assert_eq!(-1, Status::from_bool(false).code());
    }

    #[test]
    fn failed_status_names_the_call() {
        let err = Status::ERROR
            .into_result("linphone_call_accept")
            .unwrap_err();

        assert_eq!(
            "native call `linphone_call_accept` failed with status -1",
            err.to_string()
        );
    }

    #[test]
    fn callback_without_panic() {
        let value = catch_callback("test", 0, || 7);

        assert_eq!(7, value);
        assert_eq!(None, take_last_callback_panic());
    }

    #[test]
    fn callback_panic_is_contained() {
        let value = catch_callback("call_state_changed", -1, || -> i32 { panic!("handler failed") });

        assert_eq!(-1, value);

        let last = take_last_callback_panic().expect("missing panic");
        assert_eq!("call_state_changed", last.callback);
        assert_eq!(Some("handler failed".to_owned()), last.message);

        assert_eq!(None, take_last_callback_panic());
    }
}
