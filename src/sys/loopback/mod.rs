/*!
An in-process stand-in for the native libraries.

It implements the slice of each library's ABI declared in `sys`, with the
same ownership rules: objects start floating with a count of zero, the first
`*_ref` takes ownership, `*_unref` to zero destroys, `char *` results belong
to the caller and `const char *` results stay owned by the object they came from.

There is no network underneath. Calls advance through their states one
`linphone_core_iterate` at a time, and incoming calls are injected rather
than received. Unit tests always run on top of it; other builds opt in with
the `loopback` feature.
*/

#![allow(improper_ctypes_definitions)]

pub mod belle_sip;
pub mod linphone;
pub mod log;
pub mod mediastreamer;
pub mod ortp;
pub mod toolbox;

pub(crate) use crate::sys::{bool_t, to_bool_t, FALSE};

use libc::c_char;
use std::ffi::{CStr, CString};
use std::ptr;

/// Copy a caller-provided C string, null stays `None`.
pub(crate) unsafe fn copy_c_string(value: *const c_char) -> Option<CString> {
    if value.is_null() {
        None
    } else {
        Some(CStr::from_ptr(value).to_owned())
    }
}

/// Read a caller-provided C string as UTF-8, lossily.
pub(crate) unsafe fn read_c_string(value: *const c_char) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(CStr::from_ptr(value).to_string_lossy().into_owned())
    }
}

/// Hand out a field as a borrowed `const char *`.
pub(crate) fn borrow_c_string(value: &Option<CString>) -> *const c_char {
    value.as_ref().map(|value| value.as_ptr()).unwrap_or(ptr::null())
}

/// Allocate a `char *` the caller must release with `bctbx_free`.
pub(crate) fn alloc_c_string(value: &str) -> *mut c_char {
    match CString::new(value) {
        Ok(value) => unsafe { libc::strdup(value.as_ptr()) },
        Err(_) => ptr::null_mut(),
    }
}

/// Build a `CString` from text that came out of other C strings.
pub(crate) fn c_string(value: &str) -> CString {
    CString::new(value.replace('\0', "")).unwrap_or_default()
}
