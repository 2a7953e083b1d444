/*!
String ownership conventions at the native boundary.

Native getters hand back strings in one of two ways, and each property sticks
to one of them:

- a *borrowed* `const char *` that stays owned by the object it came from.
  It's copied and must never be freed.
- an *owned* `char *` allocated for the caller. It's copied and then freed
  with bctoolbox's allocator. Forgetting to free it leaks.
*/

use crate::error::Error;
use crate::{unsafe_block, unsafe_fn};
use libc::c_char;
use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr;

unsafe_fn!("`ptr` must be null or a valid C string that outlives this call" =>
/// Copy a string the native library keeps ownership of.
pub fn from_borrowed(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
});

unsafe_fn!("`ptr` must be null or a C string allocated by the native libraries that nothing else frees" =>
/// Copy a string whose buffer was handed to the caller, then free the buffer.
pub fn from_owned(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    let value = CStr::from_ptr(ptr).to_string_lossy().into_owned();
    crate::sys::toolbox::bctbx_free(ptr as *mut libc::c_void);

    Some(value)
});

/// Convert a Rust string into a C string for a native call.
pub fn to_c_string(value: &str) -> Result<CString, Error> {
    Ok(CString::new(value)?)
}

/// Convert an optional Rust string into an optional C string for a native call.
pub fn to_optional_c_string(value: Option<&str>) -> Result<Option<CString>, Error> {
    value.map(to_c_string).transpose()
}

/// The pointer to pass for an optional C string, null when absent.
pub fn as_ptr_or_null(value: &Option<CString>) -> *const c_char {
    value.as_ref().map(|s| s.as_ptr()).unwrap_or(ptr::null())
}

/**
A C string buffer owned by Rust and lent to a native struct field.

Native structs like filter descriptions point at `const char *` fields they
never free. The buffer lives on the C heap so a struct copied byte-for-byte
still points at valid memory until the owning `ManagedCString` is dropped.
 */
pub struct ManagedCString {
    ptr: *mut c_char,
}

impl ManagedCString {
    pub fn new(value: &str) -> Result<Self, Error> {
        let value = to_c_string(value)?;

        let ptr = unsafe_block!("`value` is a valid C string" => libc::strdup(value.as_ptr()));
        if ptr.is_null() {
            panic!("the C allocator failed to duplicate a string");
        }

        Ok(ManagedCString { ptr })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr
    }

    pub fn as_c_str(&self) -> &CStr {
        unsafe_block!("The buffer is a valid C string for as long as we live" => CStr::from_ptr(self.ptr))
    }

    pub fn to_string_lossy(&self) -> String {
        self.as_c_str().to_string_lossy().into_owned()
    }
}

impl Clone for ManagedCString {
    fn clone(&self) -> Self {
        let ptr = unsafe_block!("The buffer is a valid C string" => libc::strdup(self.ptr));
        if ptr.is_null() {
            panic!("the C allocator failed to duplicate a string");
        }

        ManagedCString { ptr }
    }
}

impl Drop for ManagedCString {
    fn drop(&mut self) {
        unsafe_block!("We own the buffer, allocated by `strdup`" => libc::free(self.ptr as *mut libc::c_void))
    }
}

impl fmt::Debug for ManagedCString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.as_c_str(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_is_copied() {
        let source = CString::new("sip:toto@titi").unwrap();

        let copied = unsafe { from_borrowed(source.as_ptr()) };

        assert_eq!(Some("sip:toto@titi".to_owned()), copied);
        assert_eq!("sip:toto@titi", source.to_str().unwrap());
    }

    #[test]
    fn owned_is_copied_and_freed() {
        let source = CString::new("linphone").unwrap();
        let owned = unsafe { libc::strdup(source.as_ptr()) };

        assert_eq!(Some("linphone".to_owned()), unsafe { from_owned(owned) });
    }

    #[test]
    fn null_strings() {
        assert_eq!(None, unsafe { from_borrowed(ptr::null()) });
        assert_eq!(None, unsafe { from_owned(ptr::null_mut()) });
        assert!(as_ptr_or_null(&None).is_null());
    }

    #[test]
    fn interior_nul_is_an_error() {
        assert!(to_c_string("a\0b").is_err());
        assert!(to_optional_c_string(None).unwrap().is_none());
    }

    #[test]
    fn managed_c_string_clones_its_buffer() {
        let name = ManagedCString::new("MSVolume").unwrap();
        let copy = name.clone();

        assert_ne!(name.as_ptr(), copy.as_ptr());
        assert_eq!("MSVolume", copy.to_string_lossy());
    }
}
