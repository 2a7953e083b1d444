/*!
belle-sip's object model and generic URIs.
*/

#[cfg(not(any(test, feature = "loopback")))]
pub use self::native::*;

#[cfg(any(test, feature = "loopback"))]
pub use super::loopback::belle_sip::*;

/// View any belle-sip object through its header.
pub fn as_object<T>(obj: *const T) -> *mut belle_sip_object_t {
    obj as *mut belle_sip_object_t
}

#[cfg(not(any(test, feature = "loopback")))]
mod native {
    use crate::sys::opaque_types;
    use libc::{c_char, c_int, c_void};

    opaque_types!(belle_sip_object_t, belle_generic_uri_t);

    #[link(name = "bellesip")]
    extern "C" {
        pub fn belle_sip_object_ref(obj: *mut c_void) -> *mut c_void;

        /// Unreferencing a floating object destroys it.
        pub fn belle_sip_object_unref(obj: *mut c_void);

        /// Deep copy an object. The copy is floating.
        pub fn belle_sip_object_clone(obj: *const belle_sip_object_t) -> *mut belle_sip_object_t;

        /// The textual form of an object, to be freed by the caller.
        pub fn belle_sip_object_to_string(obj: *const c_void) -> *mut c_char;

        /// The type name of an object, to be freed by the caller.
        pub fn belle_sip_object_describe(obj: *const c_void) -> *mut c_char;

        pub fn belle_generic_uri_new() -> *mut belle_generic_uri_t;

        /// Parse a URI, returning null if it's malformed.
        pub fn belle_generic_uri_parse(uri: *const c_char) -> *mut belle_generic_uri_t;

        pub fn belle_generic_uri_get_scheme(uri: *const belle_generic_uri_t) -> *const c_char;
        pub fn belle_generic_uri_set_scheme(uri: *mut belle_generic_uri_t, value: *const c_char);
        pub fn belle_generic_uri_get_user(uri: *const belle_generic_uri_t) -> *const c_char;
        pub fn belle_generic_uri_set_user(uri: *mut belle_generic_uri_t, value: *const c_char);
        pub fn belle_generic_uri_get_user_password(uri: *const belle_generic_uri_t) -> *const c_char;
        pub fn belle_generic_uri_set_user_password(uri: *mut belle_generic_uri_t, value: *const c_char);
        pub fn belle_generic_uri_get_host(uri: *const belle_generic_uri_t) -> *const c_char;
        pub fn belle_generic_uri_set_host(uri: *mut belle_generic_uri_t, value: *const c_char);
        pub fn belle_generic_uri_get_path(uri: *const belle_generic_uri_t) -> *const c_char;
        pub fn belle_generic_uri_set_path(uri: *mut belle_generic_uri_t, value: *const c_char);
        pub fn belle_generic_uri_get_query(uri: *const belle_generic_uri_t) -> *const c_char;
        pub fn belle_generic_uri_set_query(uri: *mut belle_generic_uri_t, value: *const c_char);
        pub fn belle_generic_uri_get_opaque_part(uri: *const belle_generic_uri_t) -> *const c_char;
        pub fn belle_generic_uri_set_opaque_part(uri: *mut belle_generic_uri_t, value: *const c_char);

        /// The port, or -1 if none was given.
        pub fn belle_generic_uri_get_port(uri: *const belle_generic_uri_t) -> c_int;
        pub fn belle_generic_uri_set_port(uri: *mut belle_generic_uri_t, port: c_int);
    }
}
