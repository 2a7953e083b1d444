/*!
bctoolbox's doubly linked list and allocator.

A list is a pointer to its head node, null being the empty list. Operations
that can change the head return the new one.
*/

use libc::c_void;

#[repr(C)]
pub struct bctbx_list_t {
    pub next: *mut bctbx_list_t,
    pub prev: *mut bctbx_list_t,
    pub data: *mut c_void,
}

pub type bctbx_list_free_func = Option<unsafe extern "C" fn(data: *mut c_void)>;
pub type bctbx_list_copy_func = Option<unsafe extern "C" fn(data: *mut c_void) -> *mut c_void>;

#[cfg(not(any(test, feature = "loopback")))]
pub use self::native::*;

#[cfg(any(test, feature = "loopback"))]
pub use super::loopback::toolbox::*;

#[cfg(not(any(test, feature = "loopback")))]
mod native {
    use super::{bctbx_list_copy_func, bctbx_list_free_func, bctbx_list_t};
    use libc::{c_char, c_int, c_void, size_t};

    #[link(name = "bctoolbox")]
    extern "C" {
        pub fn bctbx_list_new(data: *mut c_void) -> *mut bctbx_list_t;
        pub fn bctbx_list_append(list: *mut bctbx_list_t, data: *mut c_void) -> *mut bctbx_list_t;
        pub fn bctbx_list_prepend(list: *mut bctbx_list_t, data: *mut c_void) -> *mut bctbx_list_t;

        /// Link `second` after `first`. Both lists are consumed.
        pub fn bctbx_list_concat(first: *mut bctbx_list_t, second: *mut bctbx_list_t) -> *mut bctbx_list_t;

        pub fn bctbx_list_next(list: *const bctbx_list_t) -> *mut bctbx_list_t;
        pub fn bctbx_list_get_data(list: *const bctbx_list_t) -> *mut c_void;
        pub fn bctbx_list_size(list: *const bctbx_list_t) -> size_t;

        /// The data of the `index`th node, null if out of range.
        pub fn bctbx_list_nth_data(list: *const bctbx_list_t, index: c_int) -> *mut c_void;

        /// Copy the nodes, sharing the data.
        pub fn bctbx_list_copy(list: *const bctbx_list_t) -> *mut bctbx_list_t;

        /// Copy the nodes, duplicating the data with `copy`.
        pub fn bctbx_list_copy_with_data(list: *const bctbx_list_t, copy: bctbx_list_copy_func) -> *mut bctbx_list_t;

        /// Free the nodes, leaving the data alone.
        pub fn bctbx_list_free(list: *mut bctbx_list_t) -> *mut bctbx_list_t;

        /// Free the nodes and their data.
        pub fn bctbx_list_free_with_data(list: *mut bctbx_list_t, free: bctbx_list_free_func) -> *mut bctbx_list_t;

        pub fn bctbx_strdup(value: *const c_char) -> *mut c_char;
        pub fn bctbx_free(data: *mut c_void);
    }

    /// A copy function for lists of C strings.
    pub unsafe extern "C" fn bctbx_strdup_data(data: *mut c_void) -> *mut c_void {
        bctbx_strdup(data as *const c_char) as *mut c_void
    }
}
