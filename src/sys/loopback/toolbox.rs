/*!
bctoolbox's doubly linked list and allocator, over the C heap.
*/

pub(crate) use crate::sys::toolbox::bctbx_list_t;
use crate::sys::toolbox::{bctbx_list_copy_func, bctbx_list_free_func};
use libc::{c_char, c_int, c_void};
use std::ptr;

pub unsafe extern "C" fn bctbx_list_new(data: *mut c_void) -> *mut bctbx_list_t {
    Box::into_raw(Box::new(bctbx_list_t {
        next: ptr::null_mut(),
        prev: ptr::null_mut(),
        data,
    }))
}

unsafe fn last(mut list: *mut bctbx_list_t) -> *mut bctbx_list_t {
    while !(*list).next.is_null() {
        list = (*list).next;
    }

    list
}

pub unsafe extern "C" fn bctbx_list_append(list: *mut bctbx_list_t, data: *mut c_void) -> *mut bctbx_list_t {
    let node = bctbx_list_new(data);

    if list.is_null() {
        return node;
    }

    let tail = last(list);
    (*tail).next = node;
    (*node).prev = tail;

    list
}

pub unsafe extern "C" fn bctbx_list_prepend(list: *mut bctbx_list_t, data: *mut c_void) -> *mut bctbx_list_t {
    let node = bctbx_list_new(data);

    if !list.is_null() {
        (*node).next = list;
        (*list).prev = node;
    }

    node
}

/// Link `second` after `first`. Both lists are consumed.
pub unsafe extern "C" fn bctbx_list_concat(first: *mut bctbx_list_t, second: *mut bctbx_list_t) -> *mut bctbx_list_t {
    if first.is_null() {
        return second;
    }

    if second.is_null() {
        return first;
    }

    let tail = last(first);
    (*tail).next = second;
    (*second).prev = tail;

    first
}

pub unsafe extern "C" fn bctbx_list_next(list: *const bctbx_list_t) -> *mut bctbx_list_t {
    (*list).next
}

pub unsafe extern "C" fn bctbx_list_get_data(list: *const bctbx_list_t) -> *mut c_void {
    (*list).data
}

pub unsafe extern "C" fn bctbx_list_size(mut list: *const bctbx_list_t) -> usize {
    let mut size = 0;

    while !list.is_null() {
        size += 1;
        list = (*list).next;
    }

    size
}

/// The data of the `index`th node, null if out of range.
pub unsafe extern "C" fn bctbx_list_nth_data(mut list: *const bctbx_list_t, index: c_int) -> *mut c_void {
    if index < 0 {
        return ptr::null_mut();
    }

    for _ in 0..index {
        if list.is_null() {
            return ptr::null_mut();
        }

        list = (*list).next;
    }

    if list.is_null() {
        ptr::null_mut()
    } else {
        (*list).data
    }
}

/// Copy the nodes, sharing the data.
pub unsafe extern "C" fn bctbx_list_copy(list: *const bctbx_list_t) -> *mut bctbx_list_t {
    bctbx_list_copy_with_data(list, None)
}

/// Copy the nodes, duplicating the data with `copy`.
pub unsafe extern "C" fn bctbx_list_copy_with_data(
    mut list: *const bctbx_list_t,
    copy: bctbx_list_copy_func,
) -> *mut bctbx_list_t {
    let mut result = ptr::null_mut();

    while !list.is_null() {
        let data = match copy {
            Some(copy) => copy((*list).data),
            None => (*list).data,
        };

        result = bctbx_list_append(result, data);
        list = (*list).next;
    }

    result
}

/// Free the nodes, leaving the data alone.
pub unsafe extern "C" fn bctbx_list_free(list: *mut bctbx_list_t) -> *mut bctbx_list_t {
    bctbx_list_free_with_data(list, None)
}

/// Free the nodes and their data.
pub unsafe extern "C" fn bctbx_list_free_with_data(
    mut list: *mut bctbx_list_t,
    free: bctbx_list_free_func,
) -> *mut bctbx_list_t {
    while !list.is_null() {
        let node = Box::from_raw(list);

        if let Some(free) = free {
            free(node.data);
        }

        list = node.next;
    }

    ptr::null_mut()
}

pub unsafe extern "C" fn bctbx_strdup(value: *const c_char) -> *mut c_char {
    libc::strdup(value)
}

/// A copy function for lists of C strings.
pub unsafe extern "C" fn bctbx_strdup_data(data: *mut c_void) -> *mut c_void {
    bctbx_strdup(data as *const c_char) as *mut c_void
}

pub unsafe extern "C" fn bctbx_free(data: *mut c_void) {
    libc::free(data)
}
