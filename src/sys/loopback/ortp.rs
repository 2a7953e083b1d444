/*!
oRTP message blocks.
*/

use super::bool_t;
use crate::sys::ortp::mblk_t;
use libc::{c_char, c_int, size_t};
use std::ptr;

/// A reference counted buffer, shared by every block that points into it.
pub struct dblk_t {
    buffer: Box<[u8]>,
    refs: c_int,
}

unsafe fn new_block(size: usize) -> *mut mblk_t {
    let datap = Box::into_raw(Box::new(dblk_t {
        buffer: vec![0; size].into_boxed_slice(),
        refs: 1,
    }));

    let base = (*datap).buffer.as_mut_ptr();
    Box::into_raw(Box::new(mblk_t::new(datap, base, base)))
}

unsafe fn limit(mp: *const mblk_t) -> *mut u8 {
    let buffer = &mut (*(*mp).b_datap).buffer;
    buffer.as_mut_ptr().add(buffer.len())
}

pub unsafe extern "C" fn allocb(size: size_t, _unused: c_int) -> *mut mblk_t {
    new_block(size)
}

pub unsafe extern "C" fn dupmsg(mut mp: *mut mblk_t) -> *mut mblk_t {
    let mut head: *mut mblk_t = ptr::null_mut();
    let mut tail: *mut mblk_t = ptr::null_mut();

    while !mp.is_null() {
        (*(*mp).b_datap).refs += 1;
        let block = Box::into_raw(Box::new(mblk_t::new((*mp).b_datap, (*mp).b_rptr, (*mp).b_wptr)));

        if tail.is_null() {
            head = block;
        } else {
            (*tail).b_cont = block;
        }

        tail = block;
        mp = (*mp).b_cont;
    }

    head
}

pub unsafe extern "C" fn copymsg(mp: *const mblk_t) -> *mut mblk_t {
    let copy = new_block(msgdsize(mp));
    let mut block = mp;

    while !block.is_null() {
        let len = (*block).b_wptr.offset_from((*block).b_rptr) as usize;
        ptr::copy_nonoverlapping((*block).b_rptr, (*copy).b_wptr, len);
        (*copy).b_wptr = (*copy).b_wptr.add(len);

        block = (*block).b_cont;
    }

    copy
}

pub unsafe extern "C" fn freemsg(mut mp: *mut mblk_t) {
    while !mp.is_null() {
        let block = Box::from_raw(mp);
        mp = block.b_cont;

        (*block.b_datap).refs -= 1;
        if (*block.b_datap).refs == 0 {
            drop(Box::from_raw(block.b_datap));
        }
    }
}

pub unsafe extern "C" fn msgdsize(mut mp: *const mblk_t) -> size_t {
    let mut size = 0;

    while !mp.is_null() {
        size += (*mp).b_wptr.offset_from((*mp).b_rptr) as usize;
        mp = (*mp).b_cont;
    }

    size
}

/// Write at the end of the last block, chaining a new one if it's full.
pub unsafe extern "C" fn msgappend(mp: *mut mblk_t, data: *const c_char, size: size_t, _pad: bool_t) -> *mut mblk_t {
    let mut last = mp;
    while !(*last).b_cont.is_null() {
        last = (*last).b_cont;
    }

    if (*last).b_wptr.add(size) > limit(last) {
        let block = new_block(size);
        (*last).b_cont = block;
        last = block;
    }

    ptr::copy_nonoverlapping(data as *const u8, (*last).b_wptr, size);
    (*last).b_wptr = (*last).b_wptr.add(size);

    last
}

pub unsafe extern "C" fn dblk_ref_value(db: *mut dblk_t) -> c_int {
    (*db).refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::FALSE;

    unsafe fn append(mp: *mut mblk_t, data: &[u8]) {
        msgappend(mp, data.as_ptr() as *const c_char, data.len(), FALSE);
    }

    #[test]
    fn appending_past_the_capacity_chains_blocks() {
        unsafe {
            let mp = allocb(4, 0);
            append(mp, b"abc");
            append(mp, b"defg");

            assert!(!(*mp).b_cont.is_null());
            assert_eq!(7, msgdsize(mp));

            let copy = copymsg(mp);
            assert!((*copy).b_cont.is_null());
            assert_eq!(7, msgdsize(copy));

            freemsg(copy);
            freemsg(mp);
        }
    }

    #[test]
    fn duplicates_share_data_blocks() {
        unsafe {
            let mp = allocb(16, 0);
            append(mp, b"abc");

            let dup = dupmsg(mp);
            assert_eq!(2, dblk_ref_value((*mp).b_datap));
            assert_eq!((*mp).b_datap, (*dup).b_datap);

            freemsg(dup);
            assert_eq!(1, dblk_ref_value((*mp).b_datap));

            freemsg(mp);
        }
    }
}
