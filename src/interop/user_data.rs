/*!
Associating Rust state with a native object through its user-data slot.

Native callbacks only hand back the native object that fired. The Rust context
they need is stored in that object's user-data slot, so callbacks can find it
without a global registry.

The slot is cleared before the context is freed, and owners declare their
`UserData` before their `Managed` handle so the association is gone before the
native reference is released. A callback that fires once teardown has started
finds an empty slot and does nothing.
*/

use crate::interop::thread_bound::ThreadBound;
use crate::{unsafe_block, unsafe_fn};
use libc::c_void;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/**
A native object type with a single opaque user-data slot.

# Safety

`user_data` must return exactly what the last `set_user_data` stored, or null
if nothing was stored.
 */
pub unsafe trait UserDataSlot {
    const TYPE_NAME: &'static str;

    unsafe fn user_data(raw: *mut Self) -> *mut c_void;

    unsafe fn set_user_data(raw: *mut Self, data: *mut c_void);
}

/**
Rust state attached to a native object's user-data slot.
 */
pub struct UserData<S: UserDataSlot, T> {
    raw: NonNull<S>,
    context: NonNull<ThreadBound<T>>,
    _marker: PhantomData<Box<ThreadBound<T>>>,
}

impl<S: UserDataSlot, T> UserData<S, T> {
    unsafe_fn!("`raw` must stay live for as long as the returned `UserData`" =>
    /// Attach `value` to the native object.
    ///
    /// Each object carries at most one association, attaching twice is a bug.
    pub fn attach(raw: NonNull<S>, value: T) -> Self {
        if !S::user_data(raw.as_ptr()).is_null() {
            tracing::error!(handle = S::TYPE_NAME, "user data is already attached");
            panic!("`{}` already has user data attached", S::TYPE_NAME);
        }

        let context = NonNull::from(Box::leak(Box::new(ThreadBound::new(value))));
        S::set_user_data(raw.as_ptr(), context.as_ptr() as *mut c_void);

        tracing::trace!(handle = S::TYPE_NAME, ptr = ?raw, "attached user data");

        UserData {
            raw,
            context,
            _marker: PhantomData,
        }
    });

    unsafe_fn!("`raw` must be null or live, and its user data, if any, must have been attached as a `UserData<S, T>`" =>
    /// Find the Rust state for a native object from inside a callback.
    ///
    /// Returns `None` if nothing is attached, including once teardown has begun.
    pub fn recover<'a>(raw: *mut S) -> Option<&'a T> {
        if raw.is_null() {
            return None;
        }

        let data = S::user_data(raw) as *const ThreadBound<T>;
        if data.is_null() {
            tracing::trace!(handle = S::TYPE_NAME, "callback fired without user data, ignoring");
            return None;
        }

        Some((*data).get())
    });

    pub fn get(&self) -> &T {
        unsafe_block!("The context is live until we're dropped" => self.context.as_ref().get())
    }
}

impl<S: UserDataSlot, T> Drop for UserData<S, T> {
    fn drop(&mut self) {
        unsafe_block!("The native object outlives us and the context was leaked from a `Box` in `attach`" => {
            S::set_user_data(self.raw.as_ptr(), ptr::null_mut());
            drop(Box::from_raw(self.context.as_ptr()));
        });

        tracing::trace!(handle = S::TYPE_NAME, ptr = ?self.raw, "cleared user data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Native {
        data: Cell<*mut c_void>,
    }

    unsafe impl UserDataSlot for Native {
        const TYPE_NAME: &'static str = "Native";

        unsafe fn user_data(raw: *mut Self) -> *mut c_void {
            (*raw).data.get()
        }

        unsafe fn set_user_data(raw: *mut Self, data: *mut c_void) {
            (*raw).data.set(data)
        }
    }

    fn native() -> Native {
        Native {
            data: Cell::new(ptr::null_mut()),
        }
    }

    #[test]
    fn callbacks_recover_the_context() {
        let mut native = native();
        let raw = NonNull::from(&mut native);

        let bridge = unsafe { UserData::attach(raw, String::from("core")) };

        let recovered = unsafe { UserData::<Native, String>::recover(raw.as_ptr()) };
        assert_eq!(Some("core"), recovered.map(String::as_str));
        assert_eq!("core", bridge.get());
    }

    #[test]
    fn slot_is_cleared_on_drop() {
        let mut native = native();
        let raw = NonNull::from(&mut native);

        let bridge = unsafe { UserData::attach(raw, 5u32) };
        drop(bridge);

        assert!(native.data.get().is_null());
        assert!(unsafe { UserData::<Native, u32>::recover(raw.as_ptr()) }.is_none());
    }

    #[test]
    fn null_object_recovers_nothing() {
        assert!(unsafe { UserData::<Native, u32>::recover(ptr::null_mut()) }.is_none());
    }

    #[test]
    #[should_panic(expected = "`Native` already has user data attached")]
    fn attaching_twice_is_fatal() {
        let mut native = native();
        let raw = NonNull::from(&mut native);

        let _first = unsafe { UserData::attach(raw, 1u32) };
        let _second = unsafe { UserData::attach(raw, 2u32) };
    }
}
