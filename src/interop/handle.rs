/*
Ownership tokens for native objects that use manual reference counting.

`Unmanaged` is a capability: it knows how to bump the native count of an
object but owns nothing. `Managed` is an owner: it takes exactly one reference
when it's created and gives exactly that reference back when it's dropped.

Neither protects against the native library destroying an object it still
hands out pointers to. That's the library's contract to keep.
*/

use crate::interop::is_null::IsNull;
use crate::{unsafe_block, unsafe_fn};
use std::fmt;
use std::ptr::NonNull;

/**
A family of native objects sharing a retain/release pair.

# Safety

Implementations must forward to the native library's own reference counting
functions for `Self`, and `release` must be the exact inverse of `retain`.
 */
pub unsafe trait RefCounted {
    /// The native type name, used in logs and contract-violation panics.
    const TYPE_NAME: &'static str;

    unsafe fn retain(ptr: NonNull<Self>);

    unsafe fn release(ptr: NonNull<Self>);

    /// The native reference count, where the library exposes one.
    ///
    /// This is only ever used for diagnostics and tests. The native library can
    /// hold references the bindings can't see, so it says nothing about whether
    /// a value can be mutated in place.
    unsafe fn ref_count(ptr: NonNull<Self>) -> Option<usize> {
        let _ = ptr;
        None
    }
}

/**
Anything that wraps a raw native pointer.
 */
pub trait Handle {
    type Raw;

    fn as_ptr(&self) -> *mut Self::Raw;
}

/**
An unowned native object.

This is a capability token, not an owner: it's never implicitly copied and
dropping it doesn't touch the native reference count.
 */
#[repr(transparent)]
pub struct Unmanaged<T: RefCounted>(NonNull<T>);

impl<T: RefCounted> Unmanaged<T> {
    pub fn new(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(Unmanaged)
    }

    pub fn as_non_null(&self) -> NonNull<T> {
        self.0
    }

    unsafe_fn!("The object must be live" =>
    pub fn retain(&self) {
        tracing::trace!(handle = T::TYPE_NAME, ptr = ?self.0, "retain");
        T::retain(self.0)
    });

    unsafe_fn!("The object must be live and this must balance an earlier `retain`" =>
    pub fn release(&self) {
        tracing::trace!(handle = T::TYPE_NAME, ptr = ?self.0, "release");
        T::release(self.0)
    });

    unsafe_fn!("The object must be live" =>
    pub fn ref_count(&self) -> Option<usize> {
        T::ref_count(self.0)
    });
}

impl<T: RefCounted> Handle for Unmanaged<T> {
    type Raw = T;

    fn as_ptr(&self) -> *mut T {
        self.0.as_ptr()
    }
}

impl<T: RefCounted> IsNull for Unmanaged<T> {
    fn is_null(&self) -> bool {
        false
    }
}

impl<T: RefCounted> fmt::Debug for Unmanaged<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Unmanaged")
            .field(&T::TYPE_NAME)
            .field(&self.0)
            .finish()
    }
}

/**
A single strong reference to a native object.

The reference is taken when the `Managed` is created and released when it's
dropped, on every path, including unwinding. Two `Managed`s can point at the
same native object; each holds its own reference.
 */
pub struct Managed<T: RefCounted> {
    unmanaged: Unmanaged<T>,
}

impl<T: RefCounted> Managed<T> {
    unsafe_fn!("`ptr` must be null or point to a live object of type `T`" =>
    /// Take a reference to an object returned by a factory documented as never returning null.
    ///
    /// A null pointer is a broken native contract and panics.
    #[track_caller]
    pub fn new(ptr: *mut T) -> Self {
        match Managed::from_nullable(ptr) {
            Some(managed) => managed,
            None => {
                tracing::error!(handle = T::TYPE_NAME, "attempted to manage a null handle");
                panic!("attempted to manage a null `{}` handle", T::TYPE_NAME)
            }
        }
    });

    unsafe_fn!("`ptr` must be null or point to a live object of type `T`" =>
    /// Take a reference to an object returned by a call that's allowed to fail, such as a parser.
    pub fn from_nullable(ptr: *mut T) -> Option<Self> {
        let unmanaged = Unmanaged::new(ptr)?;
        unmanaged.retain();

        Some(Managed { unmanaged })
    });

    pub fn unmanaged(&self) -> &Unmanaged<T> {
        &self.unmanaged
    }

    pub fn ref_count(&self) -> Option<usize> {
        unsafe_block!("We hold a reference so the object is live" => self.unmanaged.ref_count())
    }
}

impl<T: RefCounted> Handle for Managed<T> {
    type Raw = T;

    fn as_ptr(&self) -> *mut T {
        self.unmanaged.as_ptr()
    }
}

impl<T: RefCounted> Drop for Managed<T> {
    fn drop(&mut self) {
        unsafe_block!("We own exactly one reference, taken in `from_nullable`" => self.unmanaged.release())
    }
}

impl<T: RefCounted> fmt::Debug for Managed<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Managed")
            .field("handle", &T::TYPE_NAME)
            .field("ptr", &self.unmanaged.0)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::ptr;

    /// A stand-in native object that counts retains and releases.
    pub(crate) struct Counted {
        pub(crate) refs: Cell<usize>,
        pub(crate) retains: Cell<usize>,
        pub(crate) releases: Cell<usize>,
    }

    impl Counted {
        pub(crate) fn new() -> Self {
            Counted {
                refs: Cell::new(0),
                retains: Cell::new(0),
                releases: Cell::new(0),
            }
        }
    }

    unsafe impl RefCounted for Counted {
        const TYPE_NAME: &'static str = "Counted";

        unsafe fn retain(ptr: NonNull<Self>) {
            let counted = ptr.as_ref();
            counted.refs.set(counted.refs.get() + 1);
            counted.retains.set(counted.retains.get() + 1);
        }

        unsafe fn release(ptr: NonNull<Self>) {
            let counted = ptr.as_ref();
            counted.refs.set(counted.refs.get() - 1);
            counted.releases.set(counted.releases.get() + 1);
        }

        unsafe fn ref_count(ptr: NonNull<Self>) -> Option<usize> {
            Some(ptr.as_ref().refs.get())
        }
    }

    #[test]
    fn unmanaged_does_not_own() {
        let mut counted = Counted::new();

        let unmanaged = Unmanaged::new(&mut counted as *mut Counted).expect("null");
        drop(unmanaged);

        assert_eq!(0, counted.retains.get());
        assert_eq!(0, counted.releases.get());
    }

    #[test]
    fn unmanaged_from_null() {
        assert!(Unmanaged::<Counted>::new(ptr::null_mut()).is_none());
    }

    #[test]
    fn managed_retains_once_and_releases_once() {
        let mut counted = Counted::new();
        let ptr = &mut counted as *mut Counted;

        {
            let managed = unsafe { Managed::new(ptr) };

            assert_eq!(Some(1), managed.ref_count());
            assert_eq!(ptr, managed.as_ptr());
        }

        assert_eq!(1, counted.retains.get());
        assert_eq!(1, counted.releases.get());
        assert_eq!(0, counted.refs.get());
    }

    #[test]
    fn managed_aliases_hold_their_own_reference() {
        let mut counted = Counted::new();
        let ptr = &mut counted as *mut Counted;

        let first = unsafe { Managed::new(ptr) };
        let second = unsafe { Managed::new(ptr) };

        assert_eq!(first.as_ptr(), second.as_ptr());
        assert_eq!(Some(2), second.ref_count());

        drop(first);
        assert_eq!(Some(1), second.ref_count());

        drop(second);
        assert_eq!(0, counted.refs.get());
    }

    #[test]
    fn managed_releases_while_unwinding() {
        let mut counted = Counted::new();
        let ptr = &mut counted as *mut Counted;

        let addr = ptr as usize;
        let result = std::panic::catch_unwind(move || {
            let _managed = unsafe { Managed::new(addr as *mut Counted) };
            panic!("unwinding");
        });

        assert!(result.is_err());
        assert_eq!(1, counted.releases.get());
    }

    #[test]
    fn nullable_construction_returns_none() {
        let managed = unsafe { Managed::<Counted>::from_nullable(ptr::null_mut()) };

        assert!(managed.is_none());
    }

    #[test]
    #[should_panic(expected = "attempted to manage a null `Counted` handle")]
    fn null_handle_is_fatal() {
        let _ = unsafe { Managed::<Counted>::new(ptr::null_mut()) };
    }
}
