use std::ptr::NonNull;

/**
Whether or not a value returned by, or passed to, native code is null.
 */
pub trait IsNull {
    fn is_null(&self) -> bool;
}

impl<T: ?Sized> IsNull for *const T {
    fn is_null(&self) -> bool {
        <*const T>::is_null(*self)
    }
}

impl<T: ?Sized> IsNull for *mut T {
    fn is_null(&self) -> bool {
        <*mut T>::is_null(*self)
    }
}

impl<T: ?Sized> IsNull for NonNull<T> {
    fn is_null(&self) -> bool {
        false
    }
}

impl<T: IsNull> IsNull for Option<T> {
    fn is_null(&self) -> bool {
        self.as_ref().map(IsNull::is_null).unwrap_or(true)
    }
}

/**
Turn a pointer returned from a factory that documents a non-null result into a `NonNull`.

A null here means the native library broke its own contract, so there's nothing
sensible left to do but stop.
 */
#[track_caller]
pub fn expect_non_null<T>(ptr: *mut T, what: &str) -> NonNull<T> {
    match NonNull::new(ptr) {
        Some(ptr) => ptr,
        None => {
            tracing::error!(handle = what, "native library returned a null handle");
            panic!("native library returned a null `{}` handle", what)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn raw_pointers() {
        let mut value = 1u8;

        assert!(IsNull::is_null(&ptr::null::<u8>()));
        assert!(IsNull::is_null(&ptr::null_mut::<u8>()));
        assert!(!IsNull::is_null(&(&mut value as *mut u8)));
    }

    #[test]
    fn options_of_pointers() {
        let mut value = 1u8;

        assert!(None::<*mut u8>.is_null());
        assert!(Some(ptr::null_mut::<u8>()).is_null());
        assert!(!Some(NonNull::from(&mut value)).is_null());
    }

    #[test]
    #[should_panic(expected = "native library returned a null `LinphoneCore` handle")]
    fn expect_non_null_is_fatal() {
        expect_non_null(ptr::null_mut::<u8>(), "LinphoneCore");
    }
}
