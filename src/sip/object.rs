use crate::interop::cow::{CopyableHandle, ManagedReference};
use crate::interop::handle::{Handle, Managed, RefCounted};
use crate::interop::string;
use crate::sys::belle_sip::*;
use crate::unsafe_block;
use libc::c_void;
use std::fmt;

/**
Implement `RefCounted` for a native type with a belle-sip object header.

```ignore
belle_sip_ref_counted! {
    LinphoneAddress => linphone_address_ref, linphone_address_unref;
}
```
*/
macro_rules! belle_sip_ref_counted {
    ($($raw:ty => $retain:path, $release:path;)*) => {
        $(
            $crate::unsafe_impl!("The pair is the native library's own reference counting for this type" =>
            impl $crate::interop::handle::RefCounted for $raw {
                const TYPE_NAME: &'static str = stringify!($raw);

                unsafe fn retain(ptr: std::ptr::NonNull<Self>) {
                    $retain(ptr.as_ptr() as *mut _);
                }

                unsafe fn release(ptr: std::ptr::NonNull<Self>) {
                    $release(ptr.as_ptr() as *mut _);
                }

                // Only the in-process libraries expose the count.
                #[cfg(any(test, feature = "loopback"))]
                unsafe fn ref_count(ptr: std::ptr::NonNull<Self>) -> Option<usize> {
                    let count = $crate::sys::belle_sip::belle_sip_object_get_ref_count(ptr.as_ptr() as *const libc::c_void);
                    usize::try_from(count).ok()
                }
            });

            $crate::unsafe_impl!("The type starts with a belle-sip object header" =>
            impl $crate::sip::BelleSipObject for $raw {});
        )*
    };
}

pub(crate) use belle_sip_ref_counted;

/**
A native type that starts with a `belle_sip_object_t` header.

# Safety

A pointer to `Self` must be usable as a pointer to `belle_sip_object_t`.
 */
pub unsafe trait BelleSipObject: RefCounted {}

belle_sip_ref_counted! {
    belle_generic_uri_t => belle_sip_object_ref, belle_sip_object_unref;
}

/**
The reference type shared by every value over a belle-sip object.

Duplicating goes through `belle_sip_object_clone`, which deep copies.
 */
pub struct ObjectReference<T: BelleSipObject> {
    managed: Managed<T>,
}

impl<T: BelleSipObject> Handle for ObjectReference<T> {
    type Raw = T;

    fn as_ptr(&self) -> *mut T {
        self.managed.as_ptr()
    }
}

impl<T: BelleSipObject> CopyableHandle for ObjectReference<T> {
    fn duplicate(&self) -> Option<Self> {
        let copy = unsafe_block!("We hold a reference and the object has a belle-sip header" => {
            belle_sip_object_clone(as_object(self.managed.as_ptr())) as *mut T
        });

        let managed = unsafe_block!("A clone is a new floating object of the same type" => Managed::from_nullable(copy)?);

        Some(ObjectReference { managed })
    }
}

impl<T: BelleSipObject> ManagedReference for ObjectReference<T> {
    type Raw = T;

    fn from_managed(managed: Managed<T>) -> Self {
        ObjectReference { managed }
    }

    fn managed(&self) -> &Managed<T> {
        &self.managed
    }
}

impl<T: BelleSipObject> fmt::Debug for ObjectReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.managed, f)
    }
}

/**
Operations every belle-sip backed value supports.
 */
pub trait BelledonneObject {
    /// The object header, for read-only native calls.
    fn object_ptr(&self) -> *const belle_sip_object_t;

    /// The object's textual form, as belle-sip marshals it.
    fn marshal(&self) -> String {
        unsafe_block!("The object is live while we're borrowed and the buffer is ours" => {
            string::from_owned(belle_sip_object_to_string(self.object_ptr() as *const c_void))
        })
        .unwrap_or_default()
    }

    /// The native type name.
    fn type_name(&self) -> String {
        unsafe_block!("The object is live while we're borrowed and the buffer is ours" => {
            string::from_owned(belle_sip_object_describe(self.object_ptr() as *const c_void))
        })
        .unwrap_or_default()
    }
}
