/*!
Macros that force every piece of unsafe code in the bindings to carry a reason.

The reason is a string literal that's thrown away at compile time, but it
keeps the invariant the block relies on right next to the code.
*/

/**
Wrap an unsafe expression, documenting why it's sound.

```ignore
let len = unsafe_block!("The pointer is a valid C string" => libc::strlen(ptr));
```
*/
#[macro_export]
macro_rules! unsafe_block {
    ($reason:tt => $body:expr) => {{
        #[allow(unused_unsafe)]
        let __result = unsafe { $body };
        __result
    }};
}

/**
Declare an unsafe function, documenting the contract callers must uphold.
*/
#[macro_export]
macro_rules! unsafe_fn {
    ($reason:tt => $(#[$attr:meta])* $publicity:vis fn $name:ident $($body:tt)*) => {
        $(#[$attr])* $publicity unsafe fn $name $($body)*
    };
}

/**
Implement an unsafe trait, documenting why the implementation is sound.
*/
#[macro_export]
macro_rules! unsafe_impl {
    ($reason:tt => impl $($body:tt)*) => {
        unsafe impl $($body)*
    };
}
