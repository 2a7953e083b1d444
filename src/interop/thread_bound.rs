use crate::{unsafe_block, unsafe_impl};
use std::cell::UnsafeCell;
use std::thread::{self, ThreadId};

/**
A value that can only be accessed on the thread that created it.

The native libraries expect every call touching a given object family to happen
on the thread that drives the core's main loop. Contexts handed to native
callbacks are wrapped in a `ThreadBound` so a callback arriving on some other
thread panics instead of racing with the owner.
 */
pub struct ThreadBound<T: ?Sized> {
    thread_id: ThreadId,
    inner: UnsafeCell<T>,
}

unsafe_impl!("The inner value is only ever touched on `thread_id`" => impl<T: ?Sized> Sync for ThreadBound<T> {});

impl<T> ThreadBound<T> {
    pub fn new(inner: T) -> Self {
        ThreadBound {
            thread_id: thread::current().id(),
            inner: UnsafeCell::new(inner),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: ?Sized> ThreadBound<T> {
    fn check(&self) {
        let current = thread::current().id();

        if self.thread_id != current {
            tracing::error!(
                owner = ?self.thread_id,
                current = ?current,
                "thread-bound value accessed from a foreign thread"
            );
            panic!("attempted to access a thread-bound value from a thread other than the one that created it");
        }
    }

    pub fn is_owning_thread(&self) -> bool {
        self.thread_id == thread::current().id()
    }

    pub fn get(&self) -> &T {
        self.check();
        unsafe_block!("The value is only reachable from its owning thread" => &*self.inner.get())
    }

    pub fn get_raw(&self) -> *mut T {
        self.check();
        self.inner.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn same_thread_access() {
        let bound = ThreadBound::new(42);

        assert!(bound.is_owning_thread());
        assert_eq!(42, *bound.get());
        assert_eq!(42, bound.into_inner());
    }

    #[test]
    fn foreign_thread_access_panics() {
        let bound = Arc::new(ThreadBound::new(String::from("core")));

        let other = Arc::clone(&bound);
        let result = thread::spawn(move || other.get().len()).join();

        assert!(result.is_err());
        assert_eq!("core", bound.get());
    }
}
