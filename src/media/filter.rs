use crate::error::Result;
use crate::interop::cow::ReferenceConvertible;
use crate::interop::status::{catch_callback, Status};
use crate::interop::string;
use crate::interop::thread_bound::ThreadBound;
use crate::media::{Factory, FilterDescription, Interface};
use crate::sys::mediastreamer::*;
use crate::sys::FALSE;
use crate::{unsafe_block, unsafe_fn};
use libc::{c_int, c_uint, c_void};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::panic::AssertUnwindSafe;
use std::ptr::NonNull;

/**
An event a filter posted to its listeners.
 */
pub struct Notification {
    id: c_uint,
    arg: *mut c_void,
}

impl Notification {
    /// The event identifier, such as `MS_VOLUME_GAIN_CHANGED`.
    pub fn id(&self) -> u32 {
        self.id
    }

    unsafe_fn!("`T` must be the argument type the event is documented to carry" =>
    /// Read the event's argument.
    ///
    /// Returns `None` if there's no argument or its size, encoded in the event
    /// id, isn't the size of `T`.
    pub fn arg<T: Copy>(&self) -> Option<T> {
        if self.arg.is_null() || (self.id & 0xff) as usize != mem::size_of::<T>() {
            return None;
        }

        Some(*(self.arg as *const T))
    });
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Notification")
            .field("id", &format_args!("{:#x}", self.id))
            .field("has_arg", &!self.arg.is_null())
            .finish()
    }
}

type NotifyHandler = Box<dyn FnMut(&Notification)>;

#[derive(Default)]
struct FilterContext {
    handlers: RefCell<Vec<NotifyHandler>>,
}

// Filters have no user-data slot, the context rides along as the callback's
// own user data and is unregistered before it's freed.
unsafe extern "C" fn filter_notified(user_data: *mut c_void, _f: *mut MSFilter, id: c_uint, arg: *mut c_void) {
    catch_callback(
        "filter_notified",
        (),
        AssertUnwindSafe(|| {
            if user_data.is_null() {
                return;
            }

            let context = unsafe_block!("Registered with a boxed `FilterContext` that outlives the registration" => {
                (*(user_data as *const ThreadBound<FilterContext>)).get()
            });

            let notification = Notification { id, arg };

            match context.handlers.try_borrow_mut() {
                Ok(mut handlers) => {
                    for handler in handlers.iter_mut() {
                        handler(&notification);
                    }
                }
                Err(_) => tracing::warn!(id, "notify handlers are busy, dropping a reentrant notification"),
            }
        }),
    )
}

/**
An instance of a filter, created by a `Factory` it can't outlive.

Dropping a filter unlinks it from its peers and destroys it.
 */
pub struct Filter<'f> {
    context: Option<Box<ThreadBound<FilterContext>>>,
    raw: NonNull<MSFilter>,
    description: Option<FilterDescription>,
    _factory: PhantomData<&'f Factory>,
}

impl<'f> Filter<'f> {
    unsafe_fn!("`raw` must be null or a filter created by the factory, owned by nobody else" =>
    /// Take ownership of a filter. `description` keeps a Rust-built description alive.
    pub(crate) fn from_raw(raw: *mut MSFilter, description: Option<FilterDescription>) -> Option<Self> {
        let raw = NonNull::new(raw)?;

        Some(Filter {
            context: None,
            raw,
            description,
            _factory: PhantomData,
        })
    });

    pub fn as_ptr(&self) -> *mut MSFilter {
        self.raw.as_ptr()
    }

    pub fn id(&self) -> u32 {
        unsafe_block!("The filter is live" => ms_filter_get_id(self.raw.as_ptr()))
    }

    pub fn name(&self) -> Option<String> {
        unsafe_block!("The name is borrowed from the live description" => {
            string::from_borrowed(ms_filter_get_name(self.raw.as_ptr()))
        })
    }

    /// The description the filter was created from.
    ///
    /// A Rust-built description comes back as an alias of the one the filter
    /// points into, so its first mutation copies. Descriptions built by the
    /// native library come back as a copy.
    pub fn description(&self) -> FilterDescription {
        if let Some(description) = &self.description {
            return FilterDescription::from_internal_reference(description.internal_reference().aliased());
        }

        let description = unsafe_block!("The description outlives the filter" => {
            FilterDescription::snapshot(ms_filter_get_desc(self.raw.as_ptr()))
        });

        match description {
            Some(description) => description,
            None => unreachable!("every filter has a description"),
        }
    }

    pub fn implements(&self, interface: Interface) -> bool {
        unsafe_block!("The description outlives the filter" => {
            ms_filter_desc_implements_interface(ms_filter_get_desc(self.raw.as_ptr()), interface.raw()) != FALSE
        })
    }

    /// Connect output `pin` of this filter to input `peer_pin` of `peer`.
    pub fn link(&self, pin: usize, peer: &Filter<'_>, peer_pin: usize) -> Result<()> {
        let code = unsafe_block!("Both filters are live" => {
            ms_filter_link(self.raw.as_ptr(), to_pin(pin), peer.raw.as_ptr(), to_pin(peer_pin))
        });

        Status::from_raw(code).into_result("ms_filter_link")
    }

    pub fn unlink(&self, pin: usize, peer: &Filter<'_>, peer_pin: usize) -> Result<()> {
        let code = unsafe_block!("Both filters are live" => {
            ms_filter_unlink(self.raw.as_ptr(), to_pin(pin), peer.raw.as_ptr(), to_pin(peer_pin))
        });

        Status::from_raw(code).into_result("ms_filter_unlink")
    }

    pub fn has_method(&self, id: u32) -> bool {
        unsafe_block!("The filter is live" => ms_filter_has_method(self.raw.as_ptr(), id) != FALSE)
    }

    /// Call a method that takes no argument.
    pub fn call_method_noarg(&self, id: u32) -> Result<()> {
        let code = unsafe_block!("The method takes no argument" => ms_filter_call_method_noarg(self.raw.as_ptr(), id));

        Status::from_raw(code).into_result("ms_filter_call_method_noarg")
    }

    unsafe_fn!("`T` must be the argument type the method is documented to take" =>
    /// Call a method with an argument it reads or writes in place.
    pub fn call_method<T>(&self, id: u32, arg: &mut T) -> Result<()> {
        let code = ms_filter_call_method(self.raw.as_ptr(), id, arg as *mut T as *mut c_void);

        Status::from_raw(code).into_result("ms_filter_call_method")
    });

    /// Listen to the events the filter posts.
    pub fn on_notify<F>(&mut self, handler: F)
    where
        F: FnMut(&Notification) + 'static,
    {
        let raw = self.raw;

        let context = self.context.get_or_insert_with(|| {
            let context = Box::new(ThreadBound::new(FilterContext::default()));

            unsafe_block!("The trampoline matches the native signature and the box is unregistered in `Drop`" => {
                ms_filter_add_notify_callback(raw.as_ptr(), Some(filter_notified), context_ptr(&context), FALSE)
            });

            context
        });

        match context.get().handlers.try_borrow_mut() {
            Ok(mut handlers) => handlers.push(Box::new(handler)),
            Err(_) => {
                tracing::error!("notify handlers can't be added from inside a notification");
                panic!("`Filter::on_notify` called from inside a notify handler");
            }
        }
    }
}

fn context_ptr(context: &ThreadBound<FilterContext>) -> *mut c_void {
    context as *const ThreadBound<FilterContext> as *mut c_void
}

fn to_pin(pin: usize) -> c_int {
    c_int::try_from(pin).unwrap_or(c_int::MAX)
}

impl<'f> Drop for Filter<'f> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            unsafe_block!("The trampoline was registered with this context in `on_notify`" => {
                ms_filter_remove_notify_callback(self.raw.as_ptr(), Some(filter_notified), context_ptr(&context))
            });

            drop(context);
        }

        unsafe_block!("We own the filter and nothing uses it past this point" => ms_filter_destroy(self.raw.as_ptr()));

        tracing::trace!(ptr = ?self.raw, "destroyed filter");
    }
}

impl<'f> fmt::Debug for Filter<'f> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Filter")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("ptr", &self.raw)
            .finish()
    }
}
