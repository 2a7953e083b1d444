use crate::error::{Error, Result};
use crate::interop::cow::ReferenceConvertible;
use crate::interop::is_null::expect_non_null;
use crate::interop::status::Status;
use crate::interop::string;
use crate::media::{Filter, FilterDescription};
use crate::sys::mediastreamer::*;
use crate::sys::{to_bool_t, FALSE};
use crate::unsafe_block;
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;

/**
The media factory: the catalog of filter descriptions and the place filters
are created.

Filters borrow the factory they were created by, so it's destroyed last.
 */
pub struct Factory {
    raw: NonNull<MSFactory>,
    /// Registered descriptions. The native factory points into them.
    registered: RefCell<Vec<FilterDescription>>,
}

impl Factory {
    /// A new factory with the built-in filters.
    pub fn new() -> Self {
        let raw = expect_non_null(unsafe_block!("No preconditions" => ms_factory_new_with_voip()), "MSFactory");

        tracing::debug!(ptr = ?raw, "created media factory");

        Factory {
            raw,
            registered: RefCell::new(Vec::new()),
        }
    }

    pub fn as_ptr(&self) -> *mut MSFactory {
        self.raw.as_ptr()
    }

    pub fn cpu_count(&self) -> u32 {
        unsafe_block!("The factory is live" => ms_factory_get_cpu_count(self.raw.as_ptr()))
    }

    pub fn set_cpu_count(&self, count: u32) {
        unsafe_block!("The factory is live" => ms_factory_set_cpu_count(self.raw.as_ptr(), count))
    }

    /// Load the plugins installed in the library's default plugin directory.
    pub fn initialize_plugins(&self) {
        unsafe_block!("The factory is live" => ms_factory_init_plugins(self.raw.as_ptr()))
    }

    /// Load the plugins found in `dir`, returning how many were loaded.
    pub fn load_plugins<P: AsRef<Path>>(&self, dir: P) -> Result<usize> {
        let dir = string::to_c_string(&dir.as_ref().to_string_lossy())?;

        let loaded = unsafe_block!("The factory is live and the path is a valid C string" => {
            ms_factory_load_plugins(self.raw.as_ptr(), dir.as_ptr())
        });

        match usize::try_from(loaded) {
            Ok(loaded) => {
                tracing::debug!(dir = ?dir, loaded, "loaded media plugins");
                Ok(loaded)
            }
            Err(_) => Err(Error::Status {
                call: "ms_factory_load_plugins",
                code: loaded,
            }),
        }
    }

    /**
    Add a description to the catalog and enable it.

    The factory keeps its own copy. The native side flips the copy's flags,
    so the caller's value never sees the registry's writes, and later
    mutations of the caller's value don't reach the registry either.
    Fails if the description has no id.
     */
    pub fn register_filter(&self, description: &FilterDescription) -> Result<()> {
        if description.id() == MS_FILTER_NOT_SET_ID {
            return Err(Error::MissingFilterId {
                name: description.name(),
            });
        }

        let registered = description.detached();

        unsafe_block!("The factory keeps `registered` alive for as long as it points to it" => {
            ms_factory_register_filter(self.raw.as_ptr(), registered.as_ptr())
        });

        tracing::debug!(name = ?registered.name(), id = registered.id(), "registered filter description");
        self.registered.borrow_mut().push(registered);

        Ok(())
    }

    /// The registered description behind a native pointer, as an alias.
    fn registered_description(&self, desc: *mut MSFilterDesc) -> Option<FilterDescription> {
        self.registered
            .borrow()
            .iter()
            .find(|registered| registered.as_ptr() == desc)
            .map(|registered| FilterDescription::from_internal_reference(registered.internal_reference().aliased()))
    }

    /**
    The description named `name`.

    A description registered from Rust comes back as an alias of the registered
    value: it shares the native object until it's mutated. A built-in one comes
    back as a copy.
     */
    pub fn filter_description(&self, name: &str) -> Option<FilterDescription> {
        let name = string::to_c_string(name).ok()?;

        let desc = unsafe_block!("The factory is live and the name is a valid C string" => {
            ms_factory_lookup_filter_by_name(self.raw.as_ptr(), name.as_ptr())
        });

        if desc.is_null() {
            return None;
        }

        self.registered_description(desc)
            .or_else(|| unsafe_block!("Built-in descriptions live as long as the factory" => FilterDescription::snapshot(desc)))
    }

    pub fn enable_filter(&self, name: &str, enabled: bool) -> Result<()> {
        let name = string::to_c_string(name)?;

        let code = unsafe_block!("The factory is live and the name is a valid C string" => {
            ms_factory_enable_filter_from_name(self.raw.as_ptr(), name.as_ptr(), to_bool_t(enabled))
        });

        Status::from_raw(code).into_result("ms_factory_enable_filter_from_name")
    }

    pub fn is_filter_enabled(&self, name: &str) -> bool {
        let Ok(name) = string::to_c_string(name) else {
            return false;
        };

        unsafe_block!("The factory is live and the name is a valid C string" => {
            ms_factory_filter_from_name_enabled(self.raw.as_ptr(), name.as_ptr()) != FALSE
        })
    }

    /// Instantiate `description`, whether it's registered or not.
    pub fn create_filter(&self, description: &FilterDescription) -> Filter<'_> {
        let description = description.clone();

        let raw = unsafe_block!("The filter keeps its own alias of the description" => {
            expect_non_null(ms_factory_create_filter_from_desc(self.raw.as_ptr(), description.as_ptr()), "MSFilter")
        });

        match unsafe_block!("The filter is new and ours" => Filter::from_raw(raw.as_ptr(), Some(description))) {
            Some(filter) => filter,
            None => unreachable!("the pointer was checked above"),
        }
    }

    /// Take ownership of a filter the native factory created from its catalog.
    fn adopt(&self, raw: *mut MSFilter) -> Option<Filter<'_>> {
        if raw.is_null() {
            return None;
        }

        let description = self.registered_description(unsafe_block!("The filter is live" => ms_filter_get_desc(raw)));

        unsafe_block!("The filter is new and ours" => Filter::from_raw(raw, description))
    }

    pub fn filter_by_name(&self, name: &str) -> Option<Filter<'_>> {
        let name = string::to_c_string(name).ok()?;

        self.adopt(unsafe_block!("The factory is live and the name is a valid C string" => {
            ms_factory_create_filter_from_name(self.raw.as_ptr(), name.as_ptr())
        }))
    }

    pub fn filter_by_id(&self, id: u32) -> Option<Filter<'_>> {
        self.adopt(unsafe_block!("The factory is live" => ms_factory_create_filter(self.raw.as_ptr(), id)))
    }

    /// An enabled encoder for the `mime` sub-type, such as `"opus"`.
    pub fn encoder(&self, mime: &str) -> Option<Filter<'_>> {
        let mime = string::to_c_string(mime).ok()?;

        self.adopt(unsafe_block!("The factory is live and the mime is a valid C string" => {
            ms_factory_create_encoder(self.raw.as_ptr(), mime.as_ptr())
        }))
    }

    /// An enabled decoder for the `mime` sub-type.
    pub fn decoder(&self, mime: &str) -> Option<Filter<'_>> {
        let mime = string::to_c_string(mime).ok()?;

        self.adopt(unsafe_block!("The factory is live and the mime is a valid C string" => {
            ms_factory_create_decoder(self.raw.as_ptr(), mime.as_ptr())
        }))
    }
}

impl Default for Factory {
    fn default() -> Self {
        Factory::new()
    }
}

impl Drop for Factory {
    fn drop(&mut self) {
        unsafe_block!("Filters borrow the factory, so none are left" => ms_factory_destroy(self.raw.as_ptr()));

        tracing::debug!(ptr = ?self.raw, registered = self.registered.borrow().len(), "destroyed media factory");
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Factory")
            .field("ptr", &self.raw)
            .field("registered", &self.registered.borrow().len())
            .finish()
    }
}
