use crate::error::Result;
use crate::interop::cow::{CopyOnWrite, CopyableHandle, Provenance, ReferenceConvertible};
use crate::interop::handle::Handle;
use crate::interop::status::catch_callback;
use crate::interop::string::{self, ManagedCString};
use crate::media::{Category, Interface};
use crate::sys::mediastreamer::*;
use crate::sys::FALSE;
use crate::{unsafe_block, unsafe_fn};
use libc::c_int;
use std::fmt;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::ptr::{self, NonNull};
use std::rc::Rc;

type InitHandler = Rc<dyn Fn(&FilterInit<'_>)>;

/**
The native description plus everything its pointers point into.

`desc` comes first so a pointer to the storage is a pointer to the
`MSFilterDesc` the native library sees, and back.
 */
#[repr(C)]
struct DescriptionStorage {
    desc: MSFilterDesc,
    name: Option<ManagedCString>,
    text: Option<ManagedCString>,
    enc_fmt: Option<ManagedCString>,
    /// Zero-terminated when not empty, `desc.methods` points into it.
    methods: Vec<MSFilterMethod>,
    init: Option<InitHandler>,
}

impl DescriptionStorage {
    fn empty() -> Self {
        DescriptionStorage {
            desc: MSFilterDesc::empty(),
            name: None,
            text: None,
            enc_fmt: None,
            methods: Vec::new(),
            init: None,
        }
    }

    /// Point the native fields back into our buffers.
    fn relink(&mut self) {
        let borrow = |value: &Option<ManagedCString>| value.as_ref().map_or(ptr::null(), ManagedCString::as_ptr);

        self.desc.name = borrow(&self.name);
        self.desc.text = borrow(&self.text);
        self.desc.enc_fmt = borrow(&self.enc_fmt);
        self.desc.methods = if self.methods.is_empty() {
            ptr::null_mut()
        } else {
            self.methods.as_mut_ptr()
        };
    }

    fn deep_copy(&self) -> Self {
        let mut copy = DescriptionStorage {
            desc: self.desc,
            name: self.name.clone(),
            text: self.text.clone(),
            enc_fmt: self.enc_fmt.clone(),
            methods: self.methods.clone(),
            init: self.init.clone(),
        };

        copy.relink();
        copy
    }

    unsafe_fn!("`desc` must point to a live description" =>
    /// Copy a description built by the native library.
    fn snapshot(desc: *const MSFilterDesc) -> Self {
        let copy_string = |value| {
            string::from_borrowed(value).and_then(|value| ManagedCString::new(&value).ok())
        };

        let mut methods = Vec::new();
        let mut method = (*desc).methods as *const MSFilterMethod;
        if !method.is_null() {
            while (*method).id != 0 {
                methods.push(*method);
                method = method.add(1);
            }
            methods.push(MSFilterMethod { id: 0, method: None });
        }

        let mut storage = DescriptionStorage {
            desc: *desc,
            name: copy_string((*desc).name),
            text: copy_string((*desc).text),
            enc_fmt: copy_string((*desc).enc_fmt),
            methods,
            init: None,
        };

        storage.relink();
        storage
    });
}

unsafe extern "C" fn filter_init(f: *mut MSFilter) {
    catch_callback(
        "filter_init",
        (),
        AssertUnwindSafe(|| {
            let Some(raw) = NonNull::new(f) else {
                return;
            };

            let handler = unsafe_block!("Only descriptions backed by a `DescriptionStorage` use this hook" => {
                let storage = ms_filter_get_desc(f) as *const DescriptionStorage;
                (*storage).init.clone()
            });

            if let Some(handler) = handler {
                handler(&FilterInit {
                    raw,
                    _marker: PhantomData,
                });
            }
        }),
    )
}

/**
A filter being created, as seen by an initialization handler.
 */
pub struct FilterInit<'a> {
    raw: NonNull<MSFilter>,
    _marker: PhantomData<&'a MSFilter>,
}

impl<'a> FilterInit<'a> {
    pub fn id(&self) -> u32 {
        unsafe_block!("The filter is live during its initialization" => ms_filter_get_id(self.raw.as_ptr()))
    }

    pub fn name(&self) -> Option<String> {
        unsafe_block!("The name is borrowed from the description" => {
            string::from_borrowed(ms_filter_get_name(self.raw.as_ptr()))
        })
    }

    /// The native description the filter is being created from.
    pub fn description_ptr(&self) -> *const MSFilterDesc {
        unsafe_block!("The filter is live during its initialization" => ms_filter_get_desc(self.raw.as_ptr()))
    }
}

/// Owns a description and the buffers it points into.
#[doc(hidden)]
pub struct Reference {
    storage: NonNull<DescriptionStorage>,
}

impl Reference {
    fn new(storage: DescriptionStorage) -> Self {
        Reference {
            storage: NonNull::from(Box::leak(Box::new(storage))),
        }
    }

    fn storage(&self) -> &DescriptionStorage {
        unsafe_block!("The storage lives as long as we do" => self.storage.as_ref())
    }

    fn storage_mut(&mut self) -> &mut DescriptionStorage {
        unsafe_block!("The storage lives as long as we do and isn't shared" => self.storage.as_mut())
    }
}

impl Handle for Reference {
    type Raw = MSFilterDesc;

    fn as_ptr(&self) -> *mut MSFilterDesc {
        self.storage.as_ptr() as *mut MSFilterDesc
    }
}

impl CopyableHandle for Reference {
    fn duplicate(&self) -> Option<Self> {
        Some(Reference::new(self.storage().deep_copy()))
    }
}

impl Drop for Reference {
    fn drop(&mut self) {
        unsafe_block!("The storage was leaked from a `Box` in `new`" => drop(Box::from_raw(self.storage.as_ptr())))
    }
}

/**
What a filter is: its identity, its pins and its methods.

Descriptions are values. A factory that registers one keeps an alias to it, so
mutating the caller's copy afterwards copies it first and leaves the registered
description alone.

```ignore
let mut description = FilterDescription::new();
description.set_id(MS_FILTER_PLUGIN_ID);
description.set_name(Some("MyFilter"))?;
description.set_initialization(|filter| println!("created {:?}", filter.name()));

factory.register_filter(&description)?;
```
 */
#[derive(Clone)]
pub struct FilterDescription {
    internal: CopyOnWrite<Reference>,
}

impl ReferenceConvertible for FilterDescription {
    type Reference = Reference;

    fn internal_reference(&self) -> &CopyOnWrite<Reference> {
        &self.internal
    }

    fn internal_reference_mut(&mut self) -> &mut CopyOnWrite<Reference> {
        &mut self.internal
    }

    fn from_internal_reference(internal: CopyOnWrite<Reference>) -> Self {
        FilterDescription { internal }
    }
}

impl FilterDescription {
    /// An empty description: no id, no name and no pins.
    pub fn new() -> Self {
        FilterDescription {
            internal: CopyOnWrite::new(Reference::new(DescriptionStorage::empty())),
        }
    }

    unsafe_fn!("`desc` must be null or point to a live description" =>
    /// Copy a description owned by the native library.
    pub(crate) fn snapshot(desc: *const MSFilterDesc) -> Option<Self> {
        if desc.is_null() {
            return None;
        }

        let reference = Reference::new(DescriptionStorage::snapshot(desc));

        Some(FilterDescription::from_reference(reference, Provenance::Copied))
    });

    pub(crate) fn as_ptr(&self) -> *mut MSFilterDesc {
        self.internal.as_ptr()
    }

    fn desc(&self) -> &MSFilterDesc {
        &self.internal.reference().storage().desc
    }

    fn storage_mut(&mut self) -> &mut DescriptionStorage {
        self.internal.reference_mut().storage_mut()
    }

    pub fn id(&self) -> u32 {
        self.desc().id
    }

    pub fn set_id(&mut self, id: u32) {
        self.storage_mut().desc.id = id;
    }

    pub fn name(&self) -> Option<String> {
        self.internal.reference().storage().name.as_ref().map(ManagedCString::to_string_lossy)
    }

    pub fn set_name(&mut self, name: Option<&str>) -> Result<()> {
        let name = name.map(ManagedCString::new).transpose()?;

        let storage = self.storage_mut();
        storage.name = name;
        storage.relink();

        Ok(())
    }

    /// A short human readable description of the filter.
    pub fn text(&self) -> Option<String> {
        self.internal.reference().storage().text.as_ref().map(ManagedCString::to_string_lossy)
    }

    pub fn set_text(&mut self, text: Option<&str>) -> Result<()> {
        let text = text.map(ManagedCString::new).transpose()?;

        let storage = self.storage_mut();
        storage.text = text;
        storage.relink();

        Ok(())
    }

    pub fn category(&self) -> Category {
        Category::from_raw(self.desc().category)
    }

    pub fn set_category(&mut self, category: Category) {
        self.storage_mut().desc.category = category.raw();
    }

    /// The sub-mime type of an encoder or decoder, such as `"opus"`.
    pub fn encoding_format(&self) -> Option<String> {
        self.internal.reference().storage().enc_fmt.as_ref().map(ManagedCString::to_string_lossy)
    }

    pub fn set_encoding_format(&mut self, format: Option<&str>) -> Result<()> {
        let format = format.map(ManagedCString::new).transpose()?;

        let storage = self.storage_mut();
        storage.enc_fmt = format;
        storage.relink();

        Ok(())
    }

    pub fn input_count(&self) -> usize {
        usize::try_from(self.desc().ninputs).unwrap_or(0)
    }

    pub fn set_input_count(&mut self, count: usize) {
        self.storage_mut().desc.ninputs = c_int::try_from(count).unwrap_or(c_int::MAX);
    }

    pub fn output_count(&self) -> usize {
        usize::try_from(self.desc().noutputs).unwrap_or(0)
    }

    pub fn set_output_count(&mut self, count: usize) {
        self.storage_mut().desc.noutputs = c_int::try_from(count).unwrap_or(c_int::MAX);
    }

    /// Whether the filter produces data on its own rather than in reaction to input.
    pub fn is_pump(&self) -> bool {
        self.desc().flags & MS_FILTER_IS_PUMP != 0
    }

    pub fn set_pump(&mut self, pump: bool) {
        let desc = &mut self.storage_mut().desc;

        if pump {
            desc.flags |= MS_FILTER_IS_PUMP;
        } else {
            desc.flags &= !MS_FILTER_IS_PUMP;
        }
    }

    /// Whether codec lookups consider this filter. Set by the factory.
    pub fn is_enabled(&self) -> bool {
        self.desc().flags & MS_FILTER_IS_ENABLED != 0
    }

    /// Add a native method, replacing any with the same id.
    pub fn add_method(&mut self, id: u32, method: MSFilterMethodFunc) {
        let storage = self.storage_mut();

        storage.methods.retain(|existing| existing.id != id && existing.id != 0);
        storage.methods.push(MSFilterMethod { id, method });
        storage.methods.push(MSFilterMethod { id: 0, method: None });
        storage.relink();
    }

    /// Whether any of the methods belongs to `interface`.
    pub fn implements(&self, interface: Interface) -> bool {
        unsafe_block!("The description and its method table are live" => {
            ms_filter_desc_implements_interface(self.desc(), interface.raw()) != FALSE
        })
    }

    /// Run `handler` each time a filter is created from this description.
    ///
    /// This replaces any initialization the description had, native or not.
    pub fn set_initialization<F>(&mut self, handler: F)
    where
        F: Fn(&FilterInit<'_>) + 'static,
    {
        let storage = self.storage_mut();

        storage.init = Some(Rc::new(handler));
        storage.desc.init = Some(filter_init);
    }

    pub fn clear_initialization(&mut self) {
        let storage = self.storage_mut();

        storage.init = None;
        storage.desc.init = None;
    }

    pub fn has_initialization(&self) -> bool {
        self.desc().init.is_some()
    }
}

impl Default for FilterDescription {
    fn default() -> Self {
        FilterDescription::new()
    }
}

impl fmt::Debug for FilterDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FilterDescription")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("category", &self.category())
            .field("encoding_format", &self.encoding_format())
            .field("inputs", &self.input_count())
            .field("outputs", &self.output_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn have_plc(_f: *mut MSFilter, arg: *mut libc::c_void) -> c_int {
        *(arg as *mut c_int) = 1;
        0
    }

    #[test]
    fn new_description() {
        let description = FilterDescription::new();

        assert_eq!(MS_FILTER_NOT_SET_ID, description.id());
        assert_eq!(None, description.name());
        assert_eq!(None, description.text());
        assert_eq!(Category::Other, description.category());
        assert_eq!(None, description.encoding_format());
        assert_eq!(0, description.input_count());
        assert_eq!(0, description.output_count());
        assert!(!description.is_pump());
        assert!(!description.implements(Interface::Begin));
        assert!(!description.has_initialization());
    }

    #[test]
    fn unique_value_mutates_in_place() {
        let mut description = FilterDescription::new();
        let before = description.as_ptr();

        description.set_id(MS_FILTER_PLUGIN_ID);
        description.set_name(Some("TestFilter")).unwrap();
        description.set_text(Some("A filter for tests")).unwrap();
        description.set_category(Category::Decoder);
        description.set_encoding_format(Some("opus")).unwrap();
        description.set_input_count(1);
        description.set_output_count(2);

        assert_eq!(before, description.as_ptr());
        assert_eq!(Provenance::Owned, description.internal_reference().provenance());
        assert_eq!(Some("TestFilter".to_owned()), description.name());
        assert_eq!(Some("opus".to_owned()), description.encoding_format());
        assert_eq!(Category::Decoder, description.category());
        assert_eq!((1, 2), (description.input_count(), description.output_count()));
    }

    #[test]
    fn copies_diverge_on_mutation() {
        let mut original = FilterDescription::new();
        original.set_name(Some("Original")).unwrap();

        let unmutated = original.clone();
        let mut mutated = original.clone();
        assert_eq!(original.as_ptr(), mutated.as_ptr());

        mutated.set_name(Some("Mutated")).unwrap();

        assert_ne!(original.as_ptr(), mutated.as_ptr());
        assert_eq!(original.as_ptr(), unmutated.as_ptr());
        assert_eq!(Some("Original".to_owned()), original.name());
        assert_eq!(Some("Mutated".to_owned()), mutated.name());
    }

    #[test]
    fn native_fields_point_into_the_copy() {
        let mut original = FilterDescription::new();
        original.set_name(Some("Original")).unwrap();
        original.add_method(MS_AUDIO_DECODER_HAVE_PLC, Some(have_plc));

        let copy = original.detached();
        drop(original);

        let name = unsafe { string::from_borrowed((*copy.as_ptr()).name) };
        assert_eq!(Some("Original".to_owned()), name);
        assert!(copy.implements(Interface::AudioDecoder));
    }

    #[test]
    fn methods_define_interfaces() {
        let mut description = FilterDescription::new();

        description.add_method(MS_AUDIO_DECODER_HAVE_PLC, Some(have_plc));
        description.add_method(MS_AUDIO_DECODER_HAVE_PLC, Some(have_plc));

        assert!(description.implements(Interface::AudioDecoder));
        assert!(!description.implements(Interface::VideoDecoder));

        let table = unsafe { std::slice::from_raw_parts((*description.as_ptr()).methods, 2) };
        assert_eq!(MS_AUDIO_DECODER_HAVE_PLC, table[0].id);
        assert_eq!(0, table[1].id);
    }

    #[test]
    fn pump_flag() {
        let mut description = FilterDescription::new();

        description.set_pump(true);
        assert!(description.is_pump());
        assert!(!description.is_enabled());

        description.set_pump(false);
        assert!(!description.is_pump());
    }

    #[test]
    fn initialization_is_shared_by_copies() {
        let mut description = FilterDescription::new();
        description.set_initialization(|_| {});

        let copy = description.detached();
        assert!(copy.has_initialization());

        description.clear_initialization();
        assert!(!description.has_initialization());
        assert!(copy.has_initialization());
    }
}
