/*!
mediastreamer2: filter descriptions, the factory that instantiates them and filters.

Descriptions are plain structs owned by whoever built them. Registering one
with a factory stores the pointer, not a copy, and the factory writes its
`flags` when the filter is enabled or disabled.

Identifiers of the filters the library ships with depend on how it was built,
so they aren't declared here. Look them up by name.
*/

use libc::{c_char, c_int, c_uint, c_void};
use std::mem;
use std::ptr;

pub type MSFilterId = c_uint;

pub const MS_FILTER_NOT_SET_ID: MSFilterId = 0;
/// First identifier free for filters defined outside the library.
pub const MS_FILTER_PLUGIN_ID: MSFilterId = 65000;

pub type MSFilterCategory = c_int;

pub const MS_FILTER_OTHER: MSFilterCategory = 0;
pub const MS_FILTER_ENCODER: MSFilterCategory = 1;
pub const MS_FILTER_DECODER: MSFilterCategory = 2;
pub const MS_FILTER_ENCODING_CAPTURER: MSFilterCategory = 3;
pub const MS_FILTER_DECODER_RENDERER: MSFilterCategory = 4;

pub type MSFilterFlags = c_uint;

pub const MS_FILTER_IS_PUMP: MSFilterFlags = 1;
pub const MS_FILTER_IS_ENABLED: MSFilterFlags = 1 << 1;

pub type MSFilterInterfaceId = c_uint;

pub const MSFilterInterfaceBegin: MSFilterInterfaceId = 16384;
pub const MSFilterPlayerInterface: MSFilterInterfaceId = 16385;
pub const MSFilterRecorderInterface: MSFilterInterfaceId = 16386;
pub const MSFilterVideoDisplayInterface: MSFilterInterfaceId = 16387;
pub const MSFilterEchoCancellerInterface: MSFilterInterfaceId = 16388;
pub const MSFilterVideoDecoderInterface: MSFilterInterfaceId = 16389;
pub const MSFilterVideoCaptureInterface: MSFilterInterfaceId = 16390;
pub const MSFilterAudioDecoderInterface: MSFilterInterfaceId = 16391;
pub const MSFilterVideoEncoderInterface: MSFilterInterfaceId = 16392;
pub const MSFilterAudioCaptureInterface: MSFilterInterfaceId = 16393;
pub const MSFilterAudioPlaybackInterface: MSFilterInterfaceId = 16394;
pub const MSFilterAudioEncoderInterface: MSFilterInterfaceId = 16395;
pub const MSFilterVoidInterface: MSFilterInterfaceId = 16396;

/// Build a method or event identifier: the filter or interface id, an index and the argument size.
pub const fn ms_filter_method_id(base: c_uint, index: c_uint, arg_size: usize) -> c_uint {
    (base << 16) | (index << 8) | (arg_size as c_uint & 0xff)
}

/// The filter or interface id a method belongs to.
pub const fn ms_filter_method_get_fid(id: c_uint) -> c_uint {
    (id & 0xffff_0000) >> 16
}

pub const MS_AUDIO_DECODER_HAVE_PLC: c_uint =
    ms_filter_method_id(MSFilterAudioDecoderInterface, 0, mem::size_of::<c_int>());
pub const MS_VIDEO_DECODER_RESET: c_uint = ms_filter_method_id(MSFilterVideoDecoderInterface, 1, 0);

pub type MSFilterFunc = Option<unsafe extern "C" fn(f: *mut MSFilter)>;

pub type MSFilterMethodFunc = Option<unsafe extern "C" fn(f: *mut MSFilter, arg: *mut c_void) -> c_int>;

pub type MSFilterNotifyFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, f: *mut MSFilter, id: c_uint, arg: *mut c_void)>;

/// One entry of a method table. Tables end with an entry whose `id` is 0.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MSFilterMethod {
    pub id: c_uint,
    pub method: MSFilterMethodFunc,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MSFilterDesc {
    pub id: MSFilterId,
    pub name: *const c_char,
    pub text: *const c_char,
    pub category: MSFilterCategory,
    /// Sub-mime of the format, for encoders and decoders.
    pub enc_fmt: *const c_char,
    pub ninputs: c_int,
    pub noutputs: c_int,
    pub init: MSFilterFunc,
    pub preprocess: MSFilterFunc,
    pub process: MSFilterFunc,
    pub postprocess: MSFilterFunc,
    pub uninit: MSFilterFunc,
    pub methods: *mut MSFilterMethod,
    pub flags: MSFilterFlags,
}

impl MSFilterDesc {
    pub const fn empty() -> Self {
        MSFilterDesc {
            id: MS_FILTER_NOT_SET_ID,
            name: ptr::null(),
            text: ptr::null(),
            category: MS_FILTER_OTHER,
            enc_fmt: ptr::null(),
            ninputs: 0,
            noutputs: 0,
            init: None,
            preprocess: None,
            process: None,
            postprocess: None,
            uninit: None,
            methods: ptr::null_mut(),
            flags: 0,
        }
    }
}

#[cfg(not(any(test, feature = "loopback")))]
pub use self::native::*;

#[cfg(any(test, feature = "loopback"))]
pub use super::loopback::mediastreamer::*;

#[cfg(not(any(test, feature = "loopback")))]
mod native {
    use super::{MSFilterDesc, MSFilterId, MSFilterInterfaceId, MSFilterNotifyFunc};
    use crate::sys::bool_t;
    use libc::{c_char, c_int, c_uint, c_void};

    crate::sys::opaque_types!(MSFactory);

    /// A filter instance. Only its leading description pointer is read.
    #[repr(C)]
    pub struct MSFilter {
        pub desc: *mut MSFilterDesc,
        _private: [u8; 0],
    }

    /// The description a filter was created from.
    pub unsafe fn ms_filter_get_desc(f: *const MSFilter) -> *mut MSFilterDesc {
        (*f).desc
    }

    #[link(name = "mediastreamer2")]
    extern "C" {
        /// A new factory with the built-in filters registered.
        pub fn ms_factory_new_with_voip() -> *mut MSFactory;
        /// Destroy the factory. Filters created from it must be destroyed first.
        pub fn ms_factory_destroy(factory: *mut MSFactory);
        pub fn ms_factory_get_cpu_count(factory: *const MSFactory) -> c_uint;
        pub fn ms_factory_set_cpu_count(factory: *mut MSFactory, count: c_uint);
        /// Load the plugins found in the default plugin directory.
        pub fn ms_factory_init_plugins(factory: *mut MSFactory);
        /// Load the plugins found in `dir`. Returns how many loaded, or -1.
        pub fn ms_factory_load_plugins(factory: *mut MSFactory, dir: *const c_char) -> c_int;
        /// Register a description. The factory keeps the pointer and enables the filter.
        pub fn ms_factory_register_filter(factory: *mut MSFactory, desc: *mut MSFilterDesc);
        pub fn ms_factory_lookup_filter_by_name(factory: *mut MSFactory, name: *const c_char) -> *mut MSFilterDesc;
        pub fn ms_factory_enable_filter_from_name(factory: *mut MSFactory, name: *const c_char, enable: bool_t) -> c_int;
        pub fn ms_factory_filter_from_name_enabled(factory: *mut MSFactory, name: *const c_char) -> bool_t;
        /// Instantiate a filter. `desc` must outlive it.
        pub fn ms_factory_create_filter_from_desc(factory: *mut MSFactory, desc: *mut MSFilterDesc) -> *mut MSFilter;
        pub fn ms_factory_create_filter_from_name(factory: *mut MSFactory, name: *const c_char) -> *mut MSFilter;
        pub fn ms_factory_create_filter(factory: *mut MSFactory, id: MSFilterId) -> *mut MSFilter;
        pub fn ms_factory_create_encoder(factory: *mut MSFactory, mime: *const c_char) -> *mut MSFilter;
        pub fn ms_factory_create_decoder(factory: *mut MSFactory, mime: *const c_char) -> *mut MSFilter;

        pub fn ms_filter_desc_implements_interface(desc: *const MSFilterDesc, id: MSFilterInterfaceId) -> bool_t;

        pub fn ms_filter_destroy(f: *mut MSFilter);
        pub fn ms_filter_get_id(f: *const MSFilter) -> MSFilterId;
        pub fn ms_filter_get_name(f: *const MSFilter) -> *const c_char;
        pub fn ms_filter_link(f1: *mut MSFilter, pin1: c_int, f2: *mut MSFilter, pin2: c_int) -> c_int;
        pub fn ms_filter_unlink(f1: *mut MSFilter, pin1: c_int, f2: *mut MSFilter, pin2: c_int) -> c_int;
        pub fn ms_filter_has_method(f: *const MSFilter, id: c_uint) -> bool_t;
        pub fn ms_filter_call_method(f: *mut MSFilter, id: c_uint, arg: *mut c_void) -> c_int;
        pub fn ms_filter_call_method_noarg(f: *mut MSFilter, id: c_uint) -> c_int;
        pub fn ms_filter_add_notify_callback(
            f: *mut MSFilter,
            func: MSFilterNotifyFunc,
            user_data: *mut c_void,
            synchronous: bool_t,
        );
        pub fn ms_filter_remove_notify_callback(f: *mut MSFilter, func: MSFilterNotifyFunc, user_data: *mut c_void);
    }
}
