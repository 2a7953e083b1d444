/*!
mediastreamer2: filter descriptions, the factory that instantiates them and filters.

The built-in filters are a volume, a void source and sink, an opus encoder
and decoder and a disabled H264 decoder. Plugins can't be loaded here.
*/

use super::log::{native_log, BCTBX_LOG_ERROR, BCTBX_LOG_MESSAGE, BCTBX_LOG_WARNING};
use super::{bool_t, read_c_string, to_bool_t, FALSE};
use crate::sys::mediastreamer::*;
use libc::{c_char, c_float, c_int, c_uint, c_void};
use std::mem;
use std::path::Path;
use std::ptr;

pub const MS_VOLUME_ID: MSFilterId = 1;
pub const MS_VOID_SOURCE_ID: MSFilterId = 2;
pub const MS_VOID_SINK_ID: MSFilterId = 3;
pub const MS_OPUS_ENC_ID: MSFilterId = 4;
pub const MS_OPUS_DEC_ID: MSFilterId = 5;
pub const MS_OPENH264_DEC_ID: MSFilterId = 6;

pub const MS_VOLUME_SET_GAIN: c_uint = ms_filter_method_id(MS_VOLUME_ID, 0, mem::size_of::<c_float>());
pub const MS_VOLUME_GET_GAIN: c_uint = ms_filter_method_id(MS_VOLUME_ID, 1, mem::size_of::<c_float>());
pub const MS_VOLUME_GAIN_CHANGED: c_uint = ms_filter_method_id(MS_VOLUME_ID, 2, mem::size_of::<c_float>());

unsafe fn desc_name(desc: *const MSFilterDesc) -> Option<String> {
    read_c_string((*desc).name)
}

unsafe fn find_method(desc: *const MSFilterDesc, id: c_uint) -> Option<MSFilterMethod> {
    let mut method = (*desc).methods;
    if method.is_null() {
        return None;
    }

    while (*method).id != 0 {
        if (*method).id == id {
            return Some(*method);
        }

        method = method.add(1);
    }

    None
}

#[derive(Clone, Copy)]
struct Link {
    peer: *mut MSFilter,
    pin: c_int,
}

#[repr(C)]
pub struct MSFilter {
    pub desc: *mut MSFilterDesc,
    /// Private state of the filter implementation.
    pub data: *mut c_void,
    inputs: Vec<Option<Link>>,
    outputs: Vec<Option<Link>>,
    notify_callbacks: Vec<(MSFilterNotifyFunc, *mut c_void)>,
}

/// The filters the library ships with, built per factory.
struct Builtin {
    desc: Box<MSFilterDesc>,
    _methods: Box<[MSFilterMethod]>,
}

#[repr(C)]
pub struct MSFactory {
    builtins: Vec<Builtin>,
    registered: Vec<*mut MSFilterDesc>,
    cpu_count: c_uint,
    plugins_initialized: bool,
}

impl MSFactory {
    fn descriptions(&mut self) -> impl Iterator<Item = *mut MSFilterDesc> + '_ {
        self.registered
            .iter()
            .copied()
            .chain(self.builtins.iter_mut().map(|builtin| &mut *builtin.desc as *mut MSFilterDesc))
    }

    unsafe fn lookup(&mut self, name: &str) -> *mut MSFilterDesc {
        self.descriptions()
            .find(|desc| desc_name(*desc).as_deref() == Some(name))
            .unwrap_or(ptr::null_mut())
    }
}

unsafe extern "C" fn volume_init(f: *mut MSFilter) {
    (*f).data = Box::into_raw(Box::new(1.0 as c_float)) as *mut c_void;
}

unsafe extern "C" fn volume_uninit(f: *mut MSFilter) {
    drop(Box::from_raw((*f).data as *mut c_float));
    (*f).data = ptr::null_mut();
}

unsafe extern "C" fn volume_set_gain(f: *mut MSFilter, arg: *mut c_void) -> c_int {
    let gain = *(arg as *const c_float);
    if gain < 0.0 {
        return -1;
    }

    *((*f).data as *mut c_float) = gain;
    ms_filter_notify(f, MS_VOLUME_GAIN_CHANGED, arg);

    0
}

unsafe extern "C" fn volume_get_gain(f: *mut MSFilter, arg: *mut c_void) -> c_int {
    *(arg as *mut c_float) = *((*f).data as *const c_float);
    0
}

unsafe extern "C" fn have_plc(_f: *mut MSFilter, arg: *mut c_void) -> c_int {
    *(arg as *mut c_int) = 1;
    0
}

unsafe extern "C" fn noop_method(_f: *mut MSFilter, _arg: *mut c_void) -> c_int {
    0
}

fn builtin(
    id: MSFilterId,
    name: &'static [u8],
    text: &'static [u8],
    category: MSFilterCategory,
    enc_fmt: Option<&'static [u8]>,
    pins: (c_int, c_int),
    hooks: (MSFilterFunc, MSFilterFunc),
    methods: &[MSFilterMethod],
    enabled: bool,
) -> Builtin {
    let mut methods: Box<[MSFilterMethod]> = methods
        .iter()
        .copied()
        .chain(Some(MSFilterMethod { id: 0, method: None }))
        .collect();

    let desc = MSFilterDesc {
        id,
        name: name.as_ptr() as *const c_char,
        text: text.as_ptr() as *const c_char,
        category,
        enc_fmt: enc_fmt.map_or(ptr::null(), |enc_fmt| enc_fmt.as_ptr() as *const c_char),
        ninputs: pins.0,
        noutputs: pins.1,
        init: hooks.0,
        uninit: hooks.1,
        methods: methods.as_mut_ptr(),
        flags: if enabled { MS_FILTER_IS_ENABLED } else { 0 },
        ..MSFilterDesc::empty()
    };

    Builtin {
        desc: Box::new(desc),
        _methods: methods,
    }
}

fn builtins() -> Vec<Builtin> {
    let volume_methods = [
        MSFilterMethod {
            id: MS_VOLUME_SET_GAIN,
            method: Some(volume_set_gain),
        },
        MSFilterMethod {
            id: MS_VOLUME_GET_GAIN,
            method: Some(volume_get_gain),
        },
    ];

    let plc = [MSFilterMethod {
        id: MS_AUDIO_DECODER_HAVE_PLC,
        method: Some(have_plc),
    }];

    let reset = [MSFilterMethod {
        id: MS_VIDEO_DECODER_RESET,
        method: Some(noop_method),
    }];

    let no_hooks = (None, None);

    vec![
        builtin(
            MS_VOLUME_ID,
            b"MSVolume\0",
            b"A filter to make level measurements and apply gain\0",
            MS_FILTER_OTHER,
            None,
            (1, 1),
            (Some(volume_init), Some(volume_uninit)),
            &volume_methods,
            true,
        ),
        builtin(
            MS_VOID_SOURCE_ID,
            b"MSVoidSource\0",
            b"A filter that generates nothing\0",
            MS_FILTER_OTHER,
            None,
            (0, 1),
            no_hooks,
            &[],
            true,
        ),
        builtin(
            MS_VOID_SINK_ID,
            b"MSVoidSink\0",
            b"A filter that trashes its input\0",
            MS_FILTER_OTHER,
            None,
            (1, 0),
            no_hooks,
            &[],
            true,
        ),
        builtin(
            MS_OPUS_ENC_ID,
            b"MSOpusEnc\0",
            b"An opus encoder\0",
            MS_FILTER_ENCODER,
            Some(b"opus\0"),
            (1, 1),
            no_hooks,
            &[],
            true,
        ),
        builtin(
            MS_OPUS_DEC_ID,
            b"MSOpusDec\0",
            b"An opus decoder\0",
            MS_FILTER_DECODER,
            Some(b"opus\0"),
            (1, 1),
            no_hooks,
            &plc,
            true,
        ),
        builtin(
            MS_OPENH264_DEC_ID,
            b"MSOpenH264Dec\0",
            b"A H264 decoder based on openh264\0",
            MS_FILTER_DECODER,
            Some(b"H264\0"),
            (1, 1),
            no_hooks,
            &reset,
            false,
        ),
    ]
}

/// A new factory with the built-in filters registered.
pub unsafe extern "C" fn ms_factory_new_with_voip() -> *mut MSFactory {
    let cpu_count = std::thread::available_parallelism().map_or(1, |count| count.get() as c_uint);

    native_log!("mediastreamer", BCTBX_LOG_MESSAGE, "factory created with {} cpus", cpu_count);

    Box::into_raw(Box::new(MSFactory {
        builtins: builtins(),
        registered: Vec::new(),
        cpu_count,
        plugins_initialized: false,
    }))
}

pub unsafe extern "C" fn ms_factory_new() -> *mut MSFactory {
    ms_factory_new_with_voip()
}

/// Destroy the factory. Filters created from it must be destroyed first.
pub unsafe extern "C" fn ms_factory_destroy(factory: *mut MSFactory) {
    drop(Box::from_raw(factory));
}

pub unsafe extern "C" fn ms_factory_get_cpu_count(factory: *const MSFactory) -> c_uint {
    (*factory).cpu_count
}

pub unsafe extern "C" fn ms_factory_set_cpu_count(factory: *mut MSFactory, count: c_uint) {
    (*factory).cpu_count = count;
}

/// Scan the default plugin directory. There's never anything in it.
pub unsafe extern "C" fn ms_factory_init_plugins(factory: *mut MSFactory) {
    if !(*factory).plugins_initialized {
        native_log!("mediastreamer", BCTBX_LOG_MESSAGE, "no plugins to load");
        (*factory).plugins_initialized = true;
    }
}

/// Load the plugins found in `dir`: none. Fails if `dir` isn't a directory.
pub unsafe extern "C" fn ms_factory_load_plugins(_factory: *mut MSFactory, dir: *const c_char) -> c_int {
    let Some(dir) = read_c_string(dir) else {
        return -1;
    };

    if !Path::new(&dir).is_dir() {
        native_log!("mediastreamer", BCTBX_LOG_ERROR, "cannot open directory {}", dir);
        return -1;
    }

    native_log!("mediastreamer", BCTBX_LOG_WARNING, "plugins in {} can't be loaded in process", dir);
    0
}

/// Register a description. The factory keeps the pointer and enables the filter.
///
/// A description without an identifier is refused, with nothing but a log line.
pub unsafe extern "C" fn ms_factory_register_filter(factory: *mut MSFactory, desc: *mut MSFilterDesc) {
    if (*desc).id == MS_FILTER_NOT_SET_ID {
        native_log!(
            "mediastreamer",
            BCTBX_LOG_ERROR,
            "MSFilterId for {} not set",
            desc_name(desc).unwrap_or_default()
        );
        return;
    }

    (*desc).flags |= MS_FILTER_IS_ENABLED;
    (*factory).registered.insert(0, desc);
}

/// The description registered under `name`, borrowed. Null if there's none.
pub unsafe extern "C" fn ms_factory_lookup_filter_by_name(factory: *mut MSFactory, name: *const c_char) -> *mut MSFilterDesc {
    match read_c_string(name) {
        Some(name) => (*factory).lookup(&name),
        None => ptr::null_mut(),
    }
}

pub unsafe extern "C" fn ms_factory_enable_filter_from_name(
    factory: *mut MSFactory,
    name: *const c_char,
    enable: bool_t,
) -> c_int {
    let desc = ms_factory_lookup_filter_by_name(factory, name);
    if desc.is_null() {
        native_log!("mediastreamer", BCTBX_LOG_WARNING, "no filter named {:?} to enable", read_c_string(name));
        return -1;
    }

    if enable != FALSE {
        (*desc).flags |= MS_FILTER_IS_ENABLED;
    } else {
        (*desc).flags &= !MS_FILTER_IS_ENABLED;
    }

    0
}

pub unsafe extern "C" fn ms_factory_filter_from_name_enabled(factory: *mut MSFactory, name: *const c_char) -> bool_t {
    let desc = ms_factory_lookup_filter_by_name(factory, name);
    to_bool_t(!desc.is_null() && (*desc).flags & MS_FILTER_IS_ENABLED != 0)
}

/// Instantiate a filter. `desc` must outlive it.
pub unsafe extern "C" fn ms_factory_create_filter_from_desc(_factory: *mut MSFactory, desc: *mut MSFilterDesc) -> *mut MSFilter {
    let ninputs = (*desc).ninputs.max(0) as usize;
    let noutputs = (*desc).noutputs.max(0) as usize;

    let filter = Box::into_raw(Box::new(MSFilter {
        desc,
        data: ptr::null_mut(),
        inputs: vec![None; ninputs],
        outputs: vec![None; noutputs],
        notify_callbacks: Vec::new(),
    }));

    if let Some(init) = (*desc).init {
        init(filter);
    }

    filter
}

pub unsafe extern "C" fn ms_factory_create_filter_from_name(factory: *mut MSFactory, name: *const c_char) -> *mut MSFilter {
    let desc = ms_factory_lookup_filter_by_name(factory, name);
    if desc.is_null() {
        native_log!("mediastreamer", BCTBX_LOG_ERROR, "no filter named {:?}", read_c_string(name));
        return ptr::null_mut();
    }

    ms_factory_create_filter_from_desc(factory, desc)
}

pub unsafe extern "C" fn ms_factory_create_filter(factory: *mut MSFactory, id: MSFilterId) -> *mut MSFilter {
    let desc = (*factory).descriptions().find(|desc| (**desc).id == id);

    match desc {
        Some(desc) => ms_factory_create_filter_from_desc(factory, desc),
        None => {
            native_log!("mediastreamer", BCTBX_LOG_ERROR, "no filter with id {}", id);
            ptr::null_mut()
        }
    }
}

unsafe fn create_codec(factory: *mut MSFactory, category: MSFilterCategory, mime: *const c_char) -> *mut MSFilter {
    let Some(mime) = read_c_string(mime) else {
        return ptr::null_mut();
    };

    let desc = (*factory).descriptions().find(|desc| {
        (**desc).category == category
            && (**desc).flags & MS_FILTER_IS_ENABLED != 0
            && read_c_string((**desc).enc_fmt).map_or(false, |enc_fmt| enc_fmt.eq_ignore_ascii_case(&mime))
    });

    match desc {
        Some(desc) => ms_factory_create_filter_from_desc(factory, desc),
        None => ptr::null_mut(),
    }
}

/// An enabled encoder for `mime`, null if there's none.
pub unsafe extern "C" fn ms_factory_create_encoder(factory: *mut MSFactory, mime: *const c_char) -> *mut MSFilter {
    create_codec(factory, MS_FILTER_ENCODER, mime)
}

/// An enabled decoder for `mime`, null if there's none.
pub unsafe extern "C" fn ms_factory_create_decoder(factory: *mut MSFactory, mime: *const c_char) -> *mut MSFilter {
    create_codec(factory, MS_FILTER_DECODER, mime)
}

/// Whether any of the description's methods belongs to `id`.
pub unsafe extern "C" fn ms_filter_desc_implements_interface(desc: *const MSFilterDesc, id: MSFilterInterfaceId) -> bool_t {
    let mut method = (*desc).methods;
    if method.is_null() {
        return FALSE;
    }

    while (*method).id != 0 {
        if ms_filter_method_get_fid((*method).id) == id {
            return to_bool_t(true);
        }

        method = method.add(1);
    }

    FALSE
}

/// Destroy a filter, unlinking it from its peers first.
pub unsafe extern "C" fn ms_filter_destroy(f: *mut MSFilter) {
    if (*f).inputs.iter().chain((*f).outputs.iter()).any(Option::is_some) {
        native_log!("mediastreamer", BCTBX_LOG_WARNING, "destroying filter {:p} while still linked", f);
    }

    for (pin, link) in (*f).outputs.clone().into_iter().enumerate() {
        if let Some(link) = link {
            ms_filter_unlink(f, pin as c_int, link.peer, link.pin);
        }
    }

    for (pin, link) in (*f).inputs.clone().into_iter().enumerate() {
        if let Some(link) = link {
            ms_filter_unlink(link.peer, link.pin, f, pin as c_int);
        }
    }

    if let Some(uninit) = (*(*f).desc).uninit {
        uninit(f);
    }

    drop(Box::from_raw(f));
}

pub unsafe extern "C" fn ms_filter_get_id(f: *const MSFilter) -> MSFilterId {
    (*(*f).desc).id
}

/// The name from the description, borrowed.
pub unsafe extern "C" fn ms_filter_get_name(f: *const MSFilter) -> *const c_char {
    (*(*f).desc).name
}

pub unsafe extern "C" fn ms_filter_get_desc(f: *const MSFilter) -> *mut MSFilterDesc {
    (*f).desc
}

/// Link output `pin1` of `f1` to input `pin2` of `f2`. Fails on a bad or busy pin.
pub unsafe extern "C" fn ms_filter_link(f1: *mut MSFilter, pin1: c_int, f2: *mut MSFilter, pin2: c_int) -> c_int {
    let output = usize::try_from(pin1).ok().filter(|pin| *pin < (*f1).outputs.len());
    let input = usize::try_from(pin2).ok().filter(|pin| *pin < (*f2).inputs.len());

    let (Some(output), Some(input)) = (output, input) else {
        native_log!("mediastreamer", BCTBX_LOG_ERROR, "invalid pins {} -> {}", pin1, pin2);
        return -1;
    };

    if (&(*f1).outputs)[output].is_some() || (&(*f2).inputs)[input].is_some() {
        native_log!("mediastreamer", BCTBX_LOG_ERROR, "pins {} -> {} already linked", pin1, pin2);
        return -1;
    }

    (&mut (*f1).outputs)[output] = Some(Link { peer: f2, pin: pin2 });
    (&mut (*f2).inputs)[input] = Some(Link { peer: f1, pin: pin1 });

    0
}

/// Undo `ms_filter_link`. Fails if those pins aren't linked together.
pub unsafe extern "C" fn ms_filter_unlink(f1: *mut MSFilter, pin1: c_int, f2: *mut MSFilter, pin2: c_int) -> c_int {
    let output = usize::try_from(pin1).ok().filter(|pin| *pin < (*f1).outputs.len());
    let input = usize::try_from(pin2).ok().filter(|pin| *pin < (*f2).inputs.len());

    let (Some(output), Some(input)) = (output, input) else {
        return -1;
    };

    let linked = matches!((&(*f1).outputs)[output], Some(link) if link.peer == f2 && link.pin == pin2)
        && matches!((&(*f2).inputs)[input], Some(link) if link.peer == f1 && link.pin == pin1);

    if !linked {
        return -1;
    }

    (&mut (*f1).outputs)[output] = None;
    (&mut (*f2).inputs)[input] = None;

    0
}

pub unsafe extern "C" fn ms_filter_has_method(f: *const MSFilter, id: c_uint) -> bool_t {
    to_bool_t(find_method((*f).desc, id).is_some())
}

/// Call a method of the filter. Fails if the filter doesn't have it.
pub unsafe extern "C" fn ms_filter_call_method(f: *mut MSFilter, id: c_uint, arg: *mut c_void) -> c_int {
    match find_method((*f).desc, id).and_then(|method| method.method) {
        Some(method) => method(f, arg),
        None => {
            native_log!(
                "mediastreamer",
                BCTBX_LOG_ERROR,
                "method {:#x} not implemented by {}",
                id,
                desc_name((*f).desc).unwrap_or_default()
            );
            -1
        }
    }
}

pub unsafe extern "C" fn ms_filter_call_method_noarg(f: *mut MSFilter, id: c_uint) -> c_int {
    ms_filter_call_method(f, id, ptr::null_mut())
}

pub unsafe extern "C" fn ms_filter_add_notify_callback(
    f: *mut MSFilter,
    func: MSFilterNotifyFunc,
    user_data: *mut c_void,
    _synchronous: bool_t,
) {
    (*f).notify_callbacks.push((func, user_data));
}

pub unsafe extern "C" fn ms_filter_remove_notify_callback(f: *mut MSFilter, func: MSFilterNotifyFunc, user_data: *mut c_void) {
    let callbacks = &mut (*f).notify_callbacks;

    match callbacks
        .iter()
        .position(|(existing, data)| *existing == func && *data == user_data)
    {
        Some(index) => {
            callbacks.remove(index);
        }
        None => native_log!("mediastreamer", BCTBX_LOG_WARNING, "no such notify callback on {:p}", f),
    }
}

/// Deliver an event to every notify callback, in registration order.
pub unsafe extern "C" fn ms_filter_notify(f: *mut MSFilter, id: c_uint, arg: *mut c_void) {
    for (func, user_data) in (*f).notify_callbacks.clone() {
        if let Some(func) = func {
            func(user_data, f, id, arg);
        }
    }
}

pub unsafe extern "C" fn ms_filter_notify_no_arg(f: *mut MSFilter, id: c_uint) {
    ms_filter_notify(f, id, ptr::null_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn name(value: &[u8]) -> *const c_char {
        value.as_ptr() as *const c_char
    }

    #[test]
    fn builtin_filters() {
        unsafe {
            let factory = ms_factory_new();

            let volume = ms_factory_create_filter_from_name(factory, name(b"MSVolume\0"));
            assert!(!volume.is_null());
            assert_eq!(MS_VOLUME_ID, ms_filter_get_id(volume));
            assert_ne!(FALSE, ms_filter_has_method(volume, MS_VOLUME_SET_GAIN));

            let mut gain: c_float = 0.5;
            assert_eq!(0, ms_filter_call_method(volume, MS_VOLUME_SET_GAIN, &mut gain as *mut c_float as *mut c_void));

            let mut read: c_float = 0.0;
            ms_filter_call_method(volume, MS_VOLUME_GET_GAIN, &mut read as *mut c_float as *mut c_void);
            assert_eq!(0.5, read);

            assert_eq!(-1, ms_filter_call_method_noarg(volume, MS_VIDEO_DECODER_RESET));
            assert!(ms_factory_create_filter_from_name(factory, name(b"MSNothing\0")).is_null());

            ms_filter_destroy(volume);
            ms_factory_destroy(factory);
        }
    }

    #[test]
    fn codecs_respect_enabled_flag() {
        unsafe {
            let factory = ms_factory_new();

            assert!(ms_factory_create_decoder(factory, name(b"h264\0")).is_null());
            assert_eq!(FALSE, ms_factory_filter_from_name_enabled(factory, name(b"MSOpenH264Dec\0")));

            assert_eq!(0, ms_factory_enable_filter_from_name(factory, name(b"MSOpenH264Dec\0"), 1));
            let decoder = ms_factory_create_decoder(factory, name(b"h264\0"));
            assert!(!decoder.is_null());

            let encoder = ms_factory_create_encoder(factory, name(b"opus\0"));
            assert_eq!(MS_OPUS_ENC_ID, ms_filter_get_id(encoder));

            assert_eq!(-1, ms_factory_enable_filter_from_name(factory, name(b"MSNothing\0"), 1));

            ms_filter_destroy(decoder);
            ms_filter_destroy(encoder);
            ms_factory_destroy(factory);
        }
    }

    #[test]
    fn links_validate_pins() {
        unsafe {
            let factory = ms_factory_new();
            let source = ms_factory_create_filter(factory, MS_VOID_SOURCE_ID);
            let sink = ms_factory_create_filter(factory, MS_VOID_SINK_ID);

            assert_eq!(-1, ms_filter_link(source, 1, sink, 0));
            assert_eq!(-1, ms_filter_link(sink, 0, source, 0));
            assert_eq!(0, ms_filter_link(source, 0, sink, 0));
            assert_eq!(-1, ms_filter_link(source, 0, sink, 0));

            assert_eq!(0, ms_filter_unlink(source, 0, sink, 0));
            assert_eq!(-1, ms_filter_unlink(source, 0, sink, 0));

            // Destroying a linked filter leaves its peer unlinked.
            assert_eq!(0, ms_filter_link(source, 0, sink, 0));
            ms_filter_destroy(source);
            assert!((&(*sink).inputs)[0].is_none());

            ms_filter_destroy(sink);
            ms_factory_destroy(factory);
        }
    }

    #[test]
    fn registration_enables_the_callers_description() {
        unsafe {
            let factory = ms_factory_new();

            let mut desc = MSFilterDesc::empty();
            desc.name = name(b"TestFilter\0");
            ms_factory_register_filter(factory, &mut desc);
            assert!(ms_factory_lookup_filter_by_name(factory, name(b"TestFilter\0")).is_null());
            assert_eq!(0, desc.flags & MS_FILTER_IS_ENABLED);

            desc.id = MS_FILTER_PLUGIN_ID;
            ms_factory_register_filter(factory, &mut desc);
            assert_eq!(MS_FILTER_IS_ENABLED, desc.flags & MS_FILTER_IS_ENABLED);
            assert_eq!(&mut desc as *mut MSFilterDesc, ms_factory_lookup_filter_by_name(factory, name(b"TestFilter\0")));

            ms_factory_enable_filter_from_name(factory, name(b"TestFilter\0"), FALSE);
            assert_eq!(0, desc.flags & MS_FILTER_IS_ENABLED);

            ms_factory_destroy(factory);
        }
    }

    #[test]
    fn plugins_need_a_directory() {
        unsafe {
            let factory = ms_factory_new();
            let dir = crate::sys::loopback::c_string(&std::env::temp_dir().to_string_lossy());

            ms_factory_init_plugins(factory);
            ms_factory_init_plugins(factory);
            assert!((*factory).plugins_initialized);

            assert_eq!(0, ms_factory_load_plugins(factory, dir.as_ptr()));
            assert_eq!(-1, ms_factory_load_plugins(factory, name(b"/nonexistent/plugins\0")));
            assert_eq!(-1, ms_factory_load_plugins(factory, ptr::null()));

            ms_factory_destroy(factory);
        }
    }

    thread_local! {
        static EVENTS: Cell<usize> = Cell::new(0);
    }

    unsafe extern "C" fn count_events(user_data: *mut c_void, _f: *mut MSFilter, id: c_uint, _arg: *mut c_void) {
        assert_eq!(7, user_data as usize);
        assert_eq!(MS_VOLUME_GAIN_CHANGED, id);
        EVENTS.with(|events| events.set(events.get() + 1));
    }

    #[test]
    fn notifications() {
        unsafe {
            let factory = ms_factory_new();
            let volume = ms_factory_create_filter(factory, MS_VOLUME_ID);

            ms_filter_add_notify_callback(volume, Some(count_events), 7 as *mut c_void, FALSE);

            let mut gain: c_float = 2.0;
            ms_filter_call_method(volume, MS_VOLUME_SET_GAIN, &mut gain as *mut c_float as *mut c_void);
            assert_eq!(1, EVENTS.with(Cell::get));

            ms_filter_remove_notify_callback(volume, Some(count_events), 7 as *mut c_void);
            ms_filter_call_method(volume, MS_VOLUME_SET_GAIN, &mut gain as *mut c_float as *mut c_void);
            assert_eq!(1, EVENTS.with(Cell::get));

            ms_filter_destroy(volume);
            ms_factory_destroy(factory);
        }
    }

    #[test]
    fn interfaces_come_from_methods() {
        unsafe {
            let factory = ms_factory_new();

            let decoder = ms_factory_lookup_filter_by_name(factory, name(b"MSOpusDec\0"));
            assert_ne!(FALSE, ms_filter_desc_implements_interface(decoder, MSFilterAudioDecoderInterface));
            assert_eq!(FALSE, ms_filter_desc_implements_interface(decoder, MSFilterVideoDecoderInterface));

            let empty = MSFilterDesc::empty();
            assert_eq!(FALSE, ms_filter_desc_implements_interface(&empty, MSFilterInterfaceBegin));

            ms_factory_destroy(factory);
        }
    }
}
