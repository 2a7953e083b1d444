use super::address::{linphone_address_as_string, linphone_address_clone, parse_address, LinphoneAddress};
use super::config::{linphone_config_get_string, linphone_config_new_with_factory, linphone_config_set_string, LinphoneConfig};
use super::config::linphone_config_get_sections_names_list;
use super::*;
use crate::sys::loopback::belle_sip::{belle_sip_object_t, belle_sip_object_vptr_t, object_marshal_type_name, object_new, object_not_clonable};
use crate::sys::loopback::log::{native_log, BCTBX_LOG_DEBUG, BCTBX_LOG_MESSAGE, BCTBX_LOG_WARNING};
use crate::sys::loopback::toolbox::{bctbx_list_append, bctbx_list_free, bctbx_list_get_data, bctbx_list_next, bctbx_list_t};
use crate::sys::loopback::{c_string, read_c_string};
use libc::{c_char, c_int, c_void};
use std::collections::VecDeque;
use std::ffi::CString;
use std::ptr;
use std::time::Instant;

const DEFAULT_CONTACT: &[u8] = b"sip:linphone@localhost\0";
const VERSION: &[u8] = b"5.3.0\0";

/// A table of core callbacks. A core fires every table added to it.
#[repr(C)]
pub struct LinphoneCoreCbs {
    base: belle_sip_object_t,
    call_state_changed: LinphoneCoreCbsCallStateChangedCb,
    global_state_changed: LinphoneCoreCbsGlobalStateChangedCb,
    registration_state_changed: LinphoneCoreCbsRegistrationStateChangedCb,
    call_created: LinphoneCoreCbsCallCreatedCb,
    user_data: *mut c_void,
}

static CORE_CBS_VPTR: belle_sip_object_vptr_t = belle_sip_object_vptr_t {
    type_name: "LinphoneCoreCbs",
    clone: object_not_clonable,
    marshal: object_marshal_type_name,
    destroy: object_destroy::<LinphoneCoreCbs>,
};

/// An account, read from a `[proxy_N]` section of the configuration at startup.
#[repr(C)]
pub struct LinphoneProxyConfig {
    base: belle_sip_object_t,
    identity: *mut LinphoneAddress,
    state: LinphoneRegistrationState,
}

static PROXY_CONFIG_VPTR: belle_sip_object_vptr_t = belle_sip_object_vptr_t {
    type_name: "LinphoneProxyConfig",
    clone: object_not_clonable,
    marshal: object_marshal_type_name,
    destroy: proxy_config_destroy,
};

enum CoreEvent {
    GlobalState(LinphoneGlobalState, CString),
    // The call and proxy variants hold a reference until delivered.
    CallState(*mut LinphoneCall, LinphoneCallState, CString),
    Registration(*mut LinphoneProxyConfig, LinphoneRegistrationState, CString),
}

#[repr(C)]
pub struct LinphoneCore {
    base: belle_sip_object_t,
    config: *mut LinphoneConfig,
    callbacks: Vec<*mut LinphoneCoreCbs>,
    calls: Vec<*mut LinphoneCall>,
    // Rebuilt by every `linphone_core_get_calls`.
    calls_list: *mut bctbx_list_t,
    proxies: Vec<*mut LinphoneProxyConfig>,
    pending: VecDeque<CoreEvent>,
    started: bool,
    user_data: *mut c_void,
}

static CORE_VPTR: belle_sip_object_vptr_t = belle_sip_object_vptr_t {
    type_name: "LinphoneCore",
    clone: object_not_clonable,
    marshal: object_marshal_type_name,
    destroy: core_destroy,
};

#[repr(C)]
pub struct LinphoneCall {
    base: belle_sip_object_t,
    // Not a reference, cleared when the core lets go of the call.
    core: *mut LinphoneCore,
    state: LinphoneCallState,
    dir: LinphoneCallDir,
    remote_address: *mut LinphoneAddress,
    to_address: *mut LinphoneAddress,
    connected_at: Option<Instant>,
    user_data: *mut c_void,
}

static CALL_VPTR: belle_sip_object_vptr_t = belle_sip_object_vptr_t {
    type_name: "LinphoneCall",
    clone: object_not_clonable,
    marshal: object_marshal_type_name,
    destroy: call_destroy,
};

linphone_refcounting! {
    LinphoneCoreCbs => linphone_core_cbs_ref, linphone_core_cbs_unref;
    LinphoneCore => linphone_core_ref, linphone_core_unref;
    LinphoneCall => linphone_call_ref, linphone_call_unref;
    LinphoneProxyConfig => linphone_proxy_config_ref, linphone_proxy_config_unref;
}

fn state_message(state: LinphoneCallState) -> &'static str {
    match state {
        LinphoneCallStateIncomingReceived => "Incoming call",
        LinphoneCallStateOutgoingInit => "Starting outgoing call",
        LinphoneCallStateOutgoingProgress => "Outgoing call in progress",
        LinphoneCallStateOutgoingRinging => "Remote ringing",
        LinphoneCallStateConnected => "Connected",
        LinphoneCallStateStreamsRunning => "Streams running",
        LinphoneCallStatePausing => "Pausing call",
        LinphoneCallStatePaused => "Call paused",
        LinphoneCallStateResuming => "Resuming call",
        LinphoneCallStateEnd => "Call ended",
        LinphoneCallStateReleased => "Call released",
        _ => "",
    }
}

unsafe fn core_destroy(obj: *mut belle_sip_object_t) {
    let core = Box::from_raw(obj as *mut LinphoneCore);

    for event in core.pending.iter() {
        match event {
            CoreEvent::CallState(call, _, _) => release(*call),
            CoreEvent::Registration(proxy, _, _) => release(*proxy),
            CoreEvent::GlobalState(_, _) => {}
        }
    }

    for call in &core.calls {
        (**call).core = ptr::null_mut();
        release(*call);
    }

    for proxy in &core.proxies {
        release(*proxy);
    }

    for cbs in &core.callbacks {
        release(*cbs);
    }

    bctbx_list_free(core.calls_list);
    release(core.config);
}

unsafe fn call_destroy(obj: *mut belle_sip_object_t) {
    let call = Box::from_raw(obj as *mut LinphoneCall);
    release(call.remote_address);
    release(call.to_address);
}

unsafe fn proxy_config_destroy(obj: *mut belle_sip_object_t) {
    let proxy = Box::from_raw(obj as *mut LinphoneProxyConfig);
    release(proxy.identity);
}

/// A new floating callback table with no callbacks set.
pub unsafe extern "C" fn linphone_factory_create_core_cbs(_factory: *mut LinphoneFactory) -> *mut LinphoneCoreCbs {
    object_new(LinphoneCoreCbs {
        base: belle_sip_object_t::new(&CORE_CBS_VPTR),
        call_state_changed: None,
        global_state_changed: None,
        registration_state_changed: None,
        call_created: None,
        user_data: ptr::null_mut(),
    })
}

pub unsafe extern "C" fn linphone_core_cbs_set_call_state_changed(
    cbs: *mut LinphoneCoreCbs,
    cb: LinphoneCoreCbsCallStateChangedCb,
) {
    (*cbs).call_state_changed = cb;
}

pub unsafe extern "C" fn linphone_core_cbs_set_global_state_changed(
    cbs: *mut LinphoneCoreCbs,
    cb: LinphoneCoreCbsGlobalStateChangedCb,
) {
    (*cbs).global_state_changed = cb;
}

pub unsafe extern "C" fn linphone_core_cbs_set_registration_state_changed(
    cbs: *mut LinphoneCoreCbs,
    cb: LinphoneCoreCbsRegistrationStateChangedCb,
) {
    (*cbs).registration_state_changed = cb;
}

pub unsafe extern "C" fn linphone_core_cbs_set_call_created(cbs: *mut LinphoneCoreCbs, cb: LinphoneCoreCbsCallCreatedCb) {
    (*cbs).call_created = cb;
}

pub unsafe extern "C" fn linphone_core_cbs_get_user_data(cbs: *const LinphoneCoreCbs) -> *mut c_void {
    (*cbs).user_data
}

pub unsafe extern "C" fn linphone_core_cbs_set_user_data(cbs: *mut LinphoneCoreCbs, user_data: *mut c_void) {
    (*cbs).user_data = user_data;
}

/// Create a floating core, not started. Returns null if either configuration file is malformed.
pub unsafe extern "C" fn linphone_factory_create_core_3(
    _factory: *mut LinphoneFactory,
    config_path: *const c_char,
    factory_config_path: *const c_char,
    _system_context: *mut c_void,
) -> *mut LinphoneCore {
    let config = linphone_config_new_with_factory(config_path, factory_config_path);
    if config.is_null() {
        native_log!("liblinphone", BCTBX_LOG_WARNING, "cannot create core, configuration unreadable");
        return ptr::null_mut();
    }

    let core = object_new(LinphoneCore {
        base: belle_sip_object_t::new(&CORE_VPTR),
        config: retain(config),
        callbacks: Vec::new(),
        calls: Vec::new(),
        calls_list: ptr::null_mut(),
        proxies: Vec::new(),
        pending: VecDeque::new(),
        started: false,
        user_data: ptr::null_mut(),
    });

    native_log!("liblinphone", BCTBX_LOG_MESSAGE, "core created at {:p}", core);

    core
}

unsafe fn set_registration_state(lc: *mut LinphoneCore, proxy: *mut LinphoneProxyConfig, state: LinphoneRegistrationState) {
    let message = match state {
        LinphoneRegistrationProgress => "Registration in progress",
        LinphoneRegistrationOk => "Registration successful",
        LinphoneRegistrationRefreshing => "Refreshing registration",
        LinphoneRegistrationCleared => "Unregistration done",
        _ => "",
    };

    (*proxy).state = state;
    (*lc).pending.push_back(CoreEvent::Registration(retain(proxy), state, c_string(message)));
}

/// An account for every `[proxy_N]` section with a valid `reg_identity`.
unsafe fn load_proxies(lc: *mut LinphoneCore) {
    let sections = linphone_config_get_sections_names_list((*lc).config);
    let mut node = sections;

    while !node.is_null() {
        let section = bctbx_list_get_data(node) as *const c_char;
        node = bctbx_list_next(node);

        if !read_c_string(section).map_or(false, |name| name.starts_with("proxy_")) {
            continue;
        }

        let identity = linphone_config_get_string(
            (*lc).config,
            section,
            b"reg_identity\0".as_ptr() as *const c_char,
            ptr::null(),
        );

        match read_c_string(identity).and_then(|identity| parse_address(&identity)) {
            Some(identity) => {
                let proxy = retain(object_new(LinphoneProxyConfig {
                    base: belle_sip_object_t::new(&PROXY_CONFIG_VPTR),
                    identity: retain(identity),
                    state: LinphoneRegistrationNone,
                }));

                (*lc).proxies.push(proxy);
            }
            None => native_log!("liblinphone", BCTBX_LOG_WARNING, "skipping account without a valid identity"),
        }
    }

    bctbx_list_free(sections);
}

/// Start the core. `Startup`, `On` and the first registrations are delivered by the next iterate.
pub unsafe extern "C" fn linphone_core_start(lc: *mut LinphoneCore) -> c_int {
    if (*lc).started {
        native_log!("liblinphone", BCTBX_LOG_WARNING, "core {:p} already started", lc);
        return 0;
    }

    (*lc).started = true;
    (*lc).pending.push_back(CoreEvent::GlobalState(LinphoneGlobalStartup, c_string("Starting up")));
    load_proxies(lc);
    (*lc).pending.push_back(CoreEvent::GlobalState(LinphoneGlobalOn, c_string("Ready")));

    for proxy in (*lc).proxies.clone() {
        set_registration_state(lc, proxy, LinphoneRegistrationProgress);
        set_registration_state(lc, proxy, LinphoneRegistrationOk);
    }

    0
}

/// Stop the core: end every call, unregister and shut down, notifying synchronously.
pub unsafe extern "C" fn linphone_core_stop(lc: *mut LinphoneCore) {
    if !(*lc).started {
        return;
    }

    retain(lc);

    for call in (*lc).calls.clone() {
        if linphone_call_terminate(call) == 0 {
            set_call_state(call, LinphoneCallStateReleased);
        }
    }

    for proxy in (*lc).proxies.clone() {
        if (*proxy).state == LinphoneRegistrationOk {
            set_registration_state(lc, proxy, LinphoneRegistrationCleared);
        }
    }

    (*lc).pending.push_back(CoreEvent::GlobalState(LinphoneGlobalShutdown, c_string("Shutdown in progress")));
    (*lc).pending.push_back(CoreEvent::GlobalState(LinphoneGlobalOff, c_string("Off")));

    deliver_pending(lc);
    release_ended_calls(lc);

    for proxy in (*lc).proxies.drain(..) {
        release(proxy);
    }

    (*lc).started = false;
    release(lc);
}

pub unsafe extern "C" fn linphone_core_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

pub unsafe extern "C" fn linphone_core_add_callbacks(lc: *mut LinphoneCore, cbs: *mut LinphoneCoreCbs) {
    (*lc).callbacks.push(retain(cbs));
}

pub unsafe extern "C" fn linphone_core_remove_callbacks(lc: *mut LinphoneCore, cbs: *const LinphoneCoreCbs) {
    let callbacks = &mut (*lc).callbacks;

    if let Some(index) = callbacks.iter().position(|existing| *existing as *const _ == cbs) {
        let removed = callbacks.remove(index);
        release(removed);
    }
}

pub unsafe extern "C" fn linphone_core_get_user_data(lc: *const LinphoneCore) -> *mut c_void {
    (*lc).user_data
}

pub unsafe extern "C" fn linphone_core_set_user_data(lc: *mut LinphoneCore, user_data: *mut c_void) {
    (*lc).user_data = user_data;
}

/// The core's configuration, borrowed. The core keeps reading and writing it.
pub unsafe extern "C" fn linphone_core_get_config(lc: *const LinphoneCore) -> *mut LinphoneConfig {
    (*lc).config
}

/// The primary contact, borrowed from the core's configuration.
pub unsafe extern "C" fn linphone_core_get_primary_contact(lc: *const LinphoneCore) -> *const c_char {
    linphone_config_get_string(
        (*lc).config,
        b"sip\0".as_ptr() as *const c_char,
        b"contact\0".as_ptr() as *const c_char,
        DEFAULT_CONTACT.as_ptr() as *const c_char,
    )
}

/// Set the primary contact. Fails if `contact` isn't a valid address.
pub unsafe extern "C" fn linphone_core_set_primary_contact(lc: *mut LinphoneCore, contact: *const c_char) -> c_int {
    let Some(address) = read_c_string(contact).and_then(|contact| parse_address(&contact)) else {
        return -1;
    };

    let text = linphone_address_as_string(address);
    release(address);

    linphone_config_set_string(
        (*lc).config,
        b"sip\0".as_ptr() as *const c_char,
        b"contact\0".as_ptr() as *const c_char,
        text,
    );
    libc::free(text as *mut c_void);

    0
}

/// The primary contact as a new floating address.
pub unsafe extern "C" fn linphone_core_create_primary_contact_parsed(lc: *mut LinphoneCore) -> *mut LinphoneAddress {
    read_c_string(linphone_core_get_primary_contact(lc))
        .and_then(|contact| parse_address(&contact))
        .unwrap_or(ptr::null_mut())
}

unsafe fn set_call_state(call: *mut LinphoneCall, state: LinphoneCallState) {
    (*call).state = state;

    if state == LinphoneCallStateConnected {
        (*call).connected_at = Some(Instant::now());
    }

    let core = (*call).core;
    if !core.is_null() {
        let message = c_string(state_message(state));
        (*core).pending.push_back(CoreEvent::CallState(retain(call), state, message));
    }
}

/// Run `f` on a snapshot of the callback tables, each kept alive meanwhile.
unsafe fn for_each_callbacks(lc: *mut LinphoneCore, mut f: impl FnMut(*mut LinphoneCoreCbs)) {
    let callbacks = (*lc).callbacks.clone();
    for cbs in &callbacks {
        retain(*cbs);
    }

    for cbs in &callbacks {
        f(*cbs);
    }

    for cbs in callbacks {
        release(cbs);
    }
}

unsafe fn add_call(lc: *mut LinphoneCore, remote_address: *mut LinphoneAddress, dir: LinphoneCallDir) -> *mut LinphoneCall {
    // Outgoing calls go to the remote party, incoming ones came to us.
    let to_address = if dir == LinphoneCallOutgoing {
        linphone_address_clone(remote_address)
    } else {
        let contact = linphone_core_create_primary_contact_parsed(lc);
        if contact.is_null() {
            linphone_address_clone(remote_address)
        } else {
            contact
        }
    };

    let call = retain(object_new(LinphoneCall {
        base: belle_sip_object_t::new(&CALL_VPTR),
        core: lc,
        state: LinphoneCallStateIdle,
        dir,
        remote_address: retain(remote_address),
        to_address: retain(to_address),
        connected_at: None,
        user_data: ptr::null_mut(),
    }));

    (*lc).calls.push(call);

    retain(call);
    for_each_callbacks(lc, |cbs| {
        if let Some(cb) = (*cbs).call_created {
            cb(lc, call);
        }
    });
    release(call);

    let state = if dir == LinphoneCallOutgoing {
        LinphoneCallStateOutgoingInit
    } else {
        LinphoneCallStateIncomingReceived
    };

    set_call_state(call, state);

    call
}

/// Place a call. The call is borrowed from the core, null if `url` isn't an address.
pub unsafe extern "C" fn linphone_core_invite(lc: *mut LinphoneCore, url: *const c_char) -> *mut LinphoneCall {
    match read_c_string(url).and_then(|url| parse_address(&url)) {
        Some(address) => add_call(lc, address, LinphoneCallOutgoing),
        None => ptr::null_mut(),
    }
}

/// Place a call to a copy of `addr`. The call is borrowed from the core.
pub unsafe extern "C" fn linphone_core_invite_address(
    lc: *mut LinphoneCore,
    addr: *const LinphoneAddress,
) -> *mut LinphoneCall {
    add_call(lc, linphone_address_clone(addr), LinphoneCallOutgoing)
}

/// Feed an incoming call from `from` through the loopback transport.
///
/// The call is borrowed from the core, null if `from` isn't an address.
pub unsafe extern "C" fn linphone_core_inject_incoming_call(lc: *mut LinphoneCore, from: *const c_char) -> *mut LinphoneCall {
    match read_c_string(from).and_then(|from| parse_address(&from)) {
        Some(address) => add_call(lc, address, LinphoneCallIncoming),
        None => ptr::null_mut(),
    }
}

pub unsafe extern "C" fn linphone_core_get_calls_nb(lc: *const LinphoneCore) -> c_int {
    (*lc).calls.len() as c_int
}

/// The calls in creation order. The list and the calls are borrowed from the core.
pub unsafe extern "C" fn linphone_core_get_calls(lc: *mut LinphoneCore) -> *const bctbx_list_t {
    bctbx_list_free((*lc).calls_list);

    let mut list = ptr::null_mut();
    for call in &(*lc).calls {
        list = bctbx_list_append(list, *call as *mut c_void);
    }

    (*lc).calls_list = list;
    list
}

/// The most recent call that's neither paused nor over, borrowed. Null if there's none.
pub unsafe extern "C" fn linphone_core_get_current_call(lc: *const LinphoneCore) -> *mut LinphoneCall {
    (*lc)
        .calls
        .iter()
        .rev()
        .copied()
        .find(|call| {
            !matches!(
                (**call).state,
                LinphoneCallStatePaused | LinphoneCallStateEnd | LinphoneCallStateReleased
            )
        })
        .unwrap_or(ptr::null_mut())
}

pub unsafe extern "C" fn linphone_core_terminate_all_calls(lc: *mut LinphoneCore) -> c_int {
    for call in (*lc).calls.clone() {
        linphone_call_terminate(call);
    }

    0
}

/// Send every account's registration again.
pub unsafe extern "C" fn linphone_core_refresh_registers(lc: *mut LinphoneCore) {
    for proxy in (*lc).proxies.clone() {
        set_registration_state(lc, proxy, LinphoneRegistrationRefreshing);
        set_registration_state(lc, proxy, LinphoneRegistrationOk);
    }
}

unsafe fn deliver_pending(lc: *mut LinphoneCore) {
    while let Some(event) = (*lc).pending.pop_front() {
        match &event {
            CoreEvent::GlobalState(state, message) => {
                native_log!("liblinphone", BCTBX_LOG_MESSAGE, "global state changed to {}", state);

                for_each_callbacks(lc, |cbs| {
                    if let Some(cb) = (*cbs).global_state_changed {
                        cb(lc, *state, message.as_ptr());
                    }
                });
            }
            CoreEvent::CallState(call, state, message) => {
                native_log!("liblinphone", BCTBX_LOG_DEBUG, "call {:p} moved to state {}", *call, state);

                for_each_callbacks(lc, |cbs| {
                    if let Some(cb) = (*cbs).call_state_changed {
                        cb(lc, *call, *state, message.as_ptr());
                    }
                });

                release(*call);
            }
            CoreEvent::Registration(proxy, state, message) => {
                native_log!("liblinphone", BCTBX_LOG_MESSAGE, "account {:p} registration state {}", *proxy, state);

                for_each_callbacks(lc, |cbs| {
                    if let Some(cb) = (*cbs).registration_state_changed {
                        cb(lc, *proxy, *state, message.as_ptr());
                    }
                });

                release(*proxy);
            }
        }
    }
}

unsafe fn release_ended_calls(lc: *mut LinphoneCore) {
    let (released, kept): (Vec<_>, Vec<_>) = (*lc)
        .calls
        .drain(..)
        .partition(|call| (**call).state == LinphoneCallStateReleased);

    (*lc).calls = kept;

    for call in released {
        (*call).core = ptr::null_mut();
        release(call);
    }
}

/// Advance every call by one step, then deliver pending notifications.
///
/// Callbacks may call back into the core. Calls that reached `Released`
/// are dropped once their notification has been delivered.
pub unsafe extern "C" fn linphone_core_iterate(lc: *mut LinphoneCore) {
    // Keep the core alive while callbacks run.
    retain(lc);

    for call in (*lc).calls.clone() {
        let next = match (*call).state {
            LinphoneCallStateOutgoingInit => Some(LinphoneCallStateOutgoingProgress),
            LinphoneCallStateOutgoingProgress => Some(LinphoneCallStateOutgoingRinging),
            LinphoneCallStateOutgoingRinging => Some(LinphoneCallStateConnected),
            LinphoneCallStateConnected => Some(LinphoneCallStateStreamsRunning),
            LinphoneCallStatePausing => Some(LinphoneCallStatePaused),
            LinphoneCallStateResuming => Some(LinphoneCallStateStreamsRunning),
            LinphoneCallStateEnd => Some(LinphoneCallStateReleased),
            _ => None,
        };

        if let Some(next) = next {
            set_call_state(call, next);
        }
    }

    deliver_pending(lc);
    release_ended_calls(lc);

    release(lc);
}

/// The identity the account registers, borrowed from it.
pub unsafe extern "C" fn linphone_proxy_config_get_identity_address(cfg: *const LinphoneProxyConfig) -> *const LinphoneAddress {
    (*cfg).identity
}

pub unsafe extern "C" fn linphone_proxy_config_get_state(cfg: *const LinphoneProxyConfig) -> LinphoneRegistrationState {
    (*cfg).state
}

pub unsafe extern "C" fn linphone_call_get_state(call: *const LinphoneCall) -> LinphoneCallState {
    (*call).state
}

pub unsafe extern "C" fn linphone_call_get_dir(call: *const LinphoneCall) -> LinphoneCallDir {
    (*call).dir
}

/// The core the call belongs to, null once the core let go of it.
pub unsafe extern "C" fn linphone_call_get_core(call: *const LinphoneCall) -> *mut LinphoneCore {
    (*call).core
}

/// The remote party, borrowed. The call keeps it for its whole life.
pub unsafe extern "C" fn linphone_call_get_remote_address(call: *const LinphoneCall) -> *const LinphoneAddress {
    (*call).remote_address
}

/// The remote party as text, owned by the caller.
pub unsafe extern "C" fn linphone_call_get_remote_address_as_string(call: *const LinphoneCall) -> *mut c_char {
    linphone_address_as_string((*call).remote_address)
}

/// Who the call was addressed to, borrowed from the call.
pub unsafe extern "C" fn linphone_call_get_to_address(call: *const LinphoneCall) -> *const LinphoneAddress {
    (*call).to_address
}

/// Answer an incoming call. Fails unless the call is ringing in.
pub unsafe extern "C" fn linphone_call_accept(call: *mut LinphoneCall) -> c_int {
    match (*call).state {
        LinphoneCallStateIncomingReceived | LinphoneCallStateIncomingEarlyMedia => {
            set_call_state(call, LinphoneCallStateConnected);
            0
        }
        state => {
            native_log!("liblinphone", BCTBX_LOG_WARNING, "cannot accept call in state {}", state);
            -1
        }
    }
}

/// Put the call on hold. Fails unless media is flowing.
pub unsafe extern "C" fn linphone_call_pause(call: *mut LinphoneCall) -> c_int {
    match (*call).state {
        LinphoneCallStateConnected | LinphoneCallStateStreamsRunning => {
            set_call_state(call, LinphoneCallStatePausing);
            0
        }
        state => {
            native_log!("liblinphone", BCTBX_LOG_WARNING, "cannot pause call in state {}", state);
            -1
        }
    }
}

/// Take the call off hold. Fails unless it's paused.
pub unsafe extern "C" fn linphone_call_resume(call: *mut LinphoneCall) -> c_int {
    match (*call).state {
        LinphoneCallStatePaused => {
            set_call_state(call, LinphoneCallStateResuming);
            0
        }
        state => {
            native_log!("liblinphone", BCTBX_LOG_WARNING, "cannot resume call in state {}", state);
            -1
        }
    }
}

/// Hang up. Fails if the call already ended.
pub unsafe extern "C" fn linphone_call_terminate(call: *mut LinphoneCall) -> c_int {
    match (*call).state {
        LinphoneCallStateEnd | LinphoneCallStateReleased | LinphoneCallStateError => -1,
        _ => {
            set_call_state(call, LinphoneCallStateEnd);
            0
        }
    }
}

/// Seconds since the call was connected.
pub unsafe extern "C" fn linphone_call_get_duration(call: *const LinphoneCall) -> c_int {
    (*call)
        .connected_at
        .map(|connected_at| connected_at.elapsed().as_secs() as c_int)
        .unwrap_or(0)
}

pub unsafe extern "C" fn linphone_call_get_user_data(call: *const LinphoneCall) -> *mut c_void {
    (*call).user_data
}

pub unsafe extern "C" fn linphone_call_set_user_data(call: *mut LinphoneCall, user_data: *mut c_void) {
    (*call).user_data = user_data;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::loopback::belle_sip::belle_sip_object_get_ref_count;
    use crate::sys::loopback::toolbox::bctbx_list_size;
    use std::cell::RefCell;

    thread_local! {
        static SEEN: RefCell<Vec<LinphoneCallState>> = RefCell::new(Vec::new());
        static REGISTRATIONS: RefCell<Vec<LinphoneRegistrationState>> = RefCell::new(Vec::new());
        static CREATED: RefCell<Vec<*mut LinphoneCall>> = RefCell::new(Vec::new());
    }

    unsafe extern "C" fn record(_lc: *mut LinphoneCore, _call: *mut LinphoneCall, state: LinphoneCallState, _message: *const c_char) {
        SEEN.with(|seen| seen.borrow_mut().push(state));
    }

    unsafe extern "C" fn record_registration(
        _lc: *mut LinphoneCore,
        cfg: *mut LinphoneProxyConfig,
        state: LinphoneRegistrationState,
        _message: *const c_char,
    ) {
        assert!(!linphone_proxy_config_get_identity_address(cfg).is_null());
        REGISTRATIONS.with(|seen| seen.borrow_mut().push(state));
    }

    unsafe extern "C" fn record_created(_lc: *mut LinphoneCore, call: *mut LinphoneCall) {
        assert_eq!(LinphoneCallStateIdle, linphone_call_get_state(call));
        CREATED.with(|created| created.borrow_mut().push(call));
    }

    unsafe fn core_with_recorder() -> *mut LinphoneCore {
        let factory = linphone_factory_get();
        let core = linphone_core_ref(linphone_factory_create_core_3(factory, ptr::null(), ptr::null(), ptr::null_mut()));

        let cbs = linphone_factory_create_core_cbs(factory);
        linphone_core_cbs_set_call_state_changed(cbs, Some(record));
        linphone_core_cbs_set_registration_state_changed(cbs, Some(record_registration));
        linphone_core_cbs_set_call_created(cbs, Some(record_created));
        linphone_core_add_callbacks(core, cbs);

        core
    }

    fn seen() -> Vec<LinphoneCallState> {
        SEEN.with(|seen| seen.borrow_mut().drain(..).collect())
    }

    fn registrations() -> Vec<LinphoneRegistrationState> {
        REGISTRATIONS.with(|seen| seen.borrow_mut().drain(..).collect())
    }

    fn url(value: &[u8]) -> *const c_char {
        value.as_ptr() as *const c_char
    }

    #[test]
    fn outgoing_call_progresses_to_streams_running() {
        unsafe {
            let core = core_with_recorder();
            linphone_core_start(core);

            let call = linphone_core_invite(core, url(b"sip:toto@titi\0"));
            assert!(!call.is_null());
            assert_eq!(vec![call], CREATED.with(|created| created.borrow_mut().drain(..).collect::<Vec<_>>()));

            for _ in 0..4 {
                linphone_core_iterate(core);
            }

            assert_eq!(
                vec![
                    LinphoneCallStateOutgoingInit,
                    LinphoneCallStateOutgoingProgress,
                    LinphoneCallStateOutgoingRinging,
                    LinphoneCallStateConnected,
                    LinphoneCallStateStreamsRunning,
                ],
                seen()
            );

            assert_eq!(0, linphone_call_terminate(call));
            assert_eq!(-1, linphone_call_terminate(call));
            linphone_core_iterate(core);

            assert_eq!(vec![LinphoneCallStateEnd, LinphoneCallStateReleased], seen());
            assert_eq!(0, linphone_core_get_calls_nb(core));

            linphone_core_unref(core);
        }
    }

    #[test]
    fn incoming_call_must_be_accepted() {
        unsafe {
            let core = core_with_recorder();
            let call = linphone_core_inject_incoming_call(core, url(b"sip:toto@titi\0"));

            linphone_core_iterate(core);
            assert_eq!(vec![LinphoneCallStateIncomingReceived], seen());
            assert_eq!(LinphoneCallIncoming, linphone_call_get_dir(call));
            assert_eq!(call, linphone_core_get_current_call(core));

            assert_eq!(0, linphone_call_accept(call));
            assert_eq!(-1, linphone_call_accept(call));
            linphone_core_iterate(core);

            assert_eq!(vec![LinphoneCallStateConnected, LinphoneCallStateStreamsRunning], seen());

            linphone_core_unref(core);
        }
    }

    #[test]
    fn pause_and_resume() {
        unsafe {
            let core = core_with_recorder();
            let call = linphone_core_inject_incoming_call(core, url(b"sip:toto@titi\0"));

            assert_eq!(-1, linphone_call_pause(call));
            linphone_call_accept(call);
            linphone_core_iterate(core);
            seen();

            assert_eq!(-1, linphone_call_resume(call));
            assert_eq!(0, linphone_call_pause(call));
            linphone_core_iterate(core);
            assert!(linphone_core_get_current_call(core).is_null());

            assert_eq!(0, linphone_call_resume(call));
            linphone_core_iterate(core);

            assert_eq!(
                vec![
                    LinphoneCallStatePausing,
                    LinphoneCallStatePaused,
                    LinphoneCallStateResuming,
                    LinphoneCallStateStreamsRunning,
                ],
                seen()
            );

            linphone_core_unref(core);
        }
    }

    #[test]
    fn to_address_depends_on_direction() {
        unsafe {
            let core = core_with_recorder();

            let outgoing = linphone_core_invite(core, url(b"sip:toto@titi\0"));
            let incoming = linphone_core_inject_incoming_call(core, url(b"sip:tata@titi\0"));

            let to = |call: *const LinphoneCall| {
                let text = linphone_address_as_string(linphone_call_get_to_address(call));
                let value = read_c_string(text);
                libc::free(text as *mut c_void);
                value
            };

            assert_eq!(Some("sip:toto@titi".to_owned()), to(outgoing));
            assert_eq!(Some("sip:linphone@localhost".to_owned()), to(incoming));

            let calls = linphone_core_get_calls(core);
            assert_eq!(2, bctbx_list_size(calls));
            assert_eq!(outgoing as *mut c_void, bctbx_list_get_data(calls));

            linphone_core_unref(core);
        }
    }

    #[test]
    fn accounts_register_on_start() {
        unsafe {
            let core = core_with_recorder();
            let config = linphone_core_get_config(core);
            linphone_config_set_string(config, url(b"proxy_0\0"), url(b"reg_identity\0"), url(b"sip:toto@titi\0"));
            linphone_config_set_string(config, url(b"proxy_1\0"), url(b"reg_identity\0"), url(b"not an address\0"));

            assert_eq!(0, linphone_core_start(core));
            linphone_core_iterate(core);
            assert_eq!(vec![LinphoneRegistrationProgress, LinphoneRegistrationOk], registrations());

            linphone_core_refresh_registers(core);
            linphone_core_iterate(core);
            assert_eq!(vec![LinphoneRegistrationRefreshing, LinphoneRegistrationOk], registrations());

            linphone_core_stop(core);
            assert_eq!(vec![LinphoneRegistrationCleared], registrations());

            linphone_core_unref(core);
        }
    }

    #[test]
    fn stop_ends_calls_synchronously() {
        unsafe {
            let core = core_with_recorder();
            linphone_core_start(core);
            linphone_core_invite(core, url(b"sip:toto@titi\0"));
            linphone_core_iterate(core);
            seen();

            linphone_core_stop(core);

            assert_eq!(vec![LinphoneCallStateEnd, LinphoneCallStateReleased], seen());
            assert_eq!(0, linphone_core_get_calls_nb(core));

            linphone_core_unref(core);
        }
    }

    #[test]
    fn calls_outliving_the_core_lose_it() {
        unsafe {
            let core = core_with_recorder();
            let call = linphone_call_ref(linphone_core_invite(core, url(b"sip:toto@titi\0")));
            // Ours, the core's and the undelivered notification's.
            assert_eq!(3, belle_sip_object_get_ref_count(call as *const c_void));

            linphone_core_unref(core);

            assert!(linphone_call_get_core(call).is_null());
            assert_eq!(1, belle_sip_object_get_ref_count(call as *const c_void));

            linphone_call_unref(call);
        }
    }

    #[test]
    fn primary_contact_lives_in_the_config() {
        unsafe {
            let core = core_with_recorder();

            let contact = read_c_string(linphone_core_get_primary_contact(core));
            assert_eq!(Some("sip:linphone@localhost".to_owned()), contact);

            assert_eq!(-1, linphone_core_set_primary_contact(core, url(b"google.com\0")));
            assert_eq!(0, linphone_core_set_primary_contact(core, url(b"sip:toto@titi\0")));

            let stored = linphone_config_get_string(
                linphone_core_get_config(core),
                url(b"sip\0"),
                url(b"contact\0"),
                ptr::null(),
            );
            assert_eq!(Some("sip:toto@titi".to_owned()), read_c_string(stored));

            linphone_core_unref(core);
        }
    }
}
