/*!
liblinphone: the factory singleton, cores, calls, addresses and configuration.

Every liblinphone object starts with a belle-sip object header, so the
`linphone_*_ref` and `linphone_*_unref` pairs share belle-sip's counting.
*/

use libc::{c_char, c_int};

pub type LinphoneStatus = c_int;

pub type LinphoneCallState = c_int;

pub const LinphoneCallStateIdle: LinphoneCallState = 0;
pub const LinphoneCallStateIncomingReceived: LinphoneCallState = 1;
pub const LinphoneCallStateOutgoingInit: LinphoneCallState = 2;
pub const LinphoneCallStateOutgoingProgress: LinphoneCallState = 3;
pub const LinphoneCallStateOutgoingRinging: LinphoneCallState = 4;
pub const LinphoneCallStateOutgoingEarlyMedia: LinphoneCallState = 5;
pub const LinphoneCallStateConnected: LinphoneCallState = 6;
pub const LinphoneCallStateStreamsRunning: LinphoneCallState = 7;
pub const LinphoneCallStatePausing: LinphoneCallState = 8;
pub const LinphoneCallStatePaused: LinphoneCallState = 9;
pub const LinphoneCallStateResuming: LinphoneCallState = 10;
pub const LinphoneCallStateReferred: LinphoneCallState = 11;
pub const LinphoneCallStateError: LinphoneCallState = 12;
pub const LinphoneCallStateEnd: LinphoneCallState = 13;
pub const LinphoneCallStatePausedByRemote: LinphoneCallState = 14;
pub const LinphoneCallStateUpdatedByRemote: LinphoneCallState = 15;
pub const LinphoneCallStateIncomingEarlyMedia: LinphoneCallState = 16;
pub const LinphoneCallStateUpdating: LinphoneCallState = 17;
pub const LinphoneCallStateReleased: LinphoneCallState = 18;
pub const LinphoneCallStateEarlyUpdatedByRemote: LinphoneCallState = 19;
pub const LinphoneCallStateEarlyUpdating: LinphoneCallState = 20;

pub type LinphoneGlobalState = c_int;

pub const LinphoneGlobalOff: LinphoneGlobalState = 0;
pub const LinphoneGlobalStartup: LinphoneGlobalState = 1;
pub const LinphoneGlobalOn: LinphoneGlobalState = 2;
pub const LinphoneGlobalShutdown: LinphoneGlobalState = 3;
pub const LinphoneGlobalConfiguring: LinphoneGlobalState = 4;

pub type LinphoneRegistrationState = c_int;

pub const LinphoneRegistrationNone: LinphoneRegistrationState = 0;
pub const LinphoneRegistrationProgress: LinphoneRegistrationState = 1;
pub const LinphoneRegistrationOk: LinphoneRegistrationState = 2;
pub const LinphoneRegistrationCleared: LinphoneRegistrationState = 3;
pub const LinphoneRegistrationFailed: LinphoneRegistrationState = 4;
pub const LinphoneRegistrationRefreshing: LinphoneRegistrationState = 5;

pub type LinphoneCallDir = c_int;

pub const LinphoneCallOutgoing: LinphoneCallDir = 0;
pub const LinphoneCallIncoming: LinphoneCallDir = 1;

pub type LinphoneTransportType = c_int;

pub const LinphoneTransportUdp: LinphoneTransportType = 0;
pub const LinphoneTransportTcp: LinphoneTransportType = 1;
pub const LinphoneTransportTls: LinphoneTransportType = 2;
pub const LinphoneTransportDtls: LinphoneTransportType = 3;

pub type LinphoneCoreCbsCallStateChangedCb = Option<
    unsafe extern "C" fn(lc: *mut LinphoneCore, call: *mut LinphoneCall, state: LinphoneCallState, message: *const c_char),
>;

pub type LinphoneCoreCbsGlobalStateChangedCb =
    Option<unsafe extern "C" fn(lc: *mut LinphoneCore, state: LinphoneGlobalState, message: *const c_char)>;

pub type LinphoneCoreCbsRegistrationStateChangedCb = Option<
    unsafe extern "C" fn(
        lc: *mut LinphoneCore,
        cfg: *mut LinphoneProxyConfig,
        state: LinphoneRegistrationState,
        message: *const c_char,
    ),
>;

pub type LinphoneCoreCbsCallCreatedCb = Option<unsafe extern "C" fn(lc: *mut LinphoneCore, call: *mut LinphoneCall)>;

#[cfg(not(any(test, feature = "loopback")))]
pub use self::native::*;

#[cfg(any(test, feature = "loopback"))]
pub use super::loopback::linphone::*;

#[cfg(not(any(test, feature = "loopback")))]
mod native {
    use super::*;
    use crate::sys::belle_sip::{belle_sip_object_ref, belle_sip_object_unref};
    use crate::sys::bool_t;
    use crate::sys::toolbox::bctbx_list_t;
    use libc::{c_char, c_float, c_int, c_void};

    crate::sys::opaque_types!(
        LinphoneFactory,
        LinphoneCore,
        LinphoneCoreCbs,
        LinphoneCall,
        LinphoneAddress,
        LinphoneConfig,
        LinphoneProxyConfig,
    );

    /// The factory has no reference counting of its own.
    pub unsafe fn linphone_factory_ref(factory: *mut LinphoneFactory) -> *mut LinphoneFactory {
        belle_sip_object_ref(factory as *mut c_void) as *mut LinphoneFactory
    }

    pub unsafe fn linphone_factory_unref(factory: *mut LinphoneFactory) {
        belle_sip_object_unref(factory as *mut c_void)
    }

    #[link(name = "linphone")]
    extern "C" {
        /// The factory singleton, created on first use. The pointer is borrowed.
        pub fn linphone_factory_get() -> *mut LinphoneFactory;
        /// Drop the singleton's own reference. The next `linphone_factory_get` makes a new one.
        pub fn linphone_factory_clean();
        pub fn linphone_factory_create_config_from_string(
            factory: *mut LinphoneFactory,
            data: *const c_char,
        ) -> *mut LinphoneConfig;
        pub fn linphone_factory_create_core_cbs(factory: *mut LinphoneFactory) -> *mut LinphoneCoreCbs;
        /// Create a floating core that isn't started yet. Null if a configuration file is malformed.
        pub fn linphone_factory_create_core_3(
            factory: *mut LinphoneFactory,
            config_path: *const c_char,
            factory_config_path: *const c_char,
            system_context: *mut c_void,
        ) -> *mut LinphoneCore;

        pub fn linphone_core_cbs_ref(cbs: *mut LinphoneCoreCbs) -> *mut LinphoneCoreCbs;
        pub fn linphone_core_cbs_unref(cbs: *mut LinphoneCoreCbs);
        pub fn linphone_core_cbs_set_call_state_changed(cbs: *mut LinphoneCoreCbs, cb: LinphoneCoreCbsCallStateChangedCb);
        pub fn linphone_core_cbs_set_global_state_changed(cbs: *mut LinphoneCoreCbs, cb: LinphoneCoreCbsGlobalStateChangedCb);
        pub fn linphone_core_cbs_set_registration_state_changed(
            cbs: *mut LinphoneCoreCbs,
            cb: LinphoneCoreCbsRegistrationStateChangedCb,
        );
        pub fn linphone_core_cbs_set_call_created(cbs: *mut LinphoneCoreCbs, cb: LinphoneCoreCbsCallCreatedCb);

        pub fn linphone_core_ref(lc: *mut LinphoneCore) -> *mut LinphoneCore;
        pub fn linphone_core_unref(lc: *mut LinphoneCore);
        pub fn linphone_core_start(lc: *mut LinphoneCore) -> LinphoneStatus;
        pub fn linphone_core_stop(lc: *mut LinphoneCore);
        pub fn linphone_core_get_version() -> *const c_char;
        pub fn linphone_core_add_callbacks(lc: *mut LinphoneCore, cbs: *mut LinphoneCoreCbs);
        pub fn linphone_core_remove_callbacks(lc: *mut LinphoneCore, cbs: *const LinphoneCoreCbs);
        pub fn linphone_core_get_user_data(lc: *const LinphoneCore) -> *mut c_void;
        pub fn linphone_core_set_user_data(lc: *mut LinphoneCore, user_data: *mut c_void);
        pub fn linphone_core_get_config(lc: *const LinphoneCore) -> *mut LinphoneConfig;
        pub fn linphone_core_get_primary_contact(lc: *const LinphoneCore) -> *const c_char;
        pub fn linphone_core_set_primary_contact(lc: *mut LinphoneCore, contact: *const c_char) -> LinphoneStatus;
        pub fn linphone_core_create_primary_contact_parsed(lc: *mut LinphoneCore) -> *mut LinphoneAddress;
        pub fn linphone_core_invite(lc: *mut LinphoneCore, url: *const c_char) -> *mut LinphoneCall;
        pub fn linphone_core_invite_address(lc: *mut LinphoneCore, addr: *const LinphoneAddress) -> *mut LinphoneCall;
        pub fn linphone_core_get_calls_nb(lc: *const LinphoneCore) -> c_int;
        /// The calls, borrowed from the core along with the list holding them.
        pub fn linphone_core_get_calls(lc: *mut LinphoneCore) -> *const bctbx_list_t;
        pub fn linphone_core_get_current_call(lc: *const LinphoneCore) -> *mut LinphoneCall;
        pub fn linphone_core_terminate_all_calls(lc: *mut LinphoneCore) -> LinphoneStatus;
        pub fn linphone_core_refresh_registers(lc: *mut LinphoneCore);
        pub fn linphone_core_iterate(lc: *mut LinphoneCore);

        pub fn linphone_proxy_config_get_identity_address(cfg: *const LinphoneProxyConfig) -> *const LinphoneAddress;

        pub fn linphone_call_ref(call: *mut LinphoneCall) -> *mut LinphoneCall;
        pub fn linphone_call_unref(call: *mut LinphoneCall);
        pub fn linphone_call_get_state(call: *const LinphoneCall) -> LinphoneCallState;
        pub fn linphone_call_get_dir(call: *const LinphoneCall) -> LinphoneCallDir;
        pub fn linphone_call_get_core(call: *const LinphoneCall) -> *mut LinphoneCore;
        pub fn linphone_call_get_remote_address(call: *const LinphoneCall) -> *const LinphoneAddress;
        pub fn linphone_call_get_remote_address_as_string(call: *const LinphoneCall) -> *mut c_char;
        pub fn linphone_call_get_to_address(call: *const LinphoneCall) -> *const LinphoneAddress;
        pub fn linphone_call_accept(call: *mut LinphoneCall) -> LinphoneStatus;
        pub fn linphone_call_pause(call: *mut LinphoneCall) -> LinphoneStatus;
        pub fn linphone_call_resume(call: *mut LinphoneCall) -> LinphoneStatus;
        pub fn linphone_call_terminate(call: *mut LinphoneCall) -> LinphoneStatus;
        pub fn linphone_call_get_duration(call: *const LinphoneCall) -> c_int;

        pub fn linphone_address_new(address: *const c_char) -> *mut LinphoneAddress;
        pub fn linphone_address_clone(address: *const LinphoneAddress) -> *mut LinphoneAddress;
        pub fn linphone_address_ref(address: *mut LinphoneAddress) -> *mut LinphoneAddress;
        pub fn linphone_address_unref(address: *mut LinphoneAddress);
        pub fn linphone_address_get_scheme(address: *const LinphoneAddress) -> *const c_char;
        pub fn linphone_address_get_display_name(address: *const LinphoneAddress) -> *const c_char;
        pub fn linphone_address_set_display_name(address: *mut LinphoneAddress, value: *const c_char) -> LinphoneStatus;
        pub fn linphone_address_get_username(address: *const LinphoneAddress) -> *const c_char;
        pub fn linphone_address_set_username(address: *mut LinphoneAddress, value: *const c_char) -> LinphoneStatus;
        pub fn linphone_address_get_password(address: *const LinphoneAddress) -> *const c_char;
        pub fn linphone_address_set_password(address: *mut LinphoneAddress, value: *const c_char);
        pub fn linphone_address_get_domain(address: *const LinphoneAddress) -> *const c_char;
        pub fn linphone_address_set_domain(address: *mut LinphoneAddress, domain: *const c_char) -> LinphoneStatus;
        pub fn linphone_address_get_port(address: *const LinphoneAddress) -> c_int;
        pub fn linphone_address_set_port(address: *mut LinphoneAddress, port: c_int) -> LinphoneStatus;
        pub fn linphone_address_get_transport(address: *const LinphoneAddress) -> LinphoneTransportType;
        pub fn linphone_address_set_transport(
            address: *mut LinphoneAddress,
            transport: LinphoneTransportType,
        ) -> LinphoneStatus;
        pub fn linphone_address_get_secure(address: *const LinphoneAddress) -> bool_t;
        pub fn linphone_address_set_secure(address: *mut LinphoneAddress, enabled: bool_t);
        pub fn linphone_address_has_uri_param(address: *const LinphoneAddress, name: *const c_char) -> bool_t;
        pub fn linphone_address_get_uri_param(address: *const LinphoneAddress, name: *const c_char) -> *const c_char;
        pub fn linphone_address_set_uri_param(address: *mut LinphoneAddress, name: *const c_char, value: *const c_char);
        pub fn linphone_address_remove_uri_param(address: *mut LinphoneAddress, name: *const c_char);
        pub fn linphone_address_get_header(address: *const LinphoneAddress, name: *const c_char) -> *const c_char;
        pub fn linphone_address_set_header(address: *mut LinphoneAddress, name: *const c_char, value: *const c_char);
        pub fn linphone_address_clean(address: *mut LinphoneAddress);
        pub fn linphone_address_as_string(address: *const LinphoneAddress) -> *mut c_char;
        pub fn linphone_address_as_string_uri_only(address: *const LinphoneAddress) -> *mut c_char;
        pub fn linphone_address_equal(a: *const LinphoneAddress, b: *const LinphoneAddress) -> bool_t;
        pub fn linphone_address_weak_equal(a: *const LinphoneAddress, b: *const LinphoneAddress) -> bool_t;

        pub fn linphone_config_new(filename: *const c_char) -> *mut LinphoneConfig;
        pub fn linphone_config_new_with_factory(
            filename: *const c_char,
            factory_filename: *const c_char,
        ) -> *mut LinphoneConfig;
        pub fn linphone_config_new_from_buffer(buffer: *const c_char) -> *mut LinphoneConfig;
        pub fn linphone_config_ref(config: *mut LinphoneConfig) -> *mut LinphoneConfig;
        pub fn linphone_config_unref(config: *mut LinphoneConfig);
        pub fn linphone_config_read_file(config: *mut LinphoneConfig, filename: *const c_char) -> LinphoneStatus;
        pub fn linphone_config_get_string(
            config: *const LinphoneConfig,
            section: *const c_char,
            key: *const c_char,
            default_string: *const c_char,
        ) -> *const c_char;
        pub fn linphone_config_get_int(
            config: *const LinphoneConfig,
            section: *const c_char,
            key: *const c_char,
            default_value: c_int,
        ) -> c_int;
        pub fn linphone_config_get_int64(
            config: *const LinphoneConfig,
            section: *const c_char,
            key: *const c_char,
            default_value: i64,
        ) -> i64;
        pub fn linphone_config_get_float(
            config: *const LinphoneConfig,
            section: *const c_char,
            key: *const c_char,
            default_value: c_float,
        ) -> c_float;
        pub fn linphone_config_set_string(
            config: *mut LinphoneConfig,
            section: *const c_char,
            key: *const c_char,
            value: *const c_char,
        );
        pub fn linphone_config_set_int(config: *mut LinphoneConfig, section: *const c_char, key: *const c_char, value: c_int);
        pub fn linphone_config_set_int64(config: *mut LinphoneConfig, section: *const c_char, key: *const c_char, value: i64);
        pub fn linphone_config_set_float(
            config: *mut LinphoneConfig,
            section: *const c_char,
            key: *const c_char,
            value: c_float,
        );
        pub fn linphone_config_has_section(config: *const LinphoneConfig, section: *const c_char) -> c_int;
        pub fn linphone_config_has_entry(config: *const LinphoneConfig, section: *const c_char, key: *const c_char) -> c_int;
        pub fn linphone_config_clean_section(config: *mut LinphoneConfig, section: *const c_char);
        pub fn linphone_config_clean_entry(config: *mut LinphoneConfig, section: *const c_char, key: *const c_char);
        pub fn linphone_config_dump(config: *const LinphoneConfig) -> *mut c_char;
        pub fn linphone_config_sync(config: *mut LinphoneConfig) -> LinphoneStatus;
        /// The section names. The list is the caller's, the strings are borrowed.
        pub fn linphone_config_get_sections_names_list(config: *const LinphoneConfig) -> *mut bctbx_list_t;
        pub fn linphone_config_get_keys_names_list(config: *const LinphoneConfig, section: *const c_char) -> *mut bctbx_list_t;
    }
}
