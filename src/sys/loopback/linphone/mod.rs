/*!
liblinphone: the factory singleton, cores, calls, addresses and configuration.

Cores never touch the network. Calls advance one state per
`linphone_core_iterate`, registrations succeed as soon as they're sent, and
incoming calls are injected with `linphone_core_inject_incoming_call`.
*/

mod address;
mod config;
mod session;

pub use self::address::*;
pub use self::config::*;
pub use self::session::*;

use super::belle_sip::{
    belle_sip_object_ref, belle_sip_object_t, belle_sip_object_unref, belle_sip_object_vptr_t,
    object_destroy, object_marshal_type_name, object_new, object_not_clonable,
};
use super::log::{native_log, BCTBX_LOG_MESSAGE};
use crate::sys::linphone::*;
use libc::{c_char, c_int, c_void};
use lazy_static::lazy_static;
use std::sync::Mutex;

macro_rules! linphone_refcounting {
    ($($raw:ty => $ref_fn:ident, $unref_fn:ident;)*) => {
        $(
            pub unsafe extern "C" fn $ref_fn(obj: *mut $raw) -> *mut $raw {
                $crate::sys::loopback::belle_sip::belle_sip_object_ref(obj as *mut libc::c_void) as *mut $raw
            }

            pub unsafe extern "C" fn $unref_fn(obj: *mut $raw) {
                $crate::sys::loopback::belle_sip::belle_sip_object_unref(obj as *mut libc::c_void)
            }
        )*
    };
}

pub(crate) use linphone_refcounting;

#[repr(C)]
pub struct LinphoneFactory {
    base: belle_sip_object_t,
}

static FACTORY_VPTR: belle_sip_object_vptr_t = belle_sip_object_vptr_t {
    type_name: "LinphoneFactory",
    clone: object_not_clonable,
    marshal: object_marshal_type_name,
    destroy: object_destroy::<LinphoneFactory>,
};

lazy_static! {
    // The address of the singleton, zero when there's none.
    static ref FACTORY: Mutex<usize> = Mutex::new(0);
}

linphone_refcounting! {
    LinphoneFactory => linphone_factory_ref, linphone_factory_unref;
}

/// The factory singleton, created on first use.
///
/// The pointer is borrowed, the singleton holds its own reference until
/// `linphone_factory_clean`.
pub unsafe extern "C" fn linphone_factory_get() -> *mut LinphoneFactory {
    let mut factory = FACTORY.lock().unwrap_or_else(|e| e.into_inner());

    if *factory == 0 {
        let created = object_new(LinphoneFactory {
            base: belle_sip_object_t::new(&FACTORY_VPTR),
        });

        belle_sip_object_ref(created as *mut c_void);
        *factory = created as usize;

        native_log!("liblinphone", BCTBX_LOG_MESSAGE, "factory created");
    }

    *factory as *mut LinphoneFactory
}

/// Drop the singleton's own reference. The next `linphone_factory_get` makes a new one.
pub unsafe extern "C" fn linphone_factory_clean() {
    let mut factory = FACTORY.lock().unwrap_or_else(|e| e.into_inner());

    if *factory != 0 {
        belle_sip_object_unref(*factory as *mut c_void);
        *factory = 0;

        native_log!("liblinphone", BCTBX_LOG_MESSAGE, "factory cleaned");
    }
}

/// Parse an ini document into a new floating configuration.
pub unsafe extern "C" fn linphone_factory_create_config_from_string(
    _factory: *mut LinphoneFactory,
    data: *const c_char,
) -> *mut LinphoneConfig {
    linphone_config_new_from_buffer(data)
}

pub(crate) unsafe fn retain<T>(obj: *mut T) -> *mut T {
    belle_sip_object_ref(obj as *mut c_void) as *mut T
}

pub(crate) unsafe fn release<T>(obj: *mut T) {
    belle_sip_object_unref(obj as *mut c_void)
}

pub(crate) fn status(ok: bool) -> c_int {
    if ok {
        0
    } else {
        -1
    }
}
