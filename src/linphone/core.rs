use crate::error::{Error, Result};
use crate::interop::cow::{ManagedReference, Provenance, ReferenceConvertible};
use crate::interop::handle::{Handle, Managed};
use crate::interop::status::{catch_callback, Status};
use crate::interop::string;
use crate::interop::user_data::{UserData, UserDataSlot};
use crate::linphone::{Address, Call, CallState, Config, Factory, GlobalState, RegistrationState};
use crate::sip::{belle_sip_ref_counted, BelledonneObject, ObjectReference};
use crate::sys::belle_sip::{as_object, belle_sip_object_t};
use crate::sys::linphone::*;
use crate::sys::toolbox::{bctbx_list_get_data, bctbx_list_next};
use crate::{unsafe_block, unsafe_impl};
use libc::{c_char, c_void};
use std::cell::RefCell;
use std::ffi::CString;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::ptr;

belle_sip_ref_counted! {
    LinphoneCore => linphone_core_ref, linphone_core_unref;
    LinphoneCoreCbs => linphone_core_cbs_ref, linphone_core_cbs_unref;
}

unsafe_impl!("The core hands back exactly what was last stored" =>
impl UserDataSlot for LinphoneCore {
    const TYPE_NAME: &'static str = "LinphoneCore";

    unsafe fn user_data(raw: *mut Self) -> *mut c_void {
        linphone_core_get_user_data(raw)
    }

    unsafe fn set_user_data(raw: *mut Self, data: *mut c_void) {
        linphone_core_set_user_data(raw, data)
    }
});

type CallStateHandler = Box<dyn FnMut(&Call, CallState, &str)>;
type GlobalStateHandler = Box<dyn FnMut(GlobalState, &str)>;
type RegistrationStateHandler = Box<dyn FnMut(Option<&Address>, RegistrationState, &str)>;
type CallCreatedHandler = Box<dyn FnMut(&Call)>;

/// The Rust side of a core, found by the trampolines through the user-data slot.
#[derive(Default)]
struct CoreContext {
    call_state_changed: RefCell<Vec<CallStateHandler>>,
    global_state_changed: RefCell<Vec<GlobalStateHandler>>,
    registration_state_changed: RefCell<Vec<RegistrationStateHandler>>,
    call_created: RefCell<Vec<CallCreatedHandler>>,
}

unsafe extern "C" fn call_state_changed(
    lc: *mut LinphoneCore,
    call: *mut LinphoneCall,
    state: LinphoneCallState,
    message: *const c_char,
) {
    catch_callback(
        "call_state_changed",
        (),
        AssertUnwindSafe(|| {
            let context = unsafe_block!("The slot only ever holds a `CoreContext`" => {
                UserData::<LinphoneCore, CoreContext>::recover(lc)
            });
            let Some(context) = context else {
                return;
            };

            let call = unsafe_block!("The core passes a live call" => Call::from_raw(call));
            let (Some(call), Some(state)) = (call, CallState::from_raw(state)) else {
                tracing::warn!(state, "ignoring call state notification");
                return;
            };

            let message = unsafe_block!("The message is borrowed for the duration of the callback" => {
                string::from_borrowed(message)
            })
            .unwrap_or_default();

            match context.call_state_changed.try_borrow_mut() {
                Ok(mut handlers) => {
                    for handler in handlers.iter_mut() {
                        handler(&call, state, &message);
                    }
                }
                Err(_) => tracing::warn!(?state, "call state handlers are busy, dropping a reentrant notification"),
            }
        }),
    )
}

unsafe extern "C" fn global_state_changed(lc: *mut LinphoneCore, state: LinphoneGlobalState, message: *const c_char) {
    catch_callback(
        "global_state_changed",
        (),
        AssertUnwindSafe(|| {
            let context = unsafe_block!("The slot only ever holds a `CoreContext`" => {
                UserData::<LinphoneCore, CoreContext>::recover(lc)
            });
            let Some(context) = context else {
                return;
            };

            let Some(state) = GlobalState::from_raw(state) else {
                tracing::warn!(state, "ignoring unknown global state");
                return;
            };

            let message = unsafe_block!("The message is borrowed for the duration of the callback" => {
                string::from_borrowed(message)
            })
            .unwrap_or_default();

            match context.global_state_changed.try_borrow_mut() {
                Ok(mut handlers) => {
                    for handler in handlers.iter_mut() {
                        handler(state, &message);
                    }
                }
                Err(_) => tracing::warn!(?state, "global state handlers are busy, dropping a reentrant notification"),
            }
        }),
    )
}

unsafe extern "C" fn registration_state_changed(
    lc: *mut LinphoneCore,
    cfg: *mut LinphoneProxyConfig,
    state: LinphoneRegistrationState,
    message: *const c_char,
) {
    catch_callback(
        "registration_state_changed",
        (),
        AssertUnwindSafe(|| {
            let context = unsafe_block!("The slot only ever holds a `CoreContext`" => {
                UserData::<LinphoneCore, CoreContext>::recover(lc)
            });
            let Some(context) = context else {
                return;
            };

            let Some(state) = RegistrationState::from_raw(state) else {
                tracing::warn!(state, "ignoring unknown registration state");
                return;
            };

            let identity = if cfg.is_null() {
                None
            } else {
                unsafe_block!("The identity belongs to the account, which outlives the callback" => {
                    Address::from_retained(linphone_proxy_config_get_identity_address(cfg) as *mut _)
                })
            };

            let message = unsafe_block!("The message is borrowed for the duration of the callback" => {
                string::from_borrowed(message)
            })
            .unwrap_or_default();

            match context.registration_state_changed.try_borrow_mut() {
                Ok(mut handlers) => {
                    for handler in handlers.iter_mut() {
                        handler(identity.as_ref(), state, &message);
                    }
                }
                Err(_) => tracing::warn!(?state, "registration handlers are busy, dropping a reentrant notification"),
            }
        }),
    )
}

unsafe extern "C" fn call_created(lc: *mut LinphoneCore, call: *mut LinphoneCall) {
    catch_callback(
        "call_created",
        (),
        AssertUnwindSafe(|| {
            let context = unsafe_block!("The slot only ever holds a `CoreContext`" => {
                UserData::<LinphoneCore, CoreContext>::recover(lc)
            });
            let Some(context) = context else {
                return;
            };

            let Some(call) = unsafe_block!("The core passes a live call" => Call::from_raw(call)) else {
                return;
            };

            match context.call_created.try_borrow_mut() {
                Ok(mut handlers) => {
                    for handler in handlers.iter_mut() {
                        handler(&call);
                    }
                }
                Err(_) => tracing::warn!("call created handlers are busy, dropping a reentrant notification"),
            }
        }),
    )
}

/**
Options for creating a `Core`.

```ignore
let core = Factory::shared()
    .core_builder()
    .config_path("linphonerc")
    .primary_contact(Address::parse("sip:toto@titi").unwrap())
    .build()?;
```
 */
pub struct CoreBuilder<'f> {
    factory: &'f Factory,
    config_path: Option<PathBuf>,
    factory_config_path: Option<PathBuf>,
    primary_contact: Option<Address>,
}

impl<'f> CoreBuilder<'f> {
    pub fn new(factory: &'f Factory) -> Self {
        CoreBuilder {
            factory,
            config_path: None,
            factory_config_path: None,
            primary_contact: None,
        }
    }

    /// The user configuration, read if it exists and written by `Config::sync`.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_owned());
        self
    }

    /// Read-only defaults, read before the user configuration.
    pub fn factory_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.factory_config_path = Some(path.as_ref().to_owned());
        self
    }

    pub fn primary_contact(mut self, contact: Address) -> Self {
        self.primary_contact = Some(contact);
        self
    }

    /// Create and start the core. Fails if a configuration file is malformed.
    pub fn build(self) -> Result<Core> {
        let to_c_string = |path: &Option<PathBuf>| {
            path.as_ref()
                .map(|path| string::to_c_string(&path.to_string_lossy()))
                .transpose()
        };

        let config_path: Option<CString> = to_c_string(&self.config_path)?;
        let factory_config_path: Option<CString> = to_c_string(&self.factory_config_path)?;

        let raw = unsafe_block!("The factory is live and the paths are valid C strings or null" => {
            linphone_factory_create_core_3(
                self.factory.as_ptr(),
                string::as_ptr_or_null(&config_path),
                string::as_ptr_or_null(&factory_config_path),
                ptr::null_mut(),
            )
        });

        let managed = unsafe_block!("A new core is floating" => Managed::from_nullable(raw))
            .ok_or(Error::Construction { what: "LinphoneCore" })?;

        let callbacks = unsafe_block!("The factory never fails to create a callback table" => {
            Managed::new(linphone_factory_create_core_cbs(self.factory.as_ptr()))
        });

        unsafe_block!("The table is live and the trampolines match the native signatures" => {
            linphone_core_cbs_set_call_state_changed(callbacks.as_ptr(), Some(call_state_changed));
            linphone_core_cbs_set_global_state_changed(callbacks.as_ptr(), Some(global_state_changed));
            linphone_core_cbs_set_registration_state_changed(callbacks.as_ptr(), Some(registration_state_changed));
            linphone_core_cbs_set_call_created(callbacks.as_ptr(), Some(call_created));
        });

        let bridge = unsafe_block!("The core outlives the bridge, see the field order of `Core`" => {
            UserData::attach(managed.unmanaged().as_non_null(), CoreContext::default())
        });

        unsafe_block!("Both objects are live, the core takes its own reference on the table" => {
            linphone_core_add_callbacks(managed.as_ptr(), callbacks.as_ptr())
        });

        let core = Core {
            bridge,
            callbacks,
            managed,
        };

        if let Some(contact) = &self.primary_contact {
            core.set_primary_contact(contact)?;
        }

        let code = unsafe_block!("The core is live and not started yet" => linphone_core_start(core.managed.as_ptr()));
        Status::from_raw(code).into_result("linphone_core_start")?;

        tracing::debug!(config = ?self.config_path, "started core");

        Ok(core)
    }
}

/**
The liblinphone engine: calls, configuration and the main loop.

Nothing happens unless `iterate` is called regularly. State changes are
delivered from inside `iterate`, except `on_call_created`, which runs as soon
as the call exists. Dropping the core stops it, ending every call.
 */
pub struct Core {
    // Declared first so the slot is cleared before the core is released.
    bridge: UserData<LinphoneCore, CoreContext>,
    callbacks: Managed<LinphoneCoreCbs>,
    managed: Managed<LinphoneCore>,
}

impl Core {
    /// The version of liblinphone.
    pub fn version() -> String {
        unsafe_block!("The version is a static string" => string::from_borrowed(linphone_core_get_version()))
            .unwrap_or_default()
    }

    /// Run the main loop once: advance calls and deliver notifications.
    pub fn iterate(&self) {
        unsafe_block!("The core is live" => linphone_core_iterate(self.managed.as_ptr()))
    }

    pub fn on_call_state_changed<F>(&mut self, handler: F)
    where
        F: FnMut(&Call, CallState, &str) + 'static,
    {
        self.bridge.get().call_state_changed.borrow_mut().push(Box::new(handler));
    }

    pub fn on_global_state_changed<F>(&mut self, handler: F)
    where
        F: FnMut(GlobalState, &str) + 'static,
    {
        self.bridge.get().global_state_changed.borrow_mut().push(Box::new(handler));
    }

    /// Notified for every account registration change, with the account's identity.
    pub fn on_registration_state_changed<F>(&mut self, handler: F)
    where
        F: FnMut(Option<&Address>, RegistrationState, &str) + 'static,
    {
        self.bridge.get().registration_state_changed.borrow_mut().push(Box::new(handler));
    }

    /// Notified when a call is created, placed or received, before its first state change.
    pub fn on_call_created<F>(&mut self, handler: F)
    where
        F: FnMut(&Call) + 'static,
    {
        self.bridge.get().call_created.borrow_mut().push(Box::new(handler));
    }

    /// Call `url`. `None` if it isn't a valid address.
    pub fn invite(&self, url: &str) -> Option<Call> {
        let url = string::to_c_string(url).ok()?;

        unsafe_block!("The call is borrowed from the core and we take our own reference" => {
            Call::from_raw(linphone_core_invite(self.managed.as_ptr(), url.as_ptr()))
        })
    }

    pub fn invite_address(&self, address: &Address) -> Option<Call> {
        unsafe_block!("The core copies the address, the call is borrowed from the core" => {
            Call::from_raw(linphone_core_invite_address(self.managed.as_ptr(), address.as_ptr()))
        })
    }

    /// Receive a call from `from` through the loopback transport.
    #[cfg(any(test, feature = "loopback"))]
    pub fn receive_call(&self, from: &str) -> Option<Call> {
        let from = string::to_c_string(from).ok()?;

        unsafe_block!("The call is borrowed from the core and we take our own reference" => {
            Call::from_raw(linphone_core_inject_incoming_call(self.managed.as_ptr(), from.as_ptr()))
        })
    }

    /// The most recent call that hasn't ended.
    pub fn current_call(&self) -> Option<Call> {
        unsafe_block!("The call is borrowed from the core and we take our own reference" => {
            Call::from_raw(linphone_core_get_current_call(self.managed.as_ptr()))
        })
    }

    /// Every call the core tracks, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        let mut calls = Vec::new();
        let mut node = unsafe_block!("The list is borrowed from the core" => linphone_core_get_calls(self.managed.as_ptr()));

        while !node.is_null() {
            unsafe_block!("The nodes hold live calls and we take our own references" => {
                calls.extend(Call::from_raw(bctbx_list_get_data(node) as *mut LinphoneCall));
                node = bctbx_list_next(node) as *const _;
            });
        }

        calls
    }

    pub fn calls_count(&self) -> usize {
        let count = unsafe_block!("The core is live" => linphone_core_get_calls_nb(self.managed.as_ptr()));
        usize::try_from(count).unwrap_or(0)
    }

    pub fn terminate_all_calls(&self) -> Result<()> {
        let code = unsafe_block!("The core is live" => linphone_core_terminate_all_calls(self.managed.as_ptr()));
        Status::from_raw(code).into_result("linphone_core_terminate_all_calls")
    }

    /// Register every account again.
    pub fn refresh_registers(&self) {
        unsafe_block!("The core is live" => linphone_core_refresh_registers(self.managed.as_ptr()))
    }

    /// The core's configuration.
    ///
    /// The core keeps using it, so the value is externally retained: changing
    /// it copies first and never affects the core.
    pub fn config(&self) -> Config {
        let managed = unsafe_block!("A core always has a configuration, we take our own reference" => {
            Managed::new(linphone_core_get_config(self.managed.as_ptr()))
        });

        Config::from_reference(ObjectReference::from_managed(managed), Provenance::ExternallyRetained)
    }

    /// The identity used for outgoing calls.
    pub fn primary_contact(&self) -> Option<String> {
        unsafe_block!("The contact is borrowed from the core's configuration" => {
            string::from_borrowed(linphone_core_get_primary_contact(self.managed.as_ptr()))
        })
    }

    pub fn set_primary_contact(&self, contact: &Address) -> Result<()> {
        let contact = string::to_c_string(&contact.to_string())?;

        let code = unsafe_block!("The core copies the contact" => {
            linphone_core_set_primary_contact(self.managed.as_ptr(), contact.as_ptr())
        });

        Status::from_raw(code).into_result("linphone_core_set_primary_contact")
    }

    /// The primary contact as a new address.
    pub fn create_primary_contact_address(&self) -> Option<Address> {
        unsafe_block!("The address is new and floating" => {
            Address::from_owned(linphone_core_create_primary_contact_parsed(self.managed.as_ptr()))
        })
    }

    pub fn ref_count(&self) -> Option<usize> {
        self.managed.ref_count()
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        unsafe_block!("Both objects are live until our fields are dropped" => {
            linphone_core_remove_callbacks(self.managed.as_ptr(), self.callbacks.as_ptr());
            linphone_core_stop(self.managed.as_ptr());
        });

        tracing::debug!(ptr = ?self.managed.as_ptr(), "dropping core");
    }
}

impl BelledonneObject for Core {
    fn object_ptr(&self) -> *const belle_sip_object_t {
        as_object(self.managed.as_ptr())
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Core")
            .field("ptr", &self.managed.as_ptr())
            .field("calls", &self.calls_count())
            .finish()
    }
}
