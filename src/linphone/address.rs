use crate::error::Result;
use crate::interop::cow::{self, CopyOnWrite, ReferenceConvertible};
use crate::interop::status::Status;
use crate::interop::string;
use crate::linphone::Transport;
use crate::sip::{belle_sip_ref_counted, BelledonneObject, ObjectReference};
use crate::sys::belle_sip::{as_object, belle_sip_object_t};
use crate::sys::linphone::*;
use crate::sys::{to_bool_t, FALSE};
use crate::{unsafe_block, unsafe_fn};
use libc::{c_char, c_int};
use std::fmt;

belle_sip_ref_counted! {
    LinphoneAddress => linphone_address_ref, linphone_address_unref;
}

/**
A SIP address: an optional display name, a SIP URI, and headers.

Copies share the native address until one of them is mutated.

```ignore
let mut address = Address::parse("sip:toto@titi").unwrap();
address.set_port(Some(8080))?;
assert_eq!("sip:toto@titi:8080", address.to_string());
```
 */
#[derive(Clone)]
pub struct Address {
    internal: CopyOnWrite<ObjectReference<LinphoneAddress>>,
}

impl ReferenceConvertible for Address {
    type Reference = ObjectReference<LinphoneAddress>;

    fn internal_reference(&self) -> &CopyOnWrite<Self::Reference> {
        &self.internal
    }

    fn internal_reference_mut(&mut self) -> &mut CopyOnWrite<Self::Reference> {
        &mut self.internal
    }

    fn from_internal_reference(internal: CopyOnWrite<Self::Reference>) -> Self {
        Address { internal }
    }
}

type Getter = unsafe extern "C" fn(*const LinphoneAddress) -> *const c_char;
type Setter = unsafe extern "C" fn(*mut LinphoneAddress, *const c_char) -> c_int;

impl Address {
    /// Parse an address, `None` if it isn't a valid SIP address.
    pub fn parse(address: &str) -> Option<Self> {
        let address = string::to_c_string(address).ok()?;

        unsafe_block!("A parsed address is floating and nobody else references it" => {
            cow::owned_value(linphone_address_new(address.as_ptr()))
        })
    }

    unsafe_fn!("`ptr` must be null or point to a live address owned by another object" =>
    pub(crate) fn from_retained(ptr: *mut LinphoneAddress) -> Option<Self> {
        cow::retained_value(ptr)
    });

    unsafe_fn!("`ptr` must be null or point to a new floating address" =>
    pub(crate) fn from_owned(ptr: *mut LinphoneAddress) -> Option<Self> {
        cow::owned_value(ptr)
    });

    pub(crate) fn as_ptr(&self) -> *mut LinphoneAddress {
        self.internal.as_ptr()
    }

    fn get(&self, getter: Getter) -> Option<String> {
        unsafe_block!("The getter returns a string borrowed from the live address" => {
            string::from_borrowed(getter(self.internal.as_ptr()))
        })
    }

    fn set(&mut self, setter: Setter, call: &'static str, value: Option<&str>) -> Result<()> {
        let value = string::to_optional_c_string(value)?;

        let code = unsafe_block!("The address is ours after any copy, and the setter copies the string" => {
            setter(self.internal.as_mut_ptr(), string::as_ptr_or_null(&value))
        });

        Status::from_raw(code).into_result(call)
    }

    /// `sip` or `sips`.
    pub fn scheme(&self) -> String {
        self.get(linphone_address_get_scheme).unwrap_or_default()
    }

    pub fn display_name(&self) -> Option<String> {
        self.get(linphone_address_get_display_name)
    }

    pub fn set_display_name(&mut self, display_name: Option<&str>) -> Result<()> {
        self.set(linphone_address_set_display_name, "linphone_address_set_display_name", display_name)
    }

    pub fn username(&self) -> Option<String> {
        self.get(linphone_address_get_username)
    }

    pub fn set_username(&mut self, username: Option<&str>) -> Result<()> {
        self.set(linphone_address_set_username, "linphone_address_set_username", username)
    }

    pub fn password(&self) -> Option<String> {
        self.get(linphone_address_get_password)
    }

    pub fn set_password(&mut self, password: Option<&str>) -> Result<()> {
        let password = string::to_optional_c_string(password)?;

        unsafe_block!("The address is ours after any copy, and the setter copies the string" => {
            linphone_address_set_password(self.internal.as_mut_ptr(), string::as_ptr_or_null(&password))
        });

        Ok(())
    }

    pub fn domain(&self) -> Option<String> {
        self.get(linphone_address_get_domain)
    }

    /// Fails if `domain` is empty.
    pub fn set_domain(&mut self, domain: &str) -> Result<()> {
        self.set(linphone_address_set_domain, "linphone_address_set_domain", Some(domain))
    }

    pub fn port(&self) -> Option<u16> {
        let port = unsafe_block!("The address is live" => linphone_address_get_port(self.internal.as_ptr()));

        match port {
            0 => None,
            port => u16::try_from(port).ok(),
        }
    }

    pub fn set_port(&mut self, port: Option<u16>) -> Result<()> {
        let port = port.map_or(0, c_int::from);

        let code = unsafe_block!("The address is ours after any copy" => {
            linphone_address_set_port(self.internal.as_mut_ptr(), port)
        });

        Status::from_raw(code).into_result("linphone_address_set_port")
    }

    pub fn transport(&self) -> Transport {
        let raw = unsafe_block!("The address is live" => linphone_address_get_transport(self.internal.as_ptr()));
        Transport::from_raw(raw).unwrap_or(Transport::Udp)
    }

    pub fn set_transport(&mut self, transport: Transport) -> Result<()> {
        let code = unsafe_block!("The address is ours after any copy" => {
            linphone_address_set_transport(self.internal.as_mut_ptr(), transport.raw())
        });

        Status::from_raw(code).into_result("linphone_address_set_transport")
    }

    /// Whether the address uses `sips`.
    pub fn is_secure(&self) -> bool {
        unsafe_block!("The address is live" => linphone_address_get_secure(self.internal.as_ptr())) != FALSE
    }

    pub fn set_secure(&mut self, secure: bool) {
        unsafe_block!("The address is ours after any copy" => {
            linphone_address_set_secure(self.internal.as_mut_ptr(), to_bool_t(secure))
        })
    }

    pub fn has_uri_param(&self, name: &str) -> bool {
        let Ok(name) = string::to_c_string(name) else {
            return false;
        };

        unsafe_block!("The address is live" => linphone_address_has_uri_param(self.internal.as_ptr(), name.as_ptr())) != FALSE
    }

    /// The value of a URI parameter, `None` if it's absent or has no value.
    pub fn uri_param(&self, name: &str) -> Option<String> {
        let name = string::to_c_string(name).ok()?;

        unsafe_block!("The value is borrowed from the live address" => {
            string::from_borrowed(linphone_address_get_uri_param(self.internal.as_ptr(), name.as_ptr()))
        })
    }

    pub fn set_uri_param(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let name = string::to_c_string(name)?;
        let value = string::to_optional_c_string(value)?;

        unsafe_block!("The address is ours after any copy, and the strings are copied" => {
            linphone_address_set_uri_param(self.internal.as_mut_ptr(), name.as_ptr(), string::as_ptr_or_null(&value))
        });

        Ok(())
    }

    pub fn remove_uri_param(&mut self, name: &str) -> Result<()> {
        let name = string::to_c_string(name)?;

        unsafe_block!("The address is ours after any copy" => {
            linphone_address_remove_uri_param(self.internal.as_mut_ptr(), name.as_ptr())
        });

        Ok(())
    }

    pub fn header(&self, name: &str) -> Option<String> {
        let name = string::to_c_string(name).ok()?;

        unsafe_block!("The value is borrowed from the live address" => {
            string::from_borrowed(linphone_address_get_header(self.internal.as_ptr(), name.as_ptr()))
        })
    }

    /// Set a header, or remove it with `None`.
    pub fn set_header(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let name = string::to_c_string(name)?;
        let value = string::to_optional_c_string(value)?;

        unsafe_block!("The address is ours after any copy, and the strings are copied" => {
            linphone_address_set_header(self.internal.as_mut_ptr(), name.as_ptr(), string::as_ptr_or_null(&value))
        });

        Ok(())
    }

    /// Remove the tag parameter and every header, leaving what a user should see.
    pub fn clean(&mut self) {
        unsafe_block!("The address is ours after any copy" => linphone_address_clean(self.internal.as_mut_ptr()))
    }

    /// The SIP URI alone, without display name or headers.
    pub fn uri_only(&self) -> String {
        unsafe_block!("The buffer is allocated for us" => {
            string::from_owned(linphone_address_as_string_uri_only(self.internal.as_ptr()))
        })
        .unwrap_or_default()
    }

    /// Whether both addresses name the same user on the same host and port,
    /// whatever their parameters.
    pub fn weak_equal(&self, other: &Address) -> bool {
        unsafe_block!("Both addresses are live" => {
            linphone_address_weak_equal(self.internal.as_ptr(), other.internal.as_ptr())
        }) != FALSE
    }
}

impl BelledonneObject for Address {
    fn object_ptr(&self) -> *const belle_sip_object_t {
        as_object(self.internal.as_ptr())
    }
}

/// Addresses are equal when their URIs are, display names aside.
impl PartialEq for Address {
    fn eq(&self, other: &Address) -> bool {
        CopyOnWrite::ptr_eq(&self.internal, &other.internal)
            || unsafe_block!("Both addresses are live" => {
                linphone_address_equal(self.internal.as_ptr(), other.internal.as_ptr())
            }) != FALSE
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = unsafe_block!("The buffer is allocated for us" => {
            string::from_owned(linphone_address_as_string(self.internal.as_ptr()))
        });

        f.write_str(&text.unwrap_or_default())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Address")
            .field("address", &self.to_string())
            .field("internal", &self.internal)
            .finish()
    }
}
