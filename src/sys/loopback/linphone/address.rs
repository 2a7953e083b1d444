use super::{linphone_refcounting, status, LinphoneTransportType};
use super::{LinphoneTransportDtls, LinphoneTransportTcp, LinphoneTransportTls, LinphoneTransportUdp};
use crate::sys::loopback::belle_sip::{
    as_object, belle_sip_object_t, belle_sip_object_vptr_t, object_destroy, object_new, split_host_port,
};
use crate::sys::loopback::log::{native_log, BCTBX_LOG_WARNING};
use crate::sys::loopback::{alloc_c_string, bool_t, borrow_c_string, c_string, copy_c_string, read_c_string, to_bool_t, FALSE};
use libc::{c_char, c_int};
use std::ffi::CString;
use std::fmt::Write;
use std::ptr;

/// A SIP address: an optional display name around a `sip:` or `sips:` URI.
#[repr(C)]
pub struct LinphoneAddress {
    base: belle_sip_object_t,
    display_name: Option<CString>,
    secure: bool,
    username: Option<CString>,
    password: Option<CString>,
    domain: Option<CString>,
    port: c_int,
    params: Vec<(CString, Option<CString>)>,
    headers: Vec<(CString, CString)>,
}

static ADDRESS_VPTR: belle_sip_object_vptr_t = belle_sip_object_vptr_t {
    type_name: "LinphoneAddress",
    clone: address_clone,
    marshal: address_marshal,
    destroy: object_destroy::<LinphoneAddress>,
};

impl LinphoneAddress {
    fn empty() -> Self {
        LinphoneAddress {
            base: belle_sip_object_t::new(&ADDRESS_VPTR),
            display_name: None,
            secure: false,
            username: None,
            password: None,
            domain: None,
            port: 0,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        let mut address = LinphoneAddress::empty();

        let uri = match input.find('<') {
            Some(open) => {
                let (display, rest) = input.split_at(open);
                let (uri, trailer) = rest[1..].split_once('>')?;

                if !trailer.trim().is_empty() {
                    return None;
                }

                let display = display.trim().trim_matches('"');
                if !display.is_empty() {
                    address.display_name = Some(CString::new(display).ok()?);
                }

                uri
            }
            None => input,
        };

        let (scheme, rest) = uri.split_once(':')?;
        address.secure = match scheme.to_ascii_lowercase().as_str() {
            "sip" => false,
            "sips" => true,
            _ => return None,
        };

        let (rest, headers) = match rest.split_once('?') {
            Some((rest, headers)) => (rest, Some(headers)),
            None => (rest, None),
        };

        let mut parts = rest.split(';');
        let user_host = parts.next()?;

        for param in parts.filter(|param| !param.is_empty()) {
            let (name, value) = match param.split_once('=') {
                Some((name, value)) => (name, Some(CString::new(value).ok()?)),
                None => (param, None),
            };

            address.params.push((CString::new(name).ok()?, value));
        }

        if let Some(headers) = headers {
            for header in headers.split('&').filter(|header| !header.is_empty()) {
                let (name, value) = header.split_once('=')?;
                address.headers.push((CString::new(name).ok()?, CString::new(value).ok()?));
            }
        }

        let host_port = match user_host.rsplit_once('@') {
            Some((user_info, host_port)) => {
                let (user, password) = match user_info.split_once(':') {
                    Some((user, password)) => (user, Some(password)),
                    None => (user_info, None),
                };

                if user.is_empty() {
                    return None;
                }

                address.username = Some(CString::new(user).ok()?);
                address.password = password.map(CString::new).transpose().ok()?;

                host_port
            }
            None => user_host,
        };

        let (host, port) = split_host_port(host_port)?;
        if host.is_empty() {
            return None;
        }

        address.domain = Some(CString::new(host).ok()?);
        address.port = port.unwrap_or(0);

        Some(address)
    }

    fn param(&self, name: &str) -> Option<&(CString, Option<CString>)> {
        self.params
            .iter()
            .find(|(param, _)| param.to_bytes().eq_ignore_ascii_case(name.as_bytes()))
    }

    fn set_param(&mut self, name: CString, value: Option<CString>) {
        match self.params.iter_mut().find(|(param, _)| *param == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name, value)),
        }
    }

    fn remove_param(&mut self, name: &str) {
        self.params
            .retain(|(param, _)| !param.to_bytes().eq_ignore_ascii_case(name.as_bytes()));
    }

    fn transport(&self) -> LinphoneTransportType {
        let value = self
            .param("transport")
            .and_then(|(_, value)| value.as_ref())
            .map(|value| value.to_string_lossy().to_ascii_lowercase());

        match value.as_deref() {
            Some("tcp") => LinphoneTransportTcp,
            Some("tls") => LinphoneTransportTls,
            Some("dtls") => LinphoneTransportDtls,
            _ => LinphoneTransportUdp,
        }
    }

    fn write_uri(&self, out: &mut String, with_headers: bool) {
        let text = |value: &CString| value.to_string_lossy().into_owned();

        out.push_str(if self.secure { "sips:" } else { "sip:" });

        if let Some(username) = &self.username {
            out.push_str(&text(username));

            if let Some(password) = &self.password {
                out.push(':');
                out.push_str(&text(password));
            }

            out.push('@');
        }

        if let Some(domain) = &self.domain {
            let domain = text(domain);

            if domain.contains(':') {
                let _ = write!(out, "[{}]", domain);
            } else {
                out.push_str(&domain);
            }
        }

        if self.port > 0 {
            let _ = write!(out, ":{}", self.port);
        }

        for (name, value) in &self.params {
            out.push(';');
            out.push_str(&text(name));

            if let Some(value) = value {
                out.push('=');
                out.push_str(&text(value));
            }
        }

        if with_headers {
            for (i, (name, value)) in self.headers.iter().enumerate() {
                out.push(if i == 0 { '?' } else { '&' });
                let _ = write!(out, "{}={}", text(name), text(value));
            }
        }
    }

    fn marshal(&self, out: &mut String) {
        match &self.display_name {
            Some(display_name) => {
                let _ = write!(out, "\"{}\" <", display_name.to_string_lossy());
                self.write_uri(out, true);
                out.push('>');
            }
            None => self.write_uri(out, true),
        }
    }

    fn uri_only(&self) -> String {
        let mut out = String::new();
        self.write_uri(&mut out, false);
        out
    }
}

unsafe fn address_clone(obj: *const belle_sip_object_t) -> *mut belle_sip_object_t {
    let address = &*(obj as *const LinphoneAddress);

    let copy = LinphoneAddress {
        base: belle_sip_object_t::new(&ADDRESS_VPTR),
        display_name: address.display_name.clone(),
        secure: address.secure,
        username: address.username.clone(),
        password: address.password.clone(),
        domain: address.domain.clone(),
        port: address.port,
        params: address.params.clone(),
        headers: address.headers.clone(),
    };

    as_object(object_new(copy))
}

unsafe fn address_marshal(obj: *const belle_sip_object_t, out: &mut String) {
    (*(obj as *const LinphoneAddress)).marshal(out)
}

pub(crate) fn parse_address(input: &str) -> Option<*mut LinphoneAddress> {
    match LinphoneAddress::parse(input) {
        Some(address) => Some(object_new(address)),
        None => {
            native_log!("liblinphone", BCTBX_LOG_WARNING, "cannot create address from [{}]", input);
            None
        }
    }
}

linphone_refcounting! {
    LinphoneAddress => linphone_address_ref, linphone_address_unref;
}

/// Parse an address, returning null if it's malformed.
pub unsafe extern "C" fn linphone_address_new(address: *const c_char) -> *mut LinphoneAddress {
    read_c_string(address)
        .and_then(|address| parse_address(&address))
        .unwrap_or(ptr::null_mut())
}

pub unsafe extern "C" fn linphone_address_clone(address: *const LinphoneAddress) -> *mut LinphoneAddress {
    address_clone(as_object(address)) as *mut LinphoneAddress
}

/// `sip` or `sips`, borrowed.
pub unsafe extern "C" fn linphone_address_get_scheme(address: *const LinphoneAddress) -> *const c_char {
    if (*address).secure {
        b"sips\0".as_ptr() as *const c_char
    } else {
        b"sip\0".as_ptr() as *const c_char
    }
}

macro_rules! address_string_accessors {
    ($($field:ident => $get:ident, $set:ident;)*) => {
        $(
            pub unsafe extern "C" fn $get(address: *const LinphoneAddress) -> *const c_char {
                borrow_c_string(&(*address).$field)
            }

            pub unsafe extern "C" fn $set(address: *mut LinphoneAddress, value: *const c_char) -> c_int {
                (*address).$field = copy_c_string(value);
                0
            }
        )*
    };
}

address_string_accessors! {
    display_name => linphone_address_get_display_name, linphone_address_set_display_name;
    username => linphone_address_get_username, linphone_address_set_username;
}

pub unsafe extern "C" fn linphone_address_get_password(address: *const LinphoneAddress) -> *const c_char {
    borrow_c_string(&(*address).password)
}

pub unsafe extern "C" fn linphone_address_set_password(address: *mut LinphoneAddress, password: *const c_char) {
    (*address).password = copy_c_string(password);
}

pub unsafe extern "C" fn linphone_address_get_domain(address: *const LinphoneAddress) -> *const c_char {
    borrow_c_string(&(*address).domain)
}

/// Fails on a null or empty domain, every address needs one.
pub unsafe extern "C" fn linphone_address_set_domain(address: *mut LinphoneAddress, domain: *const c_char) -> c_int {
    match copy_c_string(domain) {
        Some(domain) if !domain.as_bytes().is_empty() => {
            (*address).domain = Some(domain);
            0
        }
        _ => -1,
    }
}

/// The port, 0 if none was given.
pub unsafe extern "C" fn linphone_address_get_port(address: *const LinphoneAddress) -> c_int {
    (*address).port
}

pub unsafe extern "C" fn linphone_address_set_port(address: *mut LinphoneAddress, port: c_int) -> c_int {
    let ok = (0..=c_int::from(u16::MAX)).contains(&port);
    if ok {
        (*address).port = port;
    }

    status(ok)
}

pub unsafe extern "C" fn linphone_address_get_transport(address: *const LinphoneAddress) -> LinphoneTransportType {
    (*address).transport()
}

pub unsafe extern "C" fn linphone_address_set_transport(
    address: *mut LinphoneAddress,
    transport: LinphoneTransportType,
) -> c_int {
    let name = match transport {
        LinphoneTransportUdp => None,
        LinphoneTransportTcp => Some("tcp"),
        LinphoneTransportTls => Some("tls"),
        LinphoneTransportDtls => Some("dtls"),
        _ => return -1,
    };

    (*address).remove_param("transport");

    // UDP is the default and goes unnamed.
    if let Some(name) = name {
        (*address).params.push((c_string("transport"), Some(c_string(name))));
    }

    0
}

pub unsafe extern "C" fn linphone_address_get_secure(address: *const LinphoneAddress) -> bool_t {
    to_bool_t((*address).secure)
}

pub unsafe extern "C" fn linphone_address_set_secure(address: *mut LinphoneAddress, enabled: bool_t) {
    (*address).secure = enabled != FALSE;
}

pub unsafe extern "C" fn linphone_address_has_uri_param(address: *const LinphoneAddress, name: *const c_char) -> bool_t {
    let found = read_c_string(name).map_or(false, |name| (*address).param(&name).is_some());
    to_bool_t(found)
}

/// The value of a URI parameter, borrowed. Null if absent or valueless.
pub unsafe extern "C" fn linphone_address_get_uri_param(
    address: *const LinphoneAddress,
    name: *const c_char,
) -> *const c_char {
    read_c_string(name)
        .and_then(|name| (*address).param(&name).map(|(_, value)| borrow_c_string(value)))
        .unwrap_or(ptr::null())
}

pub unsafe extern "C" fn linphone_address_set_uri_param(
    address: *mut LinphoneAddress,
    name: *const c_char,
    value: *const c_char,
) {
    if let Some(name) = copy_c_string(name) {
        (*address).set_param(name, copy_c_string(value));
    }
}

pub unsafe extern "C" fn linphone_address_remove_uri_param(address: *mut LinphoneAddress, name: *const c_char) {
    if let Some(name) = read_c_string(name) {
        (*address).remove_param(&name);
    }
}

/// The value of a header, borrowed. Null if absent.
pub unsafe extern "C" fn linphone_address_get_header(
    address: *const LinphoneAddress,
    name: *const c_char,
) -> *const c_char {
    let Some(name) = copy_c_string(name) else {
        return ptr::null();
    };

    (*address)
        .headers
        .iter()
        .find(|(header, _)| *header == name)
        .map(|(_, value)| value.as_ptr())
        .unwrap_or(ptr::null())
}

/// Set a header, removing it when `value` is null.
pub unsafe extern "C" fn linphone_address_set_header(
    address: *mut LinphoneAddress,
    name: *const c_char,
    value: *const c_char,
) {
    let Some(name) = copy_c_string(name) else {
        return;
    };

    let headers = &mut (*address).headers;
    headers.retain(|(header, _)| *header != name);

    if let Some(value) = copy_c_string(value) {
        headers.push((name, value));
    }
}

/// Remove the tag parameter and every header so the address can be shown to a user.
pub unsafe extern "C" fn linphone_address_clean(address: *mut LinphoneAddress) {
    (*address).remove_param("tag");
    (*address).headers.clear();
}

/// The full textual form, owned by the caller.
pub unsafe extern "C" fn linphone_address_as_string(address: *const LinphoneAddress) -> *mut c_char {
    let mut out = String::new();
    (*address).marshal(&mut out);

    alloc_c_string(&out)
}

/// The URI without display name or headers, owned by the caller.
pub unsafe extern "C" fn linphone_address_as_string_uri_only(address: *const LinphoneAddress) -> *mut c_char {
    alloc_c_string(&(*address).uri_only())
}

/// Whether two addresses have the same URI.
pub unsafe extern "C" fn linphone_address_equal(a: *const LinphoneAddress, b: *const LinphoneAddress) -> bool_t {
    let mut a_text = String::new();
    let mut b_text = String::new();
    (*a).write_uri(&mut a_text, true);
    (*b).write_uri(&mut b_text, true);

    to_bool_t(a_text.eq_ignore_ascii_case(&b_text))
}

/// Whether two addresses name the same user on the same host and port.
pub unsafe extern "C" fn linphone_address_weak_equal(a: *const LinphoneAddress, b: *const LinphoneAddress) -> bool_t {
    let domain = |address: *const LinphoneAddress| {
        (*address)
            .domain
            .as_ref()
            .map(|domain| domain.to_string_lossy().to_ascii_lowercase())
    };

    to_bool_t((*a).username == (*b).username && domain(a) == domain(b) && (*a).port == (*b).port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::loopback::belle_sip::belle_sip_object_get_ref_count;
    use libc::c_void;
    use std::ffi::CStr;

    fn parse(input: &str) -> *mut LinphoneAddress {
        let input = CString::new(input).unwrap();
        unsafe { linphone_address_new(input.as_ptr()) }
    }

    unsafe fn owned(ptr: *mut c_char) -> String {
        let value = CStr::from_ptr(ptr).to_string_lossy().into_owned();
        libc::free(ptr as *mut c_void);
        value
    }

    unsafe fn borrowed(ptr: *const c_char) -> Option<String> {
        if ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for input in &["sip:@sip.linphone.org", "", "google.com", "http://toto@titi", "sip:toto@"] {
            assert!(parse(input).is_null(), "{}", input);
        }
    }

    #[test]
    fn parses_and_prints() {
        for input in &[
            "sip:toto@titi",
            "sips:toto@titi",
            "sip:toto@titi;transport=tcp",
            "sip:toto@titi;transport=udp",
            "sip:toto@titi?X-Create-Account=yes",
            "sip:127.0.0.1;transport=tcp",
            "sip:toto:secret@titi:5060",
        ] {
            let address = parse(input);
            assert!(!address.is_null(), "{}", input);

            unsafe {
                assert_eq!(*input, owned(linphone_address_as_string(address)));
                linphone_address_unref(address);
            }
        }
    }

    #[test]
    fn display_name() {
        unsafe {
            let address = parse("\"Toto\" <sip:toto@titi>");

            assert_eq!(Some("Toto".to_owned()), borrowed(linphone_address_get_display_name(address)));
            assert_eq!("\"Toto\" <sip:toto@titi>", owned(linphone_address_as_string(address)));
            assert_eq!("sip:toto@titi", owned(linphone_address_as_string_uri_only(address)));

            linphone_address_unref(address);
        }
    }

    #[test]
    fn transport_and_port() {
        unsafe {
            let address = parse("sip:toto@titi;transport=TCP");
            assert_eq!(LinphoneTransportTcp, linphone_address_get_transport(address));

            assert_eq!(0, linphone_address_set_transport(address, LinphoneTransportTls));
            assert_eq!(0, linphone_address_set_port(address, 8080));
            assert_eq!(-1, linphone_address_set_port(address, 70000));

            assert_eq!("sip:toto@titi:8080;transport=tls", owned(linphone_address_as_string(address)));

            linphone_address_set_transport(address, LinphoneTransportUdp);
            assert_eq!("sip:toto@titi:8080", owned(linphone_address_as_string(address)));

            linphone_address_unref(address);
        }
    }

    #[test]
    fn clean_drops_tag_and_headers() {
        unsafe {
            let address = parse("sip:toto@titi;tag=1234;lr?X-Create-Account=yes");
            linphone_address_clean(address);

            assert_eq!("sip:toto@titi;lr", owned(linphone_address_as_string(address)));

            linphone_address_unref(address);
        }
    }

    #[test]
    fn equality() {
        unsafe {
            let a = parse("sip:toto@titi;transport=tcp");
            let b = parse("\"Toto\" <sip:toto@TITI;transport=tcp>");
            let c = parse("sip:toto@titi");

            assert_ne!(FALSE, linphone_address_equal(a, b));
            assert_eq!(FALSE, linphone_address_equal(a, c));
            assert_ne!(FALSE, linphone_address_weak_equal(a, c));

            linphone_address_unref(a);
            linphone_address_unref(b);
            linphone_address_unref(c);
        }
    }

    #[test]
    fn clone_is_floating_and_independent() {
        unsafe {
            let address = linphone_address_ref(parse("sip:toto@titi"));
            let copy = linphone_address_ref(linphone_address_clone(address));

            linphone_address_set_port(copy, 8080);

            assert_eq!(1, belle_sip_object_get_ref_count(copy as *const c_void));
            assert_eq!("sip:toto@titi", owned(linphone_address_as_string(address)));
            assert_eq!("sip:toto@titi:8080", owned(linphone_address_as_string(copy)));

            linphone_address_unref(address);
            linphone_address_unref(copy);
        }
    }
}
