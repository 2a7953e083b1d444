use crate::error::Result;
use crate::interop::cow::{self, CopyOnWrite, ReferenceConvertible};
use crate::interop::string;
use crate::sip::{BelledonneObject, ObjectReference};
use crate::sys::belle_sip::*;
use crate::{unsafe_block, unsafe_fn};
use libc::c_char;
use std::fmt;

/**
A generic URI, as described by RFC 3986.

```ignore
let uri = Uri::parse("http://www.linphone.org/index.html").unwrap();
assert_eq!(Some("www.linphone.org".to_owned()), uri.host());
```
 */
#[derive(Clone)]
pub struct Uri {
    internal: CopyOnWrite<ObjectReference<belle_generic_uri_t>>,
}

impl ReferenceConvertible for Uri {
    type Reference = ObjectReference<belle_generic_uri_t>;

    fn internal_reference(&self) -> &CopyOnWrite<Self::Reference> {
        &self.internal
    }

    fn internal_reference_mut(&mut self) -> &mut CopyOnWrite<Self::Reference> {
        &mut self.internal
    }

    fn from_internal_reference(internal: CopyOnWrite<Self::Reference>) -> Self {
        Uri { internal }
    }
}

type Getter = unsafe extern "C" fn(*const belle_generic_uri_t) -> *const c_char;
type Setter = unsafe extern "C" fn(*mut belle_generic_uri_t, *const c_char);

impl Uri {
    /// An empty URI.
    pub fn new() -> Self {
        unsafe_block!("A new URI is floating and nobody else references it" => {
            cow::owned_value(belle_generic_uri_new())
        })
        .unwrap_or_else(|| panic!("`belle_generic_uri_new` returned null"))
    }

    /// Parse a URI, `None` if it's malformed.
    pub fn parse(uri: &str) -> Option<Self> {
        let uri = string::to_c_string(uri).ok()?;

        unsafe_block!("A parsed URI is floating and nobody else references it" => {
            cow::owned_value(belle_generic_uri_parse(uri.as_ptr()))
        })
    }

    fn get(&self, getter: Getter) -> Option<String> {
        unsafe_block!("The getter returns a string borrowed from the live URI" => {
            string::from_borrowed(getter(self.internal.as_ptr()))
        })
    }

    fn set(&mut self, setter: Setter, value: Option<&str>) -> Result<()> {
        let value = string::to_optional_c_string(value)?;

        unsafe_block!("The URI is ours after any copy, and the setter copies the string" => {
            setter(self.internal.as_mut_ptr(), string::as_ptr_or_null(&value))
        });

        Ok(())
    }

    pub fn scheme(&self) -> Option<String> {
        self.get(belle_generic_uri_get_scheme)
    }

    pub fn set_scheme(&mut self, scheme: Option<&str>) -> Result<()> {
        self.set(belle_generic_uri_set_scheme, scheme)
    }

    pub fn user(&self) -> Option<String> {
        self.get(belle_generic_uri_get_user)
    }

    pub fn set_user(&mut self, user: Option<&str>) -> Result<()> {
        self.set(belle_generic_uri_set_user, user)
    }

    pub fn user_password(&self) -> Option<String> {
        self.get(belle_generic_uri_get_user_password)
    }

    pub fn set_user_password(&mut self, password: Option<&str>) -> Result<()> {
        self.set(belle_generic_uri_set_user_password, password)
    }

    pub fn host(&self) -> Option<String> {
        self.get(belle_generic_uri_get_host)
    }

    pub fn set_host(&mut self, host: Option<&str>) -> Result<()> {
        self.set(belle_generic_uri_set_host, host)
    }

    pub fn port(&self) -> Option<u16> {
        let port = unsafe_block!("The URI is live" => belle_generic_uri_get_port(self.internal.as_ptr()));
        u16::try_from(port).ok()
    }

    pub fn set_port(&mut self, port: Option<u16>) {
        let port = port.map_or(-1, libc::c_int::from);
        unsafe_block!("The URI is ours after any copy" => belle_generic_uri_set_port(self.internal.as_mut_ptr(), port))
    }

    pub fn path(&self) -> Option<String> {
        self.get(belle_generic_uri_get_path)
    }

    pub fn set_path(&mut self, path: Option<&str>) -> Result<()> {
        self.set(belle_generic_uri_set_path, path)
    }

    pub fn query(&self) -> Option<String> {
        self.get(belle_generic_uri_get_query)
    }

    pub fn set_query(&mut self, query: Option<&str>) -> Result<()> {
        self.set(belle_generic_uri_set_query, query)
    }

    /// Everything after the scheme of an opaque URI such as `mailto:`.
    pub fn opaque_part(&self) -> Option<String> {
        self.get(belle_generic_uri_get_opaque_part)
    }

    pub fn set_opaque_part(&mut self, opaque_part: Option<&str>) -> Result<()> {
        self.set(belle_generic_uri_set_opaque_part, opaque_part)
    }

    unsafe_fn!("`ptr` must be null or point to a live URI owned by another object" =>
    /// Wrap a URI that belongs to another native object.
    pub fn from_retained(ptr: *mut belle_generic_uri_t) -> Option<Self> {
        cow::retained_value(ptr)
    });
}

impl Default for Uri {
    fn default() -> Self {
        Uri::new()
    }
}

impl BelledonneObject for Uri {
    fn object_ptr(&self) -> *const belle_sip_object_t {
        as_object(self.internal.as_ptr())
    }
}

impl PartialEq for Uri {
    fn eq(&self, other: &Uri) -> bool {
        CopyOnWrite::ptr_eq(&self.internal, &other.internal) || self.marshal() == other.marshal()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Uri").field(&self.marshal()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::cow::Provenance;

    #[test]
    fn parse_http() {
        let uri = Uri::parse("http://www.linphone.org/index.html").unwrap();

        assert_eq!(Some("http".to_owned()), uri.scheme());
        assert_eq!(Some("www.linphone.org".to_owned()), uri.host());
        assert_eq!(Some("/index.html".to_owned()), uri.path());
        assert_eq!(None, uri.port());
        assert_eq!("http://www.linphone.org/index.html", uri.to_string());
        assert_eq!("belle_generic_uri_t", uri.type_name());
        assert_eq!(Provenance::Owned, uri.internal_reference().provenance());
    }

    #[test]
    fn malformed() {
        assert!(Uri::parse("").is_none());
        assert!(Uri::parse("not a uri").is_none());
    }

    #[test]
    fn build_from_parts() {
        let mut uri = Uri::new();
        uri.set_scheme(Some("http")).unwrap();
        uri.set_host(Some("www.linphone.org")).unwrap();
        uri.set_port(Some(8080));
        uri.set_path(Some("/index.html")).unwrap();

        assert_eq!(Some(8080), uri.port());
        assert_eq!(Uri::parse("http://www.linphone.org:8080/index.html").unwrap(), uri);
    }

    #[test]
    fn copies_diverge_on_mutation() {
        let original = Uri::parse("http://www.linphone.org/index.html").unwrap();
        let mut copy = original.clone();

        copy.set_host(Some("belledonne-communications.com")).unwrap();

        assert_eq!(Some("www.linphone.org".to_owned()), original.host());
        assert_eq!(Some("belledonne-communications.com".to_owned()), copy.host());
        assert_eq!(Provenance::Copied, copy.internal_reference().provenance());
    }

    #[test]
    fn retained_copies_before_mutation() {
        let owner = Uri::parse("http://www.linphone.org/index.html").unwrap();

        let mut retained = unsafe { Uri::from_retained(owner.internal_reference().as_ptr()) }.unwrap();
        retained.set_path(Some("/")).unwrap();

        assert_eq!(Some("/index.html".to_owned()), owner.path());
        assert_eq!(Some("/".to_owned()), retained.path());
    }
}
