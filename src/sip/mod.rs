/*!
belle-sip objects and URIs.
*/

mod object;
mod uri;

pub use self::object::{BelleSipObject, BelledonneObject, ObjectReference};
pub use self::uri::Uri;

pub(crate) use self::object::belle_sip_ref_counted;
