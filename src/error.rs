use std::ffi::NulError;
use std::os::raw::c_int;

use failure_derive::*;

/**
Recoverable failures surfaced by the bindings.

Contract violations by the native libraries (a null handle from a factory
documented as non-null, a clone that fails halfway through a mutation) aren't
represented here: they panic.
 */
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "native call `{}` failed with status {}", call, code)]
    Status { call: &'static str, code: c_int },
    #[fail(display = "string passed to native code contains an interior nul byte")]
    InteriorNul(#[cause] NulError),
    #[fail(display = "native library refused to create `{}`", what)]
    Construction { what: &'static str },
    #[fail(display = "filter description {:?} has no id", name)]
    MissingFilterId { name: Option<String> },
}

impl From<NulError> for Error {
    fn from(e: NulError) -> Self {
        Error::InteriorNul(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
