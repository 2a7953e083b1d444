use crate::error::Result;
use crate::interop::handle::{Handle, Managed};
use crate::interop::status::Status;
use crate::interop::string;
use crate::linphone::{Address, CallState, Direction};
use crate::sip::{belle_sip_ref_counted, BelledonneObject};
use crate::sys::belle_sip::{as_object, belle_sip_object_t};
use crate::sys::linphone::*;
use crate::{unsafe_block, unsafe_fn};
use std::fmt;
use std::time::Duration;

belle_sip_ref_counted! {
    LinphoneCall => linphone_call_ref, linphone_call_unref;
}

/**
A call placed or received by a core.

A call is a reference, not a value: clones refer to the same call, and a
call can outlive the core that made it. It just stops changing state.
 */
pub struct Call {
    managed: Managed<LinphoneCall>,
}

impl Call {
    unsafe_fn!("`ptr` must be null or point to a live call" =>
    pub(crate) fn from_raw(ptr: *mut LinphoneCall) -> Option<Self> {
        Managed::from_nullable(ptr).map(|managed| Call { managed })
    });

    pub fn state(&self) -> CallState {
        let raw = unsafe_block!("The call is live" => linphone_call_get_state(self.managed.as_ptr()));

        CallState::from_raw(raw).unwrap_or_else(|| {
            tracing::warn!(state = raw, "unknown call state");
            CallState::Error
        })
    }

    pub fn direction(&self) -> Direction {
        Direction::from_raw(unsafe_block!("The call is live" => linphone_call_get_dir(self.managed.as_ptr())))
    }

    /// The remote party.
    ///
    /// The address still belongs to the call, so changing the returned value
    /// copies it first.
    pub fn remote_address(&self) -> Address {
        let ptr = unsafe_block!("The call is live" => linphone_call_get_remote_address(self.managed.as_ptr()));

        match unsafe_block!("The address lives as long as the call" => Address::from_retained(ptr as *mut _)) {
            Some(address) => address,
            None => {
                tracing::error!("call has no remote address");
                panic!("`linphone_call_get_remote_address` returned null")
            }
        }
    }

    /// Who the call was addressed to: the callee when outgoing, us when incoming.
    ///
    /// Like `remote_address`, the address belongs to the call.
    pub fn to_address(&self) -> Option<Address> {
        let ptr = unsafe_block!("The call is live" => linphone_call_get_to_address(self.managed.as_ptr()));
        unsafe_block!("The address lives as long as the call" => Address::from_retained(ptr as *mut _))
    }

    pub fn remote_address_string(&self) -> String {
        unsafe_block!("The buffer is allocated for us" => {
            string::from_owned(linphone_call_get_remote_address_as_string(self.managed.as_ptr()))
        })
        .unwrap_or_default()
    }

    /// Answer an incoming call.
    pub fn accept(&self) -> Result<()> {
        let code = unsafe_block!("The call is live" => linphone_call_accept(self.managed.as_ptr()));
        Status::from_raw(code).into_result("linphone_call_accept")
    }

    /// Put a running call on hold. It reaches `Paused` on a later iterate.
    pub fn pause(&self) -> Result<()> {
        let code = unsafe_block!("The call is live" => linphone_call_pause(self.managed.as_ptr()));
        Status::from_raw(code).into_result("linphone_call_pause")
    }

    /// Take a paused call off hold.
    pub fn resume(&self) -> Result<()> {
        let code = unsafe_block!("The call is live" => linphone_call_resume(self.managed.as_ptr()));
        Status::from_raw(code).into_result("linphone_call_resume")
    }

    /// Hang up.
    pub fn terminate(&self) -> Result<()> {
        let code = unsafe_block!("The call is live" => linphone_call_terminate(self.managed.as_ptr()));
        Status::from_raw(code).into_result("linphone_call_terminate")
    }

    /// Time since the call was connected, zero if it never was.
    pub fn duration(&self) -> Duration {
        let seconds = unsafe_block!("The call is live" => linphone_call_get_duration(self.managed.as_ptr()));
        Duration::from_secs(u64::try_from(seconds).unwrap_or(0))
    }

    /// Whether the core that made the call still tracks it.
    pub fn has_core(&self) -> bool {
        !unsafe_block!("The call is live" => linphone_call_get_core(self.managed.as_ptr())).is_null()
    }

    pub fn ref_count(&self) -> Option<usize> {
        self.managed.ref_count()
    }
}

impl Clone for Call {
    fn clone(&self) -> Self {
        let managed = unsafe_block!("We hold a reference so the call is live" => Managed::new(self.managed.as_ptr()));
        Call { managed }
    }
}

/// Calls are equal when they're the same native call.
impl PartialEq for Call {
    fn eq(&self, other: &Call) -> bool {
        self.managed.as_ptr() == other.managed.as_ptr()
    }
}

impl Eq for Call {}

impl BelledonneObject for Call {
    fn object_ptr(&self) -> *const belle_sip_object_t {
        as_object(self.managed.as_ptr())
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Call")
            .field("ptr", &self.managed.as_ptr())
            .field("state", &self.state())
            .field("direction", &self.direction())
            .finish()
    }
}
