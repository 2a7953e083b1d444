use crate::sys::linphone::*;
use std::fmt;

/**
The states a call goes through, from creation to release.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    Idle,
    IncomingReceived,
    OutgoingInit,
    OutgoingProgress,
    OutgoingRinging,
    OutgoingEarlyMedia,
    Connected,
    StreamsRunning,
    Pausing,
    Paused,
    Resuming,
    Referred,
    Error,
    End,
    PausedByRemote,
    UpdatedByRemote,
    IncomingEarlyMedia,
    Updating,
    Released,
    EarlyUpdatedByRemote,
    EarlyUpdating,
}

impl CallState {
    pub fn from_raw(raw: LinphoneCallState) -> Option<Self> {
        let state = match raw {
            LinphoneCallStateIdle => CallState::Idle,
            LinphoneCallStateIncomingReceived => CallState::IncomingReceived,
            LinphoneCallStateOutgoingInit => CallState::OutgoingInit,
            LinphoneCallStateOutgoingProgress => CallState::OutgoingProgress,
            LinphoneCallStateOutgoingRinging => CallState::OutgoingRinging,
            LinphoneCallStateOutgoingEarlyMedia => CallState::OutgoingEarlyMedia,
            LinphoneCallStateConnected => CallState::Connected,
            LinphoneCallStateStreamsRunning => CallState::StreamsRunning,
            LinphoneCallStatePausing => CallState::Pausing,
            LinphoneCallStatePaused => CallState::Paused,
            LinphoneCallStateResuming => CallState::Resuming,
            LinphoneCallStateReferred => CallState::Referred,
            LinphoneCallStateError => CallState::Error,
            LinphoneCallStateEnd => CallState::End,
            LinphoneCallStatePausedByRemote => CallState::PausedByRemote,
            LinphoneCallStateUpdatedByRemote => CallState::UpdatedByRemote,
            LinphoneCallStateIncomingEarlyMedia => CallState::IncomingEarlyMedia,
            LinphoneCallStateUpdating => CallState::Updating,
            LinphoneCallStateReleased => CallState::Released,
            LinphoneCallStateEarlyUpdatedByRemote => CallState::EarlyUpdatedByRemote,
            LinphoneCallStateEarlyUpdating => CallState::EarlyUpdating,
            _ => return None,
        };

        Some(state)
    }

    /// Whether the call is over, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Error | CallState::End | CallState::Released)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/**
The lifecycle of a core.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalState {
    Off,
    Startup,
    On,
    Shutdown,
    Configuring,
}

impl GlobalState {
    pub fn from_raw(raw: LinphoneGlobalState) -> Option<Self> {
        match raw {
            LinphoneGlobalOff => Some(GlobalState::Off),
            LinphoneGlobalStartup => Some(GlobalState::Startup),
            LinphoneGlobalOn => Some(GlobalState::On),
            LinphoneGlobalShutdown => Some(GlobalState::Shutdown),
            LinphoneGlobalConfiguring => Some(GlobalState::Configuring),
            _ => None,
        }
    }
}

/**
Where an account's registration with its proxy stands.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationState {
    None,
    Progress,
    Ok,
    Cleared,
    Failed,
    Refreshing,
}

impl RegistrationState {
    pub fn from_raw(raw: LinphoneRegistrationState) -> Option<Self> {
        match raw {
            LinphoneRegistrationNone => Some(RegistrationState::None),
            LinphoneRegistrationProgress => Some(RegistrationState::Progress),
            LinphoneRegistrationOk => Some(RegistrationState::Ok),
            LinphoneRegistrationCleared => Some(RegistrationState::Cleared),
            LinphoneRegistrationFailed => Some(RegistrationState::Failed),
            LinphoneRegistrationRefreshing => Some(RegistrationState::Refreshing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    pub fn from_raw(raw: LinphoneCallDir) -> Self {
        if raw == LinphoneCallIncoming {
            Direction::Incoming
        } else {
            Direction::Outgoing
        }
    }
}

/**
The SIP transport named by an address.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Udp,
    Tcp,
    Tls,
    Dtls,
}

impl Transport {
    pub fn from_raw(raw: LinphoneTransportType) -> Option<Self> {
        match raw {
            LinphoneTransportUdp => Some(Transport::Udp),
            LinphoneTransportTcp => Some(Transport::Tcp),
            LinphoneTransportTls => Some(Transport::Tls),
            LinphoneTransportDtls => Some(Transport::Dtls),
            _ => None,
        }
    }

    pub fn raw(self) -> LinphoneTransportType {
        match self {
            Transport::Udp => LinphoneTransportUdp,
            Transport::Tcp => LinphoneTransportTcp,
            Transport::Tls => LinphoneTransportTls,
            Transport::Dtls => LinphoneTransportDtls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_states_cover_the_native_range() {
        for raw in 0..=20 {
            assert!(CallState::from_raw(raw).is_some(), "{}", raw);
        }

        assert_eq!(None, CallState::from_raw(21));
        assert_eq!(Some(CallState::StreamsRunning), CallState::from_raw(LinphoneCallStateStreamsRunning));
    }

    #[test]
    fn registration_states() {
        assert_eq!(Some(RegistrationState::Ok), RegistrationState::from_raw(LinphoneRegistrationOk));
        assert_eq!(Some(RegistrationState::Refreshing), RegistrationState::from_raw(5));
        assert_eq!(None, RegistrationState::from_raw(6));
    }

    #[test]
    fn transports() {
        for transport in &[Transport::Udp, Transport::Tcp, Transport::Tls, Transport::Dtls] {
            assert_eq!(Some(*transport), Transport::from_raw(transport.raw()));
        }
    }
}
