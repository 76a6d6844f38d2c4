//! Contract of the external logging backend and the per-unit registration states.

use std::fmt;
use std::sync::Arc;

use crate::enabling_state::EnablingState;
use crate::sink::LogSink;
use crate::trace_error::TraceError;

/// Callback a unit hands to the backend; invoked whenever the backend changes
/// the unit's enabling state. It is a no-op once the unit has been dropped.
pub type EnablingStateCallback = Arc<dyn Fn(EnablingState) + Send + Sync>;

/// Registration capability offered by a logging backend.
///
/// The backend owns the lifetime of this capability. The core only learns
/// that it became invalid through an explicit detach.
pub trait TraceRegistration: Send + Sync {
    /// Registers a unit and returns the sink it should write to from now on.
    fn register_unit(
        &self,
        name: &str,
        initial: EnablingState,
        on_change: EnablingStateCallback,
    ) -> Result<Arc<dyn LogSink>, TraceError>;

    /// Releases a sink previously returned by [`register_unit`](Self::register_unit).
    fn unregister_unit(&self, sink: Arc<dyn LogSink>) -> Result<(), TraceError>;
}

/// Lifecycle position of a single unit relative to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationState {
    /// No valid name yet; only indexed slots start here.
    Unregistered,
    /// Named and waiting for a backend.
    RegistrationReady,
    /// The backend sink is active.
    Registered,
    /// Marked for release on the next unregister pass.
    UnregistrationReady,
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationState::Unregistered => write!(f, "unregistered"),
            RegistrationState::RegistrationReady => write!(f, "registration ready"),
            RegistrationState::Registered => write!(f, "registered"),
            RegistrationState::UnregistrationReady => write!(f, "unregistration ready"),
        }
    }
}
