//! Process-wide coordination of backend attach and detach.
//!
//! There is no global: the composition root constructs one [`TraceConnect`]
//! and hands it to every [`TraceInstance`](crate::TraceInstance) it creates.
//!
//! # Preconditions
//!
//! [`attach_trace`](TraceConnect::attach_trace),
//! [`detach_trace`](TraceConnect::detach_trace) and the indexed
//! register/unregister calls are lifecycle operations and must be serialized
//! by the caller (typically the backend component's availability callbacks).
//! They stay memory-safe when called concurrently, but the resulting
//! registration states are then unspecified. Emission through units may run
//! concurrently with all of them.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::instance::InstanceShared;
use crate::registration::TraceRegistration;
use crate::trace_error::{aggregate, TraceError, TraceResult};

#[derive(Default)]
pub(crate) struct ConnectShared {
    registration: RwLock<Option<Arc<dyn TraceRegistration>>>,
    /// Every instance ever created against this context.
    instances: Mutex<Vec<Weak<InstanceShared>>>,
}

impl ConnectShared {
    pub(crate) fn registration(&self) -> Option<Arc<dyn TraceRegistration>> {
        self.registration.read().clone()
    }

    pub(crate) fn add_instance(&self, instance: Weak<InstanceShared>) {
        self.instances.lock().push(instance);
    }

    fn instances(&self) -> Vec<Arc<InstanceShared>> {
        self.instances.lock().iter().filter_map(Weak::upgrade).collect()
    }
}

/// Holds the attached backend and fans attach/detach out to every instance.
///
/// Cloning yields another handle to the same context.
#[derive(Clone, Default)]
pub struct TraceConnect {
    pub(crate) shared: Arc<ConnectShared>,
}

impl TraceConnect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a backend is attached.
    pub fn is_attached(&self) -> bool {
        self.shared.registration.read().is_some()
    }

    /// Number of live instances created against this context.
    pub fn instance_count(&self) -> usize {
        self.shared.instances().len()
    }

    /// Attaches a backend and asks every instance to register its ready units.
    ///
    /// A backend that is already attached is detached first, so at most one
    /// backend is attached at a time.
    ///
    /// # Errors
    ///
    /// - [`TraceError::InvalidArgument`] if `registration` is `None`; nothing changes
    /// - the last instance failure; every instance is still attempted and the
    ///   backend stays attached
    pub fn attach_trace(&self, registration: Option<Arc<dyn TraceRegistration>>) -> TraceResult {
        let Some(registration) = registration else {
            return Err(TraceError::InvalidArgument);
        };

        if self.is_attached() {
            if let Err(err) = self.detach_trace() {
                tracing::warn!(error = %err, "previous trace backend detached with failures");
            }
        }

        *self.shared.registration.write() = Some(registration);

        let mut outcome = Ok(());
        for instance in self.shared.instances() {
            aggregate(&mut outcome, instance.register_trace_units());
        }
        tracing::debug!(failed = outcome.is_err(), "trace backend attached");
        outcome
    }

    /// Unregisters every registered unit and forgets the backend.
    ///
    /// The backend is forgotten even when some units fail to unregister, so
    /// the system can always fall back to buffered output. Handles the backend
    /// refused to release are dropped with it, and their units become
    /// `RegistrationReady` for the next backend.
    ///
    /// # Errors
    ///
    /// - [`TraceError::InvalidParameter`] if nothing is attached; nothing changes
    /// - the last instance failure; every instance is still attempted
    pub fn detach_trace(&self) -> TraceResult {
        if !self.is_attached() {
            return Err(TraceError::InvalidParameter);
        }

        let mut outcome = Ok(());
        for instance in self.shared.instances() {
            aggregate(&mut outcome, instance.unregister_trace_units(true));
        }
        for instance in self.shared.instances() {
            instance.abandon_pending_releases();
        }

        *self.shared.registration.write() = None;
        tracing::debug!(failed = outcome.is_err(), "trace backend detached");
        outcome
    }

    /// Silences the buffered sink of every unit not currently `Registered`.
    ///
    /// Meant for a failed attach, when buffered output would cost too much
    /// time on real-time paths.
    pub fn disable_all_buffered_trace_units(&self) {
        for instance in self.shared.instances() {
            instance.disable_all_buffered_trace_units();
        }
    }
}

impl fmt::Debug for TraceConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceConnect")
            .field("attached", &self.is_attached())
            .field("instances", &self.instance_count())
            .finish()
    }
}
