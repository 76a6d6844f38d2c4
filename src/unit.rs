//! A single named log source and its active-sink switch.

use std::fmt;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config::{
    truncate_entity, truncate_unit_name, UNKNOWN_BUFFERED_UNIT_NAME, UNKNOWN_UNIT_NAME,
};
use crate::enabling_state::{AtomicEnablingState, EnablingState, Severity};
use crate::instance::{InstanceShared, TraceInstance};
use crate::registration::{EnablingStateCallback, RegistrationState};
use crate::sink::{BufferedSink, LogSink, SourceLocation, TraceRecord};

/// Lifecycle bookkeeping of a unit. Only touched off the real-time path.
struct UnitRegistration {
    name: String,
    state: RegistrationState,
    /// Backend handle whose release failed; retried on the next unregister pass.
    pending_release: Option<Arc<dyn LogSink>>,
}

pub(crate) struct UnitShared {
    pub(crate) instance: Arc<InstanceShared>,
    buffered: BufferedSink,
    /// `None` while the buffered sink is active.
    backend: ArcSwapOption<Arc<dyn LogSink>>,
    backend_enabling: AtomicEnablingState,
    buffered_enabling: AtomicEnablingState,
    registration: Mutex<UnitRegistration>,
}

impl UnitShared {
    fn new(
        instance: Arc<InstanceShared>,
        buffered_name: String,
        name: String,
        state: RegistrationState,
        initial: EnablingState,
    ) -> Arc<Self> {
        let unit = Arc::new(Self {
            instance,
            buffered: BufferedSink::new(buffered_name),
            backend: ArcSwapOption::empty(),
            backend_enabling: AtomicEnablingState::new(initial),
            buffered_enabling: AtomicEnablingState::new(EnablingState::ALL),
            registration: Mutex::new(UnitRegistration {
                name,
                state,
                pending_release: None,
            }),
        });
        unit.instance.add_unit(Arc::downgrade(&unit));
        unit
    }

    pub(crate) fn name(&self) -> String {
        self.registration.lock().name.clone()
    }

    pub(crate) fn state(&self) -> RegistrationState {
        self.registration.lock().state
    }

    pub(crate) fn set_state(&self, state: RegistrationState) {
        self.registration.lock().state = state;
    }

    pub(crate) fn is_backend_active(&self) -> bool {
        self.backend.load().is_some()
    }

    /// True while the backend still holds a sink for this unit.
    pub(crate) fn holds_backend_handle(&self) -> bool {
        self.is_backend_active() || self.registration.lock().pending_release.is_some()
    }

    pub(crate) fn backend_enabling_state(&self) -> EnablingState {
        self.backend_enabling.load()
    }

    pub(crate) fn enabling_state(&self) -> EnablingState {
        self.active_enabling(self.backend.load().is_some())
    }

    fn active_enabling(&self, backend_active: bool) -> EnablingState {
        if backend_active {
            self.backend_enabling.load()
        } else {
            self.buffered_enabling.load()
        }
    }

    pub(crate) fn set_buffered_enabling_state(&self, state: EnablingState) {
        self.buffered_enabling.store(state);
    }

    /// Silences the buffered sink unless the backend currently owns the unit.
    pub(crate) fn disable_buffered(&self) {
        if self.state() != RegistrationState::Registered {
            self.buffered_enabling.store(EnablingState::NONE);
        }
    }

    /// Promotes `Registered` to `UnregistrationReady`; other states are left alone.
    pub(crate) fn mark_for_unregistration(&self) {
        let mut registration = self.registration.lock();
        if registration.state == RegistrationState::Registered {
            registration.state = RegistrationState::UnregistrationReady;
        }
    }

    /// Callback handed to the backend. Holds only a weak handle so it turns
    /// into a no-op once the unit is gone.
    pub(crate) fn enabling_state_callback(self: &Arc<Self>) -> EnablingStateCallback {
        let unit: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |state| {
            if let Some(unit) = unit.upgrade() {
                unit.backend_enabling.store(state);
            }
        })
    }

    /// Commits a successful registration: name, state and sink switch together.
    pub(crate) fn commit_backend(&self, name: &str, sink: Arc<dyn LogSink>) {
        let mut registration = self.registration.lock();
        registration.name = name.to_string();
        registration.state = RegistrationState::Registered;
        self.backend.store(Some(Arc::new(sink)));
    }

    /// Switches back to the buffered sink and hands out the backend handle to
    /// release. Falls back to a handle whose earlier release failed.
    pub(crate) fn take_backend_sink(&self) -> Option<Arc<dyn LogSink>> {
        match self.backend.swap(None) {
            Some(sink) => Some(Arc::clone(&*sink)),
            None => self.registration.lock().pending_release.take(),
        }
    }

    pub(crate) fn finish_release(&self, state: RegistrationState) {
        let mut registration = self.registration.lock();
        registration.state = state;
        registration.pending_release = None;
    }

    pub(crate) fn keep_pending_release(&self, sink: Arc<dyn LogSink>) {
        self.registration.lock().pending_release = Some(sink);
    }

    /// Forgets a handle whose release failed, once the backend that issued it
    /// is going away. The unit becomes `RegistrationReady` for the next backend.
    pub(crate) fn abandon_pending_release(&self) -> bool {
        let mut registration = self.registration.lock();
        if registration.pending_release.take().is_none() {
            return false;
        }
        registration.state = RegistrationState::RegistrationReady;
        true
    }

    /// Returns an indexed slot to its nameless state.
    pub(crate) fn reset_slot(&self) {
        let mut registration = self.registration.lock();
        registration.state = RegistrationState::Unregistered;
        registration.name = UNKNOWN_UNIT_NAME.to_string();
    }

    /// Writes straight to the buffered sink, bypassing the enabling flags.
    pub(crate) fn log_buffered(&self, record: &TraceRecord<'_>) {
        self.buffered.log(record);
    }

    pub(crate) fn buffered(&self) -> &BufferedSink {
        &self.buffered
    }

    fn log(
        &self,
        severity: Severity,
        entity: Option<&str>,
        location: SourceLocation,
        message: fmt::Arguments<'_>,
    ) {
        // One load decides both the enabling flags and the target sink.
        let backend = self.backend.load();
        if !self.active_enabling(backend.is_some()).allows(severity) {
            return;
        }

        let instance = &self.instance;
        let record = TraceRecord {
            severity,
            diagnosis_code: instance.codes.code_for(severity),
            entity: entity.map_or(instance.base_entity.as_str(), truncate_entity),
            origin: &instance.origin,
            location,
            message,
        };
        match &*backend {
            Some(sink) => sink.log(&record),
            None => self.buffered.log(&record),
        }
    }
}

/// One logical log source belonging to a [`TraceInstance`].
///
/// The unit writes to its own buffered sink until the instance registers it
/// with a backend, and returns to it after unregistration. Emission reads the
/// active sink with a single lock-free load.
pub struct TraceUnit {
    pub(crate) shared: Arc<UnitShared>,
}

impl TraceUnit {
    /// Creates a unit whose name is known up front. It starts
    /// `RegistrationReady` and is picked up by the next registration pass.
    pub fn new(instance: &TraceInstance, name: &str, initial: EnablingState) -> Self {
        let name = truncate_unit_name(name);
        let shared = UnitShared::new(
            Arc::clone(&instance.shared),
            name.clone(),
            name,
            RegistrationState::RegistrationReady,
            initial,
        );
        Self { shared }
    }

    /// Creates a nameless slot of an indexed pool.
    pub(crate) fn new_indexed(instance: &TraceInstance, index: usize, initial: EnablingState) -> Self {
        let shared = UnitShared::new(
            Arc::clone(&instance.shared),
            format!("{UNKNOWN_BUFFERED_UNIT_NAME} with index {index}"),
            UNKNOWN_UNIT_NAME.to_string(),
            RegistrationState::Unregistered,
            initial,
        );
        Self { shared }
    }

    pub fn name(&self) -> String {
        self.shared.name()
    }

    pub fn registration_state(&self) -> RegistrationState {
        self.shared.state()
    }

    /// Returns `true` while records go to the backend rather than the buffered sink.
    pub fn is_backend_active(&self) -> bool {
        self.shared.is_backend_active()
    }

    /// Effective enabling state of whichever sink is active.
    pub fn enabling_state(&self) -> EnablingState {
        self.shared.enabling_state()
    }

    /// Overrides the flags used while the buffered sink is active.
    pub fn set_buffered_enabling_state(&self, state: EnablingState) {
        self.shared.set_buffered_enabling_state(state);
    }

    pub fn buffered_sink(&self) -> &BufferedSink {
        self.shared.buffered()
    }

    /// Emits one record through the active sink if its severity is enabled.
    ///
    /// `entity` overrides the instance's base entity. Usually called through
    /// [`trace_error!`](crate::trace_error) and friends.
    pub fn log(
        &self,
        severity: Severity,
        entity: Option<&str>,
        location: SourceLocation,
        message: fmt::Arguments<'_>,
    ) {
        self.shared.log(severity, entity, location, message);
    }
}

impl Drop for TraceUnit {
    fn drop(&mut self) {
        if self.shared.holds_backend_handle() {
            self.shared.instance.release_dropped_unit(&self.shared);
        }
    }
}

impl fmt::Debug for TraceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceUnit")
            .field("name", &self.name())
            .field("state", &self.registration_state())
            .field("backend_active", &self.is_backend_active())
            .field("enabling_state", &self.enabling_state())
            .finish()
    }
}
