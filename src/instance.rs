//! Groups of units sharing diagnosis codes, base entity and origin.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::origin_from_env;
use crate::connect::{ConnectShared, TraceConnect};
use crate::enabling_state::Severity;
use crate::registration::{RegistrationState, TraceRegistration};
use crate::sink::{SourceLocation, TraceRecord};
use crate::trace_error::{aggregate, TraceError, TraceResult};
use crate::unit::UnitShared;

/// Main diagnosis codes attached to records of each severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosisCodes {
    pub info: u32,
    pub warning: u32,
    pub error: u32,
}

impl DiagnosisCodes {
    pub const fn new(info: u32, warning: u32, error: u32) -> Self {
        Self {
            info,
            warning,
            error,
        }
    }

    pub const fn code_for(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

pub(crate) struct InstanceShared {
    pub(crate) codes: DiagnosisCodes,
    pub(crate) base_entity: String,
    pub(crate) origin: String,
    connect: Arc<ConnectShared>,
    units: Mutex<Vec<Weak<UnitShared>>>,
}

impl InstanceShared {
    pub(crate) fn add_unit(&self, unit: Weak<UnitShared>) {
        self.units.lock().push(unit);
    }

    fn units(&self) -> Vec<Arc<UnitShared>> {
        self.units.lock().iter().filter_map(Weak::upgrade).collect()
    }

    fn registration(&self) -> Result<Arc<dyn TraceRegistration>, TraceError> {
        self.connect.registration().ok_or(TraceError::InvalidParameter)
    }

    pub(crate) fn register_trace_units(&self) -> TraceResult {
        let registration = self.registration()?;

        let mut outcome = Ok(());
        for unit in self.units() {
            if unit.state() != RegistrationState::RegistrationReady || unit.is_backend_active() {
                continue;
            }
            let name = unit.name();
            aggregate(&mut outcome, self.register_unit(registration.as_ref(), &unit, &name));
        }
        outcome
    }

    /// Registers one unit under `name`. Nothing on the unit changes unless the
    /// backend accepts.
    pub(crate) fn register_named(&self, unit: &Arc<UnitShared>, name: &str) -> TraceResult {
        let registration = self.registration()?;
        self.register_unit(registration.as_ref(), unit, name)
    }

    fn register_unit(
        &self,
        registration: &dyn TraceRegistration,
        unit: &Arc<UnitShared>,
        name: &str,
    ) -> TraceResult {
        let result = registration.register_unit(
            name,
            unit.backend_enabling_state(),
            unit.enabling_state_callback(),
        );
        match result {
            Ok(sink) => {
                unit.commit_backend(name, sink);
                tracing::debug!(unit = name, entity = %self.base_entity, "trace unit registered");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(unit = name, error = %err, "trace unit registration failed");
                self.report_failure(
                    unit,
                    SourceLocation::new(file!(), line!(), module_path!()),
                    format_args!(
                        "Failed to register trace unit '{}' with error code 0x{:08X}",
                        name,
                        err.code()
                    ),
                );
                Err(err)
            }
        }
    }

    pub(crate) fn unregister_trace_units(&self, force: bool) -> TraceResult {
        let registration = self.registration()?;

        let mut outcome = Ok(());
        for unit in self.units() {
            if force {
                unit.mark_for_unregistration();
            }
            if unit.state() != RegistrationState::UnregistrationReady {
                continue;
            }
            aggregate(&mut outcome, self.unregister_unit(registration.as_ref(), &unit));
        }
        outcome
    }

    /// Releases one unit already marked `UnregistrationReady`.
    pub(crate) fn unregister_marked(&self, unit: &Arc<UnitShared>) -> TraceResult {
        let registration = self.registration()?;
        self.unregister_unit(registration.as_ref(), unit)
    }

    fn unregister_unit(&self, registration: &dyn TraceRegistration, unit: &UnitShared) -> TraceResult {
        // Readers are moved to the buffered sink before the backend tears its sink down.
        let Some(sink) = unit.take_backend_sink() else {
            return Ok(());
        };

        match registration.unregister_unit(Arc::clone(&sink)) {
            Ok(()) => {
                unit.finish_release(RegistrationState::RegistrationReady);
                tracing::debug!(unit = %unit.name(), entity = %self.base_entity, "trace unit unregistered");
                Ok(())
            }
            Err(err) => {
                unit.keep_pending_release(sink);
                let name = unit.name();
                tracing::warn!(unit = %name, error = %err, "trace unit unregistration failed");
                self.report_failure(
                    unit,
                    SourceLocation::new(file!(), line!(), module_path!()),
                    format_args!(
                        "Failed to unregister trace unit '{}' with error code 0x{:08X}",
                        name,
                        err.code()
                    ),
                );
                Err(err)
            }
        }
    }

    /// Best-effort release of a unit that is being dropped while the backend
    /// still holds a sink for it.
    pub(crate) fn release_dropped_unit(&self, unit: &UnitShared) {
        let Some(sink) = unit.take_backend_sink() else {
            return;
        };
        match self.connect.registration() {
            Some(registration) => {
                if let Err(err) = registration.unregister_unit(sink) {
                    tracing::warn!(unit = %unit.name(), error = %err, "dropped trace unit not released");
                }
            }
            None => tracing::debug!(unit = %unit.name(), "dropped trace unit outlived its backend"),
        }
    }

    /// Drops handles whose release failed against the backend being detached.
    pub(crate) fn abandon_pending_releases(&self) {
        for unit in self.units() {
            if unit.abandon_pending_release() {
                tracing::warn!(unit = %unit.name(), entity = %self.base_entity, "unreleased trace unit handle dropped with its backend");
            }
        }
    }

    pub(crate) fn disable_all_buffered_trace_units(&self) {
        for unit in self.units() {
            unit.disable_buffered();
        }
    }

    fn report_failure(&self, unit: &UnitShared, location: SourceLocation, message: fmt::Arguments<'_>) {
        unit.log_buffered(&TraceRecord {
            severity: Severity::Error,
            diagnosis_code: self.codes.error,
            entity: &self.base_entity,
            origin: &self.origin,
            location,
            message,
        });
    }
}

/// A group of trace units sharing diagnosis codes and a base entity.
///
/// Created against a [`TraceConnect`], which fans attach and detach out to
/// every instance. Units join the instance when they are constructed.
#[derive(Clone)]
pub struct TraceInstance {
    pub(crate) shared: Arc<InstanceShared>,
}

impl TraceInstance {
    /// Creates an instance whose origin is read from [`ORIGIN_ENV_VAR`](crate::config::ORIGIN_ENV_VAR).
    pub fn new(connect: &TraceConnect, codes: DiagnosisCodes, base_entity: impl Into<String>) -> Self {
        Self::with_origin(connect, codes, base_entity, origin_from_env())
    }

    pub fn with_origin(
        connect: &TraceConnect,
        codes: DiagnosisCodes,
        base_entity: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        let shared = Arc::new(InstanceShared {
            codes,
            base_entity: base_entity.into(),
            origin: origin.into(),
            connect: Arc::clone(&connect.shared),
            units: Mutex::new(Vec::new()),
        });
        connect.shared.add_instance(Arc::downgrade(&shared));
        Self { shared }
    }

    pub fn codes(&self) -> DiagnosisCodes {
        self.shared.codes
    }

    pub fn base_entity(&self) -> &str {
        &self.shared.base_entity
    }

    pub fn origin(&self) -> &str {
        &self.shared.origin
    }

    /// Registers every `RegistrationReady` unit that still writes to its
    /// buffered sink.
    ///
    /// # Errors
    ///
    /// - [`TraceError::InvalidParameter`] if no backend is attached
    /// - the last per-unit failure; the remaining units are still attempted
    pub fn register_trace_units(&self) -> TraceResult {
        self.shared.register_trace_units()
    }

    /// Releases every `UnregistrationReady` unit from the backend. With
    /// `force`, `Registered` units are marked first.
    ///
    /// # Errors
    ///
    /// - [`TraceError::InvalidParameter`] if no backend is attached
    /// - the last per-unit failure; the remaining units are still attempted
    pub fn unregister_trace_units(&self, force: bool) -> TraceResult {
        self.shared.unregister_trace_units(force)
    }

    /// Sets the buffered flags of every unit not currently `Registered` to NONE.
    pub fn disable_all_buffered_trace_units(&self) {
        self.shared.disable_all_buffered_trace_units();
    }
}

impl fmt::Debug for TraceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceInstance")
            .field("codes", &self.shared.codes)
            .field("base_entity", &self.shared.base_entity)
            .field("origin", &self.shared.origin)
            .finish_non_exhaustive()
    }
}
