//! Fixed pools of units named at runtime, addressed by 1-based index.

use std::fmt;

use crate::config::truncate_unit_name;
use crate::enabling_state::{EnablingState, Severity};
use crate::instance::TraceInstance;
use crate::registration::RegistrationState;
use crate::sink::SourceLocation;
use crate::trace_error::{TraceError, TraceResult};
use crate::unit::TraceUnit;

/// A fixed number of trace units for entities only known at runtime, such as
/// one unit per bus device.
///
/// Slots start nameless and `Unregistered`. A slot is named and registered in
/// one step and becomes nameless again when unregistered, ready for another
/// entity.
pub struct TraceUnitIndexed {
    instance: TraceInstance,
    units: Vec<TraceUnit>,
}

impl TraceUnitIndexed {
    pub fn new(instance: &TraceInstance, capacity: usize, initial: EnablingState) -> Self {
        let units = (1..=capacity)
            .map(|index| TraceUnit::new_indexed(instance, index, initial))
            .collect();
        Self {
            instance: instance.clone(),
            units,
        }
    }

    pub fn capacity(&self) -> usize {
        self.units.len()
    }

    /// The unit at `index` (1-based), if in range.
    pub fn get(&self, index: usize) -> Option<&TraceUnit> {
        index.checked_sub(1).and_then(|slot| self.units.get(slot))
    }

    fn slot(&self, index: usize) -> Result<&TraceUnit, TraceError> {
        self.get(index).ok_or(TraceError::InvalidArgument)
    }

    /// Name of the unit at `index`, or an empty string when out of range.
    pub fn name(&self, index: usize) -> String {
        self.get(index).map(TraceUnit::name).unwrap_or_default()
    }

    /// Effective enabling state of the unit at `index`, if in range.
    pub fn enabling_state(&self, index: usize) -> Option<EnablingState> {
        self.get(index).map(TraceUnit::enabling_state)
    }

    /// Overrides the buffered flags of the unit at `index`; ignored when out of range.
    pub fn set_buffered_enabling_state(&self, index: usize, state: EnablingState) {
        if let Some(unit) = self.get(index) {
            unit.set_buffered_enabling_state(state);
        }
    }

    /// Names the slot at `index` and registers it with the attached backend.
    ///
    /// The name is staged and only committed when the backend accepts. On any
    /// failure the slot keeps its previous name and is left `Unregistered`.
    ///
    /// # Errors
    ///
    /// - [`TraceError::InvalidArgument`] if `index` is 0 or above the capacity
    /// - [`TraceError::UnitNameInvalid`] if `name` is empty
    /// - [`TraceError::UnitAlreadyAvailable`] if the slot is registered, still
    ///   holds a backend sink or has an unregistration pending
    /// - [`TraceError::InvalidParameter`] if no backend is attached
    /// - any failure reported by the backend
    pub fn register_trace_unit_indexed(&self, index: usize, name: &str) -> TraceResult {
        let unit = self.slot(index)?;
        if name.is_empty() {
            return Err(TraceError::UnitNameInvalid);
        }
        let busy = matches!(
            unit.registration_state(),
            RegistrationState::Registered | RegistrationState::UnregistrationReady
        );
        if busy || unit.shared.holds_backend_handle() {
            return Err(TraceError::UnitAlreadyAvailable);
        }

        let staged = truncate_unit_name(name);
        let result = self.instance.shared.register_named(&unit.shared, &staged);
        if result.is_err() {
            unit.shared.set_state(RegistrationState::Unregistered);
        }
        result
    }

    /// Releases the slot at `index` from the backend and makes it nameless.
    ///
    /// A slot that never reached the backend is reset without contacting it.
    ///
    /// # Errors
    ///
    /// - [`TraceError::InvalidArgument`] if `index` is 0 or above the capacity
    /// - [`TraceError::InvalidParameter`] if no backend is attached
    /// - any failure reported by the backend; the slot stays
    ///   `UnregistrationReady` and the call may be retried
    pub fn unregister_trace_unit_indexed(&self, index: usize) -> TraceResult {
        let unit = self.slot(index)?;
        unit.shared.set_state(RegistrationState::UnregistrationReady);
        self.instance.shared.unregister_marked(&unit.shared)?;
        unit.shared.reset_slot();
        Ok(())
    }

    /// Sets the buffered flags of every slot not currently `Registered` to NONE.
    pub fn disable_all_buffered_trace_units_indexed(&self) {
        for unit in &self.units {
            unit.shared.disable_buffered();
        }
    }

    /// Emits through the unit at `index`; silently ignored when out of range.
    pub fn log(
        &self,
        index: usize,
        severity: Severity,
        entity: Option<&str>,
        location: SourceLocation,
        message: fmt::Arguments<'_>,
    ) {
        if let Some(unit) = self.get(index) {
            unit.log(severity, entity, location, message);
        }
    }
}

impl fmt::Debug for TraceUnitIndexed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceUnitIndexed")
            .field("instance", &self.instance)
            .field("units", &self.units)
            .finish()
    }
}
