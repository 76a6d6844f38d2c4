//! # Trace Connect
//!
//! Lets independently created log sources ("trace units") write output
//! before the real logging backend exists, move onto that backend when it
//! attaches, and fall back to local buffered output when it detaches.
//!
//! Emission never blocks: each unit switches its active sink with a single
//! atomic pointer swap, and its enabling flags live in atomics.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use trace_connect::{
//!     trace_error, DiagnosisCodes, EnablingState, EnablingStateCallback, LogSink,
//!     RegistrationState, TraceConnect, TraceError, TraceInstance, TraceRecord,
//!     TraceRegistration, TraceUnit,
//! };
//!
//! struct Stdout;
//!
//! impl LogSink for Stdout {
//!     fn log(&self, record: &TraceRecord<'_>) {
//!         println!("[{}] {}: {}", record.severity, record.entity, record.message);
//!     }
//! }
//!
//! struct Backend;
//!
//! impl TraceRegistration for Backend {
//!     fn register_unit(
//!         &self,
//!         _name: &str,
//!         _initial: EnablingState,
//!         _on_change: EnablingStateCallback,
//!     ) -> Result<Arc<dyn LogSink>, TraceError> {
//!         Ok(Arc::new(Stdout))
//!     }
//!
//!     fn unregister_unit(&self, _sink: Arc<dyn LogSink>) -> Result<(), TraceError> {
//!         Ok(())
//!     }
//! }
//!
//! // Composition root: one context, passed to every instance.
//! let connect = TraceConnect::new();
//! let system = TraceInstance::new(
//!     &connect,
//!     DiagnosisCodes::new(0x080A_0FFF, 0x080E_0FFF, 0x080F_0FFF),
//!     "system",
//! );
//! let common = TraceUnit::new(&system, "app.common.systemhandler", EnablingState::ERROR);
//!
//! trace_error!(common, "written to the buffered sink");
//!
//! connect.attach_trace(Some(Arc::new(Backend))).unwrap();
//! assert_eq!(common.registration_state(), RegistrationState::Registered);
//! trace_error!(common, "written to the backend");
//!
//! connect.detach_trace().unwrap();
//! assert!(!common.is_backend_active());
//! ```
//!
//! ## Main Types
//!
//! - [`TraceConnect`] - attaches and detaches the backend for every instance
//! - [`TraceInstance`] - units sharing diagnosis codes and a base entity
//! - [`TraceUnit`] - one named log source
//! - [`TraceUnitIndexed`] - a fixed pool of units named at runtime
//! - [`TraceRegistration`] / [`LogSink`] - the backend contract

pub mod config;
mod connect;
mod enabling_state;
mod instance;
mod macros;
mod registration;
mod sink;
mod trace_error;
mod unit;
mod unit_indexed;

pub use connect::TraceConnect;
pub use enabling_state::{EnablingState, Severity};
pub use instance::{DiagnosisCodes, TraceInstance};
pub use registration::{EnablingStateCallback, RegistrationState, TraceRegistration};
pub use sink::{BufferedSink, LogSink, SourceLocation, TraceRecord};
pub use trace_error::{TraceError, TraceResult};
pub use unit::TraceUnit;
pub use unit_indexed::TraceUnitIndexed;
