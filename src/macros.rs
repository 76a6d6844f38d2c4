//! Emission macros.
//!
//! Each macro captures the call site, checks the unit's effective enabling
//! state and only then formats the message into the active sink.

/// Emits an error record through a trace unit.
///
/// # Forms
///
/// - `trace_error!(unit, "fmt", args..)`
/// - `trace_error!(unit, entity = "other/entity", "fmt", args..)`
/// - `trace_error!(pool, index = i, "fmt", args..)`
/// - `trace_error!(pool, index = i, entity = "other/entity", "fmt", args..)`
///
/// # Examples
///
/// ```rust
/// use trace_connect::{
///     trace_error, DiagnosisCodes, EnablingState, Severity, TraceConnect, TraceInstance,
///     TraceUnit, TraceUnitIndexed,
/// };
///
/// let connect = TraceConnect::new();
/// let instance = TraceInstance::new(
///     &connect,
///     DiagnosisCodes::new(0x080A_0FFF, 0x080E_0FFF, 0x080F_0FFF),
///     "datalayer",
/// );
/// let core = TraceUnit::new(&instance, "comm.datalayer.core", EnablingState::ALL);
/// let slaves = TraceUnitIndexed::new(&instance, 4, EnablingState::ERROR);
///
/// trace_error!(core, "broker unreachable after {} attempts", 3);
/// trace_error!(core, entity = "datalayer/test", "with another entity");
/// trace_error!(slaves, index = 2, "slave {} lost", 2);
///
/// // No backend yet: both records went to buffered sinks.
/// assert_eq!(core.buffered_sink().emitted(Severity::Error), 2);
/// ```
#[macro_export]
macro_rules! trace_error {
    ($($args:tt)+) => {
        $crate::__trace_log!($crate::Severity::Error, $($args)+)
    };
}

/// Emits a warning record through a trace unit. Same forms as [`trace_error!`].
#[macro_export]
macro_rules! trace_warning {
    ($($args:tt)+) => {
        $crate::__trace_log!($crate::Severity::Warning, $($args)+)
    };
}

/// Emits an informational record through a trace unit. Same forms as [`trace_error!`].
#[macro_export]
macro_rules! trace_info {
    ($($args:tt)+) => {
        $crate::__trace_log!($crate::Severity::Info, $($args)+)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __trace_log {
    ($severity:expr, $pool:expr, index = $index:expr, entity = $entity:expr, $($arg:tt)+) => {
        $pool.log(
            $index,
            $severity,
            ::core::option::Option::Some($entity),
            $crate::SourceLocation::new(file!(), line!(), module_path!()),
            format_args!($($arg)+),
        )
    };
    ($severity:expr, $pool:expr, index = $index:expr, $($arg:tt)+) => {
        $pool.log(
            $index,
            $severity,
            ::core::option::Option::None,
            $crate::SourceLocation::new(file!(), line!(), module_path!()),
            format_args!($($arg)+),
        )
    };
    ($severity:expr, $unit:expr, entity = $entity:expr, $($arg:tt)+) => {
        $unit.log(
            $severity,
            ::core::option::Option::Some($entity),
            $crate::SourceLocation::new(file!(), line!(), module_path!()),
            format_args!($($arg)+),
        )
    };
    ($severity:expr, $unit:expr, $($arg:tt)+) => {
        $unit.log(
            $severity,
            ::core::option::Option::None,
            $crate::SourceLocation::new(file!(), line!(), module_path!()),
            format_args!($($arg)+),
        )
    };
}
