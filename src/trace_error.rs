use thiserror::Error;

/// Result of every lifecycle operation in this crate.
pub type TraceResult = Result<(), TraceError>;

/// Failures reported by the connect, instance and unit lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TraceError {
    /// A required argument was absent or out of range (missing backend, bad index).
    #[error("invalid argument")]
    InvalidArgument,
    /// The operation needs an attached backend and none is attached.
    #[error("invalid parameter: no trace backend attached")]
    InvalidParameter,
    /// The backend already knows a unit under this name.
    #[error("trace unit already available")]
    UnitAlreadyAvailable,
    /// The backend refused the unit name.
    #[error("trace unit name invalid")]
    UnitNameInvalid,
    /// The backend does not know the unit being unregistered.
    #[error("trace unit not available")]
    UnitNotAvailable,
    /// Any other failure code reported by the backend.
    #[error("trace backend failure 0x{0:08X}")]
    Backend(u32),
}

impl TraceError {
    /// Stable 32-bit status code, printed as `0x%08X` in diagnostics.
    pub fn code(&self) -> u32 {
        match self {
            TraceError::InvalidArgument => 0x8000_0001,
            TraceError::InvalidParameter => 0x8000_0002,
            TraceError::UnitAlreadyAvailable => 0x8000_0101,
            TraceError::UnitNameInvalid => 0x8000_0102,
            TraceError::UnitNotAvailable => 0x8000_0103,
            TraceError::Backend(code) => *code,
        }
    }
}

/// Folds one more outcome into a fan-out aggregate: the last failure wins.
pub(crate) fn aggregate(outcome: &mut TraceResult, next: TraceResult) {
    if next.is_err() {
        *outcome = next;
    }
}
