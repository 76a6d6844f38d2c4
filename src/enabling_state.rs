//! Severity flags carried by every trace unit.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Severity of a single trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Which severities a unit currently lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EnablingState {
    pub errors: bool,
    pub warnings: bool,
    pub messages: bool,
}

impl EnablingState {
    pub const NONE: Self = Self::new(false, false, false);
    pub const ALL: Self = Self::new(true, true, true);
    pub const ERROR: Self = Self::new(true, false, false);
    pub const WARNING_AND_ERROR: Self = Self::new(true, true, false);

    pub const fn new(errors: bool, warnings: bool, messages: bool) -> Self {
        Self {
            errors,
            warnings,
            messages,
        }
    }

    /// Returns `true` if records of `severity` pass this state.
    pub const fn allows(self, severity: Severity) -> bool {
        match severity {
            Severity::Error => self.errors,
            Severity::Warning => self.warnings,
            Severity::Info => self.messages,
        }
    }

    const fn to_bits(self) -> u8 {
        (self.errors as u8) | ((self.warnings as u8) << 1) | ((self.messages as u8) << 2)
    }

    const fn from_bits(bits: u8) -> Self {
        Self::new(bits & 0b001 != 0, bits & 0b010 != 0, bits & 0b100 != 0)
    }
}

impl fmt::Display for EnablingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "errors: {}, warnings: {}, messages: {}",
            self.errors, self.warnings, self.messages
        )
    }
}

/// Lock-free cell for an [`EnablingState`].
///
/// Written by lifecycle code and by the backend's change callback, read on
/// every emission.
#[derive(Debug)]
pub(crate) struct AtomicEnablingState(AtomicU8);

impl AtomicEnablingState {
    pub(crate) const fn new(state: EnablingState) -> Self {
        Self(AtomicU8::new(state.to_bits()))
    }

    pub(crate) fn load(&self) -> EnablingState {
        EnablingState::from_bits(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: EnablingState) {
        self.0.store(state.to_bits(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(!EnablingState::NONE.allows(Severity::Error));
        assert!(EnablingState::ALL.allows(Severity::Info));
        assert!(EnablingState::ERROR.allows(Severity::Error));
        assert!(!EnablingState::ERROR.allows(Severity::Warning));
        assert!(EnablingState::WARNING_AND_ERROR.allows(Severity::Warning));
        assert!(!EnablingState::WARNING_AND_ERROR.allows(Severity::Info));
    }

    #[test]
    fn test_atomic_cell_preserves_every_combination() {
        let cell = AtomicEnablingState::new(EnablingState::NONE);
        for bits in 0u8..8 {
            let state = EnablingState::from_bits(bits);
            cell.store(state);
            assert_eq!(cell.load(), state);
        }
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(EnablingState::default(), EnablingState::NONE);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            EnablingState::ERROR.to_string(),
            "errors: true, warnings: false, messages: false"
        );
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
