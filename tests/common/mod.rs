//! Recording backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use trace_connect::{
    DiagnosisCodes, EnablingState, EnablingStateCallback, LogSink, Severity, TraceError,
    TraceRecord, TraceRegistration,
};

pub const CODES: DiagnosisCodes = DiagnosisCodes::new(0x080A_0FFF, 0x080E_0FFF, 0x080F_0FFF);

/// One record as the backend received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub unit: String,
    pub severity: Severity,
    pub code: u32,
    pub entity: String,
    pub origin: String,
    pub message: String,
}

struct MockSink {
    unit: String,
    records: Arc<Mutex<Vec<Captured>>>,
}

impl LogSink for MockSink {
    fn log(&self, record: &TraceRecord<'_>) {
        self.records.lock().unwrap().push(Captured {
            unit: self.unit.clone(),
            severity: record.severity,
            code: record.diagnosis_code,
            entity: record.entity.to_string(),
            origin: record.origin.to_string(),
            message: record.message.to_string(),
        });
    }
}

struct Live {
    name: String,
    sink: Arc<dyn LogSink>,
    on_change: EnablingStateCallback,
}

/// Backend that accepts every unit unless told otherwise.
#[derive(Default)]
pub struct MockBackend {
    live: Mutex<Vec<Live>>,
    reject_register: Mutex<HashSet<String>>,
    reject_unregister: Mutex<HashSet<String>>,
    records: Arc<Mutex<Vec<Captured>>>,
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
}

fn same_sink(a: &Arc<dyn LogSink>, b: &Arc<dyn LogSink>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject_register(&self, name: &str) {
        self.reject_register.lock().unwrap().insert(name.to_string());
    }

    pub fn reject_unregister(&self, name: &str) {
        self.reject_unregister.lock().unwrap().insert(name.to_string());
    }

    pub fn accept_all(&self) {
        self.reject_register.lock().unwrap().clear();
        self.reject_unregister.lock().unwrap().clear();
    }

    /// Names currently registered, in registration order.
    pub fn live_units(&self) -> Vec<String> {
        self.live.lock().unwrap().iter().map(|l| l.name.clone()).collect()
    }

    pub fn records(&self) -> Vec<Captured> {
        self.records.lock().unwrap().clone()
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }

    /// Pushes a new enabling state to the unit registered under `name`.
    pub fn change_enabling_state(&self, name: &str, state: EnablingState) {
        let callback = self
            .live
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.name == name)
            .map(|l| Arc::clone(&l.on_change));
        if let Some(callback) = callback {
            callback(state);
        }
    }

    pub fn as_registration(self: &Arc<Self>) -> Option<Arc<dyn TraceRegistration>> {
        Some(Arc::clone(self) as Arc<dyn TraceRegistration>)
    }
}

impl TraceRegistration for MockBackend {
    fn register_unit(
        &self,
        name: &str,
        _initial: EnablingState,
        on_change: EnablingStateCallback,
    ) -> Result<Arc<dyn LogSink>, TraceError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_register.lock().unwrap().contains(name) {
            return Err(TraceError::UnitNameInvalid);
        }

        let mut live = self.live.lock().unwrap();
        if live.iter().any(|l| l.name == name) {
            return Err(TraceError::UnitAlreadyAvailable);
        }
        let sink: Arc<dyn LogSink> = Arc::new(MockSink {
            unit: name.to_string(),
            records: Arc::clone(&self.records),
        });
        live.push(Live {
            name: name.to_string(),
            sink: Arc::clone(&sink),
            on_change,
        });
        Ok(sink)
    }

    fn unregister_unit(&self, sink: Arc<dyn LogSink>) -> Result<(), TraceError> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        let mut live = self.live.lock().unwrap();
        let Some(position) = live.iter().position(|l| same_sink(&l.sink, &sink)) else {
            return Err(TraceError::UnitNotAvailable);
        };
        if self.reject_unregister.lock().unwrap().contains(&live[position].name) {
            return Err(TraceError::Backend(0x8000_0FFF));
        }
        live.remove(position);
        Ok(())
    }
}
