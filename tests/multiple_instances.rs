//! Integration tests for several instances sharing one connect context.

mod common;

use common::{MockBackend, CODES};
use trace_connect::{
    DiagnosisCodes, EnablingState, RegistrationState, TraceConnect, TraceError, TraceInstance,
    TraceUnit, TraceUnitIndexed,
};

#[test]
fn test_failure_in_one_instance_spares_the_other() {
    let connect = TraceConnect::new();
    let datalayer = TraceInstance::with_origin(&connect, CODES, "datalayer", "o");
    let broker = TraceInstance::with_origin(
        &connect,
        DiagnosisCodes::new(0x080A_0FFE, 0x080E_0FFE, 0x080F_0FFE),
        "datalayer/broker",
        "o",
    );
    let core = TraceUnit::new(&datalayer, "comm.datalayer.core", EnablingState::ALL);
    let broker_core = TraceUnit::new(&broker, "comm.datalayer.broker.core", EnablingState::ERROR);
    let broker_user = TraceUnit::new(&broker, "comm.datalayer.broker.user", EnablingState::NONE);
    assert_eq!(connect.instance_count(), 2);

    let backend = MockBackend::new();
    backend.reject_register("comm.datalayer.core");

    assert_eq!(
        connect.attach_trace(backend.as_registration()),
        Err(TraceError::UnitNameInvalid)
    );
    assert_eq!(core.registration_state(), RegistrationState::RegistrationReady);
    assert_eq!(broker_core.registration_state(), RegistrationState::Registered);
    assert_eq!(broker_user.registration_state(), RegistrationState::Registered);
    assert_eq!(
        backend.live_units(),
        vec!["comm.datalayer.broker.core", "comm.datalayer.broker.user"]
    );
}

#[test]
fn test_same_name_in_two_instances_collides() {
    let connect = TraceConnect::new();
    let a = TraceInstance::with_origin(&connect, CODES, "a", "o");
    let b = TraceInstance::with_origin(&connect, CODES, "b", "o");
    let first = TraceUnit::new(&a, "shared.name", EnablingState::ALL);
    let second = TraceUnit::new(&b, "shared.name", EnablingState::ALL);
    let backend = MockBackend::new();

    assert_eq!(
        connect.attach_trace(backend.as_registration()),
        Err(TraceError::UnitAlreadyAvailable)
    );
    assert!(first.is_backend_active());
    assert!(!second.is_backend_active());
}

#[test]
fn test_instance_pass_only_touches_its_own_units() {
    let connect = TraceConnect::new();
    let a = TraceInstance::with_origin(&connect, CODES, "a", "o");
    let b = TraceInstance::with_origin(&connect, CODES, "b", "o");
    let unit_a = TraceUnit::new(&a, "a.unit", EnablingState::ALL);
    let unit_b = TraceUnit::new(&b, "b.unit", EnablingState::ALL);
    let backend = MockBackend::new();
    connect.attach_trace(backend.as_registration()).unwrap();

    assert_eq!(a.unregister_trace_units(true), Ok(()));
    assert!(!unit_a.is_backend_active());
    assert!(unit_b.is_backend_active());

    assert_eq!(a.register_trace_units(), Ok(()));
    assert!(unit_a.is_backend_active());
}

#[test]
fn test_units_created_after_attach_wait_for_a_pass() {
    let connect = TraceConnect::new();
    let instance = TraceInstance::with_origin(&connect, CODES, "late", "o");
    let backend = MockBackend::new();
    connect.attach_trace(backend.as_registration()).unwrap();

    let late = TraceUnit::new(&instance, "late.unit", EnablingState::ALL);
    assert_eq!(late.registration_state(), RegistrationState::RegistrationReady);
    assert!(!late.is_backend_active());

    instance.register_trace_units().unwrap();
    assert!(late.is_backend_active());
}

#[test]
fn test_disable_all_after_failed_attach() {
    let connect = TraceConnect::new();
    let system = TraceInstance::with_origin(&connect, CODES, "system", "o");
    let ethercat = TraceInstance::with_origin(&connect, CODES, "ethercat", "o");
    let registered = TraceUnit::new(&system, "system.common", EnablingState::ERROR);
    let rejected = TraceUnit::new(&system, "system.rejected", EnablingState::ALL);
    let slaves = TraceUnitIndexed::new(&ethercat, 2, EnablingState::NONE);
    let backend = MockBackend::new();
    backend.reject_register("system.rejected");

    assert!(connect.attach_trace(backend.as_registration()).is_err());
    connect.disable_all_buffered_trace_units();

    assert_eq!(registered.enabling_state(), EnablingState::ERROR);
    assert_eq!(rejected.enabling_state(), EnablingState::NONE);
    assert_eq!(slaves.enabling_state(1), Some(EnablingState::NONE));
    assert_eq!(slaves.enabling_state(2), Some(EnablingState::NONE));

    // The registered unit's buffered flags were left alone.
    connect.detach_trace().unwrap();
    assert_eq!(registered.enabling_state(), EnablingState::ALL);
}

#[test]
fn test_dropped_instance_is_skipped() {
    let connect = TraceConnect::new();
    let kept = TraceInstance::with_origin(&connect, CODES, "kept", "o");
    drop(TraceInstance::with_origin(&connect, CODES, "gone", "o"));
    let unit = TraceUnit::new(&kept, "kept.unit", EnablingState::ALL);

    assert_eq!(connect.instance_count(), 1);
    let backend = MockBackend::new();
    assert_eq!(connect.attach_trace(backend.as_registration()), Ok(()));
    assert!(unit.is_backend_active());
}
