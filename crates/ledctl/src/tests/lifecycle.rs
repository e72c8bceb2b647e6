use hal::HalError;
use hal_sim::{GpioEvent, GpioStage, SimGpio};

use crate::error::{AcquireStage, ConfigError, DriverError};
use crate::lifecycle::PinManager;
use crate::pin::{Level, PinState};

fn manager() -> (PinManager<SimGpio>, SimGpio) {
    let gpio = SimGpio::new();
    let probe = gpio.clone();
    (PinManager::new(gpio, "led"), probe)
}

#[test]
fn initialize_claims_every_pin_off_and_exported() {
    let (mut pins, probe) = manager();
    pins.initialize(&[17, 27]).unwrap();

    assert!(pins.is_initialized());
    for pin in [17, 27] {
        let line = probe.line(pin).expect("line claimed");
        assert_eq!(line.label, "led");
        assert!(line.output);
        assert!(line.exported);
        assert_eq!(line.level, Level::Low);
        assert_eq!(pins.read(pin), Ok(Level::Low));
    }
    assert!(pins.pins().iter().all(|desc| desc.state() == PinState::Published));
}

#[test]
fn sentinel_pin_claims_nothing() {
    let (mut pins, probe) = manager();
    let err = pins.initialize(&[17, 0]).unwrap_err();

    assert_eq!(
        err,
        DriverError::Configuration(ConfigError::Unassigned { index: 1 })
    );
    assert!(probe.journal().is_empty());
    assert!(!pins.is_initialized());
}

#[test]
fn request_failure_at_any_index_releases_earlier_pins() {
    let ids = [5, 6, 13, 19];
    for (index, &failing) in ids.iter().enumerate() {
        let (mut pins, probe) = manager();
        probe.inject_fault(failing, GpioStage::Request, HalError::Busy);

        let err = pins.initialize(&ids).unwrap_err();
        assert_eq!(
            err,
            DriverError::ResourceAcquisition {
                pin: failing,
                stage: AcquireStage::Request,
                source: HalError::Busy,
            },
            "failing index {index}"
        );
        assert!(probe.claimed_lines().is_empty(), "failing index {index}");
        for &pin in &ids[..index] {
            assert_eq!(pins.read(pin), Err(DriverError::InvalidPin(pin)));
        }
    }
}

#[test]
fn rollback_runs_in_reverse() {
    let (mut pins, probe) = manager();
    probe.inject_fault(13, GpioStage::Request, HalError::HardwareError);
    pins.initialize(&[5, 6, 13]).unwrap_err();

    let journal = probe.journal();
    assert_eq!(
        &journal[journal.len() - 4..],
        &[
            GpioEvent::Unexport(6),
            GpioEvent::Free(6),
            GpioEvent::Unexport(5),
            GpioEvent::Free(5),
        ]
    );
}

#[test]
fn direction_failure_frees_the_failing_pin() {
    let (mut pins, probe) = manager();
    probe.inject_fault(27, GpioStage::Direction, HalError::VendorError(5));

    let err = pins.initialize(&[17, 27]).unwrap_err();
    assert!(matches!(
        err,
        DriverError::ResourceAcquisition {
            pin: 27,
            stage: AcquireStage::Direction,
            ..
        }
    ));
    assert!(probe.claimed_lines().is_empty());
    assert!(probe.journal().contains(&GpioEvent::Free(27)));
    assert!(!probe.journal().contains(&GpioEvent::Unexport(27)));
}

#[test]
fn export_failure_is_an_acquisition_failure() {
    let (mut pins, probe) = manager();
    probe.inject_fault(17, GpioStage::Export, HalError::NotSupported);

    let err = pins.initialize(&[17, 27]).unwrap_err();
    assert!(matches!(
        err,
        DriverError::ResourceAcquisition {
            pin: 17,
            stage: AcquireStage::Publish,
            ..
        }
    ));
    assert!(probe.claimed_lines().is_empty());
    assert_eq!(pins.pins()[0].state(), PinState::Released);
    assert_eq!(pins.pins()[1].state(), PinState::Unacquired);
}

#[test]
fn line_held_elsewhere_is_reported_busy() {
    let (mut pins, probe) = manager();
    probe.claim_external(27, "w1-gpio");

    let err = pins.initialize(&[17, 27]).unwrap_err();
    assert_eq!(err.errno(), -16);
    assert_eq!(probe.claimed_lines(), vec![27]);
    assert_eq!(probe.line(27).unwrap().label, "w1-gpio");
}

#[test]
fn second_initialize_is_rejected() {
    let (mut pins, _probe) = manager();
    pins.initialize(&[17, 27]).unwrap();
    assert_eq!(
        pins.initialize(&[22]),
        Err(DriverError::AlreadyInitialized)
    );
}

#[test]
fn shutdown_switches_off_and_releases() {
    let (mut pins, probe) = manager();
    pins.initialize(&[17, 27]).unwrap();
    pins.write(17, Level::High).unwrap();
    pins.write(27, Level::High).unwrap();

    pins.shutdown();

    assert!(probe.claimed_lines().is_empty());
    assert_eq!(probe.last_driven(17), Some(Level::Low));
    assert_eq!(probe.last_driven(27), Some(Level::Low));
    assert!(pins.pins().iter().all(|desc| desc.state() == PinState::Released));
}

#[test]
fn shutdown_is_idempotent() {
    let (mut pins, probe) = manager();
    pins.initialize(&[17, 27]).unwrap();
    pins.shutdown();
    let journal = probe.journal();

    pins.shutdown();
    assert_eq!(probe.journal(), journal);
}

#[test]
fn shutdown_continues_past_write_failure() {
    let (mut pins, probe) = manager();
    pins.initialize(&[17, 27]).unwrap();
    probe.inject_fault(17, GpioStage::Write, HalError::HardwareError);

    pins.shutdown();
    assert!(probe.claimed_lines().is_empty());
}

#[test]
fn unmanaged_pin_is_rejected() {
    let (mut pins, probe) = manager();
    pins.initialize(&[17, 27]).unwrap();

    assert_eq!(pins.read(4), Err(DriverError::InvalidPin(4)));
    assert_eq!(
        pins.write(4, Level::High),
        Err(DriverError::InvalidPin(4))
    );
    assert!(!probe.is_claimed(4));
}

#[test]
fn hardware_failure_on_write() {
    let (mut pins, probe) = manager();
    pins.initialize(&[17]).unwrap();
    probe.inject_fault(17, GpioStage::Write, HalError::HardwareError);

    assert_eq!(
        pins.write(17, Level::High),
        Err(DriverError::Hardware {
            pin: 17,
            source: HalError::HardwareError,
        })
    );
    assert_eq!(probe.level(17), Some(Level::Low));
}
