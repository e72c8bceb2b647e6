use hal::HalError;
use hal_sim::{RegistryEvent, RegistryStage, SimGpio, SimRegistry};

use crate::config::DriverConfig;
use crate::driver::LedController;
use crate::error::{ChannelStage, ConfigError, DriverError};
use crate::pin::{Level, PinState};

fn config() -> DriverConfig {
    DriverConfig::from_params("led_gpios=17,27").unwrap()
}

fn load() -> (LedController<SimGpio, SimRegistry>, SimGpio, SimRegistry) {
    let gpio = SimGpio::new();
    let registry = SimRegistry::new();
    let controller = LedController::load(config(), gpio.clone(), registry.clone()).unwrap();
    (controller, gpio, registry)
}

#[test]
fn load_publishes_channel_after_pins() {
    let (controller, gpio, registry) = load();

    assert!(controller.is_loaded());
    assert_eq!(gpio.claimed_lines(), vec![17, 27]);
    assert_eq!(registry.channel_names(), vec!["ledControllerDev".to_string()]);
    assert_eq!(registry.class_names(), vec!["ledControllerCLS".to_string()]);
    assert_eq!(registry.device_names(), vec!["ledControllerDev".to_string()]);
    assert_eq!(
        controller.status().major,
        Some(SimRegistry::FIRST_DYNAMIC_MAJOR)
    );
}

#[test]
fn invalid_config_claims_and_publishes_nothing() {
    let gpio = SimGpio::new();
    let registry = SimRegistry::new();
    let config = DriverConfig::from_params("led_gpios=17").unwrap();

    let err = LedController::load(config, gpio.clone(), registry.clone())
        .err()
        .expect("load should fail");
    assert_eq!(
        err,
        DriverError::Configuration(ConfigError::Unassigned { index: 1 })
    );
    assert!(err.is_fatal());
    assert!(gpio.journal().is_empty());
    assert!(registry.journal().is_empty());
}

#[test]
fn pin_failure_never_publishes_channel() {
    let gpio = SimGpio::new();
    let registry = SimRegistry::new();
    gpio.inject_fault(27, hal_sim::GpioStage::Request, HalError::Busy);

    let err = LedController::load(config(), gpio.clone(), registry.clone())
        .err()
        .expect("load should fail");
    assert!(matches!(err, DriverError::ResourceAcquisition { pin: 27, .. }));
    assert!(gpio.claimed_lines().is_empty());
    assert!(registry.journal().is_empty());
}

#[test]
fn channel_failure_at_any_stage_rolls_everything_back() {
    let cases = [
        (RegistryStage::Channel, ChannelStage::Major),
        (RegistryStage::Class, ChannelStage::Class),
        (RegistryStage::Device, ChannelStage::Device),
    ];
    for (fault, stage) in cases {
        let gpio = SimGpio::new();
        let registry = SimRegistry::new();
        registry.inject_fault(fault, HalError::Exhausted);

        let err = LedController::load(config(), gpio.clone(), registry.clone())
            .err()
            .expect("load should fail");
        assert_eq!(
            err,
            DriverError::ChannelRegistration {
                stage,
                source: HalError::Exhausted,
            }
        );
        assert!(gpio.claimed_lines().is_empty(), "{stage:?}");
        assert!(registry.is_empty(), "{stage:?}");
    }
}

#[test]
fn only_one_session_at_a_time() {
    let (controller, _gpio, _registry) = load();

    let session = controller.open().unwrap();
    assert!(matches!(controller.open(), Err(DriverError::Busy)));
    assert!(controller.status().session_open);

    session.close();
    assert!(!controller.status().session_open);
    let again = controller.open().unwrap();
    drop(again);
    assert!(controller.open().is_ok());
}

#[test]
fn busy_open_leaves_first_session_working() {
    let (controller, gpio, _registry) = load();

    let session = controller.open().unwrap();
    assert!(controller.open().is_err());
    session.write_pin(27, 1).unwrap();
    assert_eq!(gpio.level(27), Some(Level::High));
}

#[test]
fn session_raw_ioctl() {
    let (controller, _gpio, _registry) = load();
    let session = controller.open().unwrap();

    let mut arg = crate::PinRecord::new(17, 1).to_bytes();
    session.ioctl(0x66, &mut arg).unwrap();
    let mut arg = crate::PinRecord::new(17, 0).to_bytes();
    session.ioctl(0x65, &mut arg).unwrap();
    assert_eq!(crate::PinRecord::from_bytes(arg).value, 1);
}

#[test]
fn status_reports_live_levels() {
    let (controller, _gpio, _registry) = load();
    controller.open().unwrap().write_pin(17, 1).unwrap();

    let status = controller.status();
    let levels: Vec<_> = status.pins.iter().map(|pin| pin.level).collect();
    assert_eq!(levels, vec![Some(Level::High), Some(Level::Low)]);
    assert!(status
        .pins
        .iter()
        .all(|pin| pin.descriptor.state() == PinState::Published));
}

#[test]
fn unload_removes_channel_then_pins() {
    let (mut controller, gpio, registry) = load();
    controller.open().unwrap().write_pin(17, 1).unwrap();

    controller.unload();

    assert!(!controller.is_loaded());
    assert!(registry.is_empty());
    assert!(gpio.claimed_lines().is_empty());
    assert_eq!(gpio.last_driven(17), Some(Level::Low));
    assert!(matches!(
        registry.journal().last(),
        Some(RegistryEvent::ChannelUnregistered { .. })
    ));
}

#[test]
fn unload_twice_is_harmless() {
    let (mut controller, gpio, registry) = load();
    controller.unload();
    let gpio_journal = gpio.journal();
    let registry_journal = registry.journal();

    controller.unload();
    drop(controller);

    assert_eq!(gpio.journal(), gpio_journal);
    assert_eq!(registry.journal(), registry_journal);
}

#[test]
fn drop_unloads() {
    let (controller, gpio, registry) = load();
    drop(controller);

    assert!(gpio.claimed_lines().is_empty());
    assert!(registry.is_empty());
}
