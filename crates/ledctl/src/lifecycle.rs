//! Pin lifecycle management.
//!
//! [`PinManager`] owns the configured lines and takes them through
//! request → output/off → publish as one all-or-nothing step. Only the first
//! `acquired` descriptors are ever held, so every cleanup path is one reverse
//! walk over that prefix.

use hal::gpio::{GpioController, Level};

use crate::config::validate_pins;
use crate::error::{AcquireStage, DriverError, DriverResult};
use crate::pin::{PinDescriptor, PinId, PinState};

/// Level every LED is driven to when claimed and before it is released.
pub const LED_OFF: Level = Level::Low;
/// Level that lights an LED.
pub const LED_ON: Level = Level::High;

pub struct PinManager<G: GpioController> {
    gpio: G,
    label: String,
    pins: Vec<PinDescriptor>,
    acquired: usize,
}

impl<G: GpioController> PinManager<G> {
    pub fn new(gpio: G, label: impl Into<String>) -> Self {
        Self {
            gpio,
            label: label.into(),
            pins: Vec::new(),
            acquired: 0,
        }
    }

    /// Claims, configures and publishes every pin in `ids`, in order.
    ///
    /// On failure every pin claimed by this call is released again before the
    /// error is returned.
    pub fn initialize(&mut self, ids: &[u32]) -> DriverResult<()> {
        if self.acquired > 0 {
            return Err(DriverError::AlreadyInitialized);
        }
        if let Err(err) = validate_pins(ids) {
            log::error!("refusing to claim LEDs: {err}");
            return Err(err.into());
        }

        self.pins = ids
            .iter()
            .map(|&pin| PinDescriptor::new(PinId::new(pin)))
            .collect();

        for index in 0..self.pins.len() {
            if let Err(err) = self.acquire(index) {
                log::error!("{err}");
                self.rollback();
                return Err(err);
            }
        }

        log::info!("claimed {} LEDs as `{}`", self.acquired, self.label);
        Ok(())
    }

    fn acquire(&mut self, index: usize) -> DriverResult<()> {
        let pin = self.pins[index].id().get();
        let failed = |stage, source| DriverError::ResourceAcquisition { pin, stage, source };

        self.gpio
            .request(pin, &self.label)
            .map_err(|source| failed(AcquireStage::Request, source))?;
        self.pins[index].set_state(PinState::Claimed);

        let configured = self
            .gpio
            .direction_output(pin, LED_OFF)
            .map_err(|source| failed(AcquireStage::Direction, source))
            .and_then(|()| {
                self.gpio
                    .export(pin, false)
                    .map_err(|source| failed(AcquireStage::Publish, source))
            });
        if let Err(err) = configured {
            self.gpio.free(pin);
            self.pins[index].set_state(PinState::Released);
            return Err(err);
        }

        self.pins[index].set_state(PinState::Published);
        self.acquired = index + 1;
        log::debug!("GPIO{pin} claimed, off and exported");
        Ok(())
    }

    /// Unpublishes and frees every acquired pin, last acquired first.
    ///
    /// Unlike [`shutdown`](Self::shutdown) the lines are not driven off first.
    pub fn rollback(&mut self) {
        for desc in self.pins[..self.acquired].iter_mut().rev() {
            let pin = desc.id().get();
            self.gpio.unexport(pin);
            self.gpio.free(pin);
            desc.set_state(PinState::Released);
            log::debug!("GPIO{pin} released");
        }
        self.acquired = 0;
    }

    /// Drives every acquired pin off, unpublishes and frees it.
    ///
    /// Safe to call repeatedly; once nothing is held it does nothing.
    pub fn shutdown(&mut self) {
        if self.acquired == 0 {
            return;
        }
        for desc in &mut self.pins[..self.acquired] {
            let pin = desc.id().get();
            if let Err(err) = self.gpio.set_value(pin, LED_OFF) {
                log::warn!("GPIO{pin}: failed to switch off before release: {err}");
            }
            self.gpio.unexport(pin);
            self.gpio.free(pin);
            desc.set_state(PinState::Released);
        }
        log::info!("released {} LEDs", self.acquired);
        self.acquired = 0;
    }

    /// Current level of a managed pin.
    pub fn read(&self, pin: u32) -> DriverResult<Level> {
        self.ensure_managed(pin)?;
        self.gpio
            .get_value(pin)
            .map_err(|source| DriverError::Hardware { pin, source })
    }

    /// Drives a managed pin to `level`.
    pub fn write(&mut self, pin: u32, level: Level) -> DriverResult<()> {
        self.ensure_managed(pin)?;
        self.gpio
            .set_value(pin, level)
            .map_err(|source| DriverError::Hardware { pin, source })
    }

    /// True if `pin` is one of the acquired lines.
    pub fn contains(&self, pin: u32) -> bool {
        self.pins[..self.acquired]
            .iter()
            .any(|desc| desc.id().get() == pin && desc.is_acquired())
    }

    fn ensure_managed(&self, pin: u32) -> DriverResult<()> {
        if self.contains(pin) {
            Ok(())
        } else {
            Err(DriverError::InvalidPin(pin))
        }
    }

    pub fn pins(&self) -> &[PinDescriptor] {
        &self.pins
    }

    pub fn is_initialized(&self) -> bool {
        self.acquired > 0
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }
}
