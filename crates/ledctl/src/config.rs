//! Start-up configuration.
//!
//! The controller manages a fixed number of LEDs, each named by its GPIO line
//! number. Line `0` marks an unassigned slot and is never valid.

use crate::error::ConfigError;

/// Marks an LED slot with no GPIO assigned.
pub const UNASSIGNED_PIN: u32 = 0;
/// Number of LED slots when none is specified.
pub const DEFAULT_PIN_COUNT: usize = 2;
/// Label under which every line is claimed.
pub const DEFAULT_LABEL: &str = "led";
/// Name of the published control channel.
pub const DEVICE_NAME: &str = "ledControllerDev";
/// Name of the published device class.
pub const CLASS_NAME: &str = "ledControllerCLS";
/// Start-up parameter holding the comma-separated GPIO list.
pub const PINS_PARAM: &str = "led_gpios";

/// Configuration for the LED controller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverConfig {
    pub pins: Vec<u32>,
    pub label: String,
    pub device_name: String,
    pub class_name: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pins: vec![UNASSIGNED_PIN; DEFAULT_PIN_COUNT],
            label: DEFAULT_LABEL.to_string(),
            device_name: DEVICE_NAME.to_string(),
            class_name: CLASS_NAME.to_string(),
        }
    }
}

impl DriverConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// Parses start-up parameters such as `led_gpios=23,24`.
    ///
    /// Parameters are whitespace separated `key=value` items. The GPIO list
    /// fills the default number of slots; missing trailing entries stay
    /// unassigned and are rejected by [`validate`](Self::validate).
    pub fn from_params(params: &str) -> Result<Self, ConfigError> {
        Self::builder().params(params)
    }

    /// Checks that every slot holds a distinct, assigned GPIO.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pins(&self.pins)
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}

/// Rejects empty sets, unassigned slots and repeated lines.
pub fn validate_pins(pins: &[u32]) -> Result<(), ConfigError> {
    if pins.is_empty() {
        return Err(ConfigError::Empty);
    }
    if let Some(index) = pins.iter().position(|&pin| pin == UNASSIGNED_PIN) {
        return Err(ConfigError::Unassigned { index });
    }
    for (index, pin) in pins.iter().enumerate() {
        if pins[..index].contains(pin) {
            return Err(ConfigError::Duplicate { pin: *pin });
        }
    }
    Ok(())
}

/// Builder for ergonomic controller configuration construction.
#[derive(Debug, Clone, Default)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// Sets the number of LED slots, keeping already assigned entries.
    pub fn pin_count(mut self, count: usize) -> Self {
        self.config.pins.resize(count, UNASSIGNED_PIN);
        self
    }

    /// Replaces the GPIO list; the slot count follows its length.
    pub fn pins(mut self, pins: impl IntoIterator<Item = u32>) -> Self {
        self.config.pins = pins.into_iter().collect();
        self
    }

    /// Assigns one slot, growing the list if needed.
    pub fn pin(mut self, index: usize, pin: u32) -> Self {
        if index >= self.config.pins.len() {
            self.config.pins.resize(index + 1, UNASSIGNED_PIN);
        }
        self.config.pins[index] = pin;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.config.device_name = name.into();
        self
    }

    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.config.class_name = name.into();
        self
    }

    /// Applies start-up parameters on top of the current slots.
    pub fn params(mut self, params: &str) -> Result<DriverConfig, ConfigError> {
        for item in params.split_whitespace() {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| ConfigError::UnknownParameter(item.to_string()))?;
            if key != PINS_PARAM {
                return Err(ConfigError::UnknownParameter(key.to_string()));
            }
            let given = value.split(',').count();
            let max = self.config.pins.len();
            if given > max {
                return Err(ConfigError::TooManyPins { max, given });
            }
            for (slot, raw) in self.config.pins.iter_mut().zip(value.split(',')) {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        param: key.to_string(),
                        value: raw.to_string(),
                    })?;
            }
        }
        Ok(self.config)
    }

    /// Builds the configuration.
    pub fn build(self) -> DriverConfig {
        self.config
    }
}
