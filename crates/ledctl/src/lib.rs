//! # ledctl
//!
//! Core of a GPIO LED controller: a fixed set of output lines exposed to user
//! space through one exclusive control channel.
//!
//! ## Module Overview
//! - [`config`]    – Start-up configuration and parameter parsing.
//! - [`lifecycle`] – All-or-nothing claim of the LED lines and their release.
//! - [`protocol`]  – Command decoding and the READ/WRITE request handler.
//! - [`channel`]   – Publication of the control channel identity.
//! - [`driver`]    – [`LedController`], which composes the pieces above.
//!
//! Platform services (line control, caller memory, channel registration) come
//! from the `hal` crate, so the core runs unchanged on the simulator and on
//! Linux sysfs.
//!
//! ## Example
//! ```
//! use hal_sim::{SimGpio, SimRegistry};
//! use ledctl::{DriverConfig, LedController};
//!
//! let config = DriverConfig::from_params("led_gpios=17,27").unwrap();
//! let controller = LedController::load(config, SimGpio::new(), SimRegistry::new()).unwrap();
//!
//! let session = controller.open().unwrap();
//! session.write_pin(17, 1).unwrap();
//! assert_eq!(session.read_pin(17).unwrap().value, 1);
//! ```

pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod pin;
pub mod protocol;
pub mod sync;

pub use config::{DriverConfig, DriverConfigBuilder};
pub use driver::{ControllerStatus, LedController, PinStatus, Session};
pub use error::{ConfigError, DriverError, DriverResult};
pub use lifecycle::{PinManager, LED_OFF, LED_ON};
pub use pin::{Level, PinDescriptor, PinId, PinState};
pub use protocol::{Command, PinRecord, ProtocolHandler, Reply};

#[cfg(test)]
mod tests;
