//! Simulated HAL implementation
//!
//! In-memory implementations of every `hal` trait, meant for host-side
//! testing and for running the controller without hardware.
//!
//! Every simulated peripheral is a cheap cloneable handle over shared state:
//! hand one clone to the controller and keep another to inspect the
//! simulated hardware or to inject faults.
//!
//! ## Example
//! ```
//! use hal::gpio::{GpioController, Level};
//! use hal_sim::SimGpio;
//!
//! let mut gpio = SimGpio::new();
//! let probe = gpio.clone();
//! gpio.request(17, "led").unwrap();
//! gpio.direction_output(17, Level::High).unwrap();
//! assert_eq!(probe.level(17), Some(Level::High));
//! ```

pub mod buffer;
pub mod gpio;
pub mod registry;

pub use buffer::SimBuffer;
pub use gpio::{GpioEvent, GpioStage, SimGpio, SimLine};
pub use registry::{RegistryEvent, RegistryStage, SimRegistry};
