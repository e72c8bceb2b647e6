//! Linux HAL implementation
//!
//! User-space implementations of the HAL traits for Linux hosts.
//!
//! - [`SysfsGpio`] drives lines through the legacy `/sys/class/gpio` interface.
//! - [`FsRegistry`] publishes control-channel identities as a directory tree
//!   (`<root>/<class>/<device>/dev`), mirroring how the kernel exposes
//!   character devices under `/sys/class`.
//!
//! Both take their root directory as a parameter so they can be pointed at a
//! scratch directory in tests.
//!
//! ## Example
//! ```no_run
//! use hal::gpio::{GpioController, Level};
//! use hal_linux::SysfsGpio;
//!
//! let mut gpio = SysfsGpio::new();
//! gpio.request(17, "led").unwrap();
//! gpio.direction_output(17, Level::Low).unwrap();
//! gpio.set_value(17, Level::High).unwrap();
//! ```

pub mod registry;
pub mod sysfs;

pub use registry::FsRegistry;
pub use sysfs::SysfsGpio;
