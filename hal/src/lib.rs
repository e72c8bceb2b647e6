//! Hardware Abstraction Layer (HAL) for GPIO-backed LED controllers
//!
//! This crate provides the platform capabilities the controller core relies
//! on: line-oriented GPIO control, copies to and from caller memory, and
//! control-channel registration. Concrete backends live in `hal-sim` and
//! `hal-linux`.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod chardev;
pub mod error;
pub mod gpio;
pub mod transfer;

// Re-export commonly used types
pub use chardev::{ChannelRegistry, ClassHandle, DeviceHandle};
pub use error::{HalError, HalResult};
pub use gpio::{GpioController, Level};
pub use transfer::UserBuffer;
