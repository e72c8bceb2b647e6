//! Control-channel registration.
//!
//! A control channel is published in three steps: a major number for the
//! channel itself, a device class, and a device node inside that class.
//! Teardown runs the same steps in reverse.

use crate::error::HalResult;

/// Handle for a registered device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassHandle(pub u32);

/// Handle for a created device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u32);

/// Platform service that publishes named control channels.
pub trait ChannelRegistry: Send {
    /// Register a channel under `name`, returning its major number.
    fn register_channel(&mut self, name: &str) -> HalResult<u32>;

    /// Release a major number obtained from [`register_channel`](Self::register_channel).
    fn unregister_channel(&mut self, major: u32, name: &str);

    /// Create a device class visible under `name`.
    fn create_class(&mut self, name: &str) -> HalResult<ClassHandle>;

    /// Destroy a class created by [`create_class`](Self::create_class).
    fn destroy_class(&mut self, class: ClassHandle);

    /// Create a device node for `major:minor` inside `class`.
    fn create_device(
        &mut self,
        class: ClassHandle,
        major: u32,
        minor: u32,
        name: &str,
    ) -> HalResult<DeviceHandle>;

    /// Remove the device node for `major:minor` from `class`.
    fn destroy_device(&mut self, class: ClassHandle, major: u32, minor: u32);
}
