//! Control-channel publication.

use hal::chardev::{ChannelRegistry, ClassHandle, DeviceHandle};

use crate::config::DriverConfig;
use crate::error::{ChannelStage, DriverError, DriverResult};

/// Minor number of the single control device.
pub const CONTROL_MINOR: u32 = 0;

/// A published control channel: major number, class and device node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRegistration {
    major: u32,
    class: ClassHandle,
    device: DeviceHandle,
    device_name: String,
}

impl ChannelRegistration {
    /// Registers the channel, its class and its device node.
    ///
    /// A failing step undoes the steps before it, so nothing stays
    /// published on error.
    pub fn register<R: ChannelRegistry>(
        registry: &mut R,
        config: &DriverConfig,
    ) -> DriverResult<Self> {
        let failed = |stage, source| DriverError::ChannelRegistration { stage, source };

        let major = registry
            .register_channel(&config.device_name)
            .map_err(|source| failed(ChannelStage::Major, source))?;
        log::info!("registered with major number {major}");

        let class = match registry.create_class(&config.class_name) {
            Ok(class) => class,
            Err(source) => {
                registry.unregister_channel(major, &config.device_name);
                return Err(failed(ChannelStage::Class, source));
            }
        };
        log::info!("device class registered");

        let device = match registry.create_device(class, major, CONTROL_MINOR, &config.device_name)
        {
            Ok(device) => device,
            Err(source) => {
                registry.destroy_class(class);
                registry.unregister_channel(major, &config.device_name);
                return Err(failed(ChannelStage::Device, source));
            }
        };
        log::info!("device {} created", config.device_name);

        Ok(Self {
            major,
            class,
            device,
            device_name: config.device_name.clone(),
        })
    }

    /// Removes the device node, the class and the channel, in that order.
    pub fn unregister<R: ChannelRegistry>(self, registry: &mut R) {
        registry.destroy_device(self.class, self.major, CONTROL_MINOR);
        registry.destroy_class(self.class);
        registry.unregister_channel(self.major, &self.device_name);
        log::info!("device and class removed");
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn device(&self) -> DeviceHandle {
        self.device
    }
}
