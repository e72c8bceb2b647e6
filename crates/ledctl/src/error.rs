//! Error taxonomy for the controller.

use core::fmt;

use hal::HalError;
use thiserror::Error;

const EIO: i32 = 5;
const EFAULT: i32 = 14;
const EBUSY: i32 = 16;
const ENODEV: i32 = 19;
const EINVAL: i32 = 22;

/// Problems with the start-up configuration. No resource is claimed when one
/// of these is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LED {index} not assigned")]
    Unassigned { index: usize },
    #[error("GPIO{pin} listed more than once")]
    Duplicate { pin: u32 },
    #[error("no LEDs configured")]
    Empty,
    #[error("{given} GPIOs given but only {max} LEDs are supported")]
    TooManyPins { max: usize, given: usize },
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("invalid value `{value}` for parameter `{param}`")]
    InvalidValue { param: String, value: String },
}

/// Step of pin acquisition that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStage {
    Request,
    Direction,
    Publish,
}

impl fmt::Display for AcquireStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Direction => write!(f, "set direction for"),
            Self::Publish => write!(f, "export"),
        }
    }
}

/// Step of control-channel registration that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStage {
    Major,
    Class,
    Device,
}

impl fmt::Display for ChannelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "register a major number"),
            Self::Class => write!(f, "register device class"),
            Self::Device => write!(f, "create the device"),
        }
    }
}

/// Direction of a copy across the caller boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    FromCaller,
    ToCaller,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromCaller => write!(f, "from caller"),
            Self::ToCaller => write!(f, "to caller"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("failed to {stage} GPIO{pin}: {source}")]
    ResourceAcquisition {
        pin: u32,
        stage: AcquireStage,
        #[source]
        source: HalError,
    },
    #[error("failed to {stage}: {source}")]
    ChannelRegistration {
        stage: ChannelStage,
        #[source]
        source: HalError,
    },
    #[error("device busy")]
    Busy,
    #[error("GPIO{0} is not managed by this controller")]
    InvalidPin(u32),
    #[error("short copy {direction}: {copied} of {expected} bytes")]
    DataTransfer {
        direction: TransferDirection,
        expected: usize,
        copied: usize,
    },
    #[error("GPIO{pin} access failed: {source}")]
    Hardware {
        pin: u32,
        #[source]
        source: HalError,
    },
    #[error("pins are already initialized")]
    AlreadyInitialized,
}

impl DriverError {
    /// Negative errno a host returns to the caller for this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::InvalidPin(_) => -EINVAL,
            Self::ResourceAcquisition { source, .. } | Self::Hardware { source, .. } => {
                hal_errno(*source)
            }
            Self::ChannelRegistration { source, .. } => match source {
                HalError::VendorError(code) => -code.abs(),
                _ => -ENODEV,
            },
            Self::Busy | Self::AlreadyInitialized => -EBUSY,
            Self::DataTransfer { .. } => -EFAULT,
        }
    }

    /// True for errors raised while bringing the controller up.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::ResourceAcquisition { .. }
                | Self::ChannelRegistration { .. }
        )
    }
}

fn hal_errno(err: HalError) -> i32 {
    match err {
        HalError::InvalidParameter | HalError::InvalidState => -EINVAL,
        HalError::Busy => -EBUSY,
        HalError::VendorError(code) => -code.abs(),
        HalError::NotSupported | HalError::HardwareError | HalError::Exhausted => -EIO,
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
