//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Invalid parameter provided (for example a line number the platform does not have)
    InvalidParameter,
    /// Operation not supported by this implementation
    NotSupported,
    /// Resource is already claimed by another consumer
    Busy,
    /// Hardware error occurred
    HardwareError,
    /// Line or channel is not in the state the operation requires
    InvalidState,
    /// Platform ran out of identifiers (for example channel majors)
    Exhausted,
    /// Vendor-specific error code (an errno on Linux backends)
    VendorError(i32),
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Busy => write!(f, "resource busy"),
            Self::HardwareError => write!(f, "hardware error"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::Exhausted => write!(f, "no identifiers left"),
            Self::VendorError(code) => write!(f, "vendor error code: {}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for HalError {
    fn from(err: std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) => Self::VendorError(code),
            None => Self::HardwareError,
        }
    }
}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;
