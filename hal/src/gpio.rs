//! GPIO (General Purpose Input/Output) abstraction
//!
//! Lines are addressed by their platform number and go through the usual
//! host life cycle: request, configure, publish, and finally unpublish and
//! free. Implementations must make `free` and `unexport` safe to call on a
//! line in any state, since rollback paths call them unconditionally.

use crate::error::HalResult;

/// GPIO pin levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    /// Low level (0V)
    #[default]
    Low,
    /// High level (VCC)
    High,
}

impl Level {
    /// Protocol representation (`0` or `1`).
    pub const fn as_raw(self) -> i32 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    /// Any non-zero value drives the line high.
    pub const fn from_raw(raw: i32) -> Self {
        if raw != 0 {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for i32 {
    fn from(level: Level) -> Self {
        level.as_raw()
    }
}

/// Line-oriented GPIO controller.
pub trait GpioController: Send {
    /// Claim `pin` exclusively under `label`.
    fn request(&mut self, pin: u32, label: &str) -> HalResult<()>;

    /// Configure a claimed line as an output driven to `initial`.
    fn direction_output(&mut self, pin: u32, initial: Level) -> HalResult<()>;

    /// Read the current level of a claimed line.
    fn get_value(&self, pin: u32) -> HalResult<Level>;

    /// Drive a claimed output line.
    fn set_value(&mut self, pin: u32, level: Level) -> HalResult<()>;

    /// Publish a claimed line under its external identity.
    fn export(&mut self, pin: u32, direction_may_change: bool) -> HalResult<()>;

    /// Withdraw the external identity of a line.
    fn unexport(&mut self, pin: u32);

    /// Release the claim on a line.
    fn free(&mut self, pin: u32);
}
