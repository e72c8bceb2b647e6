//! Managed pin descriptors.

use core::fmt;

pub use hal::Level;

/// GPIO line number of a managed LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(pub u32);

impl PinId {
    pub const fn new(pin: u32) -> Self {
        Self(pin)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Where a pin is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// Configured but not yet claimed.
    Unacquired,
    /// Claimed, not yet fully configured and published.
    Claimed,
    /// Claimed, driven as an output and published.
    Published,
    /// Given back to the platform.
    Released,
}

/// One managed output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinDescriptor {
    id: PinId,
    state: PinState,
}

impl PinDescriptor {
    pub const fn new(id: PinId) -> Self {
        Self {
            id,
            state: PinState::Unacquired,
        }
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn state(&self) -> PinState {
        self.state
    }

    /// True once the line is claimed, configured and published.
    pub fn is_acquired(&self) -> bool {
        self.state == PinState::Published
    }

    pub(crate) fn set_state(&mut self, state: PinState) {
        self.state = state;
    }
}
