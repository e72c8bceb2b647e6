//! Single-holder session token.
//!
//! A binary semaphore with a non-blocking acquire: contention is reported to
//! the caller as [`DriverError::Busy`] instead of waiting.

use parking_lot::Mutex;

use crate::error::{DriverError, DriverResult};

pub struct SessionToken {
    holders: Mutex<usize>,
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionToken {
    const MAX_HOLDERS: usize = 1;

    pub fn new() -> Self {
        Self {
            holders: Mutex::new(0),
        }
    }

    /// Takes the token if it is free.
    pub fn try_acquire(&self) -> DriverResult<()> {
        let mut holders = self.holders.lock();
        if *holders >= Self::MAX_HOLDERS {
            return Err(DriverError::Busy);
        }
        *holders += 1;
        Ok(())
    }

    /// Gives the token back.
    pub fn release(&self) {
        let mut holders = self.holders.lock();
        match holders.checked_sub(1) {
            Some(remaining) => *holders = remaining,
            None => log::warn!("session token released while free"),
        }
    }

    pub fn is_held(&self) -> bool {
        *self.holders.lock() > 0
    }
}
