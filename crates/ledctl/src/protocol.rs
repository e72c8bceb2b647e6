//! Control protocol.
//!
//! Requests arrive as a command code plus a pointer to a [`PinRecord`] in
//! caller memory. [`ProtocolHandler`] guards the channel with a
//! [`SessionToken`] and executes commands against a [`PinManager`].

use hal::gpio::{GpioController, Level};
use hal::transfer::UserBuffer;

use crate::error::{DriverError, DriverResult, TransferDirection};
use crate::lifecycle::PinManager;
use crate::sync::SessionToken;

/// Terminal-attribute query (`TCGETS`) that generic tools issue on any
/// descriptor they open.
pub const TERMINAL_PROBE: u32 = 0x5401;

/// Decoded control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report the live level of `record.pin` back in `record.value`.
    Read,
    /// Drive `record.pin` to `record.value`.
    Write,
    /// Any other code. Acknowledged without side effects so callers that
    /// probe unknown commands keep working.
    Unknown(u32),
}

impl Command {
    pub const READ: u32 = 0x65;
    pub const WRITE: u32 = 0x66;

    pub const fn from_code(code: u32) -> Self {
        match code {
            Self::READ => Command::Read,
            Self::WRITE => Command::Write,
            other => Command::Unknown(other),
        }
    }

    pub const fn code(self) -> u32 {
        match self {
            Command::Read => Self::READ,
            Command::Write => Self::WRITE,
            Command::Unknown(code) => code,
        }
    }
}

/// Request/response record: an unsigned pin number followed by a signed value,
/// both in host byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinRecord {
    pub pin: u32,
    pub value: i32,
}

impl PinRecord {
    pub const SIZE: usize = 8;

    pub const fn new(pin: u32, value: i32) -> Self {
        Self { pin, value }
    }

    pub fn level(&self) -> Level {
        Level::from_raw(self.value)
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..4].copy_from_slice(&self.pin.to_ne_bytes());
        bytes[4..].copy_from_slice(&self.value.to_ne_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let [p0, p1, p2, p3, v0, v1, v2, v3] = bytes;
        Self {
            pin: u32::from_ne_bytes([p0, p1, p2, p3]),
            value: i32::from_ne_bytes([v0, v1, v2, v3]),
        }
    }

    /// Copies a whole record in from the caller; partial copies are rejected.
    pub fn copy_in(arg: &dyn UserBuffer) -> DriverResult<Self> {
        let mut bytes = [0u8; Self::SIZE];
        let copied = arg.copy_from_user(&mut bytes);
        if copied != Self::SIZE {
            return Err(DriverError::DataTransfer {
                direction: TransferDirection::FromCaller,
                expected: Self::SIZE,
                copied,
            });
        }
        Ok(Self::from_bytes(bytes))
    }

    /// Copies the whole record back out to the caller.
    pub fn copy_out(self, arg: &mut dyn UserBuffer) -> DriverResult<()> {
        let copied = arg.copy_to_user(&self.to_bytes());
        if copied != Self::SIZE {
            return Err(DriverError::DataTransfer {
                direction: TransferDirection::ToCaller,
                expected: Self::SIZE,
                copied,
            });
        }
        Ok(())
    }
}

/// Successful outcome of a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Command done, nothing to report.
    Ack,
    /// Record as copied back to the caller.
    Record(PinRecord),
}

#[derive(Default)]
pub struct ProtocolHandler {
    token: SessionToken,
}

impl ProtocolHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session; fails with `Busy` while another session is open.
    pub fn open(&self) -> DriverResult<()> {
        match self.token.try_acquire() {
            Ok(()) => {
                log::info!("control channel opened");
                Ok(())
            }
            Err(err) => {
                log::info!("control channel open refused: session already active");
                Err(err)
            }
        }
    }

    /// Ends the current session.
    pub fn close(&self) {
        self.token.release();
        log::info!("control channel released");
    }

    pub fn is_open(&self) -> bool {
        self.token.is_held()
    }

    /// Executes one command. Must only be called inside an open session.
    pub fn dispatch<G: GpioController>(
        &self,
        pins: &mut PinManager<G>,
        command: Command,
        arg: &mut dyn UserBuffer,
    ) -> DriverResult<Reply> {
        log::debug!("command invoked: {:#x}", command.code());

        match command {
            Command::Read => {
                let mut record = PinRecord::copy_in(arg)?;
                record.value = pins.read(record.pin)?.as_raw();
                record.copy_out(arg)?;
                log::info!("read GPIO{}: {}", record.pin, record.value);
                Ok(Reply::Record(record))
            }
            Command::Write => {
                let record = PinRecord::copy_in(arg)?;
                pins.write(record.pin, record.level())?;
                log::info!("write GPIO{}: {}", record.pin, record.value);
                Ok(Reply::Ack)
            }
            Command::Unknown(TERMINAL_PROBE) => {
                log::debug!("ignoring terminal probe");
                Ok(Reply::Ack)
            }
            Command::Unknown(code) => {
                log::debug!("unrecognized command {code:#x}, ignored");
                Ok(Reply::Ack)
            }
        }
    }
}
