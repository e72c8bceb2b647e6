//! Controller composition root.
//!
//! [`LedController`] wires a [`PinManager`] and a [`ProtocolHandler`] to a
//! published control channel. Loading is all-or-nothing; unloading (explicit
//! or on drop) unpublishes the channel before releasing the pins.

use hal::chardev::ChannelRegistry;
use hal::gpio::{GpioController, Level};
use hal::transfer::UserBuffer;
use parking_lot::Mutex;

use crate::channel::ChannelRegistration;
use crate::config::DriverConfig;
use crate::error::DriverResult;
use crate::lifecycle::PinManager;
use crate::pin::PinDescriptor;
use crate::protocol::{Command, PinRecord, ProtocolHandler, Reply};

struct Inner<G: GpioController, R: ChannelRegistry> {
    pins: PinManager<G>,
    registry: R,
    channel: Option<ChannelRegistration>,
}

pub struct LedController<G: GpioController, R: ChannelRegistry> {
    config: DriverConfig,
    inner: Mutex<Inner<G, R>>,
    handler: ProtocolHandler,
}

/// Snapshot of one managed LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinStatus {
    pub descriptor: PinDescriptor,
    /// Live level, `None` if the pin is not held or could not be read.
    pub level: Option<Level>,
}

/// Snapshot of the whole controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub major: Option<u32>,
    pub session_open: bool,
    pub pins: Vec<PinStatus>,
}

impl<G: GpioController, R: ChannelRegistry> LedController<G, R> {
    /// Claims every configured LED and publishes the control channel.
    ///
    /// Nothing stays claimed or published if any step fails.
    pub fn load(config: DriverConfig, gpio: G, mut registry: R) -> DriverResult<Self> {
        if let Err(err) = config.validate() {
            log::error!("{err}");
            return Err(err.into());
        }

        let mut pins = PinManager::new(gpio, config.label.clone());
        pins.initialize(&config.pins)?;

        log::info!("initializing the controller");
        let channel = match ChannelRegistration::register(&mut registry, &config) {
            Ok(channel) => channel,
            Err(err) => {
                log::error!("{err}");
                pins.rollback();
                return Err(err);
            }
        };

        log::info!("controller loaded");
        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                pins,
                registry,
                channel: Some(channel),
            }),
            handler: ProtocolHandler::new(),
        })
    }

    /// Opens a session on the control channel.
    ///
    /// Only one session may be open at a time; a second open fails with
    /// `Busy` until the first is closed.
    pub fn open(&self) -> DriverResult<Session<'_, G, R>> {
        self.handler.open()?;
        Ok(Session { controller: self })
    }

    /// Unpublishes the control channel, then switches off and releases every
    /// LED. Further calls do nothing.
    pub fn unload(&mut self) {
        let inner = self.inner.get_mut();
        let Some(channel) = inner.channel.take() else {
            return;
        };
        channel.unregister(&mut inner.registry);
        inner.pins.shutdown();
        log::info!("controller unloaded");
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lock().channel.is_some()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn status(&self) -> ControllerStatus {
        let inner = self.inner.lock();
        let pins = inner
            .pins
            .pins()
            .iter()
            .map(|&descriptor| PinStatus {
                descriptor,
                level: descriptor
                    .is_acquired()
                    .then(|| inner.pins.read(descriptor.id().get()).ok())
                    .flatten(),
            })
            .collect();
        ControllerStatus {
            major: inner.channel.as_ref().map(ChannelRegistration::major),
            session_open: self.handler.is_open(),
            pins,
        }
    }

    fn dispatch(&self, command: Command, arg: &mut dyn UserBuffer) -> DriverResult<Reply> {
        let mut inner = self.inner.lock();
        self.handler.dispatch(&mut inner.pins, command, arg)
    }
}

impl<G: GpioController, R: ChannelRegistry> Drop for LedController<G, R> {
    fn drop(&mut self) {
        self.unload();
    }
}

/// An open session on the control channel.
///
/// Closing the session, explicitly or by dropping it, frees the channel for
/// the next caller. The session borrows the controller, so the controller
/// cannot be unloaded while a session is open.
pub struct Session<'a, G: GpioController, R: ChannelRegistry> {
    controller: &'a LedController<G, R>,
}

impl<G: GpioController, R: ChannelRegistry> Session<'_, G, R> {
    /// Raw request: `code` selects the command, `arg` is the caller's record.
    pub fn ioctl(&self, code: u32, arg: &mut dyn UserBuffer) -> DriverResult<Reply> {
        self.controller.dispatch(Command::from_code(code), arg)
    }

    pub fn read_pin(&self, pin: u32) -> DriverResult<PinRecord> {
        let mut buffer = PinRecord::new(pin, 0).to_bytes();
        self.ioctl(Command::READ, &mut buffer)?;
        Ok(PinRecord::from_bytes(buffer))
    }

    pub fn write_pin(&self, pin: u32, value: i32) -> DriverResult<()> {
        let mut buffer = PinRecord::new(pin, value).to_bytes();
        self.ioctl(Command::WRITE, &mut buffer).map(|_| ())
    }

    /// Ends the session.
    pub fn close(self) {}
}

impl<G: GpioController, R: ChannelRegistry> Drop for Session<'_, G, R> {
    fn drop(&mut self) {
        self.controller.handler.close();
    }
}
