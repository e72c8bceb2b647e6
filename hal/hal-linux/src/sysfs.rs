//! Sysfs GPIO implementation

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hal::error::{HalError, HalResult};
use hal::gpio::{GpioController, Level};

/// GPIO lines driven through `/sys/class/gpio`.
///
/// Requesting a line exports it to user space, which is also what makes it
/// visible to other tools; [`export`](GpioController::export) therefore only
/// records that the line is published.
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    requested: BTreeSet<u32>,
    published: BTreeSet<u32>,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsGpio {
    pub const DEFAULT_ROOT: &'static str = "/sys/class/gpio";

    pub fn new() -> Self {
        Self::with_root(Self::DEFAULT_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            requested: BTreeSet::new(),
            published: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{pin}"))
    }

    fn ensure_requested(&self, pin: u32) -> HalResult<()> {
        if self.requested.contains(&pin) {
            Ok(())
        } else {
            Err(HalError::InvalidState)
        }
    }

    fn write_unexport(&self, pin: u32) {
        if let Err(err) = fs::write(self.root.join("unexport"), pin.to_string()) {
            log::warn!("sysfs gpio{pin}: unexport failed: {err}");
        }
    }

    fn write_attr(&self, pin: u32, attr: &str, value: &str) -> HalResult<()> {
        fs::write(self.line_dir(pin).join(attr), value).map_err(HalError::from)
    }
}

impl GpioController for SysfsGpio {
    fn request(&mut self, pin: u32, label: &str) -> HalResult<()> {
        if self.requested.contains(&pin) {
            return Err(HalError::Busy);
        }
        match fs::write(self.root.join("export"), pin.to_string()) {
            Ok(()) => {}
            // The kernel answers EBUSY when the line is already exported.
            Err(err) if err.raw_os_error() == Some(16) => return Err(HalError::Busy),
            Err(err) => return Err(err.into()),
        }
        if !self.line_dir(pin).is_dir() {
            log::warn!("sysfs gpio{pin}: no line directory after export");
            self.write_unexport(pin);
            return Err(HalError::HardwareError);
        }
        self.requested.insert(pin);
        log::debug!("sysfs gpio{pin}: exported for {label}");
        Ok(())
    }

    fn direction_output(&mut self, pin: u32, initial: Level) -> HalResult<()> {
        self.ensure_requested(pin)?;
        // "low"/"high" set direction and initial level in one glitch-free write.
        let direction = match initial {
            Level::Low => "low",
            Level::High => "high",
        };
        self.write_attr(pin, "direction", direction)
    }

    fn get_value(&self, pin: u32) -> HalResult<Level> {
        self.ensure_requested(pin)?;
        let raw = fs::read_to_string(self.line_dir(pin).join("value"))?;
        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            _ => Err(HalError::HardwareError),
        }
    }

    fn set_value(&mut self, pin: u32, level: Level) -> HalResult<()> {
        self.ensure_requested(pin)?;
        self.write_attr(pin, "value", &level.as_raw().to_string())
    }

    fn export(&mut self, pin: u32, _direction_may_change: bool) -> HalResult<()> {
        self.ensure_requested(pin)?;
        if !self.published.insert(pin) {
            return Err(HalError::Busy);
        }
        Ok(())
    }

    fn unexport(&mut self, pin: u32) {
        self.published.remove(&pin);
    }

    fn free(&mut self, pin: u32) {
        if !self.requested.remove(&pin) {
            return;
        }
        self.published.remove(&pin);
        self.write_unexport(pin);
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        let leftover: Vec<u32> = self.requested.iter().copied().collect();
        for pin in leftover {
            log::warn!("sysfs gpio{pin}: still requested on drop, releasing");
            self.free(pin);
        }
    }
}

/// Creates the files the kernel would provide for `pin` under `root`.
#[doc(hidden)]
pub fn fake_line(root: &Path, pin: u32) -> io::Result<()> {
    let dir = root.join(format!("gpio{pin}"));
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("direction"), "in")?;
    fs::write(dir.join("value"), "0")
}
