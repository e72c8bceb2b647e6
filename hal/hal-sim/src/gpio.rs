//! Simulated GPIO controller

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hal::error::{HalError, HalResult};
use hal::gpio::{GpioController, Level};
use parking_lot::Mutex;

/// Operation that can be made to fail with [`SimGpio::inject_fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioStage {
    Request,
    Direction,
    Export,
    Read,
    Write,
}

/// State change recorded by the simulator, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioEvent {
    Request(u32),
    DirectionOutput(u32, Level),
    Set(u32, Level),
    Export(u32),
    Unexport(u32),
    Free(u32),
}

/// A claimed line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimLine {
    pub label: String,
    pub output: bool,
    pub level: Level,
    pub exported: bool,
}

#[derive(Debug)]
struct SimGpioState {
    line_count: u32,
    claimed: BTreeMap<u32, SimLine>,
    driven: BTreeMap<u32, Level>,
    faults: HashMap<(u32, GpioStage), HalError>,
    journal: Vec<GpioEvent>,
}

impl SimGpioState {
    fn fault(&self, pin: u32, stage: GpioStage) -> HalResult<()> {
        match self.faults.get(&(pin, stage)) {
            Some(err) => Err(*err),
            None => Ok(()),
        }
    }

    fn line_mut(&mut self, pin: u32) -> HalResult<&mut SimLine> {
        self.claimed.get_mut(&pin).ok_or(HalError::InvalidState)
    }
}

/// Cloneable handle to a simulated GPIO bank.
#[derive(Debug, Clone)]
pub struct SimGpio {
    state: Arc<Mutex<SimGpioState>>,
}

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimGpio {
    /// Line count of a BCM283x header bank.
    pub const DEFAULT_LINES: u32 = 54;

    pub fn new() -> Self {
        Self::with_lines(Self::DEFAULT_LINES)
    }

    /// Creates a bank with lines `0..line_count`.
    pub fn with_lines(line_count: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimGpioState {
                line_count,
                claimed: BTreeMap::new(),
                driven: BTreeMap::new(),
                faults: HashMap::new(),
                journal: Vec::new(),
            })),
        }
    }

    /// Makes `stage` fail with `err` for `pin` until cleared.
    pub fn inject_fault(&self, pin: u32, stage: GpioStage, err: HalError) {
        self.state.lock().faults.insert((pin, stage), err);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Claims `pin` on behalf of some other consumer.
    pub fn claim_external(&self, pin: u32, label: &str) {
        self.state.lock().claimed.insert(
            pin,
            SimLine {
                label: label.to_string(),
                ..SimLine::default()
            },
        );
    }

    pub fn is_claimed(&self, pin: u32) -> bool {
        self.state.lock().claimed.contains_key(&pin)
    }

    pub fn is_exported(&self, pin: u32) -> bool {
        self.state
            .lock()
            .claimed
            .get(&pin)
            .is_some_and(|line| line.exported)
    }

    pub fn line(&self, pin: u32) -> Option<SimLine> {
        self.state.lock().claimed.get(&pin).cloned()
    }

    /// Current level of a claimed line.
    pub fn level(&self, pin: u32) -> Option<Level> {
        self.state.lock().claimed.get(&pin).map(|line| line.level)
    }

    /// Last level driven onto `pin`, kept after the line is freed.
    pub fn last_driven(&self, pin: u32) -> Option<Level> {
        self.state.lock().driven.get(&pin).copied()
    }

    pub fn claimed_lines(&self) -> Vec<u32> {
        self.state.lock().claimed.keys().copied().collect()
    }

    pub fn journal(&self) -> Vec<GpioEvent> {
        self.state.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }
}

impl GpioController for SimGpio {
    fn request(&mut self, pin: u32, label: &str) -> HalResult<()> {
        let mut state = self.state.lock();
        if pin >= state.line_count {
            return Err(HalError::InvalidParameter);
        }
        state.fault(pin, GpioStage::Request)?;
        if state.claimed.contains_key(&pin) {
            return Err(HalError::Busy);
        }
        state.claimed.insert(
            pin,
            SimLine {
                label: label.to_string(),
                ..SimLine::default()
            },
        );
        state.journal.push(GpioEvent::Request(pin));
        log::trace!("sim gpio{pin}: requested as {label}");
        Ok(())
    }

    fn direction_output(&mut self, pin: u32, initial: Level) -> HalResult<()> {
        let mut state = self.state.lock();
        state.fault(pin, GpioStage::Direction)?;
        let line = state.line_mut(pin)?;
        line.output = true;
        line.level = initial;
        state.driven.insert(pin, initial);
        state.journal.push(GpioEvent::DirectionOutput(pin, initial));
        Ok(())
    }

    fn get_value(&self, pin: u32) -> HalResult<Level> {
        let state = self.state.lock();
        state.fault(pin, GpioStage::Read)?;
        state
            .claimed
            .get(&pin)
            .map(|line| line.level)
            .ok_or(HalError::InvalidState)
    }

    fn set_value(&mut self, pin: u32, level: Level) -> HalResult<()> {
        let mut state = self.state.lock();
        state.fault(pin, GpioStage::Write)?;
        let line = state.line_mut(pin)?;
        if !line.output {
            return Err(HalError::InvalidState);
        }
        line.level = level;
        state.driven.insert(pin, level);
        state.journal.push(GpioEvent::Set(pin, level));
        Ok(())
    }

    fn export(&mut self, pin: u32, _direction_may_change: bool) -> HalResult<()> {
        let mut state = self.state.lock();
        state.fault(pin, GpioStage::Export)?;
        let line = state.line_mut(pin)?;
        if line.exported {
            return Err(HalError::Busy);
        }
        line.exported = true;
        state.journal.push(GpioEvent::Export(pin));
        Ok(())
    }

    fn unexport(&mut self, pin: u32) {
        let mut state = self.state.lock();
        let was_exported = match state.claimed.get_mut(&pin) {
            Some(line) if line.exported => {
                line.exported = false;
                true
            }
            _ => false,
        };
        if was_exported {
            state.journal.push(GpioEvent::Unexport(pin));
        }
    }

    fn free(&mut self, pin: u32) {
        let mut state = self.state.lock();
        if state.claimed.remove(&pin).is_some() {
            state.journal.push(GpioEvent::Free(pin));
            log::trace!("sim gpio{pin}: freed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_exclusive() {
        let mut gpio = SimGpio::new();
        gpio.request(17, "led").unwrap();
        assert_eq!(gpio.request(17, "led"), Err(HalError::Busy));
    }

    #[test]
    fn test_request_out_of_range() {
        let mut gpio = SimGpio::with_lines(8);
        assert_eq!(gpio.request(8, "led"), Err(HalError::InvalidParameter));
        assert!(gpio.claimed_lines().is_empty());
    }

    #[test]
    fn test_set_requires_output() {
        let mut gpio = SimGpio::new();
        gpio.request(4, "led").unwrap();
        assert_eq!(gpio.set_value(4, Level::High), Err(HalError::InvalidState));

        gpio.direction_output(4, Level::Low).unwrap();
        gpio.set_value(4, Level::High).unwrap();
        assert_eq!(gpio.get_value(4), Ok(Level::High));
    }

    #[test]
    fn test_injected_fault() {
        let mut gpio = SimGpio::new();
        gpio.inject_fault(5, GpioStage::Request, HalError::VendorError(-16));
        assert_eq!(gpio.request(5, "led"), Err(HalError::VendorError(-16)));

        gpio.clear_faults();
        assert!(gpio.request(5, "led").is_ok());
    }

    #[test]
    fn test_free_keeps_last_driven_level() {
        let mut gpio = SimGpio::new();
        let probe = gpio.clone();
        gpio.request(27, "led").unwrap();
        gpio.direction_output(27, Level::High).unwrap();
        gpio.export(27, false).unwrap();
        gpio.unexport(27);
        gpio.free(27);

        assert!(!probe.is_claimed(27));
        assert_eq!(probe.last_driven(27), Some(Level::High));
        assert_eq!(
            probe.journal(),
            vec![
                GpioEvent::Request(27),
                GpioEvent::DirectionOutput(27, Level::High),
                GpioEvent::Export(27),
                GpioEvent::Unexport(27),
                GpioEvent::Free(27),
            ]
        );
    }

    #[test]
    fn test_release_of_unclaimed_line_is_silent() {
        let mut gpio = SimGpio::new();
        gpio.unexport(3);
        gpio.free(3);
        assert!(gpio.journal().is_empty());
    }
}
