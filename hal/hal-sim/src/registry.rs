//! Simulated control-channel registry

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hal::chardev::{ChannelRegistry, ClassHandle, DeviceHandle};
use hal::error::{HalError, HalResult};
use parking_lot::Mutex;

/// Registration step that can be made to fail with [`SimRegistry::inject_fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryStage {
    Channel,
    Class,
    Device,
}

/// State change recorded by the registry, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    ChannelRegistered { major: u32, name: String },
    ChannelUnregistered { major: u32 },
    ClassCreated(String),
    ClassDestroyed(String),
    DeviceCreated { major: u32, minor: u32, name: String },
    DeviceDestroyed { major: u32, minor: u32 },
}

#[derive(Debug)]
struct RegistryState {
    next_major: u32,
    next_class: u32,
    channels: BTreeMap<u32, String>,
    classes: BTreeMap<u32, String>,
    devices: BTreeMap<(u32, u32), (ClassHandle, String)>,
    faults: HashMap<RegistryStage, HalError>,
    journal: Vec<RegistryEvent>,
}

impl RegistryState {
    fn fault(&self, stage: RegistryStage) -> HalResult<()> {
        match self.faults.get(&stage) {
            Some(err) => Err(*err),
            None => Ok(()),
        }
    }
}

/// Cloneable handle to a simulated channel registry.
#[derive(Debug, Clone)]
pub struct SimRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl Default for SimRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRegistry {
    /// First major handed out by dynamic allocation.
    pub const FIRST_DYNAMIC_MAJOR: u32 = 240;

    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                next_major: Self::FIRST_DYNAMIC_MAJOR,
                next_class: 0,
                channels: BTreeMap::new(),
                classes: BTreeMap::new(),
                devices: BTreeMap::new(),
                faults: HashMap::new(),
                journal: Vec::new(),
            })),
        }
    }

    pub fn inject_fault(&self, stage: RegistryStage, err: HalError) {
        self.state.lock().faults.insert(stage, err);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.state.lock().channels.values().cloned().collect()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.state.lock().classes.values().cloned().collect()
    }

    pub fn device_names(&self) -> Vec<String> {
        self.state
            .lock()
            .devices
            .values()
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// True when nothing is published.
    pub fn is_empty(&self) -> bool {
        let state = self.state.lock();
        state.channels.is_empty() && state.classes.is_empty() && state.devices.is_empty()
    }

    pub fn journal(&self) -> Vec<RegistryEvent> {
        self.state.lock().journal.clone()
    }
}

impl ChannelRegistry for SimRegistry {
    fn register_channel(&mut self, name: &str) -> HalResult<u32> {
        let mut state = self.state.lock();
        state.fault(RegistryStage::Channel)?;
        if state.channels.values().any(|existing| existing == name) {
            return Err(HalError::Busy);
        }
        let major = state.next_major;
        state.next_major = major.checked_add(1).ok_or(HalError::Exhausted)?;
        state.channels.insert(major, name.to_string());
        state.journal.push(RegistryEvent::ChannelRegistered {
            major,
            name: name.to_string(),
        });
        Ok(major)
    }

    fn unregister_channel(&mut self, major: u32, _name: &str) {
        let mut state = self.state.lock();
        if state.channels.remove(&major).is_some() {
            state.journal.push(RegistryEvent::ChannelUnregistered { major });
        }
    }

    fn create_class(&mut self, name: &str) -> HalResult<ClassHandle> {
        let mut state = self.state.lock();
        state.fault(RegistryStage::Class)?;
        if state.classes.values().any(|existing| existing == name) {
            return Err(HalError::Busy);
        }
        let id = state.next_class;
        state.next_class += 1;
        state.classes.insert(id, name.to_string());
        state
            .journal
            .push(RegistryEvent::ClassCreated(name.to_string()));
        Ok(ClassHandle(id))
    }

    fn destroy_class(&mut self, class: ClassHandle) {
        let mut state = self.state.lock();
        if let Some(name) = state.classes.remove(&class.0) {
            state.journal.push(RegistryEvent::ClassDestroyed(name));
        }
    }

    fn create_device(
        &mut self,
        class: ClassHandle,
        major: u32,
        minor: u32,
        name: &str,
    ) -> HalResult<DeviceHandle> {
        let mut state = self.state.lock();
        state.fault(RegistryStage::Device)?;
        if !state.classes.contains_key(&class.0) || !state.channels.contains_key(&major) {
            return Err(HalError::InvalidState);
        }
        if state.devices.contains_key(&(major, minor)) {
            return Err(HalError::Busy);
        }
        state
            .devices
            .insert((major, minor), (class, name.to_string()));
        state.journal.push(RegistryEvent::DeviceCreated {
            major,
            minor,
            name: name.to_string(),
        });
        Ok(DeviceHandle(minor))
    }

    fn destroy_device(&mut self, _class: ClassHandle, major: u32, minor: u32) {
        let mut state = self.state.lock();
        if state.devices.remove(&(major, minor)).is_some() {
            state
                .journal
                .push(RegistryEvent::DeviceDestroyed { major, minor });
        }
    }
}
