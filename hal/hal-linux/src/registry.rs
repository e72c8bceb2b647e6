//! Filesystem-backed control-channel registry

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hal::chardev::{ChannelRegistry, ClassHandle, DeviceHandle};
use hal::error::{HalError, HalResult};

/// Publishes control channels as `<root>/<class>/<device>/dev` entries.
///
/// The `dev` file holds `major:minor`, the same format the kernel uses under
/// `/sys/class/*/*/dev`.
#[derive(Debug)]
pub struct FsRegistry {
    root: PathBuf,
    channels: BTreeMap<u32, String>,
    classes: BTreeMap<u32, PathBuf>,
    devices: BTreeMap<(u32, u32), PathBuf>,
    next_class: u32,
}

impl FsRegistry {
    /// First major handed out by dynamic allocation (start of the local/experimental range).
    pub const FIRST_DYNAMIC_MAJOR: u32 = 240;
    /// Last major of the local/experimental range.
    pub const LAST_DYNAMIC_MAJOR: u32 = 254;

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            channels: BTreeMap::new(),
            classes: BTreeMap::new(),
            devices: BTreeMap::new(),
            next_class: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn remove_quietly(path: &Path, result: io::Result<()>) {
    if let Err(err) = result {
        if err.kind() != io::ErrorKind::NotFound {
            log::warn!("failed to remove {}: {err}", path.display());
        }
    }
}

impl ChannelRegistry for FsRegistry {
    fn register_channel(&mut self, name: &str) -> HalResult<u32> {
        if self.channels.values().any(|existing| existing == name) {
            return Err(HalError::Busy);
        }
        // Lowest free major, so unregistered majors are reused.
        let major = (Self::FIRST_DYNAMIC_MAJOR..=Self::LAST_DYNAMIC_MAJOR)
            .find(|major| !self.channels.contains_key(major))
            .ok_or(HalError::Exhausted)?;
        self.channels.insert(major, name.to_string());
        Ok(major)
    }

    fn unregister_channel(&mut self, major: u32, _name: &str) {
        self.channels.remove(&major);
    }

    fn create_class(&mut self, name: &str) -> HalResult<ClassHandle> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(name);
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(HalError::Busy)
            }
            Err(err) => return Err(err.into()),
        }
        let id = self.next_class;
        self.next_class += 1;
        self.classes.insert(id, path);
        Ok(ClassHandle(id))
    }

    fn destroy_class(&mut self, class: ClassHandle) {
        if let Some(path) = self.classes.remove(&class.0) {
            remove_quietly(&path, fs::remove_dir(&path));
        }
    }

    fn create_device(
        &mut self,
        class: ClassHandle,
        major: u32,
        minor: u32,
        name: &str,
    ) -> HalResult<DeviceHandle> {
        let class_dir = self.classes.get(&class.0).ok_or(HalError::InvalidState)?;
        if !self.channels.contains_key(&major) {
            return Err(HalError::InvalidState);
        }
        let path = class_dir.join(name);
        fs::create_dir(&path)?;
        if let Err(err) = fs::write(path.join("dev"), format!("{major}:{minor}\n")) {
            remove_quietly(&path, fs::remove_dir_all(&path));
            return Err(err.into());
        }
        self.devices.insert((major, minor), path);
        Ok(DeviceHandle(minor))
    }

    fn destroy_device(&mut self, _class: ClassHandle, major: u32, minor: u32) {
        if let Some(path) = self.devices.remove(&(major, minor)) {
            remove_quietly(&path, fs::remove_dir_all(&path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publishes_dev_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FsRegistry::new(dir.path());

        let major = registry.register_channel("ledControllerDev").unwrap();
        let class = registry.create_class("ledControllerCLS").unwrap();
        registry
            .create_device(class, major, 0, "ledControllerDev")
            .unwrap();

        let dev = fs::read_to_string(
            dir.path()
                .join("ledControllerCLS/ledControllerDev/dev"),
        )
        .unwrap();
        assert_eq!(dev, "240:0\n");
    }

    #[test]
    fn test_teardown_removes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FsRegistry::new(dir.path());

        let major = registry.register_channel("dev").unwrap();
        let class = registry.create_class("cls").unwrap();
        registry.create_device(class, major, 0, "dev").unwrap();

        registry.destroy_device(class, major, 0);
        registry.destroy_class(class);
        registry.unregister_channel(major, "dev");
        assert!(!dir.path().join("cls").exists());
    }

    #[test]
    fn test_existing_class_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("cls")).unwrap();
        let mut registry = FsRegistry::new(dir.path());
        assert_eq!(registry.create_class("cls"), Err(HalError::Busy));
    }

    #[test]
    fn test_majors_run_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FsRegistry::new(dir.path());
        let range = FsRegistry::LAST_DYNAMIC_MAJOR - FsRegistry::FIRST_DYNAMIC_MAJOR + 1;
        for index in 0..range {
            registry.register_channel(&format!("dev{index}")).unwrap();
        }
        assert_eq!(registry.register_channel("extra"), Err(HalError::Exhausted));
    }

    #[test]
    fn test_unregistered_major_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = FsRegistry::new(dir.path());
        let range = FsRegistry::LAST_DYNAMIC_MAJOR - FsRegistry::FIRST_DYNAMIC_MAJOR + 1;

        for _ in 0..range * 2 {
            let major = registry.register_channel("ledControllerDev").unwrap();
            assert_eq!(major, FsRegistry::FIRST_DYNAMIC_MAJOR);
            registry.unregister_channel(major, "ledControllerDev");
        }

        let first = registry.register_channel("first").unwrap();
        let second = registry.register_channel("second").unwrap();
        registry.unregister_channel(first, "first");
        assert_eq!(registry.register_channel("third"), Ok(first));
        assert_eq!(second, first + 1);
    }
}
