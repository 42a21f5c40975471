use crate::{
    bridge::{DeviceDescriptor, NativeBridge},
    MidiError, Result,
};
use std::sync::Arc;

/// Read-only view over the input endpoints of a bridge.
///
/// Nothing is cached. Indices are positional and only hold for the listing
/// they came from.
#[derive(Clone)]
pub struct DeviceDirectory {
    bridge: Arc<dyn NativeBridge>,
}

impl DeviceDirectory {
    pub fn new(bridge: Arc<dyn NativeBridge>) -> Self {
        Self { bridge }
    }

    pub fn list(&self) -> Result<Vec<DeviceDescriptor>> {
        let devices = self.bridge.enumerate().map_err(|e| {
            log::error!("[ MIDI ] : failed to list devices : {e}");
            e
        })?;

        if devices.is_empty() {
            log::warn!("[ MIDI ] : {}", MidiError::NoDevicesFound);
            return Err(MidiError::NoDevicesFound);
        }

        Ok(devices)
    }

    /// Check `id` against the current listing.
    pub fn validate(&self, id: usize) -> Result<DeviceDescriptor> {
        let mut devices = self.bridge.enumerate()?;
        let count = devices.len();

        if id >= count {
            log::error!("[ MIDI ] : invalid device {id}, {count} available");
            return Err(MidiError::InvalidDevice { id, count });
        }

        Ok(devices.swap_remove(id))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bridge::fake::FakeBridge;

    fn directory(names: &[&str]) -> (Arc<FakeBridge>, DeviceDirectory) {
        let bridge = Arc::new(FakeBridge::with_devices(names));
        (bridge.clone(), DeviceDirectory::new(bridge))
    }

    #[test]
    fn lists_every_device_in_order() {
        let (_, directory) = directory(&["a", "b"]);
        let names: Vec<_> = directory
            .list()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn an_empty_listing_is_reported() {
        let (_, directory) = directory(&[]);
        assert_eq!(directory.list(), Err(MidiError::NoDevicesFound));
        assert_eq!(
            directory.validate(0),
            Err(MidiError::InvalidDevice { id: 0, count: 0 })
        );
    }

    #[test]
    fn enumeration_failures_are_propagated() {
        let (bridge, directory) = directory(&["a"]);
        bridge.fail_enumerate(true);
        assert!(matches!(directory.list(), Err(MidiError::Enumeration(_))));
    }

    #[test]
    fn listings_are_never_cached() {
        let (bridge, directory) = directory(&["a"]);
        assert_eq!(directory.list().unwrap().len(), 1);
        bridge.set_devices(&["a", "b", "c"]);
        assert_eq!(directory.list().unwrap().len(), 3);
        assert_eq!(directory.validate(2).unwrap().name, "c");
    }

    #[test]
    fn one_past_the_end_is_invalid() {
        let (_, directory) = directory(&["a", "b"]);
        assert_eq!(
            directory.validate(2),
            Err(MidiError::InvalidDevice { id: 2, count: 2 })
        );
        assert_eq!(directory.validate(1).unwrap().name, "b");
    }
}
