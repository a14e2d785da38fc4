//! Named virtual devices and index resolution.

use crate::error::VirtualDeviceError;

/// One entry in a virtual host's device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDeviceInfo {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
}

/// Fixed list of devices a virtual host exposes. The first is the default.
#[derive(Debug, Clone)]
pub struct DeviceList {
    devices: Vec<VirtualDeviceInfo>,
}

impl DeviceList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let devices = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| VirtualDeviceInfo {
                index,
                name: name.into(),
                is_default: index == 0,
            })
            .collect();
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn list(&self) -> &[VirtualDeviceInfo] {
        &self.devices
    }

    /// Look up `index`, or the default device for `None`.
    pub fn resolve(&self, index: Option<usize>) -> Result<&VirtualDeviceInfo, VirtualDeviceError> {
        let wanted = index.unwrap_or(0);
        self.devices
            .get(wanted)
            .ok_or(VirtualDeviceError::NoSuchDevice {
                index: wanted,
                available: self.devices.len(),
            })
    }
}
