// Discovery works in two halves: `find_devices` talks to libusb and logs everything it sees,
// `select_device` decides which of those is the arm and never touches USB itself.
use crate::error::ConnectError;
use log::{debug, info};
use rusb::{Device, DeviceDescriptor, UsbContext};

pub const VID_KSR10: u16 = 0x1267;
pub const PID_KSR10: u16 = 0x0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmDevice {
    pub bus_number: u8,
    pub address: u8,
}

/// Picks the last candidate whose ids match. When more than one arm is attached, the device
/// enumerated last wins.
pub fn select_device<D, I>(candidates: I, vendor_id: u16, product_id: u16) -> Option<D>
where
    I: IntoIterator<Item = (D, u16, u16)>,
{
    candidates
        .into_iter()
        .filter(|(_, vid, pid)| *vid == vendor_id && *pid == product_id)
        .last()
        .map(|(device, _, _)| device)
}

/// Reads the descriptor of every enumerated device, logging each one.
pub(crate) fn scan<T: UsbContext>(
    context: &T,
) -> Result<Vec<(Device<T>, DeviceDescriptor)>, ConnectError> {
    let devices = context.devices()?;
    let mut scanned = Vec::with_capacity(devices.len());

    for device in devices.iter() {
        let descriptor = device
            .device_descriptor()
            .map_err(ConnectError::DescriptorUnavailable)?;

        info!(
            "{:04x}:{:04x} (bus {}, device {})",
            descriptor.vendor_id(),
            descriptor.product_id(),
            device.bus_number(),
            device.address()
        );
        scanned.push((device, descriptor));
    }

    debug!("Scanned {} USB devices", scanned.len());
    Ok(scanned)
}

/// Locates the arm among the devices attached to the given context.
pub(crate) fn locate<T: UsbContext>(
    context: &T,
) -> Result<(Device<T>, DeviceDescriptor), ConnectError> {
    let scanned = scan(context)?;
    let candidates = scanned.into_iter().map(|(device, descriptor)| {
        let vendor_id = descriptor.vendor_id();
        let product_id = descriptor.product_id();
        ((device, descriptor), vendor_id, product_id)
    });

    let found = select_device(candidates, VID_KSR10, PID_KSR10).ok_or(ConnectError::DeviceNotFound)?;
    info!("---> KSR-10 arm found!");
    Ok(found)
}

/// Every attached KSR-10, by location.
pub fn find_devices() -> Result<Vec<ArmDevice>, ConnectError> {
    let scanned = scan(&rusb::GlobalContext::default())?;

    Ok(scanned
        .iter()
        .filter(|(_, descriptor)| {
            descriptor.vendor_id() == VID_KSR10 && descriptor.product_id() == PID_KSR10
        })
        .map(|(device, _)| ArmDevice {
            bus_number: device.bus_number(),
            address: device.address(),
        })
        .collect())
}
