use crate::commands::{request_type, INDEX, PAYLOAD_LENGTH, REQUEST, TRANSFER_TIMEOUT, VALUE};
use crate::device::ExecutableArm;
use crate::devices;
use crate::error::{CommandError, ConnectError};
use log::{debug, info, warn};
use rusb::{Device, DeviceDescriptor, DeviceHandle, GlobalContext, UsbContext};
use std::time::Duration;

const CONFIGURATION: u8 = 1;
const INTERFACE: u8 = 0;

#[derive(Debug)]
pub struct KSR10<T: UsbContext> {
    handle: DeviceHandle<T>,
    device: Device<T>,
    device_descriptor: DeviceDescriptor,
    timeout: Duration,
}

impl KSR10<GlobalContext> {
    pub fn open() -> Result<Self, ConnectError> {
        Self::open_with_context(&GlobalContext::default())
    }
}

impl<T: UsbContext> KSR10<T> {
    pub fn open_with_context(context: &T) -> Result<Self, ConnectError> {
        info!("Trying to locate the KSR arm...");
        let (device, device_descriptor) = devices::locate(context)?;
        let handle = device.open()?;
        Self::from_device(handle, device_descriptor)
    }

    pub fn from_device(
        handle: DeviceHandle<T>,
        device_descriptor: DeviceDescriptor,
    ) -> Result<Self, ConnectError> {
        let device = handle.device();
        info!("Connected to KSR-10 arm at {:?}", device);

        match handle.active_configuration() {
            Ok(configuration) => info!("Current configuration: {}", configuration),
            Err(error) => warn!("Unable to read current configuration: {}", error),
        }

        handle
            .set_active_configuration(CONFIGURATION)
            .map_err(ConnectError::ConfigurationFailed)?;
        if let Ok(configuration) = handle.active_configuration() {
            info!("Configuration set to {}", configuration);
        }

        // Not every platform can detach drivers, in which case we just try the claim anyway.
        if let Err(error) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", error);
        }

        handle
            .claim_interface(INTERFACE)
            .map_err(ConnectError::InterfaceNotClaimed)?;
        info!("Interface claimed!");

        Ok(Self {
            handle,
            device,
            device_descriptor,
            timeout: TRANSFER_TIMEOUT,
        })
    }

    pub fn usb_device_descriptor(&self) -> &DeviceDescriptor {
        &self.device_descriptor
    }

    pub fn usb_bus_number(&self) -> u8 {
        self.device.bus_number()
    }

    pub fn usb_address(&self) -> u8 {
        self.device.address()
    }
}

impl<T: UsbContext> ExecutableArm for KSR10<T> {
    fn write_payload(&mut self, payload: &[u8; PAYLOAD_LENGTH]) -> Result<(), CommandError> {
        let written = self.handle.write_control(
            request_type(),
            REQUEST,
            VALUE,
            INDEX,
            payload,
            self.timeout,
        )?;
        check_written(written)
    }
}

fn check_written(written: usize) -> Result<(), CommandError> {
    if written != PAYLOAD_LENGTH {
        return Err(CommandError::ShortWrite {
            written,
            expected: PAYLOAD_LENGTH,
        });
    }
    Ok(())
}

impl<T: UsbContext> Drop for KSR10<T> {
    fn drop(&mut self) {
        debug!("Releasing KSR-10 at {:?}", self.device);
        if let Err(error) = self.handle.release_interface(INTERFACE) {
            warn!("Unable to release interface: {}", error);
        }
    }
}
