#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No KSR-10 arm was found")]
    DeviceNotFound,

    #[error("Failed to get device descriptor: {0}")]
    DescriptorUnavailable(rusb::Error),

    #[error("Problems setting configuration: {0}")]
    ConfigurationFailed(rusb::Error),

    #[error("Problems claiming the interface: {0}")]
    InterfaceNotClaimed(rusb::Error),

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),
}

impl ConnectError {
    /// Process exit status for a failed setup.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConnectError::ConfigurationFailed(_) => 1,
            ConnectError::InterfaceNotClaimed(_) => 2,
            ConnectError::DeviceNotFound => 3,
            ConnectError::DescriptorUnavailable(_) => 4,
            ConnectError::UsbError(_) => 5,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error("Short write, {written} of {expected} bytes sent")]
    ShortWrite { written: usize, expected: usize },
}
