use rusb::{Direction, Recipient, RequestType};
use std::time::Duration;
use strum::{Display, EnumIter};

// Every command is a single vendor request addressed to the device itself.
pub const REQUEST: u8 = 0x06;
pub const VALUE: u16 = 0x0100;
pub const INDEX: u16 = 0x0000;
pub const PAYLOAD_LENGTH: usize = 3;
pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(10);

/// bmRequestType for a command, 0x40.
pub fn request_type() -> u8 {
    rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device)
}

/// The motor and light states the arm understands.
///
/// Byte 0 drives the gripper, wrist, elbow and shoulder motors (two bits each, one per
/// direction), byte 1 the base, and byte 2 the light. Only one bit is set per command.
#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq, Hash)]
pub enum Command {
    Reset,
    GripperClose,
    GripperOpen,
    WristUp,
    WristDown,
    ElbowUp,
    ElbowDown,
    ShoulderUp,
    ShoulderDown,
    BaseRight,
    BaseLeft,
    Light,
}

impl Command {
    pub fn payload(&self) -> [u8; PAYLOAD_LENGTH] {
        match self {
            Command::Reset => [0x00, 0x00, 0x00],
            Command::GripperClose => [0x01, 0x00, 0x00],
            Command::GripperOpen => [0x02, 0x00, 0x00],
            Command::WristUp => [0x04, 0x00, 0x00],
            Command::WristDown => [0x08, 0x00, 0x00],
            Command::ElbowUp => [0x10, 0x00, 0x00],
            Command::ElbowDown => [0x20, 0x00, 0x00],
            Command::ShoulderUp => [0x40, 0x00, 0x00],
            Command::ShoulderDown => [0x80, 0x00, 0x00],
            Command::BaseRight => [0x00, 0x01, 0x00],
            Command::BaseLeft => [0x00, 0x02, 0x00],
            Command::Light => [0x00, 0x00, 0xff],
        }
    }

    /// The keyboard binding for a movement. The light has its own toggle, so `l` isn't here.
    pub fn from_key(key: char) -> Option<Command> {
        match key {
            'w' => Some(Command::GripperClose),
            's' => Some(Command::GripperOpen),
            'e' => Some(Command::WristUp),
            'd' => Some(Command::WristDown),
            'r' => Some(Command::ElbowUp),
            'f' => Some(Command::ElbowDown),
            'u' => Some(Command::ShoulderUp),
            'j' => Some(Command::ShoulderDown),
            'i' => Some(Command::BaseRight),
            'k' => Some(Command::BaseLeft),
            _ => None,
        }
    }

    /// The command driving the same motor the other way, if there is one.
    pub const fn opposite(&self) -> Option<Command> {
        match self {
            Command::GripperClose => Some(Command::GripperOpen),
            Command::GripperOpen => Some(Command::GripperClose),
            Command::WristUp => Some(Command::WristDown),
            Command::WristDown => Some(Command::WristUp),
            Command::ElbowUp => Some(Command::ElbowDown),
            Command::ElbowDown => Some(Command::ElbowUp),
            Command::ShoulderUp => Some(Command::ShoulderDown),
            Command::ShoulderDown => Some(Command::ShoulderUp),
            Command::BaseRight => Some(Command::BaseLeft),
            Command::BaseLeft => Some(Command::BaseRight),
            Command::Reset | Command::Light => None,
        }
    }
}
