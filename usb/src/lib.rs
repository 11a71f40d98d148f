pub use rusb;
pub mod commands;
pub mod device;
pub mod devices;
pub mod error;
pub mod ksr10;
pub mod programs;

pub use crate::commands::Command;
pub use crate::device::{ArmCommands, ExecutableArm};
pub use crate::devices::{PID_KSR10, VID_KSR10};
pub use crate::ksr10::KSR10;
