use crate::commands::Command;
use crate::error::CommandError;
use crate::programs::Step;
use log::{debug, warn};
use std::thread::sleep;
use std::time::Duration;

pub trait ExecutableArm {
    fn write_payload(&mut self, payload: &[u8; 3]) -> Result<(), CommandError>;
}

// Everything the arm can do, built on top of write_payload..
pub trait ArmCommands: ExecutableArm {
    fn send_command(&mut self, command: Command) -> Result<(), CommandError> {
        debug!("Sending {} {:02x?}", command, command.payload());
        self.write_payload(&command.payload())
    }

    fn reset(&mut self) -> Result<(), CommandError> {
        self.send_command(Command::Reset)
    }

    /// Runs a motor for `duration`, then stops everything. The reset is sent even if the
    /// command itself failed to go through.
    fn pulse(&mut self, command: Command, duration: Duration) -> Result<(), CommandError> {
        let sent = self.send_command(command);
        if sent.is_ok() {
            sleep(duration);
        }
        let reset = self.reset();
        sent.and(reset)
    }

    /// Pulses each step in order. A failed transfer is logged and the sequence carries on.
    fn run_steps(&mut self, steps: &[Step]) {
        for step in steps {
            if let Err(error) = self.pulse(step.command, step.duration) {
                warn!("Failed to run {} for {:?}: {}", step.command, step.duration, error);
            }
        }
    }
}

impl<T: ExecutableArm + ?Sized> ArmCommands for T {}
