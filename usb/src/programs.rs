use crate::commands::Command;
use crate::device::ArmCommands;
use log::info;
use std::time::Duration;
use strum::{Display, EnumIter};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub command: Command,
    pub duration: Duration,
}

impl Step {
    pub const fn new(command: Command, duration: Duration) -> Self {
        Self { command, duration }
    }

    const fn millis(command: Command, millis: u64) -> Self {
        Self::new(command, Duration::from_millis(millis))
    }
}

const SMALL: [Step; 5] = [
    Step::millis(Command::BaseLeft, 1000),
    Step::millis(Command::ShoulderDown, 400),
    Step::millis(Command::GripperOpen, 300),
    Step::millis(Command::ElbowDown, 900),
    Step::millis(Command::WristUp, 600),
];

// Undoes SMALL step for step, in the same order.
const REVERSE_SMALL: [Step; 5] = {
    let mut steps = SMALL;
    let mut i = 0;
    while i < steps.len() {
        if let Some(opposite) = SMALL[i].command.opposite() {
            steps[i].command = opposite;
        }
        i += 1;
    }
    steps
};

const VIBRATE_LOOPS: usize = 10;
const VIBRATE_PAUSE: u64 = 100;

const VIBRATE: [Step; 2 * VIBRATE_LOOPS] = {
    let mut steps = [Step::millis(Command::WristUp, VIBRATE_PAUSE); 2 * VIBRATE_LOOPS];
    let mut i = 1;
    while i < steps.len() {
        steps[i] = Step::millis(Command::WristDown, VIBRATE_PAUSE);
        i += 2;
    }
    steps
};

/// The canned movement sequences.
#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq)]
pub enum Program {
    Small,
    ReverseSmall,
    Vibrate,
}

impl Program {
    pub fn steps(&self) -> &'static [Step] {
        match self {
            Program::Small => &SMALL,
            Program::ReverseSmall => &REVERSE_SMALL,
            Program::Vibrate => &VIBRATE,
        }
    }

    pub fn duration(&self) -> Duration {
        self.steps().iter().map(|step| step.duration).sum()
    }

    pub fn run<A: ArmCommands + ?Sized>(&self, arm: &mut A) {
        info!("Running {} program ({:?})", self, self.duration());
        arm.run_steps(self.steps());
    }
}
