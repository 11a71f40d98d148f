use crate::terminal::KeySource;
use anyhow::Result;
use ksr10_usb::{ArmCommands, Command};
use log::{debug, warn};
use std::io::Write;
use std::time::{Duration, Instant};

// Terminal auto-repeat takes a while to kick in, after that keys arrive quickly.
const FIRST_REPEAT_WINDOW: Duration = Duration::from_millis(500);
const REPEAT_WINDOW: Duration = Duration::from_millis(100);

const QUIT: u8 = b'q';
const ESCAPE: u8 = 0x1b;

const HELP: &str = "Move the robot arm using these keys:
w, s: close/open gripper
e, d: move first joint up/down
r, f: move second joint up/down
u, j: move third joint up/down
i, k: rotate base to the right/left
l: switch on/off the light
z, x: mark the last movement as min/max
c: move to half the excursion
q: exit
";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Move(Command),
    ToggleLight,
    MarkMin,
    MarkMax,
    HalfExcursion,
    Quit,
    Ignore,
}

impl KeyAction {
    pub fn from_key(key: u8) -> KeyAction {
        if let Some(command) = Command::from_key(key as char) {
            return KeyAction::Move(command);
        }
        match key {
            b'l' => KeyAction::ToggleLight,
            b'z' => KeyAction::MarkMin,
            b'x' => KeyAction::MarkMax,
            b'c' => KeyAction::HalfExcursion,
            QUIT => KeyAction::Quit,
            _ => KeyAction::Ignore,
        }
    }
}

/// One keypress. Arrow and function keys arrive as several bytes and are kept together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Byte(u8),
    Sequence(Vec<u8>),
}

impl Key {
    pub fn action(&self) -> KeyAction {
        match self {
            Key::Byte(key) => KeyAction::from_key(*key),
            Key::Sequence(_) => KeyAction::Ignore,
        }
    }

    /// Completes a key starting with `first`, taking the rest of an escape sequence from the
    /// bytes already waiting.
    fn read_rest<K: KeySource + ?Sized>(keys: &mut K, first: u8) -> Result<Key> {
        if first != ESCAPE {
            return Ok(Key::Byte(first));
        }

        let mut sequence = vec![ESCAPE];
        if let Some(next) = keys.read_key_timeout(Duration::ZERO)? {
            sequence.push(next);

            // CSI and SS3 run up to a final byte, anything else is Alt plus a single key.
            if next == b'[' || next == b'O' {
                while let Some(byte) = keys.read_key_timeout(Duration::ZERO)? {
                    sequence.push(byte);
                    if (0x40..=0x7e).contains(&byte) {
                        break;
                    }
                }
            }
        }
        Ok(Key::Sequence(sequence))
    }

    fn read<K: KeySource + ?Sized>(keys: &mut K) -> Result<Option<Key>> {
        match keys.read_key()? {
            Some(first) => Key::read_rest(keys, first).map(Some),
            None => Ok(None),
        }
    }

    fn read_timeout<K: KeySource + ?Sized>(keys: &mut K, window: Duration) -> Result<Option<Key>> {
        match keys.read_key_timeout(window)? {
            Some(first) => Key::read_rest(keys, first).map(Some),
            None => Ok(None),
        }
    }
}

pub struct Session<W: Write> {
    out: W,
    light: bool,
    min: Duration,
    max: Duration,
    last: Duration,
    pending: Option<Key>,
}

impl<W: Write> Session<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            light: false,
            min: Duration::ZERO,
            max: Duration::ZERO,
            last: Duration::ZERO,
            pending: None,
        }
    }

    pub fn run<A, K>(&mut self, arm: &mut A, keys: &mut K) -> Result<()>
    where
        A: ArmCommands + ?Sized,
        K: KeySource + ?Sized,
    {
        writeln!(self.out, "{}", HELP)?;
        self.out.flush()?;

        loop {
            let key = match self.pending.take() {
                Some(key) => key,
                None => match Key::read(keys)? {
                    Some(key) => key,
                    None => break,
                },
            };

            if key.action() == KeyAction::Quit {
                break;
            }
            self.handle_key(arm, keys, key)?;
        }

        // Never leave a motor running on the way out.
        if let Err(error) = arm.reset() {
            warn!("Unable to stop the arm: {}", error);
        }
        Ok(())
    }

    fn handle_key<A, K>(&mut self, arm: &mut A, keys: &mut K, key: Key) -> Result<()>
    where
        A: ArmCommands + ?Sized,
        K: KeySource + ?Sized,
    {
        let start = Instant::now();
        let action = key.action();
        debug!("Key {:?} -> {:?}", key, action);

        match action {
            KeyAction::Move(command) => report(arm.send_command(command)),
            KeyAction::ToggleLight => {
                if self.light {
                    report(arm.send_command(Command::Reset));
                } else {
                    report(arm.send_command(Command::Light));
                }
                self.light = !self.light;
            }
            KeyAction::MarkMin => {
                self.min = self.last;
                writeln!(self.out, "Time from min to max = {:.9}", self.min.as_secs_f64())?;
            }
            KeyAction::MarkMax => {
                self.max = self.last;
                writeln!(self.out, "Time from max to min = {:.9}", self.max.as_secs_f64())?;
            }
            KeyAction::HalfExcursion => {
                writeln!(self.out, "Moving to half the excursion")?;
                self.out.flush()?;
                report(arm.pulse(Command::ShoulderUp, (self.min + self.max) / 4));
            }
            KeyAction::Quit | KeyAction::Ignore => {}
        }

        self.suppress_repeats(keys, key)?;

        report(arm.reset());
        if self.light {
            report(arm.send_command(Command::Light));
        }

        self.last = start.elapsed();
        writeln!(self.out, "Time: {:.9}", self.last.as_secs_f64())?;
        self.out.flush()?;
        Ok(())
    }

    /// Swallows the auto-repeats of a held key, returning once it has been released. A
    /// different key pressed meanwhile is kept for the next round.
    fn suppress_repeats<K: KeySource + ?Sized>(&mut self, keys: &mut K, key: Key) -> Result<()> {
        let mut window = FIRST_REPEAT_WINDOW;
        while let Some(next) = Key::read_timeout(keys, window)? {
            if next != key {
                self.pending = Some(next);
                break;
            }
            window = REPEAT_WINDOW;
        }
        Ok(())
    }
}

fn report(result: Result<(), ksr10_usb::error::CommandError>) {
    if let Err(error) = result {
        warn!("Command failed: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksr10_usb::error::CommandError;
    use ksr10_usb::ExecutableArm;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<Command>,
    }

    impl ExecutableArm for Recorder {
        fn write_payload(&mut self, payload: &[u8; 3]) -> Result<(), CommandError> {
            let command = match payload {
                [0x00, 0x00, 0x00] => Command::Reset,
                [0x01, 0x00, 0x00] => Command::GripperClose,
                [0x02, 0x00, 0x00] => Command::GripperOpen,
                [0x04, 0x00, 0x00] => Command::WristUp,
                [0x08, 0x00, 0x00] => Command::WristDown,
                [0x10, 0x00, 0x00] => Command::ElbowUp,
                [0x20, 0x00, 0x00] => Command::ElbowDown,
                [0x40, 0x00, 0x00] => Command::ShoulderUp,
                [0x80, 0x00, 0x00] => Command::ShoulderDown,
                [0x00, 0x01, 0x00] => Command::BaseRight,
                [0x00, 0x02, 0x00] => Command::BaseLeft,
                [0x00, 0x00, 0xff] => Command::Light,
                other => panic!("Unexpected payload {:02x?}", other),
            };
            self.sent.push(command);
            Ok(())
        }
    }

    /// Keys typed ahead of time. `None` is a repeat window passing with no key.
    struct Script {
        keys: VecDeque<Option<u8>>,
        windows: Vec<Duration>,
    }

    impl Script {
        fn new(keys: &[Option<u8>]) -> Self {
            Self {
                keys: keys.iter().copied().collect(),
                windows: Vec::new(),
            }
        }
    }

    impl KeySource for Script {
        fn read_key(&mut self) -> Result<Option<u8>> {
            while let Some(entry) = self.keys.pop_front() {
                if entry.is_some() {
                    return Ok(entry);
                }
            }
            Ok(None)
        }

        fn read_key_timeout(&mut self, timeout: Duration) -> Result<Option<u8>> {
            self.windows.push(timeout);
            Ok(self.keys.pop_front().flatten())
        }
    }

    fn run(keys: &[Option<u8>]) -> (Vec<Command>, Script, String) {
        let mut arm = Recorder::default();
        let mut script = Script::new(keys);
        let mut out = Vec::new();
        Session::new(&mut out).run(&mut arm, &mut script).unwrap();
        (arm.sent, script, String::from_utf8(out).unwrap())
    }

    #[test]
    fn key_actions() {
        assert_eq!(KeyAction::from_key(b'w'), KeyAction::Move(Command::GripperClose));
        assert_eq!(KeyAction::from_key(b'j'), KeyAction::Move(Command::ShoulderDown));
        assert_eq!(KeyAction::from_key(b'l'), KeyAction::ToggleLight);
        assert_eq!(KeyAction::from_key(b'z'), KeyAction::MarkMin);
        assert_eq!(KeyAction::from_key(b'x'), KeyAction::MarkMax);
        assert_eq!(KeyAction::from_key(b'c'), KeyAction::HalfExcursion);
        assert_eq!(KeyAction::from_key(b'q'), KeyAction::Quit);
        assert_eq!(KeyAction::from_key(b'?'), KeyAction::Ignore);
    }

    #[test]
    fn movement_is_followed_by_reset() {
        let (sent, _, out) = run(&[Some(b'e'), None, Some(b'q')]);
        assert_eq!(sent, vec![Command::WristUp, Command::Reset, Command::Reset]);
        assert!(out.starts_with("Move the robot arm using these keys:"));
        assert_eq!(out.matches("Time: ").count(), 1);
    }

    #[test]
    fn held_key_is_sent_once() {
        let (sent, script, _) = run(&[Some(b'i'), Some(b'i'), Some(b'i'), None, Some(b'q')]);
        assert_eq!(sent, vec![Command::BaseRight, Command::Reset, Command::Reset]);
        assert_eq!(
            script.windows,
            vec![FIRST_REPEAT_WINDOW, REPEAT_WINDOW, REPEAT_WINDOW]
        );
    }

    #[test]
    fn other_key_during_repeat_window_is_kept() {
        let (sent, _, _) = run(&[Some(b'e'), Some(b'd'), None, Some(b'q')]);
        assert_eq!(
            sent,
            vec![
                Command::WristUp,
                Command::Reset,
                Command::WristDown,
                Command::Reset,
                Command::Reset
            ]
        );
    }

    #[test]
    fn quit_during_repeat_window_ends_session() {
        let (sent, _, _) = run(&[Some(b'r'), Some(b'q'), Some(b'f')]);
        assert_eq!(sent, vec![Command::ElbowUp, Command::Reset, Command::Reset]);
    }

    #[test]
    fn light_toggles_and_survives_resets() {
        let (sent, _, _) = run(&[
            Some(b'l'),
            None,
            Some(b'w'),
            None,
            Some(b'l'),
            None,
            Some(b'q'),
        ]);
        assert_eq!(
            sent,
            vec![
                Command::Light,
                Command::Reset,
                Command::Light,
                Command::GripperClose,
                Command::Reset,
                Command::Light,
                Command::Reset,
                Command::Reset,
                Command::Reset,
            ]
        );
    }

    #[test]
    fn unbound_key_still_resets() {
        let (sent, _, out) = run(&[Some(b'p'), None, Some(b'q')]);
        assert_eq!(sent, vec![Command::Reset, Command::Reset]);
        assert_eq!(out.matches("Time: ").count(), 1);
    }

    #[test]
    fn marks_and_half_excursion() {
        let (sent, _, out) = run(&[Some(b'z'), None, Some(b'x'), None, Some(b'c'), None]);
        assert!(out.contains("Time from min to max = "));
        assert!(out.contains("Time from max to min = "));
        assert!(out.contains("Moving to half the excursion"));
        assert_eq!(
            sent,
            vec![
                Command::Reset,
                Command::Reset,
                Command::ShoulderUp,
                Command::Reset,
                Command::Reset,
                Command::Reset,
            ]
        );
    }

    #[test]
    fn arrow_key_is_one_keypress() {
        let (sent, _, out) = run(&[Some(ESCAPE), Some(b'['), Some(b'A'), None, Some(b'q')]);
        assert_eq!(sent, vec![Command::Reset, Command::Reset]);
        assert_eq!(out.matches("Time: ").count(), 1);
    }

    #[test]
    fn held_arrow_key_is_one_keypress() {
        let (sent, _, out) = run(&[
            Some(ESCAPE),
            Some(b'['),
            Some(b'D'),
            Some(ESCAPE),
            Some(b'['),
            Some(b'D'),
            None,
            Some(b'q'),
        ]);
        assert_eq!(sent, vec![Command::Reset, Command::Reset]);
        assert_eq!(out.matches("Time: ").count(), 1);
    }

    #[test]
    fn function_key_then_movement() {
        let (sent, _, _) = run(&[
            Some(ESCAPE),
            Some(b'['),
            Some(b'1'),
            Some(b'5'),
            Some(b'~'),
            Some(b'e'),
            None,
            Some(b'q'),
        ]);
        assert_eq!(
            sent,
            vec![
                Command::Reset,
                Command::WristUp,
                Command::Reset,
                Command::Reset
            ]
        );
    }

    #[test]
    fn lone_escape_is_ignored() {
        let (sent, _, _) = run(&[Some(ESCAPE), None, None, Some(b'q')]);
        assert_eq!(sent, vec![Command::Reset, Command::Reset]);
    }

    #[test]
    fn escape_sequences_are_ignored() {
        assert_eq!(Key::Sequence(vec![ESCAPE, b'O', b'P']).action(), KeyAction::Ignore);
        assert_eq!(Key::Byte(b'k').action(), KeyAction::Move(Command::BaseLeft));
    }
}
