use anyhow::{Context, Result};
use log::{debug, warn};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use std::ffi::c_int;
use std::io::{stdin, Stdin};
use std::os::fd::AsFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub trait KeySource {
    /// Blocks until a key arrives. `None` once input is closed or Ctrl-C was pressed.
    fn read_key(&mut self) -> Result<Option<u8>>;

    /// Waits at most `timeout` for a key.
    fn read_key_timeout(&mut self, timeout: Duration) -> Result<Option<u8>>;
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_: c_int) {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

/// Turns SIGINT into a flag for as long as it's held, so Ctrl-C ends input instead of
/// killing the process with a motor running and the terminal still in cbreak mode.
pub struct InterruptGuard {
    previous: SigAction,
}

impl InterruptGuard {
    pub fn install() -> Result<Self> {
        INTERRUPTED.store(false, Ordering::Relaxed);

        // No SA_RESTART, a blocked poll() has to come back with EINTR.
        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::empty(),
            SigSet::empty(),
        );
        let previous = unsafe { sigaction(Signal::SIGINT, &action) }
            .context("Unable to install the Ctrl-C handler")?;
        Ok(Self { previous })
    }

    pub fn interrupted(&self) -> bool {
        INTERRUPTED.load(Ordering::Relaxed)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if let Err(error) = unsafe { sigaction(Signal::SIGINT, &self.previous) } {
            warn!("Unable to restore the Ctrl-C handler: {}", error);
        }
    }
}

/// poll(2) takes at most u16::MAX milliseconds, longer windows are cut short.
fn window_millis(window: Duration) -> u16 {
    u16::try_from(window.as_millis()).unwrap_or(u16::MAX)
}

/// Reads single bytes straight from a descriptor. std's buffered stdin would swallow keys
/// poll() should see.
pub struct KeyReader<F: AsFd> {
    fd: F,
    interrupt: Option<InterruptGuard>,
}

impl<F: AsFd> KeyReader<F> {
    pub fn new(fd: F) -> Self {
        Self {
            fd,
            interrupt: None,
        }
    }

    pub fn with_interrupt(fd: F, interrupt: InterruptGuard) -> Self {
        Self {
            fd,
            interrupt: Some(interrupt),
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(InterruptGuard::interrupted)
    }

    /// Whether input is ready. Signals other than Ctrl-C resume the wait for whatever is left
    /// of the window.
    fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if self.interrupted() {
                return Ok(false);
            }

            let poll_timeout = match deadline {
                Some(deadline) => PollTimeout::from(window_millis(
                    deadline.saturating_duration_since(Instant::now()),
                )),
                None => PollTimeout::NONE,
            };

            let mut fds = [PollFd::new(self.fd.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, poll_timeout) {
                Ok(ready) => return Ok(ready > 0),
                Err(Errno::EINTR) => continue,
                Err(error) => return Err(error).context("Unable to poll the terminal"),
            }
        }
    }

    fn read_byte(&self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match nix::unistd::read(self.fd.as_fd(), &mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(Errno::EINTR) if self.interrupted() => return Ok(None),
                Err(Errno::EINTR) => continue,
                Err(error) => return Err(error).context("Unable to read from the terminal"),
            }
        }
    }
}

impl<F: AsFd> KeySource for KeyReader<F> {
    fn read_key(&mut self) -> Result<Option<u8>> {
        if !self.wait(None)? {
            return Ok(None);
        }
        self.read_byte()
    }

    fn read_key_timeout(&mut self, timeout: Duration) -> Result<Option<u8>> {
        if !self.wait(Some(timeout))? {
            return Ok(None);
        }
        self.read_byte()
    }
}

/// Holds stdin in cbreak mode (no line buffering, no echo, Ctrl-C still delivered) until
/// dropped.
pub struct RawTerminal {
    saved: Termios,
    keys: KeyReader<Stdin>,
}

impl RawTerminal {
    pub fn enable() -> Result<Self> {
        let stdin = stdin();
        let saved = tcgetattr(stdin.as_fd()).context("Unable to read terminal settings")?;

        let mut cbreak = saved.clone();
        cbreak.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        cbreak.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        cbreak.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        let interrupt = InterruptGuard::install()?;
        tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &cbreak)
            .context("Unable to switch the terminal to cbreak mode")?;
        debug!("Terminal in cbreak mode");

        Ok(Self {
            saved,
            keys: KeyReader::with_interrupt(stdin, interrupt),
        })
    }
}

impl KeySource for RawTerminal {
    fn read_key(&mut self) -> Result<Option<u8>> {
        self.keys.read_key()
    }

    fn read_key_timeout(&mut self, timeout: Duration) -> Result<Option<u8>> {
        self.keys.read_key_timeout(timeout)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.keys.interrupted() {
            debug!("Interrupted, leaving custom mode");
        }
        if let Err(error) = tcsetattr(stdin().as_fd(), SetArg::TCSANOW, &self.saved) {
            warn!("Unable to restore terminal settings: {}", error);
        }
    }
}
