use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[clap(about, version)]
pub struct Cli {
    /// Minimum log level to print out
    #[clap(long, value_enum, default_value = "info")]
    pub log_level: LevelFilter,

    /// Run this mode directly instead of asking for it
    #[clap(long, value_enum)]
    pub mode: Option<Mode>,

    /// List the attached arms and exit
    #[clap(long, conflicts_with = "mode")]
    pub list: bool,
}

#[repr(usize)]
#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelFilter {
    /// A level lower than all log levels.
    Off,
    /// Corresponds to the `Error` log level.
    Error,
    /// Corresponds to the `Warn` log level.
    Warn,
    /// Corresponds to the `Info` log level.
    Info,
    /// Corresponds to the `Debug` log level.
    Debug,
    /// Corresponds to the `Trace` log level.
    Trace,
}

impl From<LevelFilter> for log::LevelFilter {
    fn from(level: LevelFilter) -> Self {
        match level {
            LevelFilter::Off => log::LevelFilter::Off,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum Mode {
    /// Run the small program
    Small,
    /// Run the small program backwards
    Reverse,
    /// Shake the wrist up and down
    Vibrate,
    /// Drive the arm from the keyboard
    Custom,
}

pub const MENU_PROMPT: &str =
    "Execute [s]mall program, [r]everse small program, [v]ibrate, or [c]ustom? (s/r/v/c) ";

impl Mode {
    pub fn from_menu_char(choice: char) -> Option<Mode> {
        match choice {
            's' => Some(Mode::Small),
            'r' => Some(Mode::Reverse),
            'v' => Some(Mode::Vibrate),
            'c' => Some(Mode::Custom),
            _ => None,
        }
    }

    /// The first non-whitespace character of an answer to the menu.
    pub fn from_menu_line(line: &str) -> Option<Mode> {
        line.trim_start().chars().next().and_then(Mode::from_menu_char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_characters() {
        assert_eq!(Mode::from_menu_char('s'), Some(Mode::Small));
        assert_eq!(Mode::from_menu_char('r'), Some(Mode::Reverse));
        assert_eq!(Mode::from_menu_char('v'), Some(Mode::Vibrate));
        assert_eq!(Mode::from_menu_char('c'), Some(Mode::Custom));
        assert_eq!(Mode::from_menu_char('S'), None);
        assert_eq!(Mode::from_menu_char('q'), None);
    }

    #[test]
    fn menu_lines() {
        assert_eq!(Mode::from_menu_line("v\n"), Some(Mode::Vibrate));
        assert_eq!(Mode::from_menu_line("  c"), Some(Mode::Custom));
        assert_eq!(Mode::from_menu_line("rs"), Some(Mode::Reverse));
        assert_eq!(Mode::from_menu_line("\n"), None);
        assert_eq!(Mode::from_menu_line(""), None);
    }

    #[test]
    fn parses_arguments() {
        let cli = Cli::try_parse_from(["ksr10"]).unwrap();
        assert_eq!(cli.log_level, LevelFilter::Info);
        assert_eq!(cli.mode, None);

        let cli = Cli::try_parse_from(["ksr10", "--log-level", "debug", "--mode", "vibrate"])
            .unwrap();
        assert_eq!(cli.log_level, LevelFilter::Debug);
        assert_eq!(cli.mode, Some(Mode::Vibrate));

        assert!(Cli::try_parse_from(["ksr10", "--mode", "dance"]).is_err());
        assert!(Cli::try_parse_from(["ksr10", "--list"]).unwrap().list);
        assert!(Cli::try_parse_from(["ksr10", "--list", "--mode", "small"]).is_err());
    }
}
