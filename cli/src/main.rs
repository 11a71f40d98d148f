use anyhow::{Context, Result};
use clap::Parser;
use ksr10_usb::devices::find_devices;
use ksr10_usb::programs::Program;
use ksr10_usb::KSR10;
use log::{debug, error, info};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use std::io::{stdin, stdout, Write};

use crate::cli::{Cli, Mode, MENU_PROMPT};
use crate::interactive::Session;
use crate::terminal::RawTerminal;

mod cli;
mod interactive;
mod terminal;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    CombinedLogger::init(vec![TermLogger::new(
        args.log_level.into(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .context("Could not configure the logger")?;

    info!("Starting KSR-10 controller v{}", VERSION);
    let libusb = rusb_version();
    debug!("Using libusb {}", libusb);

    if args.list {
        return list_devices();
    }

    let mut arm = match KSR10::open() {
        Ok(arm) => arm,
        Err(error) => {
            error!("{}", error);
            std::process::exit(error.exit_code());
        }
    };
    info!(
        "Found the KSR-10 arm (bus {}, device {})",
        arm.usb_bus_number(),
        arm.usb_address()
    );
    debug!("{:?}", arm.usb_device_descriptor());

    let mode = match args.mode {
        Some(mode) => Some(mode),
        None => ask_mode()?,
    };

    match mode {
        Some(Mode::Small) => Program::Small.run(&mut arm),
        Some(Mode::Reverse) => Program::ReverseSmall.run(&mut arm),
        Some(Mode::Vibrate) => Program::Vibrate.run(&mut arm),
        Some(Mode::Custom) => {
            let mut terminal = RawTerminal::enable()?;
            Session::new(stdout()).run(&mut arm, &mut terminal)?;
        }
        None => info!("Nothing to do"),
    }

    info!("Closing the KSR-10 arm");
    Ok(())
}

fn list_devices() -> Result<()> {
    let devices = match find_devices() {
        Ok(devices) => devices,
        Err(error) => {
            error!("{}", error);
            std::process::exit(error.exit_code());
        }
    };

    if devices.is_empty() {
        println!("No KSR-10 arm attached.");
    }
    for device in devices {
        println!(
            "KSR-10 on bus {}, device {}",
            device.bus_number, device.address
        );
    }
    Ok(())
}

fn ask_mode() -> Result<Option<Mode>> {
    print!("{}", MENU_PROMPT);
    stdout().flush()?;

    let mut line = String::new();
    stdin()
        .read_line(&mut line)
        .context("Unable to read the menu choice")?;
    Ok(Mode::from_menu_line(&line))
}

fn rusb_version() -> String {
    let version = ksr10_usb::rusb::version();
    format!(
        "{}.{}.{}.{}",
        version.major(),
        version.minor(),
        version.micro(),
        version.nano()
    )
}
