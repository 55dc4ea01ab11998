//! Recovery console entry point.
//!
//! Boot flow: read the TOML config, merge startup arguments from the
//! command line, the control block and the cache command file, bring up
//! the framebuffer and input threads, then hand control to the session
//! state machine. After the session ends the log is rotated, the intent
//! file is written, and the init supervisor is asked for whatever power
//! transition the session chose.

mod args;
mod catalog;
mod console;
mod host;
mod screens;
mod screenshot;
mod session;

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use lifeboat_bootctl::{ControlBlockStore, artifacts};
use lifeboat_display::SwapChain;
use lifeboat_display::device::DisplayDevice;
use lifeboat_input::InputRouter;
use lifeboat_types::config::ConsoleConfig;
use lifeboat_types::services::PowerControl;

use crate::args::StartupArgs;
use crate::console::RecoveryConsole;
use crate::host::{DisconnectedHost, HostInstaller, HostPower, HostVolumes};
use crate::session::{Outcome, Session};

const CONFIG_PATH: &str = "/etc/lifeboat.toml";

fn main() -> Result<()> {
    let config = ConsoleConfig::load_or_default(Path::new(CONFIG_PATH));
    init_logging(&config.log_path);
    log::info!("lifeboat {} starting", env!("CARGO_PKG_VERSION"));

    let store = ControlBlockStore::new(&config.control_block_path);
    let cli: Vec<String> = std::env::args().skip(1).collect();
    let args = StartupArgs::resolve(&cli, &store.read(), Path::new(&config.command_file));
    log::info!("startup arguments ({:?}): {args:?}", args.source);

    let locale = args.locale.clone().unwrap_or_else(|| config.locale.clone());

    let device = open_display(&config)?;
    let mut chain = SwapChain::new(device, config.display_rotation()?);
    chain.blank(false)?;

    let router = Arc::new(InputRouter::new());
    #[cfg(target_os = "linux")]
    let _reader =
        match lifeboat_input::evdev::EvdevReader::spawn(&config.input_dir, Arc::clone(&router)) {
            Ok(reader) => Some(reader),
            Err(err) => {
                // Headless boots still run args-driven installs.
                log::warn!("input unavailable: {err}");
                None
            }
        };

    let mut console = RecoveryConsole::new(&config, &locale, chain, router)?;

    let outcome = Session::new(
        &mut console,
        store,
        Box::new(HostInstaller),
        Box::new(HostVolumes::default()),
        Box::new(DisconnectedHost),
        args.clone(),
    )
    .run()?;

    // Let the flip worker push the final frame before tearing down.
    console.wait_idle(Duration::from_secs(2));

    if let Some(intent) = &args.send_intent
        && let Err(err) = artifacts::write_intent(Path::new(&config.intent_file), intent)
    {
        log::warn!("intent not recorded: {err}");
    }
    if let Err(err) = artifacts::finalize_session_log(
        Path::new(&config.log_path),
        Path::new(&config.last_log_path),
    ) {
        log::warn!("session log not rotated: {err}");
    }

    let mut power = HostPower;
    match outcome {
        Outcome::Reboot(target) => power.reboot(target)?,
        Outcome::Shutdown => power.shutdown()?,
        Outcome::Exit => log::info!("leaving without a power transition"),
    }
    Ok(())
}

/// Mirror of the logger output: everything goes to stderr and, when the
/// cache partition is writable, to the session log that gets rotated to
/// `last_log_path` at exit.
struct TeeWriter {
    file: Option<std::fs::File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
        Ok(())
    }
}

fn init_logging(log_path: &str) {
    let mut open_error = None;
    let file = match open_log_file(log_path) {
        Ok(file) => Some(file),
        Err(err) => {
            open_error = Some(err);
            None
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })))
        .init();
    if let Some(err) = open_error {
        log::warn!("session log at {log_path} unavailable: {err}");
    }
}

/// Truncate-open this session's log; the previous session's copy lives
/// at `last_log_path` already.
fn open_log_file(path: &str) -> io::Result<std::fs::File> {
    let path = Path::new(path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(target_os = "linux")]
fn open_display(config: &ConsoleConfig) -> lifeboat_types::error::Result<Box<dyn DisplayDevice>> {
    let device = lifeboat_display::fbdev::FbdevDisplay::open(
        &config.framebuffer_path,
        config.pixel_override(),
    )?;
    Ok(Box::new(device))
}

/// Host-side development build without a framebuffer device.
#[cfg(not(target_os = "linux"))]
fn open_display(_config: &ConsoleConfig) -> lifeboat_types::error::Result<Box<dyn DisplayDevice>> {
    Ok(Box::new(lifeboat_display::MemoryDisplay::rgb565(480, 800)))
}
