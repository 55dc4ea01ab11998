//! evdev device reader.
//!
//! Opens every `/dev/input/event*` node it can, polls them from one named
//! thread and feeds decoded records to the [`InputRouter`]. Touch records
//! arrive piecewise (button state, then coordinates, then a sync marker);
//! the [`TouchAssembler`] batches them so the router only ever sees whole
//! reports. Key autorepeat records are dropped here, before debouncing.
//!
//! Records are decoded from their trailing eight bytes (type, code, value)
//! so the same code handles 32- and 64-bit `struct timeval` prefixes.

use std::fs::{self, File};
use std::io::{self, Read};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

use lifeboat_types::error::{ConsoleError, Result};
use lifeboat_types::input::KeyCode;

use crate::router::InputRouter;

const EVENT_SIZE: usize = std::mem::size_of::<libc::input_event>();

const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;
const SYN_REPORT: u16 = 0x00;
const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;
const ABS_MT_POSITION_X: u16 = 0x35;
const ABS_MT_POSITION_Y: u16 = 0x36;
const BTN_TOUCH: u16 = 0x14A;
const KEY_VALUE_REPEAT: i32 = 2;

const POLL_INTERVAL_MS: u16 = 100;
const POLL_INTERVAL: Duration = Duration::from_millis(POLL_INTERVAL_MS as u64);

/// Pull the type/code/value fields off the end of one raw record.
fn decode_event(chunk: &[u8]) -> (u16, u16, i32) {
    let base = chunk.len() - 8;
    let type_ = u16::from_ne_bytes([chunk[base], chunk[base + 1]]);
    let code = u16::from_ne_bytes([chunk[base + 2], chunk[base + 3]]);
    let value = i32::from_ne_bytes([
        chunk[base + 4],
        chunk[base + 5],
        chunk[base + 6],
        chunk[base + 7],
    ]);
    (type_, code, value)
}

/// Collects the pieces of a touch report until the sync marker closes it.
#[derive(Default)]
struct TouchAssembler {
    x: i32,
    y: i32,
    down: bool,
    dirty: bool,
}

impl TouchAssembler {
    /// Absorb one record. Returns a whole `(x, y, down)` report when a
    /// `SYN_REPORT` closes a batch that changed something.
    fn feed(&mut self, type_: u16, code: u16, value: i32) -> Option<(i32, i32, bool)> {
        match (type_, code) {
            (EV_KEY, BTN_TOUCH) => {
                self.down = value != 0;
                self.dirty = true;
                None
            }
            (EV_ABS, ABS_X | ABS_MT_POSITION_X) => {
                self.x = value;
                self.dirty = true;
                None
            }
            (EV_ABS, ABS_Y | ABS_MT_POSITION_Y) => {
                self.y = value;
                self.dirty = true;
                None
            }
            (EV_SYN, SYN_REPORT) if self.dirty => {
                self.dirty = false;
                Some((self.x, self.y, self.down))
            }
            _ => None,
        }
    }
}

/// Feed one raw record to wherever it belongs.
fn route_record(router: &InputRouter, touch: &mut TouchAssembler, chunk: &[u8]) {
    let (type_, code, value) = decode_event(chunk);
    if let Some((x, y, down)) = touch.feed(type_, code, value) {
        router.handle_touch(x, y, down);
    } else if type_ == EV_KEY && code != BTN_TOUCH && value != KEY_VALUE_REPEAT {
        router.handle_key(KeyCode(code), value != 0);
    }
}

fn open_event_devices(input_dir: &str) -> Vec<File> {
    let mut files = Vec::new();
    let entries = match fs::read_dir(Path::new(input_dir)) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot scan {input_dir}: {e}");
            return files;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with("event") {
            continue;
        }
        let path = entry.path();
        match File::options()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
        {
            Ok(file) => {
                log::info!("input device {}", path.display());
                files.push(file);
            }
            Err(e) => log::warn!("skipping {}: {e}", path.display()),
        }
    }
    files
}

fn reader_loop(files: Vec<File>, router: Arc<InputRouter>, shutdown: Arc<AtomicBool>) {
    let mut touch = TouchAssembler::default();
    let mut buf = vec![0u8; EVENT_SIZE * 64];

    while !shutdown.load(Ordering::SeqCst) {
        if files.is_empty() {
            // Nothing to poll; spin slowly so drop can still stop us.
            thread::sleep(POLL_INTERVAL);
            continue;
        }
        let mut fds: Vec<PollFd> = files
            .iter()
            .map(|f| PollFd::new(f.as_fd(), PollFlags::POLLIN))
            .collect();
        match poll(&mut fds, PollTimeout::from(POLL_INTERVAL_MS)) {
            Ok(0) => continue,
            Ok(_) => {}
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => {
                log::warn!("input poll failed: {e}");
                thread::sleep(POLL_INTERVAL);
                continue;
            }
        }
        for (i, fd) in fds.iter().enumerate() {
            if !fd
                .revents()
                .is_some_and(|r| r.contains(PollFlags::POLLIN))
            {
                continue;
            }
            match (&files[i]).read(&mut buf) {
                Ok(n) => {
                    for chunk in buf[..n].chunks_exact(EVENT_SIZE) {
                        route_record(&router, &mut touch, chunk);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => log::debug!("input read failed: {e}"),
            }
        }
    }
}

/// Owns the reader thread. Dropping stops and joins it.
pub struct EvdevReader {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EvdevReader {
    /// Scan `input_dir` for event nodes and start the reader thread.
    ///
    /// A directory with no usable devices is not an error: the console
    /// stays up so the inactivity auto-reboot can still run.
    pub fn spawn(input_dir: &str, router: Arc<InputRouter>) -> Result<Self> {
        let files = open_event_devices(input_dir);
        if files.is_empty() {
            log::warn!("no input devices under {input_dir}");
        }
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let thread = thread::Builder::new()
            .name("lifeboat-input".into())
            .spawn(move || reader_loop(files, router, flag))
            .map_err(ConsoleError::Io)?;
        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }
}

impl Drop for EvdevReader {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
