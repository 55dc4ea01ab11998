//! The fixed-size control block and its on-disk store.
//!
//! Layout: 2048 bytes total, three NUL-padded text regions. `command`
//! holds the bootloader directive (`boot-recovery` while anything is
//! pending), `running` the current-operation marker the install engine
//! updates mid-flight, `recovery` the newline-separated argument block.
//!
//! Writers always produce the full zero-filled record, so a field that
//! shrinks can never leave stale bytes behind. Readers accept anything:
//! all zeros, truncated files and binary garbage all decode to strings,
//! and garbage simply fails to parse at the typed layer above.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use lifeboat_types::error::{ConsoleError, Result};

pub const BLOCK_SIZE: usize = 2048;
pub const COMMAND_SIZE: usize = 64;
pub const RUNNING_SIZE: usize = 192;
pub const RECOVERY_SIZE: usize = 1792;

const COMMAND_OFFSET: usize = 0;
const RUNNING_OFFSET: usize = COMMAND_SIZE;
const RECOVERY_OFFSET: usize = COMMAND_SIZE + RUNNING_SIZE;

/// Decoded control block contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlBlock {
    pub command: String,
    pub running: String,
    pub recovery: String,
}

impl ControlBlock {
    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.running.is_empty() && self.recovery.is_empty()
    }

    /// Serialize into the fixed layout.
    ///
    /// Every field keeps at least one trailing NUL, so a field must be
    /// strictly shorter than its region. Oversized fields are a caller
    /// bug surfaced as a config error, never a silent truncation.
    pub fn to_bytes(&self) -> Result<[u8; BLOCK_SIZE]> {
        let mut raw = [0u8; BLOCK_SIZE];
        write_field(&mut raw, COMMAND_OFFSET, COMMAND_SIZE, "command", &self.command)?;
        write_field(&mut raw, RUNNING_OFFSET, RUNNING_SIZE, "running", &self.running)?;
        write_field(
            &mut raw,
            RECOVERY_OFFSET,
            RECOVERY_SIZE,
            "recovery",
            &self.recovery,
        )?;
        Ok(raw)
    }

    /// Decode a raw record. Never fails: short input reads as zeros,
    /// non-UTF-8 bytes decode lossily.
    pub fn from_bytes(raw: &[u8]) -> ControlBlock {
        ControlBlock {
            command: read_field(raw, COMMAND_OFFSET, COMMAND_SIZE),
            running: read_field(raw, RUNNING_OFFSET, RUNNING_SIZE),
            recovery: read_field(raw, RECOVERY_OFFSET, RECOVERY_SIZE),
        }
    }
}

fn write_field(raw: &mut [u8], offset: usize, size: usize, name: &str, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() >= size {
        return Err(ConsoleError::Config(format!(
            "control block field {name} is {} bytes, limit {}",
            bytes.len(),
            size - 1
        )));
    }
    raw[offset..offset + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

fn read_field(raw: &[u8], offset: usize, size: usize) -> String {
    if offset >= raw.len() {
        return String::new();
    }
    let end = (offset + size).min(raw.len());
    let region = &raw[offset..end];
    let text = match region.iter().position(|&b| b == 0) {
        Some(nul) => &region[..nul],
        None => region,
    };
    String::from_utf8_lossy(text).into_owned()
}

/// Reads and writes the control block at a fixed path.
///
/// On a device the path is a raw misc partition; tests point it at a
/// plain file. Every write covers the whole record and is `sync_all`ed
/// before returning, because callers sequence side effects after it.
#[derive(Debug, Clone)]
pub struct ControlBlockStore {
    path: PathBuf,
}

impl ControlBlockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ControlBlockStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current record. A missing, short or unreadable block is
    /// an empty record, not an error: first boot has nothing there yet.
    pub fn read(&self) -> ControlBlock {
        let mut raw = [0u8; BLOCK_SIZE];
        match File::open(&self.path) {
            Ok(mut file) => {
                let mut filled = 0;
                while filled < BLOCK_SIZE {
                    match file.read(&mut raw[filled..]) {
                        Ok(0) => break,
                        Ok(n) => filled += n,
                        Err(e) => {
                            log::warn!("control block read failed: {e}");
                            break;
                        }
                    }
                }
                ControlBlock::from_bytes(&raw[..filled])
            }
            Err(e) => {
                log::info!("no control block at {} ({e})", self.path.display());
                ControlBlock::default()
            }
        }
    }

    /// Write and flush the whole record.
    pub fn write(&self, block: &ControlBlock) -> Result<()> {
        let raw = block.to_bytes()?;
        // No truncate: the path is usually a block device.
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&raw)?;
        file.sync_all()?;
        Ok(())
    }

    /// Reset to the empty record.
    pub fn clear(&self) -> Result<()> {
        self.write(&ControlBlock::default())
    }
}
