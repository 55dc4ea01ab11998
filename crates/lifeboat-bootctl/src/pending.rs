//! Typed views of the control block contents.
//!
//! [`PendingOperation`] is the command the console must carry out, stored
//! in the `command` + `recovery` regions. [`RunningMarker`] is the finer
//! cursor stored in `running`, updated between packages of a batch install
//! so a crash resumes mid-list instead of restarting it.
//!
//! Parsing is deliberately forgiving: anything that does not match the
//! grammar means "nothing pending" (or an idle marker), because the block
//! may hold garbage from a past life as an unformatted partition.

use crate::block::ControlBlock;

/// `command` region value while any operation is pending.
pub const COMMAND_BOOT_RECOVERY: &str = "boot-recovery";

/// First line of the `recovery` region.
pub const RECOVERY_MODE_TAG: &str = "recovery";

const FLAG_UPDATE_PACKAGE: &str = "--update_package=";
const FLAG_WIPE_DATA: &str = "--wipe_data";
const FLAG_WIPE_CACHE: &str = "--wipe_cache";
const FLAG_SIDELOAD: &str = "--sideload";

/// The operation the console has committed to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    None,
    /// Sequential package install, in list order.
    Install { packages: Vec<String> },
    WipeData,
    WipeCache,
    Sideload,
}

impl PendingOperation {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingOperation::None)
    }

    /// Render into a control block with an idle running marker.
    ///
    /// `None` renders the empty block, which is also how success is
    /// recorded: clearing and "nothing pending" are the same state.
    pub fn to_block(&self) -> ControlBlock {
        if self.is_none() {
            return ControlBlock::default();
        }
        let mut recovery = String::from(RECOVERY_MODE_TAG);
        recovery.push('\n');
        match self {
            PendingOperation::None => unreachable!(),
            PendingOperation::Install { packages } => {
                for package in packages {
                    recovery.push_str(FLAG_UPDATE_PACKAGE);
                    recovery.push_str(package);
                    recovery.push('\n');
                }
            }
            PendingOperation::WipeData => {
                recovery.push_str(FLAG_WIPE_DATA);
                recovery.push('\n');
            }
            PendingOperation::WipeCache => {
                recovery.push_str(FLAG_WIPE_CACHE);
                recovery.push('\n');
            }
            PendingOperation::Sideload => {
                recovery.push_str(FLAG_SIDELOAD);
                recovery.push('\n');
            }
        }
        ControlBlock {
            command: COMMAND_BOOT_RECOVERY.into(),
            running: String::new(),
            recovery,
        }
    }

    /// Decode a control block. Anything unrecognized is `None`.
    ///
    /// When flags mix (an install request alongside a wipe), the install
    /// wins; wipes beat sideload. The state machine only runs one
    /// operation per record.
    pub fn from_block(block: &ControlBlock) -> PendingOperation {
        if block.command != COMMAND_BOOT_RECOVERY {
            return PendingOperation::None;
        }
        let mut packages = Vec::new();
        let mut wipe_data = false;
        let mut wipe_cache = false;
        let mut sideload = false;
        for line in block.recovery.lines() {
            let line = line.trim();
            if line.is_empty() || line == RECOVERY_MODE_TAG {
                continue;
            }
            if let Some(path) = line.strip_prefix(FLAG_UPDATE_PACKAGE) {
                packages.push(path.to_string());
            } else if line == FLAG_WIPE_DATA {
                wipe_data = true;
            } else if line == FLAG_WIPE_CACHE {
                wipe_cache = true;
            } else if line == FLAG_SIDELOAD {
                sideload = true;
            } else {
                log::debug!("ignoring unknown recovery flag {line:?}");
            }
        }
        if !packages.is_empty() {
            PendingOperation::Install { packages }
        } else if wipe_data {
            PendingOperation::WipeData
        } else if wipe_cache {
            PendingOperation::WipeCache
        } else if sideload {
            PendingOperation::Sideload
        } else {
            PendingOperation::None
        }
    }
}

/// Fine-grained progress cursor inside a pending operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunningMarker {
    Idle,
    /// Package `index` of the batch is (or was) being applied.
    Installing { index: usize, path: String },
    Wiping,
}

impl RunningMarker {
    /// Render for the `running` region.
    pub fn render(&self) -> String {
        match self {
            RunningMarker::Idle => String::new(),
            RunningMarker::Installing { index, path } => {
                format!("installing {index} {path}")
            }
            RunningMarker::Wiping => "wiping".to_string(),
        }
    }

    /// Parse a `running` region. Garbage is an idle marker.
    pub fn parse(text: &str) -> RunningMarker {
        let text = text.trim();
        if text.is_empty() {
            return RunningMarker::Idle;
        }
        if text == "wiping" {
            return RunningMarker::Wiping;
        }
        if let Some(rest) = text.strip_prefix("installing ")
            && let Some((index, path)) = rest.split_once(' ')
            && let Ok(index) = index.parse::<usize>()
            && !path.is_empty()
        {
            return RunningMarker::Installing {
                index,
                path: path.to_string(),
            };
        }
        log::debug!("ignoring unrecognized running marker {text:?}");
        RunningMarker::Idle
    }
}
