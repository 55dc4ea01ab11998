//! Startup argument resolution.
//!
//! Arguments reach the console from three places: the process command line,
//! the `recovery` region of the persisted control block, and a plain-text
//! command file with one argument per line. The first source that carries
//! any recognized argument wins outright; sources are never merged. A crash
//! mid-operation therefore reboots into exactly the arguments the control
//! block preserved, while an operator invocation overrides both.

use std::path::Path;

use lifeboat_bootctl::ControlBlock;
use lifeboat_bootctl::pending::RECOVERY_MODE_TAG;

/// Which source supplied the winning argument set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgSource {
    CommandLine,
    ControlBlock,
    CommandFile,
    /// No source carried arguments; the console starts at the menu.
    #[default]
    None,
}

/// Parsed startup arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupArgs {
    /// Ordered install queue from repeated `--update_package=` flags.
    pub update_packages: Vec<String>,
    pub wipe_data: bool,
    pub wipe_cache: bool,
    pub sideload: bool,
    /// Start with the text UI visible instead of the graphics-only screen.
    pub show_text: bool,
    /// Exit without rebooting; the init system decides what happens next.
    pub just_exit: bool,
    /// Payload written to the intent file at session end.
    pub send_intent: Option<String>,
    pub locale: Option<String>,
    /// Vendor extension: a pre-staged OTA delta, queued after the
    /// explicit packages.
    pub stage_path: Option<String>,
    /// Vendor extension: a userdata restore archive. Surfaced in the log;
    /// the restore tooling itself lives outside the console.
    pub restore_data: Option<String>,
    pub source: ArgSource,
}

impl StartupArgs {
    /// Parse one argument list. Unknown flags are logged and skipped so a
    /// newer vendor tool can pass options an older console does not know.
    pub fn parse<I, S>(args: I) -> StartupArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = StartupArgs::default();
        for arg in args {
            let arg = arg.as_ref().trim();
            if arg.is_empty() {
                continue;
            }
            if let Some(path) = arg.strip_prefix("--update_package=") {
                out.update_packages.push(path.to_string());
            } else if arg == "--wipe_data" {
                out.wipe_data = true;
            } else if arg == "--wipe_cache" {
                out.wipe_cache = true;
            } else if arg == "--sideload" {
                out.sideload = true;
            } else if arg == "--show_text" {
                out.show_text = true;
            } else if arg == "--just_exit" {
                out.just_exit = true;
            } else if let Some(v) = arg.strip_prefix("--send_intent=") {
                out.send_intent = Some(v.to_string());
            } else if let Some(v) = arg.strip_prefix("--locale=") {
                out.locale = Some(v.to_string());
            } else if let Some(v) = arg.strip_prefix("--stage_path=") {
                out.stage_path = Some(v.to_string());
            } else if let Some(v) = arg.strip_prefix("--restore_data=") {
                out.restore_data = Some(v.to_string());
            } else {
                log::warn!("ignoring unknown argument {arg:?}");
            }
        }
        out
    }

    /// True when this set carries anything beyond the defaults.
    pub fn has_content(&self) -> bool {
        let source = self.source;
        *self != StartupArgs {
            source,
            ..StartupArgs::default()
        }
    }

    /// The full install queue: explicit packages, then the staged delta.
    pub fn install_queue(&self) -> Vec<String> {
        let mut queue = self.update_packages.clone();
        if let Some(staged) = &self.stage_path {
            queue.push(staged.clone());
        }
        queue
    }

    /// Pick the winning argument source.
    ///
    /// Precedence: command line, then control block, then command file.
    /// A source with only unrecognized flags counts as empty, so stale
    /// garbage in the block cannot shadow a valid command file.
    pub fn resolve(cli: &[String], block: &ControlBlock, command_file: &Path) -> StartupArgs {
        let mut args = Self::parse(cli.iter().map(String::as_str));
        if args.has_content() {
            args.source = ArgSource::CommandLine;
            return args;
        }

        let mut args = Self::parse(block_arg_lines(block));
        if args.has_content() {
            args.source = ArgSource::ControlBlock;
            log::info!("arguments restored from the control block");
            return args;
        }

        if let Ok(text) = std::fs::read_to_string(command_file) {
            let mut args = Self::parse(text.lines());
            if args.has_content() {
                args.source = ArgSource::CommandFile;
                log::info!("arguments read from {}", command_file.display());
                return args;
            }
        }

        StartupArgs::default()
    }
}

/// Argument lines in the control block's recovery region. The leading mode
/// tag is part of the block grammar, not an argument.
fn block_arg_lines(block: &ControlBlock) -> impl Iterator<Item = &str> {
    block
        .recovery
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != RECOVERY_MODE_TAG)
}
