//! Install session state machine.
//!
//! A flat dispatcher over six states; `Reboot` is the only terminal one.
//! Every state that mutates storage writes the pending operation to the
//! control block and flushes it *before* the first side effect, and clears
//! the block only on completion. Clean failures clear it too; only a crash
//! leaves it set, which is exactly the case the next boot must resume.
//!
//! Batch installs additionally persist a marker naming the package under
//! way. The marker advances to package N+1 immediately after package N
//! succeeds, so a crash between packages re-enters the batch at the first
//! package whose success was never recorded.

use std::path::Path;
use std::time::Duration;

use lifeboat_bootctl::{ControlBlockStore, PendingOperation, RunningMarker, artifacts};
use lifeboat_types::error::{ConsoleError, Result};
use lifeboat_types::input::{Event, KeyCode};
use lifeboat_types::services::{HostLink, PackageInstaller, RebootTarget, VolumeMounter};

use crate::args::{ArgSource, StartupArgs};
use crate::console::RecoveryConsole;
use crate::screens::{self, Menu};

/// Wipe targets; fixed mount points on every supported device.
const DATA_MOUNT: &str = "/data";
const CACHE_MOUNT: &str = "/cache";

/// Dispatcher states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    ShowMenu,
    ApplyFromMedia,
    WipeData,
    WipeCache,
    SideloadInstall,
    Reboot(RebootTarget),
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Reboot(RebootTarget),
    Shutdown,
    /// `--just_exit`: stop without a power transition.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Reboot,
    Apply,
    Sideload,
    WipeData,
    WipeCache,
    PowerOff,
}

const MENU_ACTIONS: [(&str, MenuAction); 6] = [
    ("menu.reboot", MenuAction::Reboot),
    ("menu.apply", MenuAction::Apply),
    ("menu.sideload", MenuAction::Sideload),
    ("menu.wipe_data", MenuAction::WipeData),
    ("menu.wipe_cache", MenuAction::WipeCache),
    ("menu.power_off", MenuAction::PowerOff),
];

pub struct Session<'c> {
    console: &'c mut RecoveryConsole,
    store: ControlBlockStore,
    installer: Box<dyn PackageInstaller>,
    volumes: Box<dyn VolumeMounter>,
    host: Box<dyn HostLink>,
    args: StartupArgs,
    menu: Menu,
    actions: Vec<MenuAction>,
    packages: Vec<String>,
    cursor: usize,
    power_off: bool,
}

impl<'c> Session<'c> {
    pub fn new(
        console: &'c mut RecoveryConsole,
        store: ControlBlockStore,
        installer: Box<dyn PackageInstaller>,
        volumes: Box<dyn VolumeMounter>,
        host: Box<dyn HostLink>,
        args: StartupArgs,
    ) -> Session<'c> {
        let packages = args.install_queue();
        let mut cursor = 0;
        if args.source == ArgSource::ControlBlock
            && let RunningMarker::Installing { index, path } =
                RunningMarker::parse(&store.read().running)
        {
            if packages.get(index).is_some_and(|p| *p == path) {
                log::info!(
                    "resuming interrupted install at package {} of {}",
                    index + 1,
                    packages.len()
                );
                cursor = index;
            } else {
                log::warn!("stale install marker for {path:?}; restarting the batch");
            }
        }
        if args.show_text {
            console.set_text_visible(true);
        }
        let items = MENU_ACTIONS.iter().map(|(id, _)| console.msg(id)).collect();
        let actions = MENU_ACTIONS.iter().map(|&(_, action)| action).collect();
        Session {
            console,
            store,
            installer,
            volumes,
            host,
            args,
            menu: Menu::new(Vec::new(), items),
            actions,
            packages,
            cursor,
            power_off: false,
        }
    }

    /// Run states until the terminal one. Only fatal errors propagate;
    /// everything else is reported on screen and lands back at the menu.
    pub fn run(&mut self) -> Result<Outcome> {
        if let Some(restore) = self.args.restore_data.clone() {
            let noted = self.console.msg("restore.noted");
            self.console.show_log(format!("{noted} ({restore})"));
        }
        let mut state = self.initial_state();
        loop {
            log::debug!("state: {state:?}");
            state = match state {
                State::ShowMenu => self.show_menu()?,
                State::ApplyFromMedia => self.apply_from_media()?,
                State::WipeData => self.wipe(PendingOperation::WipeData)?,
                State::WipeCache => self.wipe(PendingOperation::WipeCache)?,
                State::SideloadInstall => self.sideload()?,
                State::Reboot(target) => {
                    let leaving = self.console.msg("reboot.now");
                    self.console.show_log(leaving);
                    screens::draw_background(self.console);
                    self.console.flush();
                    return Ok(if self.power_off {
                        Outcome::Shutdown
                    } else if self.args.just_exit {
                        Outcome::Exit
                    } else {
                        Outcome::Reboot(target)
                    });
                }
            };
        }
    }

    fn initial_state(&self) -> State {
        if !self.packages.is_empty() {
            State::ApplyFromMedia
        } else if self.args.wipe_data {
            State::WipeData
        } else if self.args.wipe_cache {
            State::WipeCache
        } else if self.args.sideload {
            State::SideloadInstall
        } else {
            State::ShowMenu
        }
    }

    /// Menu loop. With the text UI hidden this is the graphics-only idle
    /// screen; the first key or touch reveals the menu. An inactivity
    /// timeout reboots only if text was never shown this session.
    fn show_menu(&mut self) -> Result<State> {
        let timeout = Duration::from_secs(self.console.config().menu_timeout_secs);
        loop {
            if self.console.text_visible() {
                screens::draw_menu(self.console, &mut self.menu);
            } else {
                screens::draw_background(self.console);
            }
            self.console.flush();

            let Some(event) = self
                .console
                .router()
                .wait_for_event(timeout, self.host.as_ref())
            else {
                if self.console.text_ever_visible() {
                    continue;
                }
                log::info!("no interaction before the timeout; leaving");
                return Ok(State::Reboot(RebootTarget::System));
            };

            if !self.console.text_visible() {
                match event {
                    Event::Key(_) | Event::Touch { down: true, .. } => {
                        self.console.set_text_visible(true);
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Key(key) => {
                    if key == KeyCode::VOLUME_DOWN
                        && self.console.router().is_pressed(KeyCode::POWER)
                    {
                        self.capture_screenshot();
                        continue;
                    }
                    match key {
                        KeyCode::UP | KeyCode::VOLUME_UP => self.menu.move_up(),
                        KeyCode::DOWN | KeyCode::VOLUME_DOWN => self.menu.move_down(),
                        KeyCode::ENTER | KeyCode::POWER => {
                            return Ok(self.activate(self.menu.selected));
                        }
                        _ => {}
                    }
                }
                Event::Touch { x, y, down: true } => self.menu.touch_down(x, y),
                Event::Touch { x, y, down: false } => {
                    if let Some(row) = self.menu.touch_up(x, y) {
                        return Ok(self.activate(row));
                    }
                }
                Event::Message(text) => self.console.show_log(text),
            }
        }
    }

    fn activate(&mut self, row: usize) -> State {
        match self.actions.get(row) {
            Some(MenuAction::Reboot) => State::Reboot(RebootTarget::System),
            Some(MenuAction::Apply) => State::ApplyFromMedia,
            Some(MenuAction::Sideload) => State::SideloadInstall,
            Some(MenuAction::WipeData) => State::WipeData,
            Some(MenuAction::WipeCache) => State::WipeCache,
            Some(MenuAction::PowerOff) => {
                self.power_off = true;
                State::Reboot(RebootTarget::System)
            }
            None => State::ShowMenu,
        }
    }

    fn capture_screenshot(&mut self) {
        let path = self.console.config().screenshot_path.clone();
        match self.console.screenshot(Path::new(&path)) {
            Ok(()) => self.console.show_log(format!("screenshot saved to {path}")),
            Err(err) => log::warn!("screenshot failed: {err}"),
        }
    }

    fn apply_from_media(&mut self) -> Result<State> {
        let media = self.console.config().media_path.clone();
        if self.packages.is_empty() {
            // Menu-driven: pick up whatever packages removable media holds.
            if let Err(err) = self.volumes.mount(&media) {
                if err.is_fatal() {
                    return Err(err);
                }
                self.report(&err);
                return Ok(State::ShowMenu);
            }
            self.packages = match scan_packages(&media) {
                Ok(found) => found,
                Err(err) => {
                    self.report(&err);
                    return Ok(State::ShowMenu);
                }
            };
            if self.packages.is_empty() {
                let none = self.console.msg("media.none");
                self.console.show_log(none);
                return Ok(State::ShowMenu);
            }
        } else if self.packages.iter().any(|p| p.starts_with(&media))
            && let Err(err) = self.volumes.mount(&media)
        {
            // Args-driven install whose packages live on media that will
            // not mount: give up on the batch rather than loop on reboot.
            self.store.clear()?;
            if err.is_fatal() {
                return Err(err);
            }
            self.report(&err);
            return Ok(State::ShowMenu);
        }
        self.install_batch()
    }

    /// Install every queued package from the cursor on.
    fn install_batch(&mut self) -> Result<State> {
        let total = self.packages.len();
        let op = PendingOperation::Install {
            packages: self.packages.clone(),
        };
        self.persist_pending(&op)?;
        let mut failure: Option<ConsoleError> = None;
        while self.cursor < total {
            if let Err(err) = self.install_step() {
                failure = Some(err);
                break;
            }
        }
        // Completion clears the pending record, clean failure included;
        // only a crash leaves it set for the next boot.
        self.store.clear()?;
        self.packages.clear();
        self.cursor = 0;
        match failure {
            None => {
                let done = self.console.msg("install.success");
                self.console.show_log(done);
                Ok(State::ShowMenu)
            }
            Some(err) if err.is_fatal() => Err(err),
            Some(err) => {
                self.report(&err);
                let failed = self.console.msg("install.failed");
                self.console.show_log(failed);
                Ok(State::ShowMenu)
            }
        }
    }

    /// Install the package at the cursor, record its result file, and
    /// durably advance the resume marker past it.
    fn install_step(&mut self) -> Result<()> {
        let total = self.packages.len();
        let index = self.cursor;
        let path = self.packages[index].clone();
        let label = self.console.msg("install.package");
        self.console
            .show_log(format!("{label} {}/{total}: {path}", index + 1));

        let result = self.install_one(Path::new(&path));
        artifacts::write_install_result(
            Path::new(&self.console.config().install_result_path),
            index,
            result.is_ok(),
        )?;
        result?;

        self.cursor += 1;
        if self.cursor < total {
            let op = PendingOperation::Install {
                packages: self.packages.clone(),
            };
            self.persist_pending(&op)?;
        }
        Ok(())
    }

    fn install_one(&mut self, package: &Path) -> Result<()> {
        self.installer.verify(package)?;
        self.console.set_progress(Some(0.0));
        screens::draw_background(self.console);
        self.console.flush();

        let console = &mut *self.console;
        let installer = self.installer.as_mut();
        let mut last_percent = u32::MAX;
        let result = installer.apply(package, &mut |fraction| {
            // Redraw at whole-percent steps; callbacks can be per-chunk.
            let percent = (fraction * 100.0) as u32;
            if percent != last_percent {
                last_percent = percent;
                console.set_progress(Some(fraction));
                screens::draw_background(console);
                console.flush();
            }
        });
        self.console.set_progress(None);
        result
    }

    fn wipe(&mut self, op: PendingOperation) -> Result<State> {
        let (message, targets): (&str, &[&str]) = match op {
            PendingOperation::WipeData => ("wipe.data", &[DATA_MOUNT, CACHE_MOUNT]),
            _ => ("wipe.cache", &[CACHE_MOUNT]),
        };
        self.persist_pending(&op)?;
        let starting = self.console.msg(message);
        self.console.show_log(starting);
        screens::draw_background(self.console);
        self.console.flush();

        for target in targets {
            if let Err(err) = self.volumes.format(target) {
                self.store.clear()?;
                if err.is_fatal() {
                    return Err(err);
                }
                self.report(&err);
                return Ok(State::ShowMenu);
            }
        }
        self.store.clear()?;
        let done = self.console.msg("wipe.done");
        self.console.show_log(done);
        Ok(State::ShowMenu)
    }

    fn sideload(&mut self) -> Result<State> {
        self.persist_pending(&PendingOperation::Sideload)?;
        let waiting = self.console.msg("sideload.waiting");
        self.console.show_log(waiting);
        screens::draw_background(self.console);
        self.console.flush();

        match self.host.receive_package() {
            Ok(path) => {
                self.packages = vec![path.display().to_string()];
                self.cursor = 0;
                self.install_batch()
            }
            Err(err) => {
                self.store.clear()?;
                if err.is_fatal() {
                    return Err(err);
                }
                self.report(&err);
                Ok(State::ShowMenu)
            }
        }
    }

    /// Durably record `op`, with the install resume marker when one
    /// applies, before any side effect it names.
    fn persist_pending(&self, op: &PendingOperation) -> Result<()> {
        let mut block = op.to_block();
        block.running = match op {
            PendingOperation::Install { .. } => RunningMarker::Installing {
                index: self.cursor,
                path: self.packages[self.cursor].clone(),
            },
            PendingOperation::WipeData | PendingOperation::WipeCache => RunningMarker::Wiping,
            _ => RunningMarker::Idle,
        }
        .render();
        self.store.write(&block)
    }

    fn report(&mut self, err: &ConsoleError) {
        log::error!("{err}");
        let line = self.console.msg(err.message_key());
        self.console.show_log(line);
    }
}

fn scan_packages(dir: &str) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
        {
            found.push(path.display().to_string());
        }
    }
    found.sort();
    Ok(found)
}
