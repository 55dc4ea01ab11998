//! Shared console state: staging surface, palette, catalog, refresh handle.
//!
//! Screens draw into the staging surface on the UI thread and call
//! [`RecoveryConsole::flush`] to hand the finished frame to the refresh
//! worker. The console also carries the on-screen log ring and the current
//! progress fraction, so any screen can render them.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lifeboat_display::{RefreshScheduler, SwapChain};
use lifeboat_gfx::gradient::GradientFill;
use lifeboat_gfx::{DitherMode, Surface};
use lifeboat_input::InputRouter;
use lifeboat_types::color::Palette;
use lifeboat_types::config::ConsoleConfig;
use lifeboat_types::error::Result;
use lifeboat_types::pixel::PixelFormat;

use crate::catalog::MessageCatalog;
use crate::screenshot;

/// On-screen log ring size; older lines scroll away.
const LOG_CAPACITY: usize = 64;

pub struct RecoveryConsole {
    pub(crate) config: ConsoleConfig,
    pub(crate) palette: Palette,
    pub(crate) catalog: MessageCatalog,
    pub(crate) staging: Surface,
    pub(crate) scale: u32,
    pub(crate) dither: DitherMode,
    pub(crate) gradient: GradientFill,
    pub(crate) log_lines: VecDeque<String>,
    pub(crate) progress: Option<f32>,
    refresh: RefreshScheduler,
    router: Arc<InputRouter>,
    text_visible: bool,
    text_ever_visible: bool,
}

impl RecoveryConsole {
    pub fn new(
        config: &ConsoleConfig,
        locale: &str,
        chain: SwapChain,
        router: Arc<InputRouter>,
    ) -> Result<RecoveryConsole> {
        let (width, height) = chain.staging_size();
        let dither = match chain.geometry().format {
            PixelFormat::Rgb565 => DitherMode::Rgb565,
            _ => DitherMode::Exact,
        };
        let catalog = MessageCatalog::for_locale(locale);
        // Integer font scale from the panel width; a 480px-class panel
        // reads fine at 1x.
        let scale = (width / 480).max(1);
        log::info!(
            "console {width}x{height} scale {scale}, locale {}",
            catalog.locale()
        );
        let refresh = RefreshScheduler::spawn(chain)?;
        Ok(RecoveryConsole {
            palette: config.palette(),
            config: config.clone(),
            catalog,
            staging: Surface::new(width, height),
            scale,
            dither,
            gradient: GradientFill::new(),
            log_lines: VecDeque::new(),
            progress: None,
            refresh,
            router,
            text_visible: false,
            text_ever_visible: false,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn size(&self) -> (u32, u32) {
        (self.staging.width(), self.staging.height())
    }

    /// Catalog lookup, owned so callers can keep drawing while holding it.
    pub fn msg(&self, id: &str) -> String {
        self.catalog.get(id).to_string()
    }

    pub fn text_visible(&self) -> bool {
        self.text_visible
    }

    /// Whether the text UI has been visible at any point this session.
    /// Once it has, inactivity timeouts stop forcing a reboot.
    pub fn text_ever_visible(&self) -> bool {
        self.text_ever_visible
    }

    pub fn set_text_visible(&mut self, visible: bool) {
        self.text_visible = visible;
        if visible {
            self.text_ever_visible = true;
        }
    }

    /// Append a line to the on-screen log and the session log.
    pub fn show_log(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{line}");
        if self.log_lines.len() == LOG_CAPACITY {
            self.log_lines.pop_front();
        }
        self.log_lines.push_back(line);
    }

    pub fn set_progress(&mut self, fraction: Option<f32>) {
        self.progress = fraction.map(|f| f.clamp(0.0, 1.0));
    }

    pub fn progress(&self) -> Option<f32> {
        self.progress
    }

    /// Hand the current staging frame to the refresh worker.
    pub fn flush(&self) {
        self.refresh.request_refresh(&self.staging);
    }

    /// Block until the refresh worker has pushed every requested frame.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.refresh.wait_idle(timeout)
    }

    /// Dump the staging surface as a PNG.
    pub fn screenshot(&self, path: &Path) -> Result<()> {
        screenshot::save_png(&self.staging, path)
    }
}

#[cfg(test)]
pub(crate) fn test_console(
    config: &ConsoleConfig,
    width: u32,
    height: u32,
) -> (RecoveryConsole, lifeboat_display::SharedMemoryDisplay) {
    use lifeboat_display::{MemoryDisplay, SharedMemoryDisplay};
    use lifeboat_types::pixel::Rotation;

    let display = SharedMemoryDisplay::new(MemoryDisplay::rgb565(width, height));
    let chain = SwapChain::new(Box::new(display.clone()), Rotation::None);
    let console = RecoveryConsole::new(config, "en-US", chain, Arc::new(InputRouter::new()))
        .expect("console");
    (console, display)
}
