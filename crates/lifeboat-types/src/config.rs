//! Runtime console configuration.
//!
//! One binary serves every device variant: rotation, pixel layout, device
//! node paths and locale are all data, loaded from a TOML file at startup.
//! A missing or unreadable file falls back to defaults with a warning so
//! recovery still comes up on a misflashed configuration partition.

use std::path::Path;

use serde::Deserialize;

use crate::color::{Palette, ThemeOverrides};
use crate::error::Result;
use crate::pixel::{PixelFormat, Rotation};

/// Console configuration, deserialized from `lifeboat.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Framebuffer device node.
    #[serde(default = "default_framebuffer_path")]
    pub framebuffer_path: String,

    /// Directory scanned for evdev input nodes.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Display rotation in degrees (0, 90 or 270).
    #[serde(default)]
    pub rotation: u32,

    /// Force a pixel layout instead of trusting the device query
    /// ("rgb565", "rgbx" or "bgrx"). Some panels misreport their bitfields.
    #[serde(default)]
    pub pixel_format: Option<String>,

    /// BCP 47 tag selecting the message catalog.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Block device holding the persisted control block.
    #[serde(default = "default_control_block_path")]
    pub control_block_path: String,

    /// Plain-text command file (lowest-precedence argument source).
    #[serde(default = "default_command_file")]
    pub command_file: String,

    /// Rolling session log.
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Log location rotated to at the end of each completed session.
    #[serde(default = "default_last_log_path")]
    pub last_log_path: String,

    /// One-byte install result file.
    #[serde(default = "default_install_result_path")]
    pub install_result_path: String,

    /// File receiving the `--send_intent` argument at session end.
    #[serde(default = "default_intent_file")]
    pub intent_file: String,

    /// Mount point scanned for update packages when installing from the menu.
    #[serde(default = "default_media_path")]
    pub media_path: String,

    /// Destination for debug screenshots of the staging surface.
    #[serde(default = "default_screenshot_path")]
    pub screenshot_path: String,

    /// Menu inactivity timeout in seconds before auto-reboot.
    #[serde(default = "default_menu_timeout_secs")]
    pub menu_timeout_secs: u64,

    /// Palette overrides.
    #[serde(default)]
    pub theme: ThemeOverrides,
}

fn default_framebuffer_path() -> String {
    "/dev/fb0".to_string()
}
fn default_input_dir() -> String {
    "/dev/input".to_string()
}
fn default_locale() -> String {
    "en-US".to_string()
}
fn default_control_block_path() -> String {
    "/dev/block/misc".to_string()
}
fn default_command_file() -> String {
    "/cache/recovery/command".to_string()
}
fn default_log_path() -> String {
    "/cache/recovery/log".to_string()
}
fn default_last_log_path() -> String {
    "/cache/recovery/last_log".to_string()
}
fn default_install_result_path() -> String {
    "/cache/recovery/last_install".to_string()
}
fn default_intent_file() -> String {
    "/cache/recovery/intent".to_string()
}
fn default_media_path() -> String {
    "/sdcard".to_string()
}
fn default_screenshot_path() -> String {
    "/cache/recovery/screenshot.png".to_string()
}
fn default_menu_timeout_secs() -> u64 {
    120
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            framebuffer_path: default_framebuffer_path(),
            input_dir: default_input_dir(),
            rotation: 0,
            pixel_format: None,
            locale: default_locale(),
            control_block_path: default_control_block_path(),
            command_file: default_command_file(),
            log_path: default_log_path(),
            last_log_path: default_last_log_path(),
            install_result_path: default_install_result_path(),
            intent_file: default_intent_file(),
            media_path: default_media_path(),
            screenshot_path: default_screenshot_path(),
            menu_timeout_secs: default_menu_timeout_secs(),
            theme: ThemeOverrides::default(),
        }
    }
}

impl ConsoleConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file, falling back to defaults when it is missing or
    /// malformed. Recovery must come up even with a wiped config partition.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match Self::from_toml_str(&text) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("ignoring malformed config {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("no config at {} ({e}); using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Parsed display rotation.
    pub fn display_rotation(&self) -> Result<Rotation> {
        Rotation::from_degrees(self.rotation)
    }

    /// Parsed pixel-format override, if one is configured.
    pub fn pixel_override(&self) -> Option<PixelFormat> {
        let name = self.pixel_format.as_deref()?;
        let fmt = PixelFormat::from_name(name);
        if fmt.is_none() {
            log::warn!("ignoring unknown pixel_format override {name:?}");
        }
        fmt
    }

    /// Resolved color palette.
    pub fn palette(&self) -> Palette {
        self.theme.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = ConsoleConfig::default();
        assert_eq!(cfg.framebuffer_path, "/dev/fb0");
        assert_eq!(cfg.input_dir, "/dev/input");
        assert_eq!(cfg.rotation, 0);
        assert_eq!(cfg.pixel_format, None);
        assert_eq!(cfg.locale, "en-US");
        assert_eq!(cfg.menu_timeout_secs, 120);
        assert_eq!(cfg.display_rotation().unwrap(), Rotation::None);
    }

    #[test]
    fn empty_toml_equals_defaults() {
        let cfg = ConsoleConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.framebuffer_path, ConsoleConfig::default().framebuffer_path);
        assert_eq!(cfg.locale, "en-US");
    }

    #[test]
    fn partial_toml_overrides() {
        let cfg = ConsoleConfig::from_toml_str(
            r#"
rotation = 90
locale = "sr-Latn"
pixel_format = "rgb565"
"#,
        )
        .unwrap();
        assert_eq!(cfg.display_rotation().unwrap(), Rotation::Cw90);
        assert_eq!(cfg.locale, "sr-Latn");
        assert_eq!(cfg.pixel_override(), Some(PixelFormat::Rgb565));
        // Untouched fields keep defaults.
        assert_eq!(cfg.framebuffer_path, "/dev/fb0");
    }

    #[test]
    fn bad_rotation_is_an_error() {
        let cfg = ConsoleConfig::from_toml_str("rotation = 180").unwrap();
        assert!(cfg.display_rotation().is_err());
    }

    #[test]
    fn unknown_pixel_override_is_ignored() {
        let cfg = ConsoleConfig::from_toml_str(r#"pixel_format = "argb1555""#).unwrap();
        assert_eq!(cfg.pixel_override(), None);
    }

    #[test]
    fn theme_table_reaches_palette() {
        let cfg = ConsoleConfig::from_toml_str(
            r##"
[theme]
accent = "#AABBCC"
"##,
        )
        .unwrap();
        let p = cfg.palette();
        assert_eq!(p.accent, crate::color::Color::rgb(0xAA, 0xBB, 0xCC));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("lifeboat-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "rotation = [[[").unwrap();
        let cfg = ConsoleConfig::load_or_default(&path);
        assert_eq!(cfg.rotation, 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ConsoleConfig::load_or_default(Path::new("/nonexistent/lifeboat.toml"));
        assert_eq!(cfg.locale, "en-US");
    }
}
