//! Color values and the console's semantic palette.
//!
//! The palette is the single source of truth for every color the console
//! draws. Markup color tags (`<error>`, `<title>`, ...) resolve against the
//! palette entry of the same name, and a TOML theme table can override any
//! entry with a hex string.

use serde::Deserialize;

/// A color in RGBA format (0-255 per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Return the same color with a different alpha value.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
}

/// Linear interpolation between two colors at `num/den`.
///
/// Integer math with round-to-nearest. `den == 0` returns `a`.
pub fn lerp_color(a: Color, b: Color, num: u32, den: u32) -> Color {
    if den == 0 {
        return a;
    }
    let inv = den - num;
    Color::rgba(
        ((a.r as u32 * inv + b.r as u32 * num + den / 2) / den) as u8,
        ((a.g as u32 * inv + b.g as u32 * num + den / 2) / den) as u8,
        ((a.b as u32 * inv + b.b as u32 * num + den / 2) / den) as u8,
        ((a.a as u32 * inv + b.a as u32 * num + den / 2) / den) as u8,
    )
}

/// Parse "#RRGGBB" or "#RRGGBBAA" into a `Color`.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.strip_prefix('#')?;
    if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::rgb(r, g, b))
    } else if s.len() == 8 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        let a = u8::from_str_radix(&s[6..8], 16).ok()?;
        Some(Color::rgba(r, g, b, a))
    } else {
        None
    }
}

/// Names of the palette entries, in declaration order.
///
/// Markup color tags accept exactly these names.
pub const PALETTE_NAMES: [&str; 14] = [
    "background",
    "panel",
    "border",
    "text",
    "dim",
    "title",
    "accent",
    "highlight",
    "error",
    "warning",
    "success",
    "info",
    "progress",
    "inverse",
];

/// The resolved 14-entry semantic palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub panel: Color,
    pub border: Color,
    pub text: Color,
    pub dim: Color,
    pub title: Color,
    pub accent: Color,
    pub highlight: Color,
    pub error: Color,
    pub warning: Color,
    pub success: Color,
    pub info: Color,
    pub progress: Color,
    pub inverse: Color,
}

impl Palette {
    /// Look up a palette entry by its markup name.
    pub fn by_name(&self, name: &str) -> Option<Color> {
        match name {
            "background" => Some(self.background),
            "panel" => Some(self.panel),
            "border" => Some(self.border),
            "text" => Some(self.text),
            "dim" => Some(self.dim),
            "title" => Some(self.title),
            "accent" => Some(self.accent),
            "highlight" => Some(self.highlight),
            "error" => Some(self.error),
            "warning" => Some(self.warning),
            "success" => Some(self.success),
            "info" => Some(self.info),
            "progress" => Some(self.progress),
            "inverse" => Some(self.inverse),
            _ => None,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        ThemeOverrides::default().resolve()
    }
}

/// Palette overrides loaded from the `[theme]` table of the config file.
///
/// Every field is a hex color string. Missing fields fall back to the
/// built-in dark scheme; unparseable strings fall back the same way with a
/// warning.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeOverrides {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_panel")]
    pub panel: String,
    #[serde(default = "default_border")]
    pub border: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_dim")]
    pub dim: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_accent")]
    pub accent: String,
    #[serde(default = "default_highlight")]
    pub highlight: String,
    #[serde(default = "default_error")]
    pub error: String,
    #[serde(default = "default_warning")]
    pub warning: String,
    #[serde(default = "default_success")]
    pub success: String,
    #[serde(default = "default_info")]
    pub info: String,
    #[serde(default = "default_progress")]
    pub progress: String,
    #[serde(default = "default_inverse")]
    pub inverse: String,
}

fn default_background() -> String {
    "#000000".to_string()
}
fn default_panel() -> String {
    "#16161E".to_string()
}
fn default_border() -> String {
    "#404048".to_string()
}
fn default_text() -> String {
    "#E0E0E0".to_string()
}
fn default_dim() -> String {
    "#808080".to_string()
}
fn default_title() -> String {
    "#FFFFFF".to_string()
}
fn default_accent() -> String {
    "#3264C8".to_string()
}
fn default_highlight() -> String {
    "#28507F".to_string()
}
fn default_error() -> String {
    "#FF4444".to_string()
}
fn default_warning() -> String {
    "#FFB432".to_string()
}
fn default_success() -> String {
    "#50C878".to_string()
}
fn default_info() -> String {
    "#64B4FF".to_string()
}
fn default_progress() -> String {
    "#3296DC".to_string()
}
fn default_inverse() -> String {
    "#101010".to_string()
}

impl Default for ThemeOverrides {
    fn default() -> Self {
        Self {
            background: default_background(),
            panel: default_panel(),
            border: default_border(),
            text: default_text(),
            dim: default_dim(),
            title: default_title(),
            accent: default_accent(),
            highlight: default_highlight(),
            error: default_error(),
            warning: default_warning(),
            success: default_success(),
            info: default_info(),
            progress: default_progress(),
            inverse: default_inverse(),
        }
    }
}

impl ThemeOverrides {
    /// Resolve every hex string into a concrete `Palette`.
    pub fn resolve(&self) -> Palette {
        Palette {
            background: self.entry(&self.background, default_background),
            panel: self.entry(&self.panel, default_panel),
            border: self.entry(&self.border, default_border),
            text: self.entry(&self.text, default_text),
            dim: self.entry(&self.dim, default_dim),
            title: self.entry(&self.title, default_title),
            accent: self.entry(&self.accent, default_accent),
            highlight: self.entry(&self.highlight, default_highlight),
            error: self.entry(&self.error, default_error),
            warning: self.entry(&self.warning, default_warning),
            success: self.entry(&self.success, default_success),
            info: self.entry(&self.info, default_info),
            progress: self.entry(&self.progress, default_progress),
            inverse: self.entry(&self.inverse, default_inverse),
        }
    }

    fn entry(&self, value: &str, fallback: fn() -> String) -> Color {
        parse_hex_color(value).unwrap_or_else(|| {
            log::warn!("ignoring unparseable theme color {value:?}");
            // Fallback strings are compile-time constants and always parse.
            parse_hex_color(&fallback()).unwrap_or(Color::WHITE)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_is_opaque() {
        let c = Color::rgb(10, 20, 30);
        assert_eq!(c.a, 255);
    }

    #[test]
    fn with_alpha_keeps_channels() {
        let c = Color::rgb(10, 20, 30).with_alpha(128);
        assert_eq!(c, Color::rgba(10, 20, 30, 128));
    }

    #[test]
    fn lerp_endpoints() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(255, 255, 255);
        assert_eq!(lerp_color(a, b, 0, 100), a);
        assert_eq!(lerp_color(a, b, 100, 100), b);
    }

    #[test]
    fn lerp_midpoint_rounds() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(255, 255, 255);
        let mid = lerp_color(a, b, 1, 2);
        assert_eq!(mid.r, 128);
    }

    #[test]
    fn lerp_zero_den_returns_first() {
        let a = Color::rgb(1, 2, 3);
        let b = Color::rgb(4, 5, 6);
        assert_eq!(lerp_color(a, b, 7, 0), a);
    }

    #[test]
    fn parse_hex_colors() {
        assert_eq!(parse_hex_color("#FF0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(
            parse_hex_color("#00FF0080"),
            Some(Color::rgba(0, 255, 0, 128))
        );
        assert_eq!(parse_hex_color("invalid"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
    }

    #[test]
    fn default_palette_resolves() {
        let p = Palette::default();
        assert_eq!(p.background, Color::BLACK);
        assert_eq!(p.error, Color::rgb(0xFF, 0x44, 0x44));
    }

    #[test]
    fn by_name_covers_all_entries() {
        let p = Palette::default();
        for name in PALETTE_NAMES {
            assert!(p.by_name(name).is_some(), "missing palette entry {name}");
        }
        assert_eq!(p.by_name("magenta"), None);
    }

    #[test]
    fn overrides_from_toml() {
        let toml = r##"
background = "#112233"
error = "#FF0000"
"##;
        let ov: ThemeOverrides = toml::from_str(toml).unwrap();
        let p = ov.resolve();
        assert_eq!(p.background, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(p.error, Color::rgb(0xFF, 0, 0));
        // Non-overridden entries keep defaults.
        assert_eq!(p.text, Color::rgb(0xE0, 0xE0, 0xE0));
    }

    #[test]
    fn bad_override_falls_back() {
        let toml = r##"
text = "not a color"
"##;
        let ov: ThemeOverrides = toml::from_str(toml).unwrap();
        let p = ov.resolve();
        assert_eq!(p.text, Color::rgb(0xE0, 0xE0, 0xE0));
    }
}
