//! Markup text layout and rendering.
//!
//! Text arrives as markup strings (see [`token`]) and is broken into lines
//! against a pixel budget. Measurement and rendering share one scanner, so
//! the bytes a line consumes are identical in both passes; lines are never
//! cached and every frame lays text out from scratch.
//!
//! The engine handles left/center/right/justify alignment, quote and bullet
//! indentation, bold/underline/color runs, right-to-left runs (drawn
//! back-to-front), and double-width CJK cells.

mod measure;
mod render;
mod token;

pub use measure::LineMeasure;

use lifeboat_types::color::{Color, Palette};
use lifeboat_types::font;
use lifeboat_types::geom::Rect;

use crate::surface::Surface;

/// Vertical gap between lines, in base pixels (pre-scale).
pub const LINE_GAP: u32 = 2;

/// Indent step for one quote level or a bullet, in glyph cells.
pub(crate) const INDENT_CELLS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Character-run attributes toggled by markup tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: Color,
    pub bold: bool,
    pub underline: bool,
}

/// Layout state carried across the lines of one markup string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutState {
    pub style: Style,
    pub align: Alignment,
    pub quote_depth: u32,
    pub bullet_pending: bool,
}

impl LayoutState {
    pub fn new(text_color: Color) -> Self {
        LayoutState {
            style: Style {
                color: text_color,
                bold: false,
                underline: false,
            },
            align: Alignment::Left,
            quote_depth: 0,
            bullet_pending: false,
        }
    }
}

/// The layout engine. Holds the palette for color tags and the integer
/// scale over the 8px base font.
pub struct TextLayout<'p> {
    palette: &'p Palette,
    scale: u32,
}

impl<'p> TextLayout<'p> {
    pub fn new(palette: &'p Palette, scale: u32) -> Self {
        TextLayout {
            palette,
            scale: scale.max(1),
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn palette(&self) -> &Palette {
        self.palette
    }

    /// Vertical advance from one line's top to the next.
    pub fn line_height(&self) -> u32 {
        (font::GLYPH_HEIGHT + LINE_GAP) * self.scale
    }

    /// Fresh state for a new markup string.
    pub fn initial_state(&self) -> LayoutState {
        LayoutState::new(self.palette.text)
    }

    /// Total pixel height of `markup` wrapped to `max_width`.
    ///
    /// Consistent with repeated [`TextLayout::measure_line`] calls: the
    /// result is always the line count times [`TextLayout::line_height`].
    pub fn text_height(&self, markup: &str, max_width: u32) -> u32 {
        let mut state = self.initial_state();
        let mut pos = 0;
        let mut lines = 0u32;
        while pos < markup.len() {
            let scan = self.scan_line(&markup[pos..], max_width, &state);
            state = scan.end_state;
            lines += 1;
            if scan.measure.consumed == 0 {
                break;
            }
            pos += scan.measure.consumed;
        }
        lines * self.line_height()
    }

    /// Render `markup` into `rect`, top-aligned, wrapping at the rect
    /// width. Lines that would start past the bottom edge are dropped.
    /// Returns the height actually used.
    pub fn render_block(&self, surface: &mut Surface, markup: &str, rect: Rect) -> u32 {
        let mut state = self.initial_state();
        let mut pos = 0;
        let mut y = rect.y;
        while pos < markup.len() {
            if y + self.line_height() as i32 > rect.bottom() {
                break;
            }
            let rest = &markup[pos..];
            let measure = self.render_line(surface, rest, rect.x, y, rect.w, &mut state);
            if measure.consumed == 0 {
                break;
            }
            pos += measure.consumed;
            y += self.line_height() as i32;
        }
        (y - rect.y) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeboat_types::font::GLYPH_WIDTH;

    fn engine(palette: &Palette) -> TextLayout<'_> {
        TextLayout::new(palette, 1)
    }

    #[test]
    fn measure_and_render_consume_identical_bytes() {
        let palette = Palette::default();
        let eng = engine(&palette);
        let samples = [
            "hello world",
            "a <b>bold</b> claim",
            "wraps over <error>multiple</error> lines of markup text",
            "line\nbreaks<br>everywhere",
            "<quote>indented words go here</quote>",
            "\u{05D0}\u{05D1}\u{05D2} mixed \u{05D3}\u{05D4}",
        ];
        for markup in samples {
            for width in [40u32, 64, 120, 400] {
                let mut surface = Surface::new(256, 64);
                let mstate = eng.initial_state();
                let mut rstate = eng.initial_state();
                let m = eng.measure_line(markup, width, &mstate);
                let r = eng.render_line(&mut surface, markup, 0, 0, width, &mut rstate);
                assert_eq!(
                    m.consumed, r.consumed,
                    "divergence for {markup:?} at width {width}"
                );
                assert_eq!(m.hit_break, r.hit_break);
            }
        }
    }

    #[test]
    fn text_height_matches_line_count() {
        let palette = Palette::default();
        let eng = engine(&palette);
        let markup = "one two three four five six seven eight";
        let width = 10 * GLYPH_WIDTH;
        // Count lines by measuring manually.
        let mut state = eng.initial_state();
        let mut pos = 0;
        let mut lines = 0;
        while pos < markup.len() {
            let m = eng.measure_line(&markup[pos..], width, &state);
            let scan = eng.scan_line(&markup[pos..], width, &state);
            state = scan.end_state;
            assert_eq!(m.consumed, scan.measure.consumed);
            pos += m.consumed.max(1);
            lines += 1;
        }
        assert!(lines > 1);
        assert_eq!(eng.text_height(markup, width), lines * eng.line_height());
    }

    #[test]
    fn text_height_counts_blank_lines() {
        let palette = Palette::default();
        let eng = engine(&palette);
        assert_eq!(eng.text_height("a\n\nb", 100), 3 * eng.line_height());
        assert_eq!(eng.text_height("a\n", 100), eng.line_height());
        assert_eq!(eng.text_height("", 100), 0);
    }

    #[test]
    fn render_block_stops_at_bottom() {
        let palette = Palette::default();
        let eng = engine(&palette);
        let mut surface = Surface::new(64, 16);
        // Three lines of text but room for only one.
        let used = eng.render_block(
            &mut surface,
            "a\nb\nc",
            Rect::new(0, 0, 64, eng.line_height()),
        );
        assert_eq!(used, eng.line_height());
    }

    #[test]
    fn scale_multiplies_line_height() {
        let palette = Palette::default();
        let one = TextLayout::new(&palette, 1);
        let two = TextLayout::new(&palette, 2);
        assert_eq!(two.line_height(), 2 * one.line_height());
        // Zero scale is clamped.
        assert_eq!(TextLayout::new(&palette, 0).scale(), 1);
    }
}
