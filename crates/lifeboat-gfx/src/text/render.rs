//! Line rendering.
//!
//! The draw pass replays the scanner's decisions over the consumed byte
//! range, mutating style state as tags go by. Right-to-left runs are
//! buffered and drawn back-to-front from a right-aligned cursor once the
//! run ends; everything else goes straight to the surface.

use lifeboat_types::color::Color;
use lifeboat_types::font;
use lifeboat_types::geom::Rect;

use crate::surface::Surface;
use crate::text::measure::LineMeasure;
use crate::text::token::{Tag, Token, Tokenizer};
use crate::text::{Alignment, INDENT_CELLS, LayoutState, Style, TextLayout};

impl TextLayout<'_> {
    /// Draw one line of `markup` at `(x, y)` against `max_width` pixels.
    ///
    /// Consumes exactly the bytes [`TextLayout::measure_line`] reports for
    /// the same input and advances `state` for the following line. Pass the
    /// whole remaining markup, not a pre-sliced line: trailing text is what
    /// tells a justified line it is not the last one.
    pub fn render_line(
        &self,
        surface: &mut Surface,
        markup: &str,
        x: i32,
        y: i32,
        max_width: u32,
        state: &mut LayoutState,
    ) -> LineMeasure {
        let scan = self.scan_line(markup, max_width, state);
        let m = scan.measure;
        let scale = self.scale;
        let avail = max_width.saturating_sub(m.indent);

        // Justified lines stretch to the full budget. Lines ended by an
        // explicit break and the final line keep their natural width.
        let justify = m.align == Alignment::Justify
            && !m.hit_break
            && m.consumed < markup.len()
            && m.spaces > 0;
        let (extra_base, extra_rem) = if justify {
            let shortfall = avail.saturating_sub(m.width);
            (shortfall / m.spaces, shortfall % m.spaces)
        } else {
            (0, 0)
        };

        let offset = match m.align {
            Alignment::Left | Alignment::Justify => 0,
            Alignment::Center => avail.saturating_sub(m.width) / 2,
            Alignment::Right => avail.saturating_sub(m.width),
        };
        let mut pen = x + (m.indent + offset) as i32;

        if m.bullet {
            let cell = x + m.indent as i32 - (INDENT_CELLS * font::GLYPH_WIDTH * scale) as i32;
            self.draw_bullet(surface, cell, y, state.style.color);
        }

        let mut style = state.style;
        let mut prev: Option<char> = None;
        let mut glyphs_drawn = 0u32;
        let mut spaces_drawn = 0u32;
        let mut rtl_run: Vec<(char, Style)> = Vec::new();

        for sp in Tokenizer::new(&markup[..m.consumed]) {
            match sp.token {
                Token::Tag(Tag::Bold(v)) => style.bold = v,
                Token::Tag(Tag::Underline(v)) => style.underline = v,
                Token::Tag(Tag::Color(name)) => {
                    if let Some(c) = self.palette().by_name(name) {
                        style.color = c;
                    }
                }
                Token::Tag(_) => {}
                Token::Char('\n') => {}
                Token::Char(ch) if font::is_rtl(ch) => {
                    rtl_run.push((ch, style));
                    prev = Some(ch);
                }
                Token::Char(' ') => {
                    pen = self.flush_rtl(surface, &mut rtl_run, pen, y);
                    let mut adv = font::advance(' ') * scale;
                    let interior = glyphs_drawn > 0 && spaces_drawn < m.spaces;
                    if interior {
                        adv += extra_base + u32::from(spaces_drawn < extra_rem);
                        spaces_drawn += 1;
                        if style.underline {
                            self.underline(surface, pen, y, adv, style.color);
                        }
                    }
                    pen += adv as i32;
                    prev = Some(' ');
                }
                Token::Char(ch) => {
                    pen = self.flush_rtl(surface, &mut rtl_run, pen, y);
                    if let Some(p) = prev {
                        pen += font::kerning(p, ch) * scale as i32;
                    }
                    let adv = font::advance(ch) * scale;
                    self.draw_glyph(surface, ch, pen, y, style);
                    if style.underline {
                        self.underline(surface, pen, y, adv, style.color);
                    }
                    pen += adv as i32;
                    glyphs_drawn += 1;
                    prev = Some(ch);
                }
            }
        }
        let _ = self.flush_rtl(surface, &mut rtl_run, pen, y);

        *state = scan.end_state;
        m
    }

    /// Draw a buffered right-to-left run. The run occupies the same span a
    /// left-to-right run would; only glyph order inside it reverses.
    fn flush_rtl(
        &self,
        surface: &mut Surface,
        run: &mut Vec<(char, Style)>,
        pen: i32,
        y: i32,
    ) -> i32 {
        if run.is_empty() {
            return pen;
        }
        let scale = self.scale;
        let total: u32 = run.iter().map(|(ch, _)| font::advance(*ch) * scale).sum();
        let mut cursor = pen + total as i32;
        for (ch, style) in run.iter() {
            let adv = font::advance(*ch) * scale;
            cursor -= adv as i32;
            self.draw_glyph(surface, *ch, cursor, y, *style);
            if style.underline {
                self.underline(surface, cursor, y, adv, style.color);
            }
        }
        run.clear();
        pen + total as i32
    }

    fn draw_glyph(&self, surface: &mut Surface, ch: char, x: i32, y: i32, style: Style) {
        let scale = self.scale;
        let bitmap = font::glyph(ch);
        for (row, bits) in bitmap.iter().enumerate() {
            for col in 0..font::GLYPH_WIDTH {
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let px = x + (col * scale) as i32;
                let py = y + (row as u32 * scale) as i32;
                if scale == 1 {
                    surface.put_pixel(px, py, style.color);
                    if style.bold {
                        surface.put_pixel(px + 1, py, style.color);
                    }
                } else {
                    surface.fill_rect(Rect::new(px, py, scale, scale), style.color);
                    if style.bold {
                        surface.fill_rect(Rect::new(px + 1, py, scale, scale), style.color);
                    }
                }
            }
        }
    }

    fn underline(&self, surface: &mut Surface, x: i32, y: i32, advance: u32, color: Color) {
        let scale = self.scale;
        let row = y + ((font::GLYPH_HEIGHT - 1) * scale) as i32;
        surface.fill_rect(Rect::new(x, row, advance, scale), color);
    }

    fn draw_bullet(&self, surface: &mut Surface, cell_x: i32, y: i32, color: Color) {
        let s = self.scale;
        surface.fill_rect(
            Rect::new(cell_x + (2 * s) as i32, y + (3 * s) as i32, 3 * s, 3 * s),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeboat_types::color::Palette;

    fn render(markup: &str, width: u32) -> (Surface, Palette) {
        let palette = Palette::default();
        let mut surface = Surface::new(width.max(64), 16);
        {
            let eng = TextLayout::new(&palette, 1);
            let mut state = eng.initial_state();
            eng.render_line(&mut surface, markup, 0, 0, width, &mut state);
        }
        (surface, palette)
    }

    fn colored(surface: &Surface, x: i32, y: i32) -> bool {
        surface.get_pixel(x, y) != Color::BLACK
    }

    #[test]
    fn glyph_pixels_land_where_the_bitmap_says() {
        let (s, p) = render("A", 100);
        // 'A' row 0 is 0x30: columns 2 and 3.
        assert_eq!(s.get_pixel(2, 0), p.text);
        assert_eq!(s.get_pixel(3, 0), p.text);
        assert!(!colored(&s, 0, 0));
    }

    #[test]
    fn color_tag_changes_run_color() {
        let (s, p) = render("<error>A", 100);
        assert_eq!(s.get_pixel(2, 0), p.error);
    }

    #[test]
    fn centered_line_is_offset() {
        let (s, _) = render("<center>ab", 32);
        // Width 16 in a 32px budget: content starts at x=8.
        // 'a' row 2 is 0x78: columns 1..=4.
        assert!(colored(&s, 8 + 1, 2));
        assert!(!colored(&s, 1, 2));
    }

    #[test]
    fn right_aligned_line_touches_budget_edge() {
        let (s, _) = render("<right>ab", 32);
        // 'b' occupies cells 24..32; its row 3 (0x7C) covers columns 1..=5.
        assert!(colored(&s, 24 + 1, 3));
        assert!(!colored(&s, 1, 3));
    }

    #[test]
    fn bold_widens_strokes() {
        let plain = render("i", 100).0;
        let bold = render("<b>i", 100).0;
        // 'i' row 0 is 0x30: columns 2..=3; bold adds column 4.
        assert!(!colored(&plain, 4, 0));
        assert!(colored(&bold, 4, 0));
    }

    #[test]
    fn underline_paints_bottom_row() {
        let (s, p) = render("<u>a", 100);
        for x in 0..8 {
            assert_eq!(s.get_pixel(x, 7), p.text, "missing underline at {x}");
        }
    }

    #[test]
    fn justified_underline_spans_full_budget() {
        // "a b" wraps before "mmmm", so the first line justifies to 32px.
        let (s, p) = render("<u><justify>a b mmmm", 32);
        for x in 0..32 {
            assert_eq!(s.get_pixel(x, 7), p.text, "gap in justified line at {x}");
        }
        assert!(!colored(&s, 32, 7));
    }

    #[test]
    fn final_line_is_not_justified() {
        let (s, _) = render("<justify>a b", 32);
        // Natural width 24; nothing may be drawn past it.
        for x in 24..32 {
            for y in 0..8 {
                assert!(!colored(&s, x, y), "stray pixel at ({x}, {y})");
            }
        }
    }

    #[test]
    fn rtl_run_draws_back_to_front() {
        // First logical character lands at the right end of the run.
        let (s, p) = render("<error>\u{05D0}<text>\u{05D1}", 100);
        // Fallback box row 1 is 0x7E: columns 1..=6.
        assert_eq!(s.get_pixel(8 + 1, 1), p.error);
        assert_eq!(s.get_pixel(1, 1), p.text);
    }

    #[test]
    fn rtl_and_ltr_share_the_line() {
        let (s, p) = render("ab \u{05D0}\u{05D1}", 100);
        // LTR prefix draws at the left; the RTL run follows after the space.
        assert_eq!(s.get_pixel(2, 0), p.text); // 'a'
        assert!(colored(&s, 24 + 1, 1)); // first RTL cell
    }

    #[test]
    fn bullet_marker_is_drawn_in_the_indent() {
        let (s, p) = render("<bullet>a", 100);
        assert_eq!(s.get_pixel(3, 4), p.text);
        // Glyph starts after the two-cell indent.
        assert!(colored(&s, 16 + 1, 2));
    }

    #[test]
    fn state_carries_color_to_next_line() {
        let palette = Palette::default();
        let mut surface = Surface::new(64, 32);
        let eng = TextLayout::new(&palette, 1);
        let mut state = eng.initial_state();
        let m = eng.render_line(&mut surface, "<error>a\nb", 0, 0, 64, &mut state);
        assert!(m.hit_break);
        eng.render_line(&mut surface, "b", 0, 10, 64, &mut state);
        // 'b' row 0 is 0xE0: column 0 at least; check its color.
        assert_eq!(s_color_at(&surface, 10), palette.error);
    }

    fn s_color_at(surface: &Surface, y: i32) -> Color {
        for x in 0..8 {
            for dy in 0..8 {
                let c = surface.get_pixel(x, y + dy);
                if c != Color::BLACK {
                    return c;
                }
            }
        }
        Color::BLACK
    }
}
