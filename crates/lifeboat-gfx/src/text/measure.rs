//! Line scanning and measurement.
//!
//! One scanner decides where every line ends; rendering replays its
//! decisions. Tags are resolved while scanning but never cost pixels. A
//! line ends at a literal newline, a `<br>` tag, or when the next glyph
//! would overflow the budget; overflow backtracks to the last whitespace
//! when there is one, otherwise the break lands mid-word. A line always
//! consumes at least one character, so layout makes progress even when a
//! single glyph exceeds the budget.

use lifeboat_types::font;

use crate::text::token::{Tag, Token, Tokenizer};
use crate::text::{Alignment, INDENT_CELLS, LayoutState, TextLayout};

/// Quote nesting deeper than this stops indenting.
const MAX_QUOTE_DEPTH: u32 = 8;

/// What one line of markup resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMeasure {
    /// Bytes of markup this line consumes, tags and the terminating
    /// newline or `<br>` included.
    pub consumed: usize,
    /// The line ended on an explicit break rather than width overflow.
    pub hit_break: bool,
    /// Drawn width in pixels, kerning included.
    pub width: u32,
    /// Interior spaces eligible for justification.
    pub spaces: u32,
    /// Leading indent in pixels (quote levels plus bullet).
    pub indent: u32,
    /// Alignment in effect when the line started drawing.
    pub align: Alignment,
    /// Draw a bullet marker in the indent.
    pub bullet: bool,
    /// The line broke inside a right-to-left run.
    pub rtl_continues: bool,
}

/// Scanner output: the line plus the state the next line starts from.
pub(crate) struct Scan {
    pub measure: LineMeasure,
    pub end_state: LayoutState,
}

/// Whitespace break candidate. Restoring it un-consumes everything after
/// the space, including tag effects.
struct WsMark {
    pos: usize,
    width: u32,
    spaces: u32,
    trailing: u32,
    state: LayoutState,
}

fn indent_px(quote_depth: u32, bullet: bool, scale: u32) -> u32 {
    let cells = quote_depth * INDENT_CELLS + if bullet { INDENT_CELLS } else { 0 };
    cells * font::GLYPH_WIDTH * scale
}

fn next_is_rtl(markup: &str, pos: usize) -> bool {
    markup[pos..].chars().next().is_some_and(font::is_rtl)
}

impl TextLayout<'_> {
    /// Measure one line of `markup` against `max_width` pixels.
    pub fn measure_line(&self, markup: &str, max_width: u32, state: &LayoutState) -> LineMeasure {
        self.scan_line(markup, max_width, state).measure
    }

    pub(crate) fn scan_line(&self, markup: &str, max_width: u32, state: &LayoutState) -> Scan {
        let scale = self.scale;
        let mut st = *state;
        // A bullet requested by the previous line applies here and is
        // consumed once the line draws anything.
        let mut bullet_now = st.bullet_pending;
        st.bullet_pending = false;

        let mut consumed = 0usize;
        let mut width = 0u32;
        let mut spaces = 0u32;
        let mut trailing = 0u32;
        let mut glyphs = 0u32;
        let mut prev: Option<char> = None;
        let mut hit_break = false;
        let mut line_align: Option<Alignment> = None;
        let mut line_indent: Option<u32> = None;
        let mut line_bullet = false;
        let mut rtl_continues = false;
        let mut mark: Option<WsMark> = None;

        for sp in Tokenizer::new(markup) {
            match sp.token {
                Token::Tag(Tag::Break) => {
                    consumed = sp.end;
                    hit_break = true;
                    break;
                }
                Token::Tag(tag) => {
                    match tag {
                        Tag::Bold(v) => st.style.bold = v,
                        Tag::Underline(v) => st.style.underline = v,
                        Tag::Color(name) => {
                            if let Some(c) = self.palette().by_name(name) {
                                st.style.color = c;
                            }
                        }
                        Tag::QuoteOpen => st.quote_depth = (st.quote_depth + 1).min(MAX_QUOTE_DEPTH),
                        Tag::QuoteClose => st.quote_depth = st.quote_depth.saturating_sub(1),
                        Tag::Bullet => {
                            if line_indent.is_none() {
                                bullet_now = true;
                            } else {
                                st.bullet_pending = true;
                            }
                        }
                        Tag::Align(a) => st.align = a,
                        Tag::Break => unreachable!(),
                    }
                    consumed = sp.end;
                }
                Token::Char('\n') => {
                    consumed = sp.end;
                    hit_break = true;
                    break;
                }
                Token::Char(ch) => {
                    // Line attributes freeze at the first width-consuming
                    // token; later indent or alignment tags affect the
                    // following lines.
                    if line_indent.is_none() {
                        line_align = Some(st.align);
                        line_bullet = bullet_now;
                        line_indent = Some(indent_px(st.quote_depth, bullet_now, scale));
                    }
                    let avail = max_width.saturating_sub(line_indent.unwrap_or(0));

                    if ch == ' ' {
                        let adv = font::advance(' ') * scale;
                        if width + adv > avail && glyphs > 0 {
                            // Break at this space: consumed, never drawn.
                            consumed = sp.end;
                            break;
                        }
                        mark = Some(WsMark {
                            pos: sp.end,
                            width,
                            spaces,
                            trailing,
                            state: st,
                        });
                        if glyphs > 0 {
                            spaces += 1;
                            trailing += 1;
                        }
                        width += adv;
                        prev = Some(' ');
                        consumed = sp.end;
                        continue;
                    }

                    let kern = match prev {
                        Some(p) => font::kerning(p, ch) * scale as i32,
                        None => 0,
                    };
                    let adv = (font::advance(ch) * scale) as i32 + kern;
                    let adv = adv.max(0) as u32;
                    if width + adv > avail {
                        if let Some(m) = mark.take() {
                            consumed = m.pos;
                            width = m.width;
                            spaces = m.spaces;
                            trailing = m.trailing;
                            st = m.state;
                        } else if glyphs == 0 {
                            // A single glyph wider than the whole budget
                            // still consumes, or layout would never advance.
                            width += adv;
                            consumed = sp.end;
                            rtl_continues = font::is_rtl(ch) && next_is_rtl(markup, sp.end);
                        } else {
                            consumed = sp.start;
                            rtl_continues =
                                prev.is_some_and(font::is_rtl) && font::is_rtl(ch);
                        }
                        break;
                    }
                    width += adv;
                    glyphs += 1;
                    trailing = 0;
                    prev = Some(ch);
                    consumed = sp.end;
                }
            }
        }

        let mut end_state = st;
        if bullet_now && line_indent.is_none() {
            // The line never drew; the bullet moves to the next one.
            end_state.bullet_pending = true;
        }
        let measure = LineMeasure {
            consumed,
            hit_break,
            width,
            spaces: spaces - trailing,
            indent: line_indent.unwrap_or_else(|| indent_px(st.quote_depth, bullet_now, scale)),
            align: line_align.unwrap_or(st.align),
            bullet: line_bullet,
            rtl_continues,
        };
        Scan { measure, end_state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeboat_types::color::Palette;

    fn measure(markup: &str, width: u32) -> LineMeasure {
        let palette = Palette::default();
        let eng = TextLayout::new(&palette, 1);
        let state = eng.initial_state();
        eng.measure_line(markup, width, &state)
    }

    #[test]
    fn everything_fits_on_a_wide_line() {
        let m = measure("hello", 1000);
        assert_eq!(m.consumed, 5);
        assert!(!m.hit_break);
        assert_eq!(m.width, 5 * 8);
    }

    #[test]
    fn wraps_at_whitespace() {
        // "aaa " fits in 32px, "bbb" does not.
        let m = measure("aaa bbb", 32);
        assert_eq!(m.consumed, 4);
        assert!(!m.hit_break);
        assert_eq!(m.width, 24);
    }

    #[test]
    fn newline_ends_line() {
        let m = measure("ab\ncd", 1000);
        assert_eq!(m.consumed, 3);
        assert!(m.hit_break);
        assert_eq!(m.width, 16);
    }

    #[test]
    fn br_tag_ends_line() {
        let m = measure("ab<br>cd", 1000);
        assert_eq!(m.consumed, 6);
        assert!(m.hit_break);
    }

    #[test]
    fn tags_cost_no_width() {
        let plain = measure("ab", 1000);
        let tagged = measure("<b><error>ab</b>", 1000);
        assert_eq!(plain.width, tagged.width);
        assert_eq!(tagged.consumed, 16);
    }

    #[test]
    fn unknown_tag_is_measured_as_text() {
        let m = measure("<zz>", 1000);
        assert_eq!(m.width, 4 * 8);
    }

    #[test]
    fn single_oversized_glyph_still_consumes() {
        let m = measure("ab", 4);
        assert_eq!(m.consumed, 1);
        assert_eq!(m.width, 8);
        assert!(!m.hit_break);
    }

    #[test]
    fn mid_word_break_without_whitespace() {
        let m = measure("abcdef", 24);
        assert_eq!(m.consumed, 3);
        assert_eq!(m.width, 24);
    }

    #[test]
    fn kerning_tightens_pairs() {
        assert_eq!(measure("AV", 1000).width, 15);
        assert_eq!(measure("AB", 1000).width, 16);
    }

    #[test]
    fn wide_chars_take_two_cells() {
        let m = measure("\u{4E2D}a", 1000);
        assert_eq!(m.width, 16 + 8);
    }

    #[test]
    fn quote_indents_and_narrows() {
        // 40px budget minus one quote level (16px) leaves 24px: three cells.
        let m = measure("<quote>abcd", 40);
        assert_eq!(m.indent, 16);
        assert_eq!(m.consumed, 7 + 3);
    }

    #[test]
    fn bullet_sets_indent_and_flag() {
        let m = measure("<bullet>hi", 1000);
        assert!(m.bullet);
        assert_eq!(m.indent, 16);
    }

    #[test]
    fn bullet_after_text_moves_to_next_line() {
        let palette = Palette::default();
        let eng = TextLayout::new(&palette, 1);
        let state = eng.initial_state();
        let scan = eng.scan_line("x<bullet>", 1000, &state);
        assert!(!scan.measure.bullet);
        assert!(scan.end_state.bullet_pending);
        let next = eng.scan_line("y", 1000, &scan.end_state);
        assert!(next.measure.bullet);
        assert!(!next.end_state.bullet_pending);
    }

    #[test]
    fn alignment_freezes_at_first_glyph() {
        let m = measure("<center>x", 1000);
        assert_eq!(m.align, Alignment::Center);
        let palette = Palette::default();
        let eng = TextLayout::new(&palette, 1);
        let state = eng.initial_state();
        let scan = eng.scan_line("x<center>", 1000, &state);
        assert_eq!(scan.measure.align, Alignment::Left);
        assert_eq!(scan.end_state.align, Alignment::Center);
    }

    #[test]
    fn tag_effects_past_break_point_are_unconsumed() {
        // The <error> tag sits after the wrap space and before the word
        // that overflows, so the next line must re-scan it.
        let palette = Palette::default();
        let eng = TextLayout::new(&palette, 1);
        let state = eng.initial_state();
        let scan = eng.scan_line("aaa <error>bbb", 32, &state);
        assert_eq!(scan.measure.consumed, 4);
        assert_eq!(scan.end_state.style.color, palette.text);
    }

    #[test]
    fn interior_space_count_excludes_edges() {
        let m = measure("a b c ", 1000);
        assert_eq!(m.spaces, 2);
        let lead = measure("  a", 1000);
        assert_eq!(lead.spaces, 0);
    }

    #[test]
    fn rtl_run_break_is_flagged() {
        // Two Hebrew letters fit, the third forces a mid-run break.
        let m = measure("\u{05D0}\u{05D1}\u{05D2}\u{05D3}", 16);
        assert_eq!(m.consumed, 4);
        assert!(m.rtl_continues);
        // Breaking at a space between runs is not a mid-run break.
        let at_space = measure("\u{05D0}\u{05D1} \u{05D2}\u{05D3}", 16);
        assert!(!at_space.rtl_continues);
    }

    #[test]
    fn scale_multiplies_widths() {
        let palette = Palette::default();
        let eng = TextLayout::new(&palette, 2);
        let state = eng.initial_state();
        let m = eng.measure_line("ab", 1000, &state);
        assert_eq!(m.width, 2 * 16);
    }

    mod properties {
        use super::*;
        use crate::surface::Surface;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn layout_always_makes_progress(
                markup in "[ a-zA-Z0-9<>/bqun]{0,60}",
                width in 1u32..200,
            ) {
                let palette = Palette::default();
                let eng = TextLayout::new(&palette, 1);
                let mut state = eng.initial_state();
                let mut pos = 0;
                while pos < markup.len() {
                    let scan = eng.scan_line(&markup[pos..], width, &state);
                    prop_assert!(scan.measure.consumed > 0, "stalled at byte {}", pos);
                    prop_assert!(scan.measure.consumed <= markup.len() - pos);
                    pos += scan.measure.consumed;
                    state = scan.end_state;
                }
                prop_assert_eq!(pos, markup.len());
            }

            #[test]
            fn render_consumes_what_measure_reports(
                markup in "[ a-z<>/bq\\n]{0,48}",
                width in 8u32..160,
            ) {
                let palette = Palette::default();
                let eng = TextLayout::new(&palette, 1);
                let mut surface = Surface::new(200, 16);
                let mstate = eng.initial_state();
                let mut rstate = eng.initial_state();
                let m = eng.measure_line(&markup, width, &mstate);
                let r = eng.render_line(&mut surface, &markup, 0, 0, width, &mut rstate);
                prop_assert_eq!(m.consumed, r.consumed);
                prop_assert_eq!(m.hit_break, r.hit_break);
                prop_assert_eq!(m.width, r.width);
            }
        }
    }
}
