//! Built-in 8x8 bitmap font.
//!
//! Glyph rows are bit-per-pixel with the leftmost column in the high bit
//! (`row & (0x80 >> col)`). The renderer scales glyphs by integer factors of
//! the 8px base size. Coverage is printable ASCII; everything else renders
//! the fallback box, with CJK ideographs advancing two cells.
//!
//! Advance is per glyph (a few narrow punctuation marks and letters take 6px
//! instead of 8) and a small kerning table tightens classic letter pairs.
//! Measurement and rendering must consult the same tables or line breaks
//! drift from the drawn pixels.

pub const GLYPH_WIDTH: u32 = 8;
pub const GLYPH_HEIGHT: u32 = 8;

/// First codepoint in the glyph table.
const FIRST_GLYPH: u32 = 0x20;

/// Rendered for any codepoint outside the table.
pub static FALLBACK: [u8; 8] = [0x00, 0x7E, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x00];

/// Printable ASCII 0x20..=0x7E.
static GLYPHS: [[u8; 8]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x30, 0x78, 0x78, 0x30, 0x30, 0x00, 0x30, 0x00], // '!'
    [0x6C, 0x6C, 0x48, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x6C, 0x6C, 0xFE, 0x6C, 0xFE, 0x6C, 0x6C, 0x00], // '#'
    [0x30, 0x7C, 0xC0, 0x78, 0x0C, 0xF8, 0x30, 0x00], // '$'
    [0x00, 0xC6, 0xCC, 0x18, 0x30, 0x66, 0xC6, 0x00], // '%'
    [0x38, 0x6C, 0x38, 0x76, 0xDC, 0xCC, 0x76, 0x00], // '&'
    [0x60, 0x60, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x18, 0x30, 0x60, 0x60, 0x60, 0x30, 0x18, 0x00], // '('
    [0x60, 0x30, 0x18, 0x18, 0x18, 0x30, 0x60, 0x00], // ')'
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // '*'
    [0x00, 0x30, 0x30, 0xFC, 0x30, 0x30, 0x00, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x30, 0x60], // ','
    [0x00, 0x00, 0x00, 0xFC, 0x00, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x30, 0x00], // '.'
    [0x06, 0x0C, 0x18, 0x30, 0x60, 0xC0, 0x80, 0x00], // '/'
    [0x7C, 0xC6, 0xCE, 0xDE, 0xF6, 0xE6, 0x7C, 0x00], // '0'
    [0x30, 0x70, 0x30, 0x30, 0x30, 0x30, 0xFC, 0x00], // '1'
    [0x78, 0xCC, 0x0C, 0x38, 0x60, 0xCC, 0xFC, 0x00], // '2'
    [0x78, 0xCC, 0x0C, 0x38, 0x0C, 0xCC, 0x78, 0x00], // '3'
    [0x1C, 0x3C, 0x6C, 0xCC, 0xFE, 0x0C, 0x1E, 0x00], // '4'
    [0xFC, 0xC0, 0xF8, 0x0C, 0x0C, 0xCC, 0x78, 0x00], // '5'
    [0x38, 0x60, 0xC0, 0xF8, 0xCC, 0xCC, 0x78, 0x00], // '6'
    [0xFC, 0xCC, 0x0C, 0x18, 0x30, 0x30, 0x30, 0x00], // '7'
    [0x78, 0xCC, 0xCC, 0x78, 0xCC, 0xCC, 0x78, 0x00], // '8'
    [0x78, 0xCC, 0xCC, 0x7C, 0x0C, 0x18, 0x70, 0x00], // '9'
    [0x00, 0x30, 0x30, 0x00, 0x00, 0x30, 0x30, 0x00], // ':'
    [0x00, 0x30, 0x30, 0x00, 0x00, 0x30, 0x30, 0x60], // ';'
    [0x18, 0x30, 0x60, 0xC0, 0x60, 0x30, 0x18, 0x00], // '<'
    [0x00, 0x00, 0xFC, 0x00, 0x00, 0xFC, 0x00, 0x00], // '='
    [0x60, 0x30, 0x18, 0x0C, 0x18, 0x30, 0x60, 0x00], // '>'
    [0x78, 0xCC, 0x0C, 0x18, 0x30, 0x00, 0x30, 0x00], // '?'
    [0x7C, 0xC6, 0xDE, 0xDE, 0xDE, 0xC0, 0x78, 0x00], // '@'
    [0x30, 0x78, 0xCC, 0xCC, 0xFC, 0xCC, 0xCC, 0x00], // 'A'
    [0xFC, 0x66, 0x66, 0x7C, 0x66, 0x66, 0xFC, 0x00], // 'B'
    [0x3C, 0x66, 0xC0, 0xC0, 0xC0, 0x66, 0x3C, 0x00], // 'C'
    [0xF8, 0x6C, 0x66, 0x66, 0x66, 0x6C, 0xF8, 0x00], // 'D'
    [0xFE, 0x62, 0x68, 0x78, 0x68, 0x62, 0xFE, 0x00], // 'E'
    [0xFE, 0x62, 0x68, 0x78, 0x68, 0x60, 0xF0, 0x00], // 'F'
    [0x3C, 0x66, 0xC0, 0xC0, 0xCE, 0x66, 0x3E, 0x00], // 'G'
    [0xCC, 0xCC, 0xCC, 0xFC, 0xCC, 0xCC, 0xCC, 0x00], // 'H'
    [0x78, 0x30, 0x30, 0x30, 0x30, 0x30, 0x78, 0x00], // 'I'
    [0x1E, 0x0C, 0x0C, 0x0C, 0xCC, 0xCC, 0x78, 0x00], // 'J'
    [0xE6, 0x66, 0x6C, 0x78, 0x6C, 0x66, 0xE6, 0x00], // 'K'
    [0xF0, 0x60, 0x60, 0x60, 0x62, 0x66, 0xFE, 0x00], // 'L'
    [0xC6, 0xEE, 0xFE, 0xFE, 0xD6, 0xC6, 0xC6, 0x00], // 'M'
    [0xC6, 0xE6, 0xF6, 0xDE, 0xCE, 0xC6, 0xC6, 0x00], // 'N'
    [0x38, 0x6C, 0xC6, 0xC6, 0xC6, 0x6C, 0x38, 0x00], // 'O'
    [0xFC, 0x66, 0x66, 0x7C, 0x60, 0x60, 0xF0, 0x00], // 'P'
    [0x78, 0xCC, 0xCC, 0xCC, 0xDC, 0x78, 0x1C, 0x00], // 'Q'
    [0xFC, 0x66, 0x66, 0x7C, 0x6C, 0x66, 0xE6, 0x00], // 'R'
    [0x78, 0xCC, 0xE0, 0x70, 0x1C, 0xCC, 0x78, 0x00], // 'S'
    [0xFC, 0xB4, 0x30, 0x30, 0x30, 0x30, 0x78, 0x00], // 'T'
    [0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0xFC, 0x00], // 'U'
    [0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0x78, 0x30, 0x00], // 'V'
    [0xC6, 0xC6, 0xC6, 0xD6, 0xFE, 0xEE, 0xC6, 0x00], // 'W'
    [0xC6, 0xC6, 0x6C, 0x38, 0x38, 0x6C, 0xC6, 0x00], // 'X'
    [0xCC, 0xCC, 0xCC, 0x78, 0x30, 0x30, 0x78, 0x00], // 'Y'
    [0xFE, 0xC6, 0x8C, 0x18, 0x32, 0x66, 0xFE, 0x00], // 'Z'
    [0x78, 0x60, 0x60, 0x60, 0x60, 0x60, 0x78, 0x00], // '['
    [0xC0, 0x60, 0x30, 0x18, 0x0C, 0x06, 0x02, 0x00], // '\\'
    [0x78, 0x18, 0x18, 0x18, 0x18, 0x18, 0x78, 0x00], // ']'
    [0x10, 0x38, 0x6C, 0xC6, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // '_'
    [0x30, 0x30, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // '`'
    [0x00, 0x00, 0x78, 0x0C, 0x7C, 0xCC, 0x76, 0x00], // 'a'
    [0xE0, 0x60, 0x60, 0x7C, 0x66, 0x66, 0xDC, 0x00], // 'b'
    [0x00, 0x00, 0x78, 0xCC, 0xC0, 0xCC, 0x78, 0x00], // 'c'
    [0x1C, 0x0C, 0x0C, 0x7C, 0xCC, 0xCC, 0x76, 0x00], // 'd'
    [0x00, 0x00, 0x78, 0xCC, 0xFC, 0xC0, 0x78, 0x00], // 'e'
    [0x38, 0x6C, 0x60, 0xF0, 0x60, 0x60, 0xF0, 0x00], // 'f'
    [0x00, 0x00, 0x76, 0xCC, 0xCC, 0x7C, 0x0C, 0xF8], // 'g'
    [0xE0, 0x60, 0x6C, 0x76, 0x66, 0x66, 0xE6, 0x00], // 'h'
    [0x30, 0x00, 0x70, 0x30, 0x30, 0x30, 0x78, 0x00], // 'i'
    [0x0C, 0x00, 0x0C, 0x0C, 0x0C, 0xCC, 0xCC, 0x78], // 'j'
    [0xE0, 0x60, 0x66, 0x6C, 0x78, 0x6C, 0xE6, 0x00], // 'k'
    [0x70, 0x30, 0x30, 0x30, 0x30, 0x30, 0x78, 0x00], // 'l'
    [0x00, 0x00, 0xCC, 0xFE, 0xFE, 0xD6, 0xC6, 0x00], // 'm'
    [0x00, 0x00, 0xF8, 0xCC, 0xCC, 0xCC, 0xCC, 0x00], // 'n'
    [0x00, 0x00, 0x78, 0xCC, 0xCC, 0xCC, 0x78, 0x00], // 'o'
    [0x00, 0x00, 0xDC, 0x66, 0x66, 0x7C, 0x60, 0xF0], // 'p'
    [0x00, 0x00, 0x76, 0xCC, 0xCC, 0x7C, 0x0C, 0x1E], // 'q'
    [0x00, 0x00, 0xDC, 0x76, 0x66, 0x60, 0xF0, 0x00], // 'r'
    [0x00, 0x00, 0x7C, 0xC0, 0x78, 0x0C, 0xF8, 0x00], // 's'
    [0x10, 0x30, 0x7C, 0x30, 0x30, 0x34, 0x18, 0x00], // 't'
    [0x00, 0x00, 0xCC, 0xCC, 0xCC, 0xCC, 0x76, 0x00], // 'u'
    [0x00, 0x00, 0xCC, 0xCC, 0xCC, 0x78, 0x30, 0x00], // 'v'
    [0x00, 0x00, 0xC6, 0xD6, 0xFE, 0xFE, 0x6C, 0x00], // 'w'
    [0x00, 0x00, 0xC6, 0x6C, 0x38, 0x6C, 0xC6, 0x00], // 'x'
    [0x00, 0x00, 0xCC, 0xCC, 0xCC, 0x7C, 0x0C, 0xF8], // 'y'
    [0x00, 0x00, 0xFC, 0x98, 0x30, 0x64, 0xFC, 0x00], // 'z'
    [0x1C, 0x30, 0x30, 0xE0, 0x30, 0x30, 0x1C, 0x00], // '{'
    [0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // '|'
    [0xE0, 0x30, 0x30, 0x1C, 0x30, 0x30, 0xE0, 0x00], // '}'
    [0x76, 0xDC, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // '~'
];

/// Letter pairs drawn one pixel tighter than their advances suggest.
static KERN_PAIRS: [(char, char); 18] = [
    ('A', 'T'),
    ('A', 'V'),
    ('A', 'W'),
    ('A', 'Y'),
    ('F', 'a'),
    ('L', 'T'),
    ('L', 'V'),
    ('L', 'Y'),
    ('P', 'a'),
    ('T', 'a'),
    ('T', 'e'),
    ('T', 'o'),
    ('V', 'a'),
    ('V', 'e'),
    ('V', 'o'),
    ('Y', 'a'),
    ('Y', 'e'),
    ('Y', 'o'),
];

/// Glyph bitmap for a codepoint, falling back to the box glyph.
pub fn glyph(ch: char) -> &'static [u8; 8] {
    let cp = ch as u32;
    if (FIRST_GLYPH..FIRST_GLYPH + GLYPHS.len() as u32).contains(&cp) {
        &GLYPHS[(cp - FIRST_GLYPH) as usize]
    } else {
        &FALLBACK
    }
}

/// Horizontal advance of a glyph at base size, in pixels.
pub fn advance(ch: char) -> u32 {
    if is_wide(ch) {
        return GLYPH_WIDTH * 2;
    }
    match ch {
        '.' | ',' | ':' | ';' | '!' | '\'' | '`' | 'i' | 'l' | '|' => 6,
        _ => GLYPH_WIDTH,
    }
}

/// Kerning adjustment between two adjacent glyphs at base size.
pub fn kerning(prev: char, next: char) -> i32 {
    if KERN_PAIRS.contains(&(prev, next)) {
        -1
    } else {
        0
    }
}

/// Whether a codepoint belongs to the right-to-left range.
///
/// One contiguous range (Hebrew through Arabic). Scripts outside it are
/// treated as left-to-right.
pub fn is_rtl(ch: char) -> bool {
    ('\u{0590}'..='\u{06FF}').contains(&ch)
}

/// Whether a codepoint renders double-width (CJK unified ideographs).
pub fn is_wide(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_printable_ascii() {
        for cp in 0x20u32..=0x7E {
            let ch = char::from_u32(cp).unwrap();
            // Known codepoints never return the fallback box.
            assert!(
                !std::ptr::eq(glyph(ch), &FALLBACK),
                "missing glyph for {ch:?}"
            );
        }
    }

    #[test]
    fn out_of_table_returns_fallback() {
        assert!(std::ptr::eq(glyph('\u{00E9}'), &FALLBACK));
        assert!(std::ptr::eq(glyph('\u{05D0}'), &FALLBACK));
        assert!(std::ptr::eq(glyph('\t'), &FALLBACK));
    }

    #[test]
    fn space_is_blank() {
        assert_eq!(glyph(' '), &[0u8; 8]);
    }

    #[test]
    fn distinct_letters_have_distinct_bitmaps() {
        assert_ne!(glyph('A'), glyph('B'));
        assert_ne!(glyph('O'), glyph('0'));
    }

    #[test]
    fn advances() {
        assert_eq!(advance('A'), 8);
        assert_eq!(advance(' '), 8);
        assert_eq!(advance('i'), 6);
        assert_eq!(advance('.'), 6);
        assert_eq!(advance('\u{4E2D}'), 16);
    }

    #[test]
    fn narrow_glyphs_fit_their_advance() {
        // Narrow glyphs must not paint columns their 6px advance gives away.
        for ch in ['.', ',', ':', ';', '!', '\'', '`', 'i', 'l', '|'] {
            for row in glyph(ch) {
                assert_eq!(row & 0x03, 0, "{ch:?} paints past column 5");
            }
        }
    }

    #[test]
    fn kerning_pairs() {
        assert_eq!(kerning('A', 'V'), -1);
        assert_eq!(kerning('T', 'o'), -1);
        assert_eq!(kerning('A', 'B'), 0);
        assert_eq!(kerning('a', 'v'), 0);
    }

    #[test]
    fn rtl_range_bounds() {
        assert!(is_rtl('\u{0590}'));
        assert!(is_rtl('\u{05D0}')); // aleph
        assert!(is_rtl('\u{0645}')); // meem
        assert!(is_rtl('\u{06FF}'));
        assert!(!is_rtl('\u{058F}'));
        assert!(!is_rtl('\u{0700}'));
        assert!(!is_rtl('A'));
    }

    #[test]
    fn wide_range_bounds() {
        assert!(is_wide('\u{4E00}'));
        assert!(is_wide('\u{9FFF}'));
        assert!(!is_wide('\u{4DFF}'));
        assert!(!is_wide('\u{A000}'));
        assert!(!is_wide('W'));
    }
}
