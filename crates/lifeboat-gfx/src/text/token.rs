//! Markup tokenizer.
//!
//! Markup is plain text with `<name>` escapes. Only the closed set of names
//! below is recognized; anything else (including an unterminated `<`) is
//! ordinary text, so arbitrary log output can be displayed without escaping.
//! Tags never consume pixel width.

use lifeboat_types::color::PALETTE_NAMES;

use crate::text::Alignment;

/// Longest recognized tag name ("background").
const MAX_TAG_NAME: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag<'a> {
    Bold(bool),
    Underline(bool),
    QuoteOpen,
    QuoteClose,
    Bullet,
    Align(Alignment),
    Break,
    /// A palette entry name; validated by the tokenizer.
    Color(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Char(char),
    Tag(Tag<'a>),
}

/// A token plus the byte range it occupies in the source.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Spanned<'a> {
    pub token: Token<'a>,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Tokenizer { src, pos: 0 }
    }

    /// Current byte offset; the start of the next token.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn parse_tag(name: &str) -> Option<Tag<'_>> {
        match name {
            "b" => Some(Tag::Bold(true)),
            "/b" => Some(Tag::Bold(false)),
            "u" => Some(Tag::Underline(true)),
            "/u" => Some(Tag::Underline(false)),
            "quote" => Some(Tag::QuoteOpen),
            "/quote" => Some(Tag::QuoteClose),
            "bullet" => Some(Tag::Bullet),
            "left" => Some(Tag::Align(Alignment::Left)),
            "center" => Some(Tag::Align(Alignment::Center)),
            "right" => Some(Tag::Align(Alignment::Right)),
            "justify" => Some(Tag::Align(Alignment::Justify)),
            "br" => Some(Tag::Break),
            _ if PALETTE_NAMES.contains(&name) => Some(Tag::Color(name)),
            _ => None,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Spanned<'a>;

    fn next(&mut self) -> Option<Spanned<'a>> {
        let rest = &self.src[self.pos..];
        let mut chars = rest.chars();
        let ch = chars.next()?;
        let start = self.pos;

        if ch == '<' {
            let bytes = rest.as_bytes();
            let close = bytes[1..]
                .iter()
                .take(MAX_TAG_NAME + 1)
                .position(|&b| b == b'>');
            if let Some(i) = close
                && let Some(tag) = Self::parse_tag(&rest[1..1 + i])
            {
                let end = start + i + 2;
                self.pos = end;
                return Some(Spanned {
                    token: Token::Tag(tag),
                    start,
                    end,
                });
            }
            // Not a recognized tag; the '<' is literal text.
        }

        let end = start + ch.len_utf8();
        self.pos = end;
        Some(Spanned {
            token: Token::Char(ch),
            start,
            end,
        })
    }
}
