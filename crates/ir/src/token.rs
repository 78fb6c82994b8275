// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Tokens
//!
//! The tokenizer produces one ordered, immutable token list per buffer
//! generation. Comment tokens are kept in the stream so that callers can ask
//! whether a cursor sits inside a comment; every other consumer skips them.

use crate::position::{Position, Span};
use serde::{Deserialize, Serialize};

/// Punctuation tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punct {
    Dot,
    Comma,
    LParen,
    RParen,
    Semicolon,
    Star,
    Hash,
    At,
}

impl Punct {
    /// Map a single character to punctuation
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Punct::Dot),
            ',' => Some(Punct::Comma),
            '(' => Some(Punct::LParen),
            ')' => Some(Punct::RParen),
            ';' => Some(Punct::Semicolon),
            '*' => Some(Punct::Star),
            '#' => Some(Punct::Hash),
            '@' => Some(Punct::At),
            _ => None,
        }
    }
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Reserved word (SELECT, FROM, ...)
    Keyword,
    /// Bare identifier, including `#temp` and `@variable` forms
    Identifier,
    /// Delimited identifier: `[x]`, `"x"` or `` `x` ``
    BracketedIdentifier,
    /// String literal, possibly unterminated
    String,
    Number,
    Operator,
    Punct(Punct),
    /// `GO` alone on its line
    BatchSeparator,
    /// Line or block comment, possibly unterminated
    Comment,
}

/// A single token with its source extent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Original text, delimiters included
    pub text: String,
    /// Position of the first character
    pub start: Position,
    /// Position just past the last character
    pub end: Position,
    /// Byte offset of the first character
    pub offset: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: impl Into<String>, start: Position, end: Position, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            start,
            end,
            offset,
        }
    }

    /// Source extent of the token
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Whether this token is the keyword `kw` (case-insensitive)
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(kw)
    }

    /// Whether this token is one of the given keywords
    pub fn is_any_keyword(&self, kws: &[&str]) -> bool {
        self.kind == TokenKind::Keyword && kws.iter().any(|kw| self.text.eq_ignore_ascii_case(kw))
    }

    /// Whether this token is the punctuation `p`
    pub fn is_punct(&self, p: Punct) -> bool {
        self.kind == TokenKind::Punct(p)
    }

    /// Whether this token can name an object (bare or delimited identifier)
    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::BracketedIdentifier)
    }

    /// Whether the token is a comment
    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    /// Whether the token ends a statement (`;` or `GO`)
    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, TokenKind::Punct(Punct::Semicolon) | TokenKind::BatchSeparator)
    }

    /// Whether the token is a comparison operator
    pub fn is_comparison(&self) -> bool {
        self.kind == TokenKind::Operator
            && matches!(self.text.as_str(), "=" | "<" | ">" | "<=" | ">=" | "<>" | "!=" | "!<" | "!>")
    }

    /// Identifier text without delimiters
    pub fn unquoted(&self) -> String {
        crate::qualified::strip_delimiters(&self.text)
    }
}
