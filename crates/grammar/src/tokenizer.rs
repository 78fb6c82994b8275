// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Tokenizer
//!
//! Turns a whole buffer into an ordered token list. The scan is deterministic
//! and never fails: unterminated strings and block comments run to the end of
//! input, unterminated delimited identifiers run to the end of their line.

use crate::keywords::is_reserved;
use sqlctx_ir::{Dialect, Position, Punct, Token, TokenKind};

/// Tokenize `text` for `dialect`
pub fn tokenize(text: &str, dialect: Dialect) -> Vec<Token> {
    Tokenizer::new(text, dialect).run()
}

struct Tokenizer<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    idx: usize,
    pos: Position,
    dialect: Dialect,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str, dialect: Dialect) -> Self {
        Self {
            text,
            chars: text.char_indices().collect(),
            idx: 0,
            pos: Position::start(),
            dialect,
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.peek(0) {
            if ch.is_whitespace() {
                self.bump();
                continue;
            }
            let start = self.pos;
            let offset = self.offset();
            let kind = self.scan(ch);
            let text = &self.text[offset..self.offset()];
            tokens.push(Token::new(kind, text, start, self.pos, offset));
        }
        tokens
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.idx + n).map(|(_, c)| *c)
    }

    fn bump(&mut self) {
        if let Some((_, ch)) = self.chars.get(self.idx) {
            self.pos = self.pos.advance(*ch);
            self.idx += 1;
        }
    }

    fn offset(&self) -> usize {
        self.chars.get(self.idx).map_or(self.text.len(), |(o, _)| *o)
    }

    fn scan(&mut self, ch: char) -> TokenKind {
        match ch {
            '-' if self.peek(1) == Some('-') => {
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.bump();
                }
                TokenKind::Comment
            }
            '/' if self.peek(1) == Some('*') => {
                self.block_comment();
                TokenKind::Comment
            }
            '\'' => {
                self.quoted('\'');
                TokenKind::String
            }
            'N' | 'n' if self.peek(1) == Some('\'') => {
                self.bump();
                self.quoted('\'');
                TokenKind::String
            }
            '"' if self.dialect.double_quote_identifiers() => {
                self.delimited('"');
                TokenKind::BracketedIdentifier
            }
            '"' => {
                self.quoted('"');
                TokenKind::String
            }
            '[' if self.dialect.bracket_identifiers() => {
                self.delimited(']');
                TokenKind::BracketedIdentifier
            }
            '`' if self.dialect.backtick_identifiers() => {
                self.delimited('`');
                TokenKind::BracketedIdentifier
            }
            c if c.is_ascii_digit() => {
                self.number();
                TokenKind::Number
            }
            c if is_ident_start(c) || self.at_sigil_word() => self.word(),
            c => {
                self.bump();
                if let Some(p) = Punct::from_char(c) {
                    return TokenKind::Punct(p);
                }
                if let Some(next) = self.peek(0) {
                    if matches!(
                        (c, next),
                        ('<', '=') | ('>', '=') | ('<', '>') | ('!', '=') | ('!', '<') | ('!', '>') | ('|', '|') | (':', ':')
                    ) {
                        self.bump();
                    }
                }
                TokenKind::Operator
            }
        }
    }

    /// `#temp`, `##global`, `@var` and `@@sysvar` read as one word
    fn at_sigil_word(&self) -> bool {
        let Some(sigil) = self.peek(0).filter(|c| *c == '#' || *c == '@') else {
            return false;
        };
        match self.peek(1) {
            Some(c) if c == sigil => self.peek(2).is_some_and(is_ident_start),
            Some(c) => is_ident_start(c),
            None => false,
        }
    }

    fn word(&mut self) -> TokenKind {
        let start = self.offset();
        while self.peek(0).is_some_and(|c| c == '#' || c == '@') {
            self.bump();
        }
        while self.peek(0).is_some_and(is_ident_continue) {
            self.bump();
        }
        let word = &self.text[start..self.offset()];

        if word.starts_with('#') || word.starts_with('@') {
            return TokenKind::Identifier;
        }
        if word.eq_ignore_ascii_case("GO") {
            if self.dialect.supports_batch_separator() && self.alone_on_line(start, self.offset()) {
                return TokenKind::BatchSeparator;
            }
            return TokenKind::Identifier;
        }
        if is_reserved(word) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        }
    }

    /// Whether `[start, end)` is the only thing on its line, allowing a repeat count
    fn alone_on_line(&self, start: usize, end: usize) -> bool {
        let line_start = self.text[..start].rfind('\n').map_or(0, |i| i + 1);
        if !self.text[line_start..start].trim().is_empty() {
            return false;
        }
        let rest = &self.text[end..];
        let rest = rest.split('\n').next().unwrap_or_default().trim();
        rest.is_empty() || rest.starts_with("--") || rest.chars().all(|c| c.is_ascii_digit())
    }

    fn block_comment(&mut self) {
        self.bump();
        self.bump();
        let mut depth = 1usize;
        while let Some(c) = self.peek(0) {
            if c == '/' && self.peek(1) == Some('*') {
                self.bump();
                self.bump();
                depth += 1;
            } else if c == '*' && self.peek(1) == Some('/') {
                self.bump();
                self.bump();
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else {
                self.bump();
            }
        }
    }

    /// String literal with doubled-delimiter escapes
    fn quoted(&mut self, delim: char) {
        self.bump();
        while let Some(c) = self.peek(0) {
            self.bump();
            if c == delim {
                if self.peek(0) == Some(delim) {
                    self.bump();
                } else {
                    return;
                }
            }
        }
    }

    /// Delimited identifier; unterminated ones stop at the end of the line
    fn delimited(&mut self, close: char) {
        self.bump();
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                return;
            }
            self.bump();
            if c == close {
                if self.peek(0) == Some(close) {
                    self.bump();
                } else {
                    return;
                }
            }
        }
    }

    fn number(&mut self) {
        if self.peek(0) == Some('0') && matches!(self.peek(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            while self.peek(0).is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            return;
        }
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(0), Some('e' | 'E')) {
            let digit_at = if matches!(self.peek(1), Some('+' | '-')) { 2 } else { 1 };
            if self.peek(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '#' | '@')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text, Dialect::SqlServer).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_select() {
        let tokens = tokenize("SELECT e.Name FROM dbo.Employees e", Dialect::SqlServer);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["SELECT", "e", ".", "Name", "FROM", "dbo", ".", "Employees", "e"]);
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[4].start, Position::new(1, 15));
    }

    #[test]
    fn test_positions_across_lines() {
        let tokens = tokenize("SELECT 1\n  FROM t", Dialect::SqlServer);
        assert_eq!(tokens[2].start, Position::new(2, 3));
        assert_eq!(tokens[2].end, Position::new(2, 7));
        assert_eq!(tokens[3].offset, 16);
    }

    #[test]
    fn test_brackets_and_escapes() {
        let tokens = tokenize("[Order]] Details].[x]", Dialect::SqlServer);
        assert_eq!(tokens[0].kind, TokenKind::BracketedIdentifier);
        assert_eq!(tokens[0].unquoted(), "Order] Details");
        assert_eq!(tokens[1].kind, TokenKind::Punct(Punct::Dot));
    }

    #[test]
    fn test_unterminated_bracket_stops_at_line_end() {
        let tokens = tokenize("FROM [Sal\nWHERE", Dialect::SqlServer);
        assert_eq!(tokens[1].text, "[Sal");
        assert!(tokens[2].is_keyword("WHERE"));
    }

    #[test]
    fn test_strings_and_comments() {
        assert_eq!(
            kinds("'it''s' -- trailing\n/* a /* b */ c */ N'x'"),
            vec![TokenKind::String, TokenKind::Comment, TokenKind::Comment, TokenKind::String]
        );
        assert_eq!(kinds("'open"), vec![TokenKind::String]);
    }

    #[test]
    fn test_temp_tables_and_variables() {
        let tokens = tokenize("SELECT * FROM ##g JOIN #t ON @id = @@ROWCOUNT #", Dialect::SqlServer);
        assert_eq!(tokens[3].text, "##g");
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[5].text, "#t");
        assert_eq!(tokens[7].text, "@id");
        assert_eq!(tokens[9].text, "@@ROWCOUNT");
        assert_eq!(tokens[10].kind, TokenKind::Punct(Punct::Hash));
    }

    #[test]
    fn test_go_alone_on_line() {
        let tokens = tokenize("SELECT 1\nGO\nSELECT go\n  go 3", Dialect::SqlServer);
        assert_eq!(tokens[2].kind, TokenKind::BatchSeparator);
        assert_eq!(tokens[4].kind, TokenKind::Identifier);
        assert_eq!(tokens[5].kind, TokenKind::BatchSeparator);

        let mysql = tokenize("SELECT 1\nGO", Dialect::MySQL);
        assert_eq!(mysql[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("a <> b != c <= 1.5e3", Dialect::SqlServer);
        assert!(tokens[1].is_comparison());
        assert_eq!(tokens[3].text, "!=");
        assert_eq!(tokens[5].text, "<=");
        assert_eq!(tokens[6].text, "1.5e3");
    }

    #[test]
    fn test_dialect_quoting() {
        let pg = tokenize("\"Order\" 'x'", Dialect::PostgreSQL);
        assert_eq!(pg[0].kind, TokenKind::BracketedIdentifier);
        let my = tokenize("`Order` \"x\"", Dialect::MySQL);
        assert_eq!(my[0].kind, TokenKind::BracketedIdentifier);
        assert_eq!(my[1].kind, TokenKind::String);
    }

    #[test]
    fn test_deterministic() {
        let text = "SELECT [a], 'b' FROM t -- c";
        assert_eq!(tokenize(text, Dialect::SqlServer), tokenize(text, Dialect::SqlServer));
    }
}
