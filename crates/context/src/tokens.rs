// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Token context helpers
//!
//! Pure functions over a token list and a cursor position. Comment tokens are
//! skipped by everything except [`is_in_string_or_comment`].
//!
//! A *reference* is the dotted chain the cursor is typing into: an optional
//! qualifier ending in a dot, then an optional partial word (the prefix).
//! `Sales.dbo.Emp█` has qualifier `Sales.dbo.` and prefix `Emp`.

use crate::result::LeftSideColumn;
use sqlctx_ir::{Position, Punct, QualifiedName, Token, TokenKind, strip_delimiters};

/// Significant tokens around a cursor and the reference being typed there
#[derive(Debug, Clone)]
pub struct CursorTokens<'t> {
    tokens: Vec<&'t Token>,
    pos: Position,
    word: Option<usize>,
    reference_start: usize,
    prefix: String,
    trigger: Option<char>,
    qualifier: Option<QualifiedName>,
}

impl<'t> CursorTokens<'t> {
    pub fn new(tokens: &'t [Token], pos: Position) -> Self {
        let tokens: Vec<&Token> = tokens.iter().filter(|t| !t.is_comment()).collect();
        let before = tokens.partition_point(|t| t.start < pos);

        let mut word = None;
        let mut prefix = String::new();
        let mut trigger = None;
        if let Some(idx) = before.checked_sub(1) {
            let tok = tokens[idx];
            if pos <= tok.end && is_word(tok) {
                word = Some(idx);
                (prefix, trigger) = prefix_of(tok, pos);
            } else if pos == tok.end && (tok.is_punct(Punct::At) || tok.is_punct(Punct::Hash)) {
                word = Some(idx);
                prefix = tok.text.clone();
                trigger = tok.text.chars().next();
            }
        }

        let tail = word.unwrap_or(before);
        let mut reference_start = tail;
        let mut qualifier = None;
        if let Some(dot_idx) = tail.checked_sub(1) {
            let dot = tokens[dot_idx];
            let touches = match word {
                Some(w) => dot.end == tokens[w].start,
                None => dot.end == pos,
            };
            if dot.is_punct(Punct::Dot) && touches {
                let start = chain_start(&tokens, dot_idx);
                qualifier = QualifiedName::parse(&concat(&tokens[start..tail]));
                reference_start = start;
                trigger = trigger.or(Some('.'));
            }
        }

        Self {
            tokens,
            pos,
            word,
            reference_start,
            prefix,
            trigger,
            qualifier,
        }
    }

    /// Significant tokens of the whole buffer
    pub fn tokens(&self) -> &[&'t Token] {
        &self.tokens
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn trigger(&self) -> Option<char> {
        self.trigger
    }

    /// Qualifier before the prefix, always with a trailing dot
    pub fn qualifier(&self) -> Option<&QualifiedName> {
        self.qualifier.as_ref()
    }

    /// Index of the first token of the reference; tokens before it precede the cursor
    pub fn reference_start(&self) -> usize {
        self.reference_start
    }

    /// Index of the token holding the prefix
    pub fn word(&self) -> Option<usize> {
        self.word
    }

    /// Index of the last token before the reference
    pub fn previous(&self) -> Option<usize> {
        self.reference_start.checked_sub(1)
    }

    pub fn previous_token(&self) -> Option<&'t Token> {
        self.previous().map(|i| self.tokens[i])
    }

    /// Whether the cursor follows a dot, possibly with a partial word typed after it
    pub fn is_dot_triggered(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Where to look up the clause the cursor belongs to: the end of the last
    /// token before the reference, or the cursor itself
    pub fn anchor_pos(&self) -> Position {
        self.previous_token().map_or(self.pos, |t| t.end)
    }

    /// Index of the token starting exactly at `pos`
    pub fn index_at(&self, pos: Position) -> Option<usize> {
        let idx = self.tokens.partition_point(|t| t.start < pos);
        self.tokens.get(idx).filter(|t| t.start == pos).map(|_| idx)
    }

    /// Complete dotted name ending at token `end`, with its first index
    pub fn name_ending_at(&self, end: usize) -> Option<(usize, QualifiedName)> {
        let last = self.tokens.get(end)?;
        if !last.is_identifier() {
            return None;
        }
        let start = chain_start(&self.tokens, end);
        let name = QualifiedName::parse(&concat(&self.tokens[start..=end]))?;
        (!name.has_trailing_dot).then_some((start, name))
    }

    /// Column compared against the cursor, e.g. `e.DepartmentID` in `e.DepartmentID = █`
    pub fn left_side_column(&self) -> Option<LeftSideColumn> {
        let op = self.previous()?;
        if !self.tokens[op].is_comparison() {
            return None;
        }
        let (_, name) = self.name_ending_at(op.checked_sub(1)?)?;
        let column_name = name.last()?.to_string();
        if column_name.starts_with('@') {
            return None;
        }
        let n = name.len();
        let part = |back: usize| n.checked_sub(back).map(|i| name.parts[i].clone()).filter(|p| !p.is_empty());
        Some(LeftSideColumn {
            qualified: name.joined(),
            table_ref: part(2),
            column_name,
            schema: part(3),
        })
    }
}

/// Whether the cursor directly follows a dot
pub fn is_dot_triggered(tokens: &[Token], pos: Position) -> bool {
    CursorTokens::new(tokens, pos).is_dot_triggered()
}

/// Dotted reference before the dot the cursor follows, e.g. `Sales.dbo` for `Sales.dbo.█`
pub fn reference_before_dot(tokens: &[Token], pos: Position) -> Option<QualifiedName> {
    CursorTokens::new(tokens, pos).qualifier
}

/// Column on the left of a comparison the cursor completes
pub fn extract_left_side_column(tokens: &[Token], pos: Position) -> Option<LeftSideColumn> {
    CursorTokens::new(tokens, pos).left_side_column()
}

/// Identifier text typed before the cursor and the character that opened it
pub fn extract_prefix_and_trigger(tokens: &[Token], pos: Position) -> (String, Option<char>) {
    let cursor = CursorTokens::new(tokens, pos);
    (cursor.prefix, cursor.trigger)
}

/// Whether `pos` is inside a string literal or comment
///
/// A cursor right after a closed literal is outside it; a cursor at the end of
/// an unterminated literal or a line comment is inside.
pub fn is_in_string_or_comment(tokens: &[Token], pos: Position) -> bool {
    let before = tokens.partition_point(|t| t.start < pos);
    let Some(tok) = before.checked_sub(1).map(|i| &tokens[i]) else {
        return false;
    };
    match tok.kind {
        TokenKind::String | TokenKind::Comment if pos < tok.end => true,
        TokenKind::String if pos == tok.end => !string_closed(&tok.text),
        TokenKind::Comment if pos == tok.end => tok.text.starts_with("--") || !block_comment_closed(&tok.text),
        _ => false,
    }
}

fn is_word(tok: &Token) -> bool {
    matches!(
        tok.kind,
        TokenKind::Identifier | TokenKind::BracketedIdentifier | TokenKind::Keyword
    )
}

fn prefix_of(tok: &Token, pos: Position) -> (String, Option<char>) {
    let typed: String = if pos.line == tok.start.line {
        tok.text.chars().take((pos.col - tok.start.col) as usize).collect()
    } else {
        tok.text.clone()
    };
    let first = typed.chars().next();
    match tok.kind {
        TokenKind::BracketedIdentifier => (strip_delimiters(&typed), first),
        _ if matches!(first, Some('@' | '#')) => (typed, first),
        _ => (typed, None),
    }
}

/// First index of the dotted chain ending at `last`
pub(crate) fn chain_start(tokens: &[&Token], last: usize) -> usize {
    let mut i = last;
    while i > 0 {
        let (prev, cur) = (tokens[i - 1], tokens[i]);
        if prev.end != cur.start {
            break;
        }
        let links = if cur.is_punct(Punct::Dot) {
            prev.is_identifier()
                || prev.is_punct(Punct::Dot)
                // keywords name objects only between dots: dbo.Order.x
                || (prev.kind == TokenKind::Keyword
                    && i >= 2
                    && tokens[i - 2].is_punct(Punct::Dot)
                    && tokens[i - 2].end == prev.start)
        } else {
            prev.is_punct(Punct::Dot)
        };
        if !links {
            break;
        }
        i -= 1;
    }
    i
}

/// Last index of the dotted chain starting at `first`
pub(crate) fn chain_end(tokens: &[&Token], first: usize) -> usize {
    let mut i = first;
    while let Some(next) = tokens.get(i + 1) {
        let cur = tokens[i];
        if cur.end != next.start {
            break;
        }
        let links = if cur.is_punct(Punct::Dot) {
            is_word(next) || next.is_punct(Punct::Dot)
        } else {
            next.is_punct(Punct::Dot)
        };
        if !links {
            break;
        }
        i += 1;
    }
    i
}

pub(crate) fn concat(tokens: &[&Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

fn string_closed(text: &str) -> bool {
    let body = text.strip_prefix(['N', 'n']).unwrap_or(text);
    let Some(delim) = body.chars().next() else {
        return false;
    };
    let quotes = body.chars().filter(|c| *c == delim).count();
    quotes >= 2 && quotes % 2 == 0
}

fn block_comment_closed(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return true;
                }
            }
            _ => i += 1,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_grammar::tokenize;
    use sqlctx_ir::Dialect;
    use sqlctx_test_utils::split_cursor;

    fn at(input: &str) -> (Vec<Token>, Position) {
        let (sql, pos) = split_cursor(input);
        (tokenize(&sql, Dialect::SqlServer), pos)
    }

    #[test]
    fn test_prefix_and_qualifier() {
        let (tokens, pos) = at("SELECT * FROM Sales.dbo.Emp█");
        let cursor = CursorTokens::new(&tokens, pos);
        assert_eq!(cursor.prefix(), "Emp");
        assert_eq!(cursor.trigger(), Some('.'));
        let q = cursor.qualifier().unwrap();
        assert_eq!(q.parts, vec!["Sales", "dbo"]);
        assert!(q.has_trailing_dot);
        assert!(cursor.previous_token().unwrap().is_keyword("FROM"));
    }

    #[test]
    fn test_dot_triggered() {
        let (tokens, pos) = at("SELECT e.█ FROM Employees e");
        assert!(is_dot_triggered(&tokens, pos));
        assert_eq!(reference_before_dot(&tokens, pos).unwrap().parts, vec!["e"]);

        let (tokens, pos) = at("SELECT e. █");
        assert!(!is_dot_triggered(&tokens, pos));
    }

    #[test]
    fn test_bracketed_prefix() {
        let (tokens, pos) = at("SELECT * FROM [Order De█");
        assert_eq!(
            extract_prefix_and_trigger(&tokens, pos),
            ("Order De".to_string(), Some('['))
        );
    }

    #[test]
    fn test_parameter_prefix() {
        let (tokens, pos) = at("EXEC dbo.usp_GetEmployee @Emp█");
        assert_eq!(extract_prefix_and_trigger(&tokens, pos), ("@Emp".to_string(), Some('@')));

        let (tokens, pos) = at("EXEC dbo.usp_GetEmployee @█");
        assert_eq!(extract_prefix_and_trigger(&tokens, pos), ("@".to_string(), Some('@')));
    }

    #[test]
    fn test_prefix_in_middle_of_word() {
        let (tokens, pos) = at("SELECT Fir█stName FROM Employees");
        assert_eq!(extract_prefix_and_trigger(&tokens, pos).0, "Fir");
    }

    #[test]
    fn test_left_side_column() {
        let (tokens, pos) = at("SELECT * FROM Employees e WHERE a = 1 AND dbo.e.DepartmentID = █");
        let left = extract_left_side_column(&tokens, pos).unwrap();
        assert_eq!(left.qualified, "dbo.e.DepartmentID");
        assert_eq!(left.table_ref.as_deref(), Some("e"));
        assert_eq!(left.column_name, "DepartmentID");
        assert_eq!(left.schema.as_deref(), Some("dbo"));

        let (tokens, pos) = at("SELECT * FROM Employees WHERE ManagerID <> Emp█");
        let left = extract_left_side_column(&tokens, pos).unwrap();
        assert_eq!(left.table_ref, None);
        assert_eq!(left.column_name, "ManagerID");
    }

    #[test]
    fn test_left_side_column_requires_comparison() {
        let (tokens, pos) = at("SELECT * FROM Employees WHERE █");
        assert!(extract_left_side_column(&tokens, pos).is_none());
        let (tokens, pos) = at("SELECT * FROM Employees WHERE @id = █");
        assert!(extract_left_side_column(&tokens, pos).is_none());
    }

    #[test]
    fn test_in_string_or_comment() {
        let (tokens, pos) = at("SELECT 'abc█' FROM t");
        assert!(is_in_string_or_comment(&tokens, pos));
        let (tokens, pos) = at("SELECT 'abc'█ FROM t");
        assert!(!is_in_string_or_comment(&tokens, pos));
        let (tokens, pos) = at("SELECT 'it''█");
        assert!(is_in_string_or_comment(&tokens, pos));
        let (tokens, pos) = at("SELECT 1 -- note█\nFROM t");
        assert!(is_in_string_or_comment(&tokens, pos));
        let (tokens, pos) = at("SELECT /* a /* b */█");
        assert!(is_in_string_or_comment(&tokens, pos));
        let (tokens, pos) = at("SELECT /* a */█ 1");
        assert!(!is_in_string_or_comment(&tokens, pos));
        let (tokens, pos) = at("SELECT █ FROM t");
        assert!(!is_in_string_or_comment(&tokens, pos));
    }

    #[test]
    fn test_name_ending_at() {
        let (tokens, pos) = at("SELECT * FROM Sales..Orders █");
        let cursor = CursorTokens::new(&tokens, pos);
        let end = cursor.previous().unwrap();
        let (start, name) = cursor.name_ending_at(end).unwrap();
        assert_eq!(name.parts, vec!["Sales", "", "Orders"]);
        assert!(cursor.tokens()[start - 1].is_keyword("FROM"));
    }
}
