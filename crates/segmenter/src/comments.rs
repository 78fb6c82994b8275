// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Comment removal
//!
//! A single left-to-right scan with an explicit state. Line comments are
//! checked before block comments, so `--/*` starts a line comment. Block
//! comments nest. Every newline inside a removed comment is kept so that line
//! numbers survive.

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Normal,
    /// Inside a `'...'` or `"..."` literal, holding its delimiter
    InString(char),
    InBracket,
    InLineComment,
    /// Inside a block comment at the given nesting depth
    InBlockComment(u32),
}

/// Counters collected while removing comments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentStats {
    pub line_comments: usize,
    pub block_comments: usize,
    /// Deepest block comment nesting seen
    pub max_depth: u32,
    /// Characters removed, newlines excluded
    pub removed_chars: usize,
}

/// Strip `--` and `/* */` comments outside strings and bracketed identifiers
///
/// Text without comments is returned unchanged. Unterminated comments and
/// literals run to the end of input.
pub fn remove_comments(text: &str) -> (String, CommentStats) {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut stats = CommentStats::default();
    let mut state = ScanState::Normal;
    let mut block_had_newline = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();
        match state {
            ScanState::Normal => match (ch, next) {
                ('-', Some('-')) => {
                    state = ScanState::InLineComment;
                    stats.line_comments += 1;
                    stats.removed_chars += 2;
                    i += 2;
                    continue;
                }
                ('/', Some('*')) => {
                    state = ScanState::InBlockComment(1);
                    block_had_newline = false;
                    stats.block_comments += 1;
                    stats.max_depth = stats.max_depth.max(1);
                    stats.removed_chars += 2;
                    i += 2;
                    continue;
                }
                ('\'' | '"', _) => {
                    state = ScanState::InString(ch);
                    out.push(ch);
                }
                ('[', _) => {
                    state = ScanState::InBracket;
                    out.push(ch);
                }
                _ => out.push(ch),
            },
            ScanState::InLineComment => {
                if ch == '\n' {
                    out.push('\n');
                    state = ScanState::Normal;
                } else {
                    stats.removed_chars += 1;
                }
            }
            ScanState::InBlockComment(depth) => match (ch, next) {
                ('/', Some('*')) => {
                    state = ScanState::InBlockComment(depth + 1);
                    stats.max_depth = stats.max_depth.max(depth + 1);
                    stats.removed_chars += 2;
                    i += 2;
                    continue;
                }
                ('*', Some('/')) => {
                    stats.removed_chars += 2;
                    i += 2;
                    if depth > 1 {
                        state = ScanState::InBlockComment(depth - 1);
                    } else {
                        state = ScanState::Normal;
                        // keep `a/*x*/b` as two words
                        if !block_had_newline && needs_separator(&out, chars.get(i).copied()) {
                            out.push(' ');
                        }
                    }
                    continue;
                }
                ('\n', _) => {
                    out.push('\n');
                    block_had_newline = true;
                }
                _ => stats.removed_chars += 1,
            },
            ScanState::InString(quote) => {
                out.push(ch);
                if ch == quote {
                    if next == Some(quote) {
                        out.push(quote);
                        i += 2;
                        continue;
                    }
                    state = ScanState::Normal;
                }
            }
            ScanState::InBracket => {
                out.push(ch);
                if ch == ']' {
                    if next == Some(']') {
                        out.push(']');
                        i += 2;
                        continue;
                    }
                    state = ScanState::Normal;
                }
            }
        }
        i += 1;
    }

    (out, stats)
}

fn needs_separator(out: &str, next: Option<char>) -> bool {
    let before = out.chars().next_back();
    matches!((before, next), (Some(b), Some(n)) if !b.is_whitespace() && !n.is_whitespace())
}

/// Tracks whether a scan over comment-free text is inside a literal
#[derive(Debug, Default)]
pub(crate) struct LiteralTracker {
    closer: Option<char>,
    skip_next: bool,
}

impl LiteralTracker {
    /// Feed one character; returns whether it sat outside any literal
    ///
    /// An opening delimiter counts as outside.
    pub(crate) fn step(&mut self, ch: char, next: Option<char>) -> bool {
        if self.skip_next {
            self.skip_next = false;
            return false;
        }
        match self.closer {
            None => {
                match ch {
                    '\'' | '"' => self.closer = Some(ch),
                    '[' => self.closer = Some(']'),
                    _ => {}
                }
                true
            }
            Some(close) => {
                if ch == close {
                    if next == Some(close) {
                        self.skip_next = true;
                    } else {
                        self.closer = None;
                    }
                }
                false
            }
        }
    }

    pub(crate) fn inside(&self) -> bool {
        self.closer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_free_text_unchanged() {
        let sql = "SELECT 'a--b', [x/*y]\nFROM t";
        let (clean, stats) = remove_comments(sql);
        assert_eq!(clean, sql);
        assert_eq!(stats, CommentStats::default());
    }

    #[test]
    fn test_nested_block_comment_removed() {
        let (clean, stats) = remove_comments("/* /* x */ */");
        assert_eq!(clean, "");
        assert_eq!(stats.block_comments, 1);
        assert_eq!(stats.max_depth, 2);
    }

    #[test]
    fn test_line_comment_hides_block_start() {
        let (clean, stats) = remove_comments("-- /* not a comment");
        assert_eq!(clean, "");
        assert_eq!(stats.line_comments, 1);
        assert_eq!(stats.block_comments, 0);

        let (clean, _) = remove_comments("SELECT 1 --/* x\nFROM t");
        assert_eq!(clean, "SELECT 1 \nFROM t");
    }

    #[test]
    fn test_newlines_preserved() {
        let (clean, _) = remove_comments("SELECT /* a\nb\nc */ 1");
        assert_eq!(clean, "SELECT \n\n 1");
        assert_eq!(clean.lines().count(), 3);
    }

    #[test]
    fn test_inline_block_comment_separates_words() {
        let (clean, _) = remove_comments("SELECT/*x*/1");
        assert_eq!(clean, "SELECT 1");
    }

    #[test]
    fn test_escaped_delimiters() {
        let sql = "SELECT 'it''s -- fine', [a]]--b] -- gone";
        let (clean, _) = remove_comments(sql);
        assert_eq!(clean, "SELECT 'it''s -- fine', [a]]--b] ");
    }

    #[test]
    fn test_unterminated_block_consumes_rest() {
        let (clean, _) = remove_comments("SELECT 1 /* open\nSELECT 2");
        assert_eq!(clean, "SELECT 1 \n");
    }

    #[test]
    fn test_literal_tracker() {
        let mut tracker = LiteralTracker::default();
        let text: Vec<char> = "'a''b' x".chars().collect();
        let outside: Vec<bool> = (0..text.len())
            .map(|i| tracker.step(text[i], text.get(i + 1).copied()))
            .collect();
        assert_eq!(outside, vec![true, false, false, false, false, false, true, true]);
    }
}
