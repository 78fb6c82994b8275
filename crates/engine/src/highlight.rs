// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Identifier chains and semantic highlight spans
//!
//! A chain is a run of identifiers joined by adjacent dots, e.g.
//! `Hr.dbo.Employees.Salary` or `e.FirstName`. Reserved words count as
//! parts only between dots (`dbo.Order.Total`). `@variables` are not
//! chains.

use serde::Serialize;
use sqlctx_ir::{Position, Punct, Token, TokenKind, strip_delimiters};
use sqlctx_semantic::SemanticType;

/// One identifier of a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPart {
    /// Name without delimiters; empty for the missing schema of `db..obj`
    pub name: String,
    pub start: Position,
    pub end: Position,
}

/// Dotted identifier chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierChain {
    pub parts: Vec<ChainPart>,
}

impl IdentifierChain {
    pub fn start(&self) -> Position {
        self.parts.first().map(|p| p.start).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }
}

/// A classified identifier span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub start: Position,
    pub end: Position,
    pub text: String,
    pub semantic_type: SemanticType,
}

/// Collect the identifier chains of a token stream
pub fn identifier_chains(tokens: &[Token]) -> Vec<IdentifierChain> {
    let mut chains = Vec::new();
    let mut current: Vec<ChainPart> = Vec::new();
    // last token of the chain being built, and whether it was a dot
    let mut tail: Option<(Position, bool)> = None;

    for tok in tokens {
        let adjacent = tail.is_some_and(|(end, _)| end == tok.start);
        let after_dot = adjacent && tail.is_some_and(|(_, dot)| dot);

        match tok.kind {
            TokenKind::Punct(Punct::Dot) if adjacent => {
                if after_dot {
                    // `db..obj`
                    current.push(ChainPart {
                        name: String::new(),
                        start: tok.start,
                        end: tok.start,
                    });
                }
                tail = Some((tok.end, true));
                continue;
            }
            TokenKind::Identifier | TokenKind::BracketedIdentifier if after_dot => {
                current.push(part(tok));
                tail = Some((tok.end, false));
                continue;
            }
            TokenKind::Keyword if after_dot => {
                current.push(part(tok));
                tail = Some((tok.end, false));
                continue;
            }
            _ => {}
        }

        flush(&mut current, &mut chains);
        tail = None;
        if tok.is_identifier() && !tok.text.starts_with('@') {
            current.push(part(tok));
            tail = Some((tok.end, false));
        }
    }
    flush(&mut current, &mut chains);
    chains
}

fn part(tok: &Token) -> ChainPart {
    ChainPart {
        name: strip_delimiters(&tok.text),
        start: tok.start,
        end: tok.end,
    }
}

fn flush(current: &mut Vec<ChainPart>, chains: &mut Vec<IdentifierChain>) {
    // a trailing `x.` is still being typed; keep the written parts
    if !current.is_empty() {
        chains.push(IdentifierChain {
            parts: std::mem::take(current),
        });
    }
}

/// Spans for a chain's parts, skipping empty ones
pub fn spans_for(chain: &IdentifierChain, types: &[SemanticType]) -> Vec<HighlightSpan> {
    chain
        .parts
        .iter()
        .zip(types)
        .filter(|(part, _)| !part.name.is_empty())
        .map(|(part, ty)| HighlightSpan {
            start: part.start,
            end: part.end,
            text: part.name.clone(),
            semantic_type: *ty,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_grammar::tokenize;
    use sqlctx_ir::Dialect;

    fn chains(sql: &str) -> Vec<Vec<String>> {
        identifier_chains(&tokenize(sql, Dialect::SqlServer))
            .into_iter()
            .map(|c| c.names().into_iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_dotted_chains() {
        assert_eq!(
            chains("SELECT e.FirstName FROM Hr.dbo.Employees e"),
            vec![vec!["e", "FirstName"], vec!["Hr", "dbo", "Employees"], vec!["e"]]
        );
    }

    #[test]
    fn test_bracketed_and_keyword_parts() {
        assert_eq!(chains("SELECT [dbo].[Order].Total"), vec![vec!["dbo", "Order", "Total"]]);
        assert_eq!(chains("SELECT t.Order FROM t"), vec![vec!["t", "Order"], vec!["t"]]);
    }

    #[test]
    fn test_empty_schema_part() {
        assert_eq!(chains("SELECT * FROM Hr..Employees"), vec![vec!["Hr", "", "Employees"]]);
    }

    #[test]
    fn test_variables_and_spaced_dots() {
        assert_eq!(chains("SET @x = a . b"), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_spans_skip_empty_parts() {
        let chain = &identifier_chains(&tokenize("Hr..Employees", Dialect::SqlServer))[0];
        let spans = spans_for(
            chain,
            &[SemanticType::Database, SemanticType::Schema, SemanticType::Table],
        );
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].text, "Employees");
        assert_eq!(spans[1].semantic_type, SemanticType::Table);
    }
}
