// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statement parser
//!
//! A forgiving, single-pass parser over the token stream. It does not build a
//! syntax tree; it records what the context engine needs per statement:
//!
//! - clause ranges in source order
//! - table references with aliases, CTE and temp table definitions
//! - nested subqueries (CTE bodies, derived tables, predicate subqueries)
//!
//! Statements end at `;`, at `GO`, or where a statement-leading keyword opens a
//! new line outside parentheses. Incomplete input is normal: an unclosed
//! parenthesis runs to the end of the statement.

use crate::keywords::STATEMENT_LEADING;
use sqlctx_ir::{
    Clause, ClauseKind, CteDef, Position, Punct, Span, StatementChunk, StatementType, TableRef,
    TempTableDef, Token, TokenKind, normalize_identifier,
};
use std::collections::BTreeSet;
use std::ops::Range;

/// Parse every statement in a token stream
pub fn parse_statements(tokens: &[Token]) -> Vec<StatementChunk> {
    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.is_comment()).collect();
    split_statements(&significant)
        .into_iter()
        .map(|(range, terminator)| {
            let slice = &significant[range];
            let (mut chunk, _) = StatementBuilder::new(slice, BTreeSet::new()).build();
            if let Some(term) = terminator {
                chunk.terminated = true;
                chunk.span.end = term;
            }
            chunk
        })
        .collect()
}

/// Token ranges of statements, each with the start of its terminator if any
fn split_statements(tokens: &[&Token]) -> Vec<(Range<usize>, Option<Position>)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut depth = 0i32;

    for (i, tok) in tokens.iter().enumerate() {
        if tok.is_terminator() {
            if i > start {
                out.push((start..i, Some(tok.start)));
            }
            start = i + 1;
            depth = 0;
            continue;
        }
        if i > start && depth <= 0 && starts_statement(tokens, start, i) {
            out.push((start..i, None));
            start = i;
        }
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => depth += 1,
            TokenKind::Punct(Punct::RParen) => depth -= 1,
            _ => {}
        }
    }
    if start < tokens.len() {
        out.push((start..tokens.len(), None));
    }
    out
}

fn starts_statement(tokens: &[&Token], start: usize, i: usize) -> bool {
    let tok = tokens[i];
    if !tok.is_any_keyword(STATEMENT_LEADING) {
        return false;
    }
    let prev = tokens[i - 1];
    if prev.end.line == tok.start.line {
        return false;
    }
    let lead = tokens[start];
    if lead.is_any_keyword(&["CREATE", "ALTER"]) {
        return false;
    }
    if prev.is_any_keyword(&["UNION", "ALL", "EXCEPT", "INTERSECT", "AS", "THEN", "ELSE", "BEGIN"])
        || prev.is_punct(Punct::LParen)
    {
        return false;
    }
    if lead.is_keyword("INSERT") && tok.is_any_keyword(&["SELECT", "EXEC", "EXECUTE", "WITH"]) {
        return false;
    }
    if lead.is_keyword("WITH")
        && prev.is_punct(Punct::RParen)
        && tok.is_any_keyword(&["SELECT", "INSERT", "UPDATE", "DELETE", "MERGE"])
    {
        return false;
    }
    if lead.is_keyword("MERGE") && tok.is_any_keyword(&["INSERT", "UPDATE", "DELETE"]) {
        return false;
    }
    true
}

/// Index of the `)` matching the `(` at `open`
fn matching_paren(tokens: &[&Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => depth += 1,
            TokenKind::Punct(Punct::RParen) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn starts_query(tokens: &[&Token]) -> bool {
    tokens.first().is_some_and(|t| t.is_any_keyword(&["SELECT", "WITH"]))
}

/// Split `tokens` on commas outside parentheses
fn split_top_level(tokens: &[&Token]) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => depth += 1,
            TokenKind::Punct(Punct::RParen) => depth -= 1,
            TokenKind::Punct(Punct::Comma) if depth == 0 => {
                parts.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(start..tokens.len());
    parts
}

/// First identifier of each comma-separated element, e.g. a column list
fn leading_names(tokens: &[&Token]) -> Vec<String> {
    split_top_level(tokens)
        .into_iter()
        .filter_map(|r| tokens[r].first().filter(|t| t.is_identifier()).map(|t| t.unquoted()))
        .collect()
}

/// Name a select-list item exposes, if any
fn projection_name(item: &[&Token]) -> Option<String> {
    let mut item = item;
    while let Some(first) = item.first() {
        if first.is_any_keyword(&["DISTINCT", "ALL"]) {
            item = &item[1..];
        } else if first.is_keyword("TOP") {
            let skip = match item.get(1) {
                Some(t) if t.is_punct(Punct::LParen) => matching_paren(item, 1).map_or(item.len(), |c| c + 1),
                Some(_) => 2,
                None => 1,
            };
            item = &item[skip.min(item.len())..];
        } else {
            break;
        }
    }

    let len = item.len();
    let last = item.last()?;
    if len >= 3 && item[0].is_identifier() && item[1].kind == TokenKind::Operator && item[1].text == "=" {
        return Some(item[0].unquoted());
    }
    if len >= 2 && item[len - 2].is_keyword("AS") && (last.is_identifier() || last.kind == TokenKind::String) {
        return Some(sqlctx_ir::strip_delimiters(last.text.trim_matches('\'')));
    }
    if !last.is_identifier() {
        return None;
    }
    if len == 1 {
        return Some(last.unquoted());
    }
    let before = item[len - 2];
    let names_column = before.is_punct(Punct::Dot)
        || before.is_identifier()
        || before.is_punct(Punct::RParen)
        || matches!(before.kind, TokenKind::Number | TokenKind::String);
    names_column.then(|| last.unquoted())
}

/// Builds one [`StatementChunk`] from a statement's tokens
struct StatementBuilder<'t> {
    tokens: &'t [&'t Token],
    chunk: StatementChunk,
    /// CTE names visible from enclosing statements
    outer_ctes: BTreeSet<String>,
    open: Option<(ClauseKind, Position)>,
    select_start: Option<usize>,
    projection: Option<Vec<String>>,
    select_into: Option<(String, bool)>,
}

impl<'t> StatementBuilder<'t> {
    fn new(tokens: &'t [&'t Token], outer_ctes: BTreeSet<String>) -> Self {
        Self {
            tokens,
            chunk: StatementChunk::default(),
            outer_ctes,
            open: None,
            select_start: None,
            projection: None,
            select_into: None,
        }
    }

    /// Build the chunk and the names its first select list projects
    fn build(mut self) -> (StatementChunk, Vec<String>) {
        let tokens = self.tokens;
        let n = tokens.len();
        if let (Some(first), Some(last)) = (tokens.first(), tokens.last()) {
            self.chunk.span = Span::new(first.start, last.end);
            self.chunk.statement_type = match first.kind {
                TokenKind::Keyword => StatementType::from_keyword(&first.text),
                _ => StatementType::Other,
            };
        }

        let mut i = 0;
        while i < n {
            let tok = tokens[i];
            if tok.is_punct(Punct::LParen) {
                let close = matching_paren(tokens, i);
                self.scan_group(i, close);
                i = close.map_or(n, |c| c + 1);
                continue;
            }
            i = if tok.kind == TokenKind::Keyword {
                self.keyword(i)
            } else {
                i + 1
            };
        }
        self.close_clause(n);

        let projection = self.projection.take().unwrap_or_default();
        if let Some((name, is_global)) = self.select_into.take() {
            let columns = (!projection.is_empty()).then(|| projection.clone());
            self.chunk.temp_tables.insert(
                normalize_identifier(&name),
                TempTableDef {
                    name,
                    columns,
                    is_global,
                },
            );
        }
        (self.chunk, projection)
    }

    fn open_clause(&mut self, kind: ClauseKind, at: usize) {
        self.close_clause(at);
        self.open = Some((kind, self.tokens[at].start));
        if kind == ClauseKind::Select && self.projection.is_none() {
            self.select_start = Some(at + 1);
        }
    }

    /// Close the open clause just before token `at`
    fn close_clause(&mut self, at: usize) {
        let Some((kind, start)) = self.open.take() else {
            return;
        };
        let end = if at > 0 { self.tokens[at - 1].end } else { start };
        self.chunk.clauses.push(Clause {
            kind,
            span: Span::new(start, end),
        });

        if kind == ClauseKind::Select {
            if let Some(from) = self.select_start.take() {
                let items = &self.tokens[from.min(at)..at];
                let names = split_top_level(items)
                    .into_iter()
                    .filter_map(|r| projection_name(&items[r]))
                    .collect();
                self.projection = Some(names);
            }
        }
    }

    fn is_cte(&self, name: &str) -> bool {
        let key = normalize_identifier(name);
        self.chunk.ctes.contains_key(&key) || self.outer_ctes.contains(&key)
    }

    fn peek_keyword(&self, i: usize, kw: &str) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_keyword(kw))
    }

    fn peek_punct(&self, i: usize, p: Punct) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_punct(p))
    }

    fn current_clause(&self) -> Option<ClauseKind> {
        self.open.map(|(k, _)| k).or_else(|| self.chunk.clauses.last().map(|c| c.kind))
    }

    /// Handle a keyword at depth 0, returning the next index to scan
    fn keyword(&mut self, i: usize) -> usize {
        let tok = self.tokens[i];
        let upper = tok.text.to_ascii_uppercase();
        let stmt = self.chunk.statement_type;
        match upper.as_str() {
            "WITH" if i == 0 => {
                self.open_clause(ClauseKind::With, i);
                self.parse_ctes(i + 1)
            }
            "SELECT" => {
                self.open_clause(ClauseKind::Select, i);
                i + 1
            }
            "FROM" => {
                self.open_clause(ClauseKind::From, i);
                self.parse_table_list(i + 1, true)
            }
            "JOIN" | "APPLY" => {
                self.open_clause(ClauseKind::Join, i);
                self.parse_table_factor(i + 1)
            }
            "WHERE" => {
                self.open_clause(ClauseKind::Where, i);
                i + 1
            }
            "HAVING" => {
                self.open_clause(ClauseKind::Having, i);
                i + 1
            }
            "GROUP" if self.peek_keyword(i + 1, "BY") => {
                self.open_clause(ClauseKind::GroupBy, i);
                i + 2
            }
            "ORDER" if self.peek_keyword(i + 1, "BY") => {
                self.open_clause(ClauseKind::OrderBy, i);
                i + 2
            }
            "SET" if matches!(stmt, StatementType::Update | StatementType::Merge) => {
                self.open_clause(ClauseKind::Set, i);
                i + 1
            }
            "INTO" => self.into_clause(i),
            "INSERT" if i == 0 => {
                if self.tokens.get(i + 1).is_some_and(|t| t.is_identifier()) {
                    self.open_clause(ClauseKind::Into, i + 1);
                    self.insert_target(i + 1)
                } else {
                    i + 1
                }
            }
            "INSERT" if self.peek_punct(i + 1, Punct::LParen) => self.insert_columns(i + 1),
            "UPDATE" if i == 0 => {
                self.open_clause(ClauseKind::Update, i);
                self.parse_table_factor(i + 1)
            }
            "DELETE" if i == 0 => {
                self.open_clause(ClauseKind::Delete, i);
                if self.peek_keyword(i + 1, "FROM") {
                    i + 1
                } else {
                    self.parse_table_factor(i + 1)
                }
            }
            "MERGE" => {
                self.open_clause(ClauseKind::Merge, i);
                let next = if self.peek_keyword(i + 1, "INTO") { i + 2 } else { i + 1 };
                self.parse_table_factor(next)
            }
            "USING" if stmt == StatementType::Merge => {
                self.open_clause(ClauseKind::Using, i);
                self.parse_table_factor(i + 1)
            }
            "WHEN" if stmt == StatementType::Merge
                && (self.peek_keyword(i + 1, "MATCHED") || self.peek_keyword(i + 1, "NOT")) =>
            {
                self.close_clause(i);
                i + 1
            }
            "VALUES" => {
                self.open_clause(ClauseKind::Values, i);
                i + 1
            }
            "OUTPUT" => {
                self.open_clause(ClauseKind::Output, i);
                i + 1
            }
            "EXEC" | "EXECUTE" => {
                self.open_clause(ClauseKind::Exec, i);
                i + 1
            }
            "USE" if i == 0 => {
                self.open_clause(ClauseKind::Use, i);
                i + 1
            }
            "UNION" | "EXCEPT" | "INTERSECT" => {
                self.close_clause(i);
                i + 1
            }
            "CREATE" if i == 0 && self.peek_keyword(i + 1, "TABLE") => self.create_table(i + 2),
            _ => i + 1,
        }
    }

    fn into_clause(&mut self, i: usize) -> usize {
        match self.current_clause() {
            // OUTPUT ... INTO stays part of the OUTPUT clause
            Some(ClauseKind::Output) => i + 1,
            Some(ClauseKind::Select) => {
                self.open_clause(ClauseKind::Into, i);
                let tokens = self.tokens;
                let Some(target) = tokens.get(i + 1).filter(|t| t.is_identifier()) else {
                    return i + 1;
                };
                if target.text.starts_with('#') {
                    self.select_into = Some((target.text.clone(), target.text.starts_with("##")));
                }
                i + 2
            }
            Some(ClauseKind::Merge) => i + 1,
            _ => {
                self.open_clause(ClauseKind::Into, i);
                self.insert_target(i + 1)
            }
        }
    }

    /// INSERT target followed by an optional column list
    fn insert_target(&mut self, i: usize) -> usize {
        let next = self.parse_table_factor_no_alias(i);
        if self.peek_punct(next, Punct::LParen) {
            self.insert_columns(next)
        } else {
            next
        }
    }

    /// Column list of an INSERT, as its own clause spanning the parentheses
    fn insert_columns(&mut self, open: usize) -> usize {
        self.open_clause(ClauseKind::InsertColumns, open);
        let end = matching_paren(self.tokens, open).map_or(self.tokens.len(), |c| c + 1);
        self.close_clause(end);
        end
    }

    fn create_table(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let Some(name_tok) = tokens.get(i).filter(|t| t.text.starts_with('#')) else {
            return i;
        };
        let mut next = i + 1;
        let mut columns = None;
        if self.peek_punct(next, Punct::LParen) {
            let close = matching_paren(self.tokens, next);
            let inner = &self.tokens[next + 1..close.unwrap_or(self.tokens.len())];
            columns = Some(
                leading_names(inner)
                    .into_iter()
                    .filter(|c| !matches!(c.to_ascii_uppercase().as_str(), "CONSTRAINT" | "INDEX"))
                    .collect(),
            );
            next = close.map_or(self.tokens.len(), |c| c + 1);
        }
        let name = name_tok.text.clone();
        self.chunk.temp_tables.insert(
            normalize_identifier(&name),
            TempTableDef {
                is_global: name.starts_with("##"),
                name,
                columns,
            },
        );
        next
    }

    /// `name [(cols)] AS (body) [, ...]`
    fn parse_ctes(&mut self, mut i: usize) -> usize {
        let n = self.tokens.len();
        while i < n && self.tokens[i].is_identifier() {
            let name = self.tokens[i].unquoted();
            i += 1;

            let mut columns = None;
            if self.peek_punct(i, Punct::LParen) {
                let close = matching_paren(self.tokens, i);
                columns = Some(leading_names(&self.tokens[i + 1..close.unwrap_or(n)]));
                i = close.map_or(n, |c| c + 1);
            }
            if self.peek_keyword(i, "AS") {
                i += 1;
            }

            // registered before the body so recursive references resolve
            let key = normalize_identifier(&name);
            self.chunk.ctes.insert(
                key.clone(),
                CteDef {
                    name: name.clone(),
                    columns: columns.clone(),
                },
            );

            if self.peek_punct(i, Punct::LParen) {
                let close = matching_paren(self.tokens, i);
                let projection = self.subquery(i, close);
                if columns.is_none() && !projection.is_empty() {
                    columns = Some(projection);
                }
                i = close.map_or(n, |c| c + 1);
            }
            self.chunk.ctes.insert(key, CteDef { name, columns });

            if self.peek_punct(i, Punct::Comma) {
                i += 1;
            } else {
                break;
            }
        }
        i
    }

    fn parse_table_list(&mut self, mut i: usize, allow_comma: bool) -> usize {
        loop {
            i = self.parse_table_factor(i);
            if allow_comma && self.peek_punct(i, Punct::Comma) {
                i += 1;
                continue;
            }
            return i;
        }
    }

    fn parse_table_factor(&mut self, i: usize) -> usize {
        self.table_factor(i, true)
    }

    fn parse_table_factor_no_alias(&mut self, i: usize) -> usize {
        self.table_factor(i, false)
    }

    /// One FROM item; `with_alias` is false for INSERT targets, whose
    /// parentheses hold a column list rather than function arguments
    fn table_factor(&mut self, i: usize, with_alias: bool) -> usize {
        let n = self.tokens.len();
        let Some(tok) = self.tokens.get(i).copied() else {
            return i;
        };

        if tok.is_punct(Punct::LParen) {
            let close = matching_paren(self.tokens, i);
            let end = close.map_or(n, |c| c + 1);
            if !starts_query(&self.tokens[i + 1..close.unwrap_or(n)]) {
                self.scan_group(i, close);
                return end;
            }
            let mut columns = self.subquery(i, close);
            let (alias, mut next) = self.parse_alias(end);
            if alias.is_some() && self.peek_punct(next, Punct::LParen) {
                let close = matching_paren(self.tokens, next);
                columns = leading_names(&self.tokens[next + 1..close.unwrap_or(n)]);
                next = close.map_or(n, |c| c + 1);
            }
            self.add_table(TableRef::Derived { alias, columns });
            return next;
        }

        if !tok.is_identifier() {
            return i;
        }

        let (parts, mut next) = self.read_qualified(i);
        let is_function = with_alias && self.peek_punct(next, Punct::LParen);
        if is_function {
            let close = matching_paren(self.tokens, next);
            self.scan_group(next, close);
            next = close.map_or(n, |c| c + 1);
        }
        let (alias, mut next) = if with_alias { self.parse_alias(next) } else { (None, next) };
        if self.peek_keyword(next, "WITH") && self.peek_punct(next + 1, Punct::LParen) {
            next = matching_paren(self.tokens, next + 1).map_or(n, |c| c + 1);
        }

        let mut parts = parts.into_iter().rev();
        let name = parts.next().unwrap_or_default();
        let schema = parts.next().filter(|s| !s.is_empty());
        let database = parts.next();

        let table = if name.starts_with('#') {
            TableRef::TempTable {
                is_global: name.starts_with("##"),
                name,
                alias,
            }
        } else if is_function {
            TableRef::TableFunction {
                database,
                schema,
                name,
                alias,
            }
        } else if schema.is_none() && database.is_none() && self.is_cte(&name) {
            TableRef::Cte { name, alias }
        } else {
            TableRef::Table {
                database,
                schema,
                name,
                alias,
            }
        };
        self.add_table(table);
        next
    }

    /// Dotted name starting at `i`; a keyword counts as a part only right after a dot
    fn read_qualified(&self, i: usize) -> (Vec<String>, usize) {
        let tokens = self.tokens;
        let mut parts = vec![tokens[i].unquoted()];
        let mut j = i + 1;
        while j < tokens.len() && tokens[j].is_punct(Punct::Dot) {
            let dot = tokens[j];
            j += 1;
            match tokens.get(j) {
                Some(t) if t.is_identifier() || (t.kind == TokenKind::Keyword && t.start == dot.end) => {
                    parts.push(t.unquoted());
                    j += 1;
                }
                Some(t) if t.is_punct(Punct::Dot) => parts.push(String::new()),
                _ => break,
            }
        }
        (parts, j)
    }

    fn parse_alias(&self, i: usize) -> (Option<String>, usize) {
        match self.tokens.get(i) {
            Some(t) if t.is_keyword("AS") => match self.tokens.get(i + 1) {
                Some(a) if a.is_identifier() => (Some(a.unquoted()), i + 2),
                _ => (None, i + 1),
            },
            Some(t) if t.is_identifier() && !t.text.starts_with('@') => (Some(t.unquoted()), i + 1),
            _ => (None, i),
        }
    }

    fn add_table(&mut self, table: TableRef) {
        if let Some(alias) = table.alias() {
            self.chunk.aliases.insert(normalize_identifier(alias), table.clone());
        }
        self.chunk.tables.push(table);
    }

    /// Build the subquery between `open` and `close`, returning its projection
    fn subquery(&mut self, open: usize, close: Option<usize>) -> Vec<String> {
        let tokens = self.tokens;
        let inner = &tokens[open + 1..close.unwrap_or(tokens.len())];
        let mut visible = self.outer_ctes.clone();
        visible.extend(self.chunk.ctes.keys().cloned());

        let (mut sub, projection) = StatementBuilder::new(inner, visible).build();
        let end = match close {
            Some(c) => tokens[c].start,
            None => inner.last().map_or(tokens[open].end, |t| t.end),
        };
        sub.span = Span::new(tokens[open].end, end);
        sub.terminated = close.is_some();
        self.chunk.subqueries.push(sub);
        projection
    }

    /// Record subqueries nested anywhere inside a parenthesised group
    fn scan_group(&mut self, open: usize, close: Option<usize>) {
        let end = close.unwrap_or(self.tokens.len());
        if starts_query(&self.tokens[open + 1..end]) {
            self.subquery(open, close);
            return;
        }
        let mut i = open + 1;
        while i < end {
            if self.tokens[i].is_punct(Punct::LParen) {
                let inner_close = matching_paren(self.tokens, i).filter(|c| *c < end);
                self.scan_group(i, inner_close);
                i = inner_close.map_or(end, |c| c + 1);
            } else {
                i += 1;
            }
        }
    }
}
