// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Comma-delimited positions in VALUES rows, column lists and EXEC arguments
//!
//! Parenthesis depth is counted explicitly so the commas of a nested function
//! call do not advance the index. Each new row group resets it to zero.

use sqlctx_ir::{Punct, Token, TokenKind};

/// Index inside the innermost open row group of `tokens`
///
/// Row groups are parentheses at depth one: the rows after `VALUES`, or the
/// single group of a column list. Returns `None` between groups.
pub fn row_position(tokens: &[&Token]) -> Option<usize> {
    let mut depth = 0usize;
    let mut index = 0usize;
    for tok in tokens {
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => {
                depth += 1;
                if depth == 1 {
                    index = 0;
                }
            }
            TokenKind::Punct(Punct::RParen) => depth = depth.saturating_sub(1),
            TokenKind::Punct(Punct::Comma) if depth == 1 => index += 1,
            _ => {}
        }
    }
    (depth >= 1).then_some(index)
}

/// Index of the argument being typed in an unparenthesised argument list
pub fn argument_position(tokens: &[&Token]) -> usize {
    let mut depth = 0usize;
    let mut index = 0usize;
    for tok in tokens {
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => depth += 1,
            TokenKind::Punct(Punct::RParen) => depth = depth.saturating_sub(1),
            TokenKind::Punct(Punct::Comma) if depth == 0 => index += 1,
            _ => {}
        }
    }
    index
}

/// Names of a parenthesised column list starting at `tokens[0]`
pub fn list_names(tokens: &[&Token]) -> Vec<String> {
    let mut depth = 0usize;
    let mut expect_name = false;
    let mut names = Vec::new();
    for tok in tokens {
        match tok.kind {
            TokenKind::Punct(Punct::LParen) => {
                depth += 1;
                expect_name = depth == 1;
            }
            TokenKind::Punct(Punct::RParen) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            TokenKind::Punct(Punct::Comma) if depth == 1 => expect_name = true,
            _ if expect_name && tok.is_identifier() => {
                names.push(tok.unquoted());
                expect_name = false;
            }
            _ => expect_name = false,
        }
    }
    names
}

/// `@name` parameters assigned by name (`@name = value`) in an argument list
pub fn named_arguments(tokens: &[&Token]) -> Vec<String> {
    tokens
        .windows(2)
        .filter(|w| w[0].text.starts_with('@') && w[1].kind == TokenKind::Operator && w[1].text == "=")
        .map(|w| w[0].text.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlctx_grammar::tokenize;
    use sqlctx_ir::Dialect;

    fn check<T>(sql: &str, f: impl Fn(&[&Token]) -> T) -> T {
        let tokens = tokenize(sql, Dialect::SqlServer);
        let refs: Vec<&Token> = tokens.iter().collect();
        f(&refs)
    }

    #[test]
    fn test_nested_call_commas_do_not_advance() {
        assert_eq!(check("(1, UPPER('a', 'b'), ", row_position), Some(2));
        assert_eq!(check("(1, UPPER('a', ", row_position), Some(1));
    }

    #[test]
    fn test_new_row_resets_index() {
        assert_eq!(check("(1, 2, 3), (", row_position), Some(0));
        assert_eq!(check("(1, 2, 3), (4, ", row_position), Some(1));
        assert_eq!(check("(1, 2, 3), ", row_position), None);
    }

    #[test]
    fn test_argument_position() {
        assert_eq!(check("@a = 1, @b = dbo.f(1, 2), ", argument_position), 2);
        assert_eq!(check("", argument_position), 0);
    }

    #[test]
    fn test_list_names() {
        assert_eq!(
            check("(EmployeeID, [First Name], LastName) VALUES", list_names),
            vec!["EmployeeID", "First Name", "LastName"]
        );
        assert_eq!(check("(EmployeeID, ", list_names), vec!["EmployeeID"]);
    }

    #[test]
    fn test_named_arguments() {
        assert_eq!(
            check("@EmployeeID = 1, @NewSalary = 2, ", named_arguments),
            vec!["@EmployeeID", "@NewSalary"]
        );
    }
}
