// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Reserved words recognised by the tokenizer

use std::collections::HashSet;
use std::sync::OnceLock;

const RESERVED: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "APPLY", "AS", "ASC", "BEGIN", "BETWEEN", "BY",
    "CASE", "CHECK", "COMMIT", "CONSTRAINT", "CREATE", "CROSS", "DECLARE", "DEFAULT",
    "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXCEPT", "EXEC", "EXECUTE",
    "EXISTS", "FETCH", "FOREIGN", "FROM", "FULL", "FUNCTION", "GROUP", "HAVING", "IF", "IN",
    "INDEX", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE",
    "LIMIT", "MATCHED", "MERGE", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER",
    "OUTPUT", "OVER", "PARTITION", "PRIMARY", "PROC", "PROCEDURE", "REFERENCES", "RETURN",
    "RETURNS", "RIGHT", "ROLLBACK", "SELECT", "SET", "TABLE", "THEN", "TOP", "TRANSACTION",
    "TRUNCATE", "UNION", "UNIQUE", "UPDATE", "USE", "USING", "VALUES", "VIEW", "WHEN",
    "WHERE", "WHILE", "WITH",
];

fn reserved() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| RESERVED.iter().copied().collect())
}

/// Whether `word` is a reserved keyword (case-insensitive)
pub fn is_reserved(word: &str) -> bool {
    reserved().contains(word.to_ascii_uppercase().as_str())
}

/// Keywords that begin a new statement when they open a line
pub const STATEMENT_LEADING: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "EXEC", "EXECUTE", "WITH", "CREATE",
    "ALTER", "DROP", "USE", "DECLARE", "TRUNCATE",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_reserved_ignores_case() {
        assert!(is_reserved("select"));
        assert!(is_reserved("Join"));
        assert!(!is_reserved("Employees"));
        assert!(!is_reserved("inserted"));
    }
}
