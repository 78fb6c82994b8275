// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use sqlctx_context::{ContextEngine, ContextMode, ContextType};
use sqlctx_grammar::ParsedBuffer;
use sqlctx_ir::Dialect;
use sqlctx_test_utils::{SqlFixtures, parse_corpus, split_cursor};

fn detect(input: &str) -> (ParsedBuffer, sqlctx_context::ContextResult) {
    let (sql, pos) = split_cursor(input);
    let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
    let result = ContextEngine::new(&buffer).detect(pos);
    (buffer, result)
}

#[test]
fn test_cte_name_position_is_keyword() {
    // "WITH █" names a new CTE; nothing from the catalog applies
    let (_, result) = detect("WITH █");
    assert_eq!(result.kind, ContextType::Keyword);
}

#[test]
fn test_cte_body_select_list() {
    let (_, result) = detect("WITH EmpCTE AS (SELECT █ FROM Employees) SELECT * FROM EmpCTE");
    assert_eq!((result.kind, result.mode), (ContextType::Column, ContextMode::Select));
}

#[test]
fn test_cte_visible_in_main_query() {
    let (sql, pos) = split_cursor(SqlFixtures::cte_from());
    let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
    let result = ContextEngine::new(&buffer).detect(pos);
    assert_eq!((result.kind, result.mode), (ContextType::Table, ContextMode::From));

    let ctx = buffer.context_at(pos);
    assert!(ctx.cte("EmpCTE").is_some());
}

#[test]
fn test_cte_not_visible_in_next_statement() {
    let (sql, pos) = split_cursor(SqlFixtures::cte_out_of_scope());
    let buffer = ParsedBuffer::parse(sql, Dialect::SqlServer);
    let result = ContextEngine::new(&buffer).detect(pos);
    assert_eq!(result.kind, ContextType::Table);
    assert!(buffer.context_at(pos).cte("EmpCTE").is_none());
}

#[test]
fn test_cte_column_through_alias() {
    let (_, result) = detect("WITH EmpCTE AS (SELECT EmployeeID FROM Employees) SELECT c.█ FROM EmpCTE c");
    assert_eq!((result.kind, result.mode), (ContextType::Column, ContextMode::Qualified));
    assert_eq!(result.hints.table_ref.as_deref(), Some("c"));
}

const CORPUS: &str = r#"
- description: select list
  input: "SELECT █ FROM Employees"
  kind: column
  mode: select
- description: qualified select list
  input: "SELECT e.█ FROM Employees e"
  kind: column
  mode: qualified
- description: join predicate
  input: "SELECT * FROM Employees e JOIN Departments d ON e.█"
  kind: column
  mode: qualified
- description: update set
  input: "UPDATE Employees SET █"
  kind: column
  mode: set
- description: schema qualified table
  input: "SELECT * FROM audit.█"
  kind: table
  mode: from_qualified
- description: use database
  input: "USE █"
  kind: database
  mode: use
- description: after table
  input: "SELECT * FROM Employees █"
  kind: keyword
  mode: after_table
- description: second statement of a batch
  input: "SELECT 1\nGO\nSELECT * FROM █"
  kind: table
  mode: from
- description: exec parameters
  input: "EXEC dbo.usp_GetEmployee █"
  kind: parameter
  mode: exec_params
- description: temp table columns
  input: "CREATE TABLE #Raise (EmployeeID INT, Amount MONEY);\nSELECT r.█ FROM #Raise r"
  kind: column
  mode: qualified
- description: multiline where
  input: "SELECT *\nFROM Employees e\nWHERE e.DepartmentID = 1\n  AND █"
  kind: column
  mode: where
"#;

#[test]
fn test_context_corpus() {
    for case in parse_corpus(CORPUS).unwrap() {
        let (_, result) = detect(&case.input);
        assert_eq!(result.kind.as_str(), case.kind, "{}: kind", case.description);
        if let Some(mode) = &case.mode {
            assert_eq!(result.mode.as_str(), mode, "{}: mode", case.description);
        }
    }
}
