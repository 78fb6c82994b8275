// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Engine integration tests over a static YAML catalog

use std::sync::Arc;

use serde_json::json;
use sqlctx_catalog::StaticLoader;
use sqlctx_engine::{CandidateKind, EngineConfig, EngineEvent, Position, SemanticType, SqlEngine};
use sqlctx_test_utils::{SchemaFixtures, assert_labels_exclude, assert_labels_include, split_cursor};

fn engine_from_settings(settings: serde_json::Value) -> SqlEngine {
    let config = EngineConfig::from_settings(&settings).unwrap();
    let loader = StaticLoader::from_yaml_str(SchemaFixtures::hr_yaml()).unwrap();
    SqlEngine::new(config, Arc::new(loader)).unwrap()
}

#[tokio::test]
async fn test_settings_schema_filter_applies() {
    let engine = engine_from_settings(json!({
        "sqlctx": {
            "connected_database": "Hr",
            "schema_filter": { "hidden_schemas": ["audit"], "hidden_objects": ["*Archive"] }
        }
    }));
    let (sql, pos) = split_cursor("SELECT * FROM █");
    engine.open("q.sql", sql);

    let response = engine.complete_settled("q.sql", pos).await.unwrap();
    let labels: Vec<&str> = response.items.iter().map(|c| c.label.as_str()).collect();
    assert_labels_include(&labels, &["Employees", "dbo"]);
    assert_labels_exclude(&labels, &["audit", "EmployeeArchive"]);
}

#[tokio::test]
async fn test_update_reparses_buffer() {
    let engine = engine_from_settings(json!({ "sqlctx": { "connected_database": "Hr" } }));
    let first = engine.open("q.sql", "SELECT  FROM Departments");
    let second = engine.update("q.sql", "SELECT  FROM Locations").unwrap();
    assert!(second > first);

    let response = engine.complete_settled("q.sql", Position::new(1, 8)).await.unwrap();
    let labels: Vec<&str> = response.items.iter().map(|c| c.label.as_str()).collect();
    assert_labels_include(&labels, &["City", "Country"]);
    assert_labels_exclude(&labels, &["DepartmentName"]);
    assert!(response.items.iter().all(|c| c.kind == CandidateKind::Column));
}

#[tokio::test]
async fn test_highlight_settles_through_catalog() {
    let engine = engine_from_settings(json!({ "sqlctx": { "connected_database": "Hr" } }));
    let _events = engine.take_events();
    engine.open("q.sql", "SELECT FirstName FROM dbo.Staff; SELECT * FROM #Tmp");

    engine.catalog().settle().await;
    let mut response = engine.highlight("q.sql").unwrap();
    while !response.pending.is_empty() {
        engine.catalog().settle().await;
        response = engine.highlight("q.sql").unwrap();
    }

    let types: Vec<(&str, SemanticType)> = response
        .spans
        .iter()
        .map(|s| (s.text.as_str(), s.semantic_type))
        .collect();
    assert!(types.contains(&("dbo", SemanticType::Schema)));
    assert!(types.contains(&("Staff", SemanticType::Synonym)));
    assert!(types.contains(&("FirstName", SemanticType::Column)));
    assert!(types.contains(&("#Tmp", SemanticType::TempTable)));
}

#[tokio::test]
async fn test_closed_buffer_is_not_reclassified() {
    let engine = engine_from_settings(json!({ "sqlctx": { "connected_database": "Hr" } }));
    let mut events = engine.take_events().unwrap();
    engine.open("q.sql", "SELECT * FROM Employees");
    engine.highlight("q.sql").unwrap();
    engine.close("q.sql");

    engine.catalog().settle().await;
    // let the reclassification task observe the closed buffer
    tokio::task::yield_now().await;
    while let Ok(event) = events.try_recv() {
        assert!(matches!(event, EngineEvent::CatalogLoaded(_)), "unexpected {:?}", event);
    }
}

#[tokio::test]
async fn test_use_switches_database_for_highlight() {
    let engine = engine_from_settings(json!({ "sqlctx": { "connected_database": "Hr" } }));
    engine.open("q.sql", "SELECT * FROM Employees;\nUSE Sales;\nSELECT * FROM Orders");

    engine.catalog().settle().await;
    let mut response = engine.highlight("q.sql").unwrap();
    while !response.pending.is_empty() {
        engine.catalog().settle().await;
        response = engine.highlight("q.sql").unwrap();
    }

    let types: Vec<(&str, SemanticType)> = response
        .spans
        .iter()
        .map(|s| (s.text.as_str(), s.semantic_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("Employees", SemanticType::Table),
            ("Sales", SemanticType::Database),
            ("Orders", SemanticType::Table),
        ]
    );
    // the switch is per request; the shared catalog keeps its database
    assert_eq!(engine.catalog().connected_database().as_deref(), Some("Hr"));
}

#[tokio::test]
async fn test_use_switches_database_for_completion() {
    let engine = engine_from_settings(json!({ "sqlctx": { "connected_database": "Hr" } }));
    let (sql, pos) = split_cursor("SELECT * FROM Employees\nGO\nUSE Sales\nGO\nSELECT * FROM █");
    engine.open("q.sql", sql);

    let response = engine.complete_settled("q.sql", pos).await.unwrap();
    let labels: Vec<&str> = response.items.iter().map(|c| c.label.as_str()).collect();
    assert_labels_include(&labels, &["Orders", "Customers"]);
    assert_labels_exclude(&labels, &["Employees", "audit"]);

    let (sql, pos) = split_cursor("SELECT * FROM █\nGO\nUSE Sales");
    engine.open("before.sql", sql);
    let before = engine.complete_settled("before.sql", pos).await.unwrap();
    let labels: Vec<&str> = before.items.iter().map(|c| c.label.as_str()).collect();
    assert_labels_include(&labels, &["Employees"]);
    assert_labels_exclude(&labels, &["Orders"]);
}
