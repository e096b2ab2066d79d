//! End-to-end runs of scene files through the file repository, the static
//! options sources and the scheduler.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::{TempDir, tempdir};

use cascade::{AppError, run};
use cascade_application::LoadSceneError;
use cascade_domain::VariableValue;

const CHAIN: &str = r#"
title: chain
sources:
  metrics:
    'A.*':
      - { label: AA, value: AA }
      - { label: AB, value: AB }
    'AA.*':
      - { label: AAA, value: AAA }
      - { label: AAB, value: AAB }
root:
  title: dashboard
  variables:
    - { name: A, type: query, source: metrics, query: 'A.*' }
    - { name: B, type: query, source: metrics, query: '$A.*' }
    - { name: C, type: query, source: missing, query: 'x' }
    - { name: env, type: custom, query: 'dev, prod', include_all: true, default_to_all: true }
  children:
    - title: panel
      state:
        expr: 'sum(up{a="$A", b=~"$B"})'
        envs: '${env:csv}'
        limit: 10
    - title: hidden
      active: false
"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write scene");
    path
}

#[tokio::test]
async fn test_chain_settles() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = write(&dir, "chain.yaml", CHAIN);

    let report = run(&path).await.expect("Failed to run scene");
    assert_eq!(report.title, "chain");

    let dashboard = report.node("dashboard").unwrap();
    assert!(dashboard.active);
    assert_eq!(dashboard.variable("A").unwrap().value, VariableValue::from("AA"));
    assert_eq!(dashboard.variable("A").unwrap().options, 2);
    assert_eq!(dashboard.variable("B").unwrap().value, VariableValue::from("AAA"));
    assert_eq!(dashboard.variable("env").unwrap().value, VariableValue::all());
    assert_eq!(dashboard.variable("env").unwrap().text, VariableValue::all_text());
}

#[tokio::test]
async fn test_missing_source_reported_per_variable() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "chain.yml", CHAIN);

    let report = run(&path).await.unwrap();
    let dashboard = report.node("dashboard").unwrap();
    assert!(dashboard.variable("C").unwrap().error.is_some());
    assert!(dashboard.variable("B").unwrap().error.is_none());
}

#[tokio::test]
async fn test_consumer_state_interpolated() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "chain.yaml", CHAIN);

    let report = run(&path).await.unwrap();
    let panel = report.node("panel").unwrap();
    assert_eq!(panel.state["expr"], json!(r#"sum(up{a="AA", b=~"AAA"})"#));
    assert_eq!(panel.state["envs"], json!("dev,prod"));
    assert_eq!(panel.state["limit"], json!(10));
}

#[tokio::test]
async fn test_inactive_node_stays_inactive() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "chain.yaml", CHAIN);

    let report = run(&path).await.unwrap();
    let titles: Vec<&str> = report.nodes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["dashboard", "panel", "hidden"]);
    assert!(!report.node("hidden").unwrap().active);
}

#[tokio::test]
async fn test_json_scene() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "scene.json",
        r#"{
            "title": "constants",
            "root": {
                "title": "root",
                "variables": [{"name": "region", "type": "constant", "value": "eu"}],
                "state": {"target": "[[region]]"}
            }
        }"#,
    );

    let report = run(&path).await.unwrap();
    let root = report.node("root").unwrap();
    assert_eq!(root.variable("region").unwrap().value, VariableValue::from("eu"));
    assert_eq!(root.state["target"], json!("eu"));
}

#[tokio::test]
async fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = run(&dir.path().join("absent.yaml")).await;
    assert!(matches!(result, Err(AppError::Load(LoadSceneError::NotFound(_)))));
}

#[tokio::test]
async fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "scene.toml", "title = 'x'");
    let result = run(&path).await;
    assert!(matches!(result, Err(AppError::Load(LoadSceneError::ParseError(_)))));
}

#[tokio::test]
async fn test_duplicate_variable_rejected() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "dup.yaml",
        "root:\n  variables:\n    - { name: a, type: text_box }\n    - { name: a, type: text_box }\n",
    );
    let result = run(&path).await;
    assert!(matches!(result, Err(AppError::Load(LoadSceneError::ParseError(_)))));
}
