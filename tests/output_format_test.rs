//! Tests for the serialized result shape.
//!
//! Downstream tooling reads these fields by name, so the JSON layout and the
//! key=value outputs are checked against fixed expectations.

use std::path::PathBuf;

use oascheck::config::DiscoveryConfig;
use oascheck::discover;
use oascheck::report::{self, OutputFormat, Subject};
use oascheck::result::{FileReport, RepositoryReport};
use oascheck::{AnalysisReport, Analyzer};
use serde_json::Value;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn analyze(name: &str) -> AnalysisReport {
    let bytes = std::fs::read(testdata_path().join(name)).expect("should read fixture");
    Analyzer::default().analyze_bytes(&bytes, None)
}

fn render_json(report: &AnalysisReport) -> Value {
    let rendered = report::render(
        OutputFormat::Json,
        Subject::File {
            source: "fixture",
            report,
        },
    )
    .unwrap();
    serde_json::from_str(&rendered).expect("output should be valid JSON")
}

#[test]
fn test_success_json_shape() {
    let json = render_json(&analyze("petstore-swagger2.yaml"));

    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "status",
            "is_valid",
            "summary",
            "suggestions",
            "category_counts",
            "total_findings",
            "complexity_score",
            "maintainability_score",
        ]
    );
    assert_eq!(json["status"], "success");
    assert_eq!(json["is_valid"], true);
    assert_eq!(json["summary"]["openapi_version"], "2.0");
    assert_eq!(json["summary"]["paths_count"], 3);
    assert_eq!(json["summary"]["operations_count"], 4);
    assert_eq!(json["summary"]["schemas_count"], 4);

    let categories: Vec<&str> = json["suggestions"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        categories,
        vec![
            "validation",
            "security",
            "performance",
            "design_patterns",
            "governance",
            "compliance",
            "documentation",
            "monitoring",
            "testing",
        ]
    );
    for (category, messages) in json["suggestions"].as_object().unwrap() {
        let messages = messages.as_array().unwrap();
        assert_eq!(json["category_counts"][category], messages.len());
        assert!(messages.iter().all(|m| m.is_string()));
    }
    assert!(json["complexity_score"].is_number());
    assert!(json["maintainability_score"].is_number());
}

#[test]
fn test_error_json_shape() {
    let json = render_json(&analyze("malformed.yaml"));
    assert_eq!(json["status"], "error");
    assert_eq!(json["is_valid"], false);
    assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(json.get("summary").is_none());
    assert_eq!(json["suggestions"], serde_json::json!({}));
    assert_eq!(json["complexity_score"], 0.0);
    assert_eq!(json["maintainability_score"], 0.0);
}

#[test]
fn test_repository_json_shape() {
    let config = DiscoveryConfig {
        patterns: vec!["*.json".to_string(), "*.yaml".to_string()],
        ..Default::default()
    };
    let analyzer = Analyzer::default();
    let openapi_files = discover::discover_files(&testdata_path(), &config)
        .unwrap()
        .into_iter()
        .map(|file| FileReport {
            report: analyzer.analyze_bytes(&file.bytes, file.format),
            file_info: file.info,
        })
        .collect();
    let repo = RepositoryReport {
        repository: discover::repository_info(&testdata_path()),
        openapi_files,
    };

    let rendered = report::render(OutputFormat::Json, Subject::Repository(&repo)).unwrap();
    let json: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(json["repository"]["name"], "testdata");
    assert!(json["repository"]["stars"].is_null());

    let files = json["openapi_files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["file_info"]["path"], "cyclic-openapi3.json");
    assert_eq!(files[0]["status"], "success");
    assert_eq!(files[1]["file_info"]["name"], "malformed.yaml");
    assert_eq!(files[1]["status"], "error");
    assert!(files[2]["file_info"]["url"]
        .as_str()
        .unwrap()
        .starts_with("file://"));

    let outputs = report::render(OutputFormat::Outputs, Subject::Repository(&repo)).unwrap();
    assert!(outputs.lines().any(|l| l == "status=error"));
    assert!(outputs.lines().any(|l| l == "files_count=3"));
}

#[test]
fn test_outputs_match_json() {
    let report = analyze("cyclic-openapi3.json");
    let json = render_json(&report);
    let outputs = report::render(
        OutputFormat::Outputs,
        Subject::File {
            source: "fixture",
            report: &report,
        },
    )
    .unwrap();

    for line in outputs.lines() {
        let (key, value) = line.split_once('=').unwrap();
        match key {
            "status" => assert_eq!(value, json["status"].as_str().unwrap()),
            "is_valid" => assert_eq!(value, json["is_valid"].to_string()),
            "paths_count" | "operations_count" | "schemas_count" => {
                assert_eq!(value, json["summary"][key].to_string(), "mismatch for {}", key)
            }
            _ => {
                let parsed: f64 = value.parse().unwrap();
                assert_eq!(Some(parsed), json[key].as_f64(), "mismatch for {}", key);
            }
        }
    }
}
