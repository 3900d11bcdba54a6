//! Integration tests for source fetching and module writing.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use swaggen_cli::source::{fetch, load_source};
use swaggen_cli::writer::{apply, plan_modules};
use swaggen_core::{CompileConfig, generate};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOC: &str = r##"{
    "swagger": "2.0",
    "paths": {
        "/user/{name}": {
            "get": {
                "operationId": "getUser",
                "parameters": [{ "name": "name", "in": "path", "required": true, "type": "string" }],
                "responses": { "200": { "schema": { "$ref": "#/definitions/User" } } }
            }
        }
    },
    "definitions": {
        "User": { "type": "object", "properties": { "name": { "type": "string" } } }
    }
}"##;

#[tokio::test]
async fn test_fetch_sends_cookie() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/swagger.json"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DOC))
        .mount(&mock_server)
        .await;

    let url = format!("{}/v2/swagger.json", mock_server.uri());
    let text = fetch(&url, Some("session=abc")).await.unwrap();
    assert_eq!(text, DOC);
}

#[tokio::test]
async fn test_fetch_reports_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing.json", mock_server.uri());
    let err = fetch(&url, None).await.unwrap_err();
    assert!(err.contains("404"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_fetched_document_compiles_to_disk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DOC))
        .mount(&mock_server)
        .await;

    let url = format!("{}/api-docs", mock_server.uri());
    let text = load_source(&url, Some("")).await.unwrap();
    let output = generate(&text, &CompileConfig::default()).unwrap();

    let temp_dir = TempDir::new().unwrap();
    let summary = apply(&plan_modules(temp_dir.path(), &output)).unwrap();
    assert_eq!(summary.created, 2);

    let api = std::fs::read_to_string(temp_dir.path().join("api.ts")).unwrap();
    assert!(api.contains("export const getUser = (params: {} = {}, pathParams: { name: string }) =>"));
    let interface = std::fs::read_to_string(temp_dir.path().join("interface.ts")).unwrap();
    assert!(interface.contains("export interface User {"));
}

#[tokio::test]
async fn test_load_source_reads_files() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("swagger.json");
    std::fs::write(&file, DOC).unwrap();

    let text = load_source(file.to_str().unwrap(), None).await.unwrap();
    assert_eq!(text, DOC);

    let err = load_source(temp_dir.path().join("nope.json").to_str().unwrap(), None)
        .await
        .unwrap_err();
    assert!(err.starts_with("Failed to read"));
}
