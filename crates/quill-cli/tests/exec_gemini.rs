//! End-to-end exec tests against a mocked Gemini streaming endpoint.


use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::text_response;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_PATH: &str = "/models/gemini-2.5-flash:streamGenerateContent";

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

async fn mount_reply(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_exec_prints_streamed_reply() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_reply(&server, text_response(&["Hello ", "**world**\n", "1. one"])).await;

    cargo_bin_cmd!("quill")
        .env("QUILL_HOME", home.path())
        .env("GEMINI_API_KEY", "test-api-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["exec", "-p", "Say hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello world\n1. one"));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Say hi");
    assert!(body["system_instruction"]["parts"][0]["text"].is_string());
}

#[tokio::test]
async fn test_exec_saves_report_directive_as_pdf() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_reply(
        &server,
        text_response(&[
            r#"{"report": true, "title": "Q3 Plan", "#,
            r####""content": "### Goals\n1. Ship\n2. Hire"}"####,
        ]),
    )
    .await;

    cargo_bin_cmd!("quill")
        .env("QUILL_HOME", home.path())
        .env("GEMINI_API_KEY", "test-api-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["exec", "-p", "Write the Q3 plan as a report", "-o"])
        .arg(out_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "I've prepared the report you requested. Saved:",
        ))
        .stdout(predicate::str::contains("Q3_Plan.pdf"))
        .stdout(predicate::str::contains("\"report\"").not());

    let pdf = std::fs::read(out_dir.path().join("Q3_Plan.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_exec_http_error_shows_fallback_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(500).set_body_string(r#"{"error":{"message":"backend exploded"}}"#),
    )
    .await;

    cargo_bin_cmd!("quill")
        .env("QUILL_HOME", home.path())
        .env("GEMINI_API_KEY", "test-api-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["exec", "-p", "Say hi"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Sorry, I encountered an error. Please try again.",
        ))
        .stdout(predicate::str::contains("backend exploded").not())
        .stderr(predicate::str::contains("Reply failed"));
}

#[tokio::test]
async fn test_piped_stdin_runs_exec() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_reply(&server, text_response(&["Piped ", "reply"])).await;

    cargo_bin_cmd!("quill")
        .env("QUILL_HOME", home.path())
        .env("GEMINI_API_KEY", "test-api-key")
        .env("GEMINI_BASE_URL", server.uri())
        .write_stdin("Say hi\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Piped reply"));
}

#[test]
fn test_exec_without_api_key_explains_setup() {
    let home = TempDir::new().unwrap();

    cargo_bin_cmd!("quill")
        .env("QUILL_HOME", home.path())
        .env_remove("GEMINI_API_KEY")
        .args(["exec", "-p", "Say hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Please set your Gemini API key to use the chat assistant.",
        ));
}
