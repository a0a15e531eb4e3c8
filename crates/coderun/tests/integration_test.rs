//! Integration tests for the coderun MCP tool handlers.

use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, ErrorCode};
use serde_json::Value;

use coderun::*;
use coderun_core::{EngineSettings, ServerConfig};
use coderun_session::SessionService;

fn server() -> CodeRunMcpServer {
    let config = ServerConfig {
        engine: EngineSettings::immediate(),
        ..Default::default()
    };
    CodeRunMcpServer::new(Arc::new(SessionService::new(&config).unwrap()))
}

fn json(result: CallToolResult) -> Value {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .expect("tool result should carry text content");
    serde_json::from_str(&text).unwrap()
}

async fn start(server: &CodeRunMcpServer, source: &str) -> Value {
    let result = server
        .run_start(Parameters(RunStartParams {
            source: source.to_string(),
        }))
        .await
        .unwrap();
    json(result)
}

async fn send(server: &CodeRunMcpServer, session_id: &str, line: &str) -> Value {
    let result = server
        .run_send_line(Parameters(RunSendLineParams {
            session_id: session_id.to_string(),
            line: line.to_string(),
        }))
        .await
        .unwrap();
    json(result)
}

#[tokio::test]
async fn test_interactive_run() {
    let server = server();
    let started = start(
        &server,
        "std::string name;\nstd::cout << \"Enter your name: \";\nstd::getline(std::cin, name);\nstd::cout << \"Hello, \" << name << \"!\";",
    )
    .await;

    assert_eq!(started["output"], "Enter your name: > ");
    assert_eq!(started["interactive"], true);
    assert_eq!(started["state"], "waiting_for_input");
    let session_id = started["session_id"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());

    let reply = send(&server, &session_id, "Ada").await;
    assert_eq!(reply["output_chunk"], "Hello, Ada!");
    assert_eq!(reply["finished"], true);
    assert_eq!(reply["state"], "finished");

    let err = server
        .run_send_line(Parameters(RunSendLineParams {
            session_id: session_id.clone(),
            line: "again".to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode(-32602));
    assert!(err.message.contains("not waiting for input"));
}

#[tokio::test]
async fn test_batch_run_has_no_session_id() {
    let server = server();
    let started = start(
        &server,
        "int main() {\n    // Expected output: 42\n    std::cout << 42;\n}",
    )
    .await;

    assert_eq!(started["output"], "42");
    assert_eq!(started["interactive"], false);
    assert_eq!(started["session_id"], "");
    assert_eq!(started["state"], "finished");
}

#[tokio::test]
async fn test_compile_error_is_invalid_params() {
    let server = server();
    let err = server
        .run_start(Parameters(RunStartParams {
            source: "int main() { syntax error }".to_string(),
        }))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode(-32602));
    assert_eq!(err.message, "Compilation error: syntax error");
}

#[tokio::test]
async fn test_invalid_and_unknown_session_ids() {
    let server = server();

    let err = server
        .run_session_get(Parameters(SessionGetParams {
            session_id: "not-a-uuid".to_string(),
            since: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode(-32602));

    let err = server
        .run_send_line(Parameters(RunSendLineParams {
            session_id: coderun_core::SessionId::new().to_string(),
            line: "hi".to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode(-32602));
    assert!(err.message.starts_with("Session not found"));
}

#[tokio::test]
async fn test_session_get_since() {
    let server = server();
    let started = start(&server, "std::string s;\nwhile (std::getline(std::cin, s)) {}").await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    send(&server, &session_id, "one").await;
    send(&server, &session_id, "two").await;

    let full = json(
        server
            .run_session_get(Parameters(SessionGetParams {
                session_id: session_id.clone(),
                since: None,
            }))
            .await
            .unwrap(),
    );
    assert_eq!(full["session"]["chunks"], 3);
    assert_eq!(full["session"]["prompt_kind"], "generic");
    assert_eq!(full["output"].as_array().unwrap().len(), 3);

    let tail = json(
        server
            .run_session_get(Parameters(SessionGetParams {
                session_id,
                since: Some(2),
            }))
            .await
            .unwrap(),
    );
    let output = tail["output"].as_array().unwrap();
    assert_eq!(output.len(), 1);
    assert!(output[0].as_str().unwrap().starts_with("You entered: two"));
}

#[tokio::test]
async fn test_stop_and_list() {
    let server = server();
    let started = start(&server, "int x;\nstd::cin >> x;").await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let listed = json(
        server
            .run_session_list(Parameters(SessionListParams {}))
            .await
            .unwrap(),
    );
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["sessions"][0]["state"], "waiting_for_input");

    let stop = |id: String| {
        let server = server.clone();
        async move {
            json(
                server
                    .run_stop(Parameters(RunStopParams { session_id: id }))
                    .await
                    .unwrap(),
            )
        }
    };

    assert_eq!(stop(session_id.clone()).await["stopped"], true);
    assert_eq!(stop(session_id.clone()).await["stopped"], false);

    let listed = json(
        server
            .run_session_list(Parameters(SessionListParams {}))
            .await
            .unwrap(),
    );
    assert_eq!(listed["sessions"][0]["state"], "finished");
}

#[tokio::test(start_paused = true)]
async fn test_finished_sessions_expire() {
    let config = ServerConfig {
        engine: EngineSettings::immediate(),
        ..Default::default()
    };
    let service = Arc::new(SessionService::new(&config).unwrap());
    service.start_background_sweeper();
    let server = CodeRunMcpServer::new(Arc::clone(&service));

    start(&server, "std::cout << \"Hello, World!\" << std::endl;").await;
    let listed = json(
        server
            .run_session_list(Parameters(SessionListParams {}))
            .await
            .unwrap(),
    );
    assert_eq!(listed["count"], 1);

    tokio::time::sleep(Duration::from_secs(6)).await;
    let listed = json(
        server
            .run_session_list(Parameters(SessionListParams {}))
            .await
            .unwrap(),
    );
    assert_eq!(listed["count"], 0);

    service.shutdown().await;
}
