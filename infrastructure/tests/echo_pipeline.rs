//! Config file → registry → orchestrator, end to end on the echo backend.

use moa_application::{ChatRequest, Orchestrator};
use moa_domain::ResponseEvent;
use moa_infrastructure::{BackendRegistry, FileConfig, JsonlTranscriptLogger};
use std::sync::Arc;

const CONFIG: &str = r#"
[models]
main = "echo/main"
cycles = 2

[[layer_agents]]
name = "a"
model = "echo/a"

[[layer_agents]]
name = "b"
model = "echo/b"

[providers]
default = "echo"
"#;

async fn collect(orchestrator: &Orchestrator, input: &str) -> Vec<ResponseEvent> {
    let mut stream = orchestrator.chat(ChatRequest::new(input));
    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_echo_chat_from_config_file() {
    let file: FileConfig = toml::from_str(CONFIG).unwrap();
    let resolved = file.resolve().unwrap();
    let (registry, issues) = BackendRegistry::from_config(&file.providers);
    assert!(issues.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let transcript = dir.path().join("transcript.jsonl");
    let logger = JsonlTranscriptLogger::open(&transcript).unwrap();

    let orchestrator = Orchestrator::builder(resolved.moa, Arc::new(registry))
        .with_params(resolved.execution)
        .with_logger(Arc::new(logger))
        .build()
        .unwrap();

    let events = collect(&orchestrator, "hello").await;
    assert_eq!(events.len(), 3);

    for (i, event) in events[..2].iter().enumerate() {
        match event {
            ResponseEvent::Intermediate {
                layer_index,
                outputs,
                ..
            } => {
                assert_eq!(*layer_index, i + 1);
                assert_eq!(outputs, &vec!["[a] hello".to_string(), "[b] hello".to_string()]);
            }
            other => panic!("expected Intermediate, got {:?}", other),
        }
    }
    assert_eq!(
        events[2],
        ResponseEvent::Output {
            text: "[main] hello".to_string()
        }
    );

    let memory = orchestrator.memory();
    let memory = memory.read().await;
    assert_eq!(memory.len(), 1);
    assert_eq!(memory.turns()[0].output, "[main] hello");

    let lines = std::fs::read_to_string(&transcript).unwrap();
    let types: Vec<String> = lines
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(types, vec!["cycle_merged", "cycle_merged", "chat_completed"]);
}

#[tokio::test]
async fn test_unknown_default_backend_fails_at_build() {
    let file: FileConfig = toml::from_str(
        r#"
[[layer_agents]]
name = "a"
model = "m"
"#,
    )
    .unwrap();
    let resolved = file.resolve().unwrap();

    // The default "groq" backend is replaced by an empty registry.
    let registry = BackendRegistry::new().with_default("groq");
    let err = Orchestrator::from_config(resolved.moa, resolved.execution, Arc::new(registry))
        .err()
        .unwrap();
    assert!(err.to_string().contains("groq"));
}
