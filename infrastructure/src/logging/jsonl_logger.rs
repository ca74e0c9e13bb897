//! JSONL transcript writer.
//!
//! Each [`TranscriptEvent`] becomes one JSON object per line carrying a
//! `type` field and an RFC 3339 `timestamp` next to the payload fields.
//! The file is opened in append mode so several chats can share it.

use moa_application::ports::transcript_logger::{TranscriptEvent, TranscriptLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Thread-safe JSONL transcript logger. Flushes after every record.
pub struct JsonlTranscriptLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTranscriptLogger {
    /// Open (or create) the transcript file at `path`.
    ///
    /// Parent directories are created as needed. Returns `None` when the
    /// file cannot be opened; the caller then runs without a transcript.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create transcript directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open transcript file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: TranscriptEvent) -> Value {
        let timestamp = event
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut map = match event.payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert(
            "type".to_string(),
            Value::String(event.event_type.to_string()),
        );
        map.insert("timestamp".to_string(), Value::String(timestamp));
        Value::Object(map)
    }
}

impl TranscriptLogger for JsonlTranscriptLogger {
    fn log(&self, event: TranscriptEvent) {
        let Ok(line) = serde_json::to_string(&Self::record(event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlTranscriptLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        let logger = JsonlTranscriptLogger::open(&path).unwrap();

        logger.log(TranscriptEvent::new(
            "cycle_merged",
            serde_json::json!({ "cycle": 1, "contributors": ["a", "b"] }),
        ));
        logger.log(TranscriptEvent::new(
            "chat_completed",
            serde_json::json!({ "output": "z" }),
        ));

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "cycle_merged");
        assert_eq!(records[0]["cycle"], 1);
        assert_eq!(records[0]["contributors"][1], "b");
        assert!(records[0]["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(records[1]["type"], "chat_completed");
        assert_eq!(records[1]["output"], "z");
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        let logger = JsonlTranscriptLogger::open(&path).unwrap();

        logger.log(TranscriptEvent::new("note", serde_json::json!("hello")));

        let records = read_lines(&path);
        assert_eq!(records[0]["data"], "hello");
        assert_eq!(records[0]["type"], "note");
    }

    #[test]
    fn test_appends_across_loggers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");

        for i in 0..2 {
            let logger = JsonlTranscriptLogger::open(&path).unwrap();
            logger.log(TranscriptEvent::new(
                "chat_completed",
                serde_json::json!({ "n": i }),
            ));
        }

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["n"], 1);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("chat.jsonl");
        let logger = JsonlTranscriptLogger::open(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());
        assert!(path.exists());
    }
}
