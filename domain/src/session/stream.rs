//! Streaming events for backend responses.
//!
//! [`StreamEvent`] represents individual events in a streaming model
//! response, so the final answer can be shown as it is generated.

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// The complete response text (signals stream end).
    Completed(String),
    /// An error that occurred during streaming.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) | StreamEvent::Completed(s) => Some(s),
            StreamEvent::Error(_) => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas_carry_text_until_completion() {
        let events = [
            StreamEvent::Delta("Hel".to_string()),
            StreamEvent::Delta("lo".to_string()),
            StreamEvent::Completed("Hello".to_string()),
        ];
        let streamed: String = events
            .iter()
            .take_while(|e| !e.is_terminal())
            .filter_map(StreamEvent::text)
            .collect();
        assert_eq!(streamed, "Hello");
        assert_eq!(events[2].text(), Some("Hello"));
    }

    #[test]
    fn test_error_ends_stream_without_text() {
        let event = StreamEvent::Error("connection reset".to_string());
        assert!(event.is_terminal());
        assert_eq!(event.text(), None);
    }
}
