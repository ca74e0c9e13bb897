//! Token-bounded chunking of oversized inputs.
//!
//! [`Chunker::split`] cuts text into segments of at most `max_tokens`
//! tokens, consecutive segments sharing `overlap` tokens. Segments are
//! slices of the original text, so the whitespace inside a segment is kept
//! verbatim. [`join`] glues per-segment results back with a single space
//! and does not try to remove the duplicated overlap.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while chunking an input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk overlap ({overlap}) must be smaller than the chunk size ({max_tokens})")]
    OverlapTooLarge { overlap: usize, max_tokens: usize },

    #[error("tokenizer failed: {0}")]
    Tokenizer(String),
}

/// Splits text into tokens, reported as byte ranges into the input.
pub trait Tokenizer: Send + Sync {
    fn spans(&self, text: &str) -> Result<Vec<Range<usize>>, ChunkingError>;

    fn count(&self, text: &str) -> Result<usize, ChunkingError> {
        Ok(self.spans(text)?.len())
    }
}

/// One token per maximal run of non-whitespace characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn spans(&self, text: &str) -> Result<Vec<Range<usize>>, ChunkingError> {
        let mut spans = Vec::new();
        let mut start: Option<usize> = None;
        for (i, c) in text.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    spans.push(s..i);
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push(s..text.len());
        }
        Ok(spans)
    }
}

/// Chunk size and overlap, in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub max_tokens: usize,
    pub overlap: usize,
}

impl ChunkConfig {
    pub fn new(max_tokens: usize, overlap: usize) -> Result<Self, ChunkingError> {
        let config = Self {
            max_tokens,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.max_tokens == 0 {
            return Err(ChunkingError::ZeroChunkSize);
        }
        if self.overlap >= self.max_tokens {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: self.overlap,
                max_tokens: self.max_tokens,
            });
        }
        Ok(())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            overlap: 200,
        }
    }
}

/// Splits inputs according to a [`ChunkConfig`] and a [`Tokenizer`].
#[derive(Clone)]
pub struct Chunker {
    config: ChunkConfig,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Chunker {
    pub fn new(config: ChunkConfig, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { config, tokenizer }
    }

    /// Chunker using [`WhitespaceTokenizer`].
    pub fn whitespace(config: ChunkConfig) -> Self {
        Self::new(config, Arc::new(WhitespaceTokenizer))
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split `text`. Inputs within the limit come back as a single chunk
    /// identical to the input.
    pub fn split(&self, text: &str) -> Result<Vec<String>, ChunkingError> {
        self.config.validate()?;
        let spans = self.tokenizer.spans(text)?;
        let max = self.config.max_tokens;
        if spans.len() <= max {
            return Ok(vec![text.to_string()]);
        }

        let step = max - self.config.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + max).min(spans.len());
            chunks.push(text[spans[start].start..spans[end - 1].end].to_string());
            if end == spans.len() {
                break;
            }
            start += step;
        }
        Ok(chunks)
    }
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Split with the whitespace tokenizer.
pub fn split(text: &str, max_tokens: usize, overlap: usize) -> Result<Vec<String>, ChunkingError> {
    Chunker::whitespace(ChunkConfig::new(max_tokens, overlap)?).split(text)
}

/// Rejoin per-chunk results with a single separating space.
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_spans() {
        let spans = WhitespaceTokenizer.spans("  ab c\n\nd ").unwrap();
        assert_eq!(spans, vec![2..4, 5..6, 8..9]);
        assert_eq!(WhitespaceTokenizer.count("").unwrap(), 0);
    }

    #[test]
    fn test_short_input_is_single_identical_chunk() {
        let text = "  keep   my\tspacing  ";
        assert_eq!(split(text, 10, 2).unwrap(), vec![text.to_string()]);
    }

    #[test]
    fn test_exact_limit_is_single_chunk() {
        assert_eq!(split("a b c", 3, 1).unwrap(), vec!["a b c"]);
    }

    #[test]
    fn test_empty_input_is_one_empty_chunk() {
        assert_eq!(split("", 3, 0).unwrap(), vec![""]);
    }

    #[test]
    fn test_split_without_overlap() {
        let chunks = split("a b c d e", 2, 0).unwrap();
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_split_with_overlap_shares_tokens() {
        let chunks = split("t1 t2 t3 t4 t5 t6", 4, 2).unwrap();
        assert_eq!(chunks, vec!["t1 t2 t3 t4", "t3 t4 t5 t6"]);

        let chunks = split("1 2 3 4 5 6 7", 3, 1).unwrap();
        assert_eq!(chunks, vec!["1 2 3", "3 4 5", "5 6 7"]);
    }

    #[test]
    fn test_every_chunk_respects_the_limit() {
        let text = (0..101).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let chunks = split(&text, 10, 3).unwrap();
        for chunk in &chunks {
            assert!(WhitespaceTokenizer.count(chunk).unwrap() <= 10);
        }
        assert!(chunks.last().unwrap().ends_with("100"));
    }

    #[test]
    fn test_round_trip_modulo_boundary_whitespace() {
        let text = "the quick brown fox jumps over the lazy dog";
        let chunks = split(text, 4, 0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(join(&chunks), text);

        // a newline at a boundary becomes the single joining space
        let text = "one two\nthree four";
        let chunks = split(text, 2, 0).unwrap();
        assert_eq!(join(&chunks), "one two three four");
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(split("a", 0, 0), Err(ChunkingError::ZeroChunkSize));
        assert_eq!(
            split("a", 2, 2),
            Err(ChunkingError::OverlapTooLarge {
                overlap: 2,
                max_tokens: 2
            })
        );
    }

    struct FailingTokenizer;

    impl Tokenizer for FailingTokenizer {
        fn spans(&self, _text: &str) -> Result<Vec<Range<usize>>, ChunkingError> {
            Err(ChunkingError::Tokenizer("malformed input".to_string()))
        }
    }

    #[test]
    fn test_tokenizer_failure_propagates() {
        let chunker = Chunker::new(ChunkConfig::default(), Arc::new(FailingTokenizer));
        assert!(matches!(
            chunker.split("x"),
            Err(ChunkingError::Tokenizer(_))
        ));
    }

    #[test]
    fn test_join_single_and_empty() {
        assert_eq!(join(&["only"]), "only");
        assert_eq!(join::<&str>(&[]), "");
    }
}
