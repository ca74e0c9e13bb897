//! Invocation context: the named slots a prompt template is rendered with.
//!
//! A [`Context`] is built fresh for every cycle and handed to every agent of
//! that cycle unchanged. Agents never mutate it; per-chunk variants are
//! derived copies (see [`Context::with`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known slot names.
pub mod slots {
    /// The user's input for this chat turn.
    pub const INPUT: &str = "input";
    /// Caller-supplied source document (bounded before use).
    pub const TRANSCRIPT: &str = "transcript";
    /// Aggregated text of the previous cycle ("" on the first cycle).
    pub const HELPER_RESPONSE: &str = "helper_response";
    /// Rendered conversation memory.
    pub const HISTORY: &str = "history";
}

/// Mapping from slot name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    slots: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style slot assignment.
    pub fn with(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(slot, value);
        self
    }

    pub fn insert(&mut self, slot: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(slot.into(), value.into());
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    /// The `input` slot, or "" when unset.
    pub fn input(&self) -> &str {
        self.get(slots::INPUT).unwrap_or("")
    }

    /// Copy of `self` with every slot of `other` applied on top.
    pub fn merged_with(&self, other: &Context) -> Context {
        let mut merged = self.clone();
        for (k, v) in &other.slots {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let ctx = Context::new()
            .with(slots::INPUT, "hello")
            .with(slots::HELPER_RESPONSE, "");
        assert_eq!(ctx.input(), "hello");
        assert_eq!(ctx.get(slots::HELPER_RESPONSE), Some(""));
        assert_eq!(ctx.get(slots::TRANSCRIPT), None);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_missing_input_is_empty() {
        assert_eq!(Context::new().input(), "");
    }

    #[test]
    fn test_merged_with_overrides() {
        let base = Context::new().with("a", "1").with("b", "2");
        let over = Context::new().with("b", "3").with("c", "4");
        let merged = base.merged_with(&over);
        assert_eq!(merged.get("a"), Some("1"));
        assert_eq!(merged.get("b"), Some("3"));
        assert_eq!(merged.get("c"), Some("4"));
        // original untouched
        assert_eq!(base.get("b"), Some("2"));
    }

    #[test]
    fn test_from_iterator_and_serde() {
        let ctx: Context = [("brief", "short"), ("input", "q")].into_iter().collect();
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"brief":"short","input":"q"}"#);
    }
}
