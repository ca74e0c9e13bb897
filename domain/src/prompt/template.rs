//! Slot-based prompt templates

use crate::context::Context;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `{{` / `}}` escapes, or a `{slot}` placeholder.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// A prompt template with `{slot}` placeholders.
///
/// Rendering never fails: a placeholder with no matching slot renders as
/// the empty string, and context slots the template does not mention are
/// ignored. `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    id: String,
    text: String,
}

impl PromptTemplate {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render against `ctx`.
    pub fn render(&self, ctx: &Context) -> String {
        PLACEHOLDER
            .replace_all(&self.text, |caps: &Captures| match caps.get(1) {
                Some(slot) => ctx.get(slot.as_str()).unwrap_or("").to_string(),
                None if &caps[0] == "{{" => "{".to_string(),
                None => "}".to_string(),
            })
            .into_owned()
    }

    /// Slot names referenced by the template, in first-use order.
    pub fn slots(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.text) {
            if let Some(slot) = caps.get(1)
                && !names.contains(&slot.as_str())
            {
                names.push(slot.as_str());
            }
        }
        names
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.slots().contains(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::slots;

    #[test]
    fn test_render_substitutes_slots() {
        let t = PromptTemplate::new("t", "Q: {input}\nHelp: {helper_response}");
        let ctx = Context::new()
            .with(slots::INPUT, "why?")
            .with(slots::HELPER_RESPONSE, "because");
        assert_eq!(t.render(&ctx), "Q: why?\nHelp: because");
    }

    #[test]
    fn test_missing_slot_renders_empty() {
        let t = PromptTemplate::new("t", "[{transcript}]");
        assert_eq!(t.render(&Context::new()), "[]");
    }

    #[test]
    fn test_unused_slots_are_ignored() {
        let t = PromptTemplate::new("t", "plain");
        let ctx = Context::new().with("brief", "ignored");
        assert_eq!(t.render(&ctx), "plain");
    }

    #[test]
    fn test_escaped_braces() {
        let t = PromptTemplate::new("t", "json: {{\"a\": {input}}}");
        let ctx = Context::new().with(slots::INPUT, "1");
        assert_eq!(t.render(&ctx), "json: {\"a\": 1}");
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let t = PromptTemplate::new("t", "{ not a slot } {1x}");
        assert_eq!(t.render(&Context::new()), "{ not a slot } {1x}");
    }

    #[test]
    fn test_values_are_not_re_expanded() {
        let t = PromptTemplate::new("t", "{input}");
        let ctx = Context::new()
            .with(slots::INPUT, "{helper_response}")
            .with(slots::HELPER_RESPONSE, "nope");
        assert_eq!(t.render(&ctx), "{helper_response}");
    }

    #[test]
    fn test_slots_listing() {
        let t = PromptTemplate::new("t", "{a} {b} {a} {{c}}");
        assert_eq!(t.slots(), vec!["a", "b"]);
        assert!(t.has_slot("b"));
        assert!(!t.has_slot("c"));
    }
}
