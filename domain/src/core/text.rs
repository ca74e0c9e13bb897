//! Text helpers for bounding context slots.

/// Keep at most `max_chars` characters of `s`, cutting on a character
/// boundary. Returns a sub-slice of the input.
pub fn bound_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Like [`bound_chars`], but appends a marker when something was cut.
pub fn bound_chars_marked(s: &str, max_chars: usize) -> String {
    let bounded = bound_chars(s, max_chars);
    if bounded.len() == s.len() {
        s.to_string()
    } else {
        format!("{}\n[... truncated]", bounded)
    }
}
