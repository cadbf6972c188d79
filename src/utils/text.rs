//! Text helpers for diagnostics

/// Returns at most `max_chars` characters from the start of `body`.
///
/// Cuts on character boundaries so multi-byte bodies never split a code point.
pub fn excerpt(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}
