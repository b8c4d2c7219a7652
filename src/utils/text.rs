//! Text normalization helpers.

/// Ellipsis marker appended to clipped text.
pub const ELLIPSIS: &str = "...";

/// Clip `text` to at most `max_chars` characters, appending an ellipsis
/// marker when anything was dropped.
///
/// Operates on characters, not bytes, so multi-byte input never splits a
/// code point. Text at or under the limit is returned unchanged.
pub fn clip(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = text[..byte_idx].to_string();
            out.push_str(ELLIPSIS);
            out
        }
    }
}
