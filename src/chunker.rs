//! Character-window text splitter.
//!
//! Splits normalized text into overlapping fixed-size windows. Indexing is
//! by Unicode scalar value, never by byte, so multi-byte text cannot be
//! split mid-character.

/// Splits `text` into trimmed, non-empty windows of at most `chunk_size`
/// characters, consecutive windows sharing `overlap` characters.
///
/// Line endings are normalized to `\n` and trailing whitespace is stripped
/// per line before windowing. The caller is expected to have validated
/// `overlap < chunk_size` (see `RagConfig::validate`); the cursor step is
/// clamped regardless so the loop always advances.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 {
        return Vec::new();
    }
    let overlap = overlap.min(chunk_size - 1);

    let normalized = normalize(text);
    let chars: Vec<char> = normalized.chars().collect();
    let n = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < n {
        let end = (start + chunk_size).min(n);
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == n {
            break;
        }
        start = end - overlap;
    }
    chunks
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
