//! Context assembly.
//!
//! Turns ranked chunks into the single text block injected into a
//! generation prompt. The budget is measured in characters and covers the
//! block separators too, so the returned string never exceeds it.

use crate::retriever::ScoredChunk;

/// Delimiter between chunk blocks in the assembled context.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Formats `ranked` as `"Source: <source>\n<text>"` blocks joined in rank
/// order. A block that would overflow `max_chars` is truncated to exactly
/// fill the remaining budget and assembly stops there.
pub fn build_context(ranked: &[ScoredChunk], max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }

    let sep_len = BLOCK_SEPARATOR.chars().count();
    let mut out = String::new();
    let mut used = 0usize;

    for scored in ranked {
        let block = format!("Source: {}\n{}", scored.chunk.source, scored.chunk.text);
        let block_len = block.chars().count();
        let lead = if out.is_empty() { 0 } else { sep_len };

        if used + lead + block_len <= max_chars {
            if lead > 0 {
                out.push_str(BLOCK_SEPARATOR);
            }
            out.push_str(&block);
            used += lead + block_len;
            if used == max_chars {
                break;
            }
        } else {
            let remaining = max_chars.saturating_sub(used + lead);
            if remaining == 0 {
                break;
            }
            if lead > 0 {
                out.push_str(BLOCK_SEPARATOR);
            }
            out.extend(block.chars().take(remaining));
            break;
        }
    }

    out
}
