//! Fence balancing shared by the fence-aware strategies.
//!
//! Fences are recognized per line, but the balance of a chunk is the number
//! of triple-backtick runs anywhere in its text. A backtick run in the middle
//! of a prose line, or a fence line with extra backticks, can leave a chunk
//! with an odd count. Such a chunk is joined with the chunks after it until
//! the count is even again, the same way a fenced block is kept whole.

use super::scan::count_fences;

/// A chunk whose text can be merged with the chunk that follows it.
pub(crate) trait FencedChunk: Sized {
    fn text(&self) -> &str;

    fn text_mut(&mut self) -> &mut String;

    /// Append `next` to `self`.
    fn absorb(&mut self, next: Self);
}

/// Whether `text` holds an odd number of triple-backtick runs.
pub(crate) fn is_unbalanced(text: &str) -> bool {
    count_fences(text) % 2 == 1
}

/// Merge consecutive chunks until each holds an even number of fences.
///
/// An imbalance still open at the end of the input is closed with an
/// appended fence line, as for an unterminated code block.
pub(crate) fn balance_fences<C: FencedChunk>(chunks: Vec<C>) -> Vec<C> {
    let mut balanced: Vec<C> = Vec::with_capacity(chunks.len());
    let mut open = false;

    for chunk in chunks {
        let odd = is_unbalanced(chunk.text());
        match balanced.last_mut() {
            Some(last) if open => last.absorb(chunk),
            _ => balanced.push(chunk),
        }
        open ^= odd;
    }

    if open {
        if let Some(last) = balanced.last_mut() {
            last.text_mut().push_str("\n```");
        }
    }
    balanced
}
