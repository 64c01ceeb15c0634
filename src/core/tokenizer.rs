/// Word tokenizer — whitespace-delimited, no normalisation.

use std::str::SplitWhitespace;

/// Split text into word tokens in document order.
///
/// Punctuation stays attached to its word, so "dog." and "dog" are
/// different words.
pub fn words(text: &str) -> SplitWhitespace<'_> {
    text.split_whitespace()
}
