/// Build statistics — advisory figures about a compiled chain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::schema::layout::TableLayout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub word_count: usize,
    pub key_count: usize,
    pub option_count: usize,
    pub max_word_length: usize,
    /// Keys with no outgoing options.
    pub dead_end_keys: usize,
    pub words_bytes: Range<u64>,
    pub keys_bytes: Range<u64>,
    pub options_bytes: Range<u64>,
}

impl BuildStats {
    pub fn new(layout: &TableLayout, dead_end_keys: usize) -> Self {
        Self {
            word_count: layout.word_count,
            key_count: layout.key_count,
            option_count: layout.option_count,
            max_word_length: layout.max_word_length,
            dead_end_keys,
            words_bytes: layout.words_offset()..layout.keys_offset(),
            keys_bytes: layout.keys_offset()..layout.options_offset(),
            options_bytes: layout.options_offset()..layout.total_len(),
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.options_bytes.end
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of words: {}", self.word_count)?;
        writeln!(f, "Number of keys: {}", self.key_count)?;
        writeln!(f, "Maximum word length: {}", self.max_word_length)?;
        writeln!(f, "Number of options: {}", self.option_count)?;
        writeln!(f, "Dead-end keys: {}", self.dead_end_keys)?;
        writeln!(f, "Word table: bytes {:?}", self.words_bytes)?;
        writeln!(f, "Key table: bytes {:?}", self.keys_bytes)?;
        write!(f, "Option table: bytes {:?}", self.options_bytes)
    }
}
