use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrapper for word IDs (index into the Words section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordId(pub u16);

/// Newtype wrapper for key IDs (index into the Keys section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(pub u16);

/// Newtype wrapper for option IDs (index into the Options section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionId(pub u16);

impl KeyId {
    /// The sentinel key: the history before any word was consumed.
    /// Always the first key interned, so always the traversal start.
    pub const START: KeyId = KeyId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl WordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl OptionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "word #{}", self.0)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key #{}", self.0)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "option #{}", self.0)
    }
}
