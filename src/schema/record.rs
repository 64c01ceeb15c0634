/// Fixed-width records stored in the Keys and Options sections.
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{KeyId, OptionId, WordId};

/// Width in bytes of one Keys record.
pub const KEY_RECORD_LEN: usize = 4;
/// Width in bytes of one Options record.
pub const OPTION_RECORD_LEN: usize = 4;

/// The three tables of a compiled chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Words,
    Keys,
    Options,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Words => "words",
            Self::Keys => "keys",
            Self::Options => "options",
        })
    }
}

/// One observed transition: after `this_key`, `word` followed, leaving the
/// history at `next_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub word: WordId,
    pub this_key: KeyId,
    pub next_key: KeyId,
}

impl Transition {
    /// The on-disk part of the transition. `this_key` is implied by the
    /// range the record sits in.
    pub fn record(&self) -> OptionRecord {
        OptionRecord {
            word: self.word,
            next_key: self.next_key,
        }
    }
}

/// Inclusive option range of a key. `first > last` marks a key with no
/// outgoing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub first: OptionId,
    pub last: OptionId,
}

impl KeyRange {
    /// How a key without outgoing options is written.
    pub const EMPTY: KeyRange = KeyRange {
        first: OptionId(1),
        last: OptionId(0),
    };

    pub fn single(id: OptionId) -> Self {
        Self { first: id, last: id }
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.last.0 - self.first.0) as usize + 1
        }
    }

    pub fn contains(&self, id: OptionId) -> bool {
        self.first <= id && id <= self.last
    }

    pub fn to_bytes(&self) -> [u8; KEY_RECORD_LEN] {
        let [a, b] = self.first.0.to_le_bytes();
        let [c, d] = self.last.0.to_le_bytes();
        [a, b, c, d]
    }

    pub fn from_bytes(bytes: [u8; KEY_RECORD_LEN]) -> Self {
        Self {
            first: OptionId(u16::from_le_bytes([bytes[0], bytes[1]])),
            last: OptionId(u16::from_le_bytes([bytes[2], bytes[3]])),
        }
    }
}

/// One Options record as stored: the emitted word and the key to continue from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub word: WordId,
    pub next_key: KeyId,
}

impl OptionRecord {
    pub fn to_bytes(&self) -> [u8; OPTION_RECORD_LEN] {
        let [a, b] = self.word.0.to_le_bytes();
        let [c, d] = self.next_key.0.to_le_bytes();
        [a, b, c, d]
    }

    pub fn from_bytes(bytes: [u8; OPTION_RECORD_LEN]) -> Self {
        Self {
            word: WordId(u16::from_le_bytes([bytes[0], bytes[1]])),
            next_key: KeyId(u16::from_le_bytes([bytes[2], bytes[3]])),
        }
    }
}
