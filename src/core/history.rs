/// The sliding window of recent word IDs that keys are made from.

use crate::schema::ids::WordId;

/// Number of words in a key.
pub const ORDER: usize = 2;

/// Canonical key form: the window's word IDs, oldest first. `None` is the
/// out-of-band "no word yet" slot, so partially filled windows can never
/// alias a real word sequence.
pub type KeyShape = [Option<WordId>; ORDER];

/// The sentinel key shape: nothing consumed yet.
pub const SENTINEL: KeyShape = [None; ORDER];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct History {
    slots: KeyShape,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self { slots: SENTINEL }
    }

    pub fn shape(&self) -> KeyShape {
        self.slots
    }

    /// The window after `word` slides in at the end.
    pub fn advanced(&self, word: WordId) -> History {
        let mut slots = self.slots;
        slots.rotate_left(1);
        slots[ORDER - 1] = Some(word);
        History { slots }
    }

    /// True once every slot holds a word.
    pub fn is_primed(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
