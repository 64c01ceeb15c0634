/// Traversal engine — walks an encoded chain one word at a time.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{Read, Seek};
use thiserror::Error;

use crate::core::reader::{ReadError, TableReader};
use crate::schema::ids::{KeyId, OptionId};

#[derive(Debug, Error)]
pub enum WalkError {
    /// The current key has no outgoing options. Not corruption: the caller
    /// decides whether to stop, `reset` or jump elsewhere.
    #[error("chain exhausted: {key} has no outgoing options")]
    Exhausted { key: KeyId },
    #[error("read error: {0}")]
    Read(#[from] ReadError),
}

impl WalkError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Walks the chain from a start key. The only state is the current key
/// and the RNG; the graph itself stays in the store.
#[derive(Debug)]
pub struct ChainWalker<S> {
    reader: TableReader<S>,
    start: KeyId,
    current: KeyId,
    rng: StdRng,
}

impl<S: Read + Seek> ChainWalker<S> {
    /// A walker with a deterministic RNG, starting at the sentinel key.
    pub fn new(reader: TableReader<S>, seed: u64) -> Self {
        Self::with_rng(reader, StdRng::seed_from_u64(seed))
    }

    /// A walker seeded from the operating system.
    pub fn from_entropy(reader: TableReader<S>) -> Self {
        Self::with_rng(reader, StdRng::from_entropy())
    }

    fn with_rng(reader: TableReader<S>, rng: StdRng) -> Self {
        Self {
            reader,
            start: KeyId::START,
            current: KeyId::START,
            rng,
        }
    }

    /// Start (and restart) from `key` instead of the sentinel.
    pub fn with_start(mut self, key: KeyId) -> Self {
        self.start = key;
        self.current = key;
        self
    }

    pub fn current_key(&self) -> KeyId {
        self.current
    }

    /// Go back to the start key.
    pub fn reset(&mut self) {
        self.current = self.start;
    }

    pub fn reader(&self) -> &TableReader<S> {
        &self.reader
    }

    /// Emit the next word and move to its successor key.
    ///
    /// On error the current key is unchanged.
    pub fn step(&mut self) -> Result<&str, WalkError> {
        let range = self.reader.read_key_range(self.current)?;
        if range.is_empty() {
            log::debug!("{} has no outgoing options", self.current);
            return Err(WalkError::Exhausted { key: self.current });
        }

        let option = OptionId(self.rng.gen_range(range.first.0..=range.last.0));
        let record = self.reader.read_option(option)?;
        let word = self.reader.read_word(record.word)?;
        self.current = record.next_key;
        Ok(word)
    }

    /// Collect up to `limit` words, stopping early at an exhausted chain.
    pub fn take_words(&mut self, limit: usize) -> Result<Vec<String>, ReadError> {
        let mut words = Vec::with_capacity(limit);
        while words.len() < limit {
            match self.step() {
                Ok(word) => words.push(word.to_string()),
                Err(WalkError::Exhausted { .. }) => break,
                Err(WalkError::Read(e)) => return Err(e),
            }
        }
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::{compile, BuildConfig};
    use crate::core::encoder::EncodedChain;

    fn chain(text: &str) -> EncodedChain {
        compile(text, BuildConfig::default()).unwrap()
    }

    #[test]
    fn alternating_input_replays_exactly() {
        let chain = chain("a b a b a b");
        let mut walker = ChainWalker::new(chain.reader().unwrap(), 42);
        let words = walker.take_words(9).unwrap();
        assert_eq!(words, vec!["a", "b", "a", "b", "a", "b", "a", "b", "a"]);
    }

    #[test]
    fn single_word_exhausts() {
        let chain = chain("only");
        let mut walker = ChainWalker::new(chain.reader().unwrap(), 42);
        assert_eq!(walker.step().unwrap(), "only");
        assert_eq!(walker.current_key(), KeyId(1));

        let err = walker.step().unwrap_err();
        assert!(err.is_exhausted());
        assert!(matches!(err, WalkError::Exhausted { key: KeyId(1) }));
        // Still parked on the dead end.
        assert_eq!(walker.current_key(), KeyId(1));

        walker.reset();
        assert_eq!(walker.step().unwrap(), "only");
    }

    #[test]
    fn empty_chain_exhausts_immediately() {
        let chain = chain("");
        let mut walker = ChainWalker::new(chain.reader().unwrap(), 1);
        assert!(walker.step().unwrap_err().is_exhausted());
        assert!(walker.take_words(5).unwrap().is_empty());
    }

    #[test]
    fn same_seed_same_stream() {
        let chain = chain("the cat sat on the mat and the cat ran off the mat");
        let mut first = ChainWalker::new(chain.reader().unwrap(), 7);
        let mut second = ChainWalker::new(chain.reader().unwrap(), 7);
        assert_eq!(first.take_words(40).unwrap(), second.take_words(40).unwrap());
    }

    #[test]
    fn custom_start_key() {
        let chain = chain("x y z");
        // key 2 is (x, y), which is followed by z
        let mut walker = ChainWalker::new(chain.reader().unwrap(), 3).with_start(KeyId(2));
        assert_eq!(walker.step().unwrap(), "z");
        walker.reset();
        assert_eq!(walker.current_key(), KeyId(2));
    }

    #[test]
    fn dangling_successor_is_an_error() {
        let mut chain = chain("a b");
        // Point option 0 (the sentinel's only option) at a key that does not exist.
        let at = chain.layout.options_offset() as usize + 2;
        chain.bytes[at..at + 2].copy_from_slice(&99u16.to_le_bytes());

        let mut walker = ChainWalker::new(chain.reader().unwrap(), 5);
        assert_eq!(walker.step().unwrap(), "a");
        let err = walker.step().unwrap_err();
        assert!(matches!(err, WalkError::Read(ReadError::OutOfRange { .. })));
    }
}
