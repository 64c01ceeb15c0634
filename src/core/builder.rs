/// Graph builder — interns words and keys and links every transition to
/// its successor key.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;
use thiserror::Error;

use crate::core::encoder::{self, EncodedChain};
use crate::core::grouper::{self, GroupedOptions, OptionOrder};
use crate::core::history::{History, KeyShape, SENTINEL};
use crate::core::interner::Interner;
use crate::core::stats::BuildStats;
use crate::core::tokenizer;
use crate::schema::ids::{KeyId, WordId};
use crate::schema::layout::{FormatError, TableLayout, MAX_IDS};
use crate::schema::record::{Table, Transition};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("word {word:?} is {len} bytes long, over the {max}-byte limit")]
    WordTooLong { word: String, len: usize, max: usize },
    #[error("invalid word {0:?}: words must be non-empty and free of NUL bytes")]
    InvalidWord(String),
    #[error("too many distinct {table}: 16-bit IDs hold at most {limit}")]
    IdSpaceExhausted { table: Table, limit: usize },
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Build-time settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Longest word (in bytes) accepted. The stored field width is the
    /// longest word actually seen, which never exceeds this.
    pub max_word_length: usize,
    /// Run order of the Options section.
    pub option_order: OptionOrder,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_word_length: 64,
            option_order: OptionOrder::Ascending,
        }
    }
}

impl BuildConfig {
    /// Load a config from a RON file. Missing fields take their defaults.
    pub fn load_from_ron(path: &Path) -> Result<Self, BuildError> {
        let contents = std::fs::read_to_string(path)?;
        let config: BuildConfig = ron::from_str(&contents)?;
        Ok(config)
    }
}

/// Consumes tokens in document order and records one transition per token.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    config: BuildConfig,
    words: Interner<String>,
    keys: Interner<KeyShape>,
    history: History,
    transitions: Vec<Transition>,
    max_word_length: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

impl GraphBuilder {
    pub fn new(config: BuildConfig) -> Self {
        let mut keys = Interner::new();
        // Key 0 is the sentinel even if no word ever arrives.
        let sentinel = keys.intern(&SENTINEL);
        debug_assert_eq!(sentinel, Ok(KeyId::START.0));

        Self {
            config,
            words: Interner::new(),
            keys,
            history: History::new(),
            transitions: Vec::new(),
            max_word_length: 0,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Consume one token and return the transition it produced.
    ///
    /// The successor key is resolved here, from the advanced window, so the
    /// returned record is complete. On error no transition is recorded and
    /// the window and word field width are unchanged; a word or key
    /// interned before the failure stays interned.
    pub fn consume(&mut self, word: &str) -> Result<Transition, BuildError> {
        if word.is_empty() || word.as_bytes().contains(&0) {
            return Err(BuildError::InvalidWord(word.to_string()));
        }
        if word.len() > self.config.max_word_length {
            return Err(BuildError::WordTooLong {
                word: word.to_string(),
                len: word.len(),
                max: self.config.max_word_length,
            });
        }
        if self.transitions.len() >= MAX_IDS {
            return Err(exhausted(Table::Options));
        }

        let word_id = WordId(self.words.intern(word).map_err(|_| exhausted(Table::Words))?);

        let this_key = self.intern_key(self.history.shape())?;
        let next = self.history.advanced(word_id);
        let next_key = self.intern_key(next.shape())?;
        self.history = next;
        self.max_word_length = self.max_word_length.max(word.len());

        let transition = Transition {
            word: word_id,
            this_key,
            next_key,
        };
        self.transitions.push(transition);
        Ok(transition)
    }

    /// Consume every whitespace-delimited word of `text`. Returns the
    /// number of words consumed.
    pub fn consume_text(&mut self, text: &str) -> Result<usize, BuildError> {
        let mut count = 0;
        for word in tokenizer::words(text) {
            self.consume(word)?;
            count += 1;
        }
        Ok(count)
    }

    /// Consume a text source line by line.
    pub fn consume_reader<R: BufRead>(&mut self, reader: R) -> Result<usize, BuildError> {
        let mut count = 0;
        for line in reader.lines() {
            count += self.consume_text(&line?)?;
        }
        Ok(count)
    }

    fn intern_key(&mut self, shape: KeyShape) -> Result<KeyId, BuildError> {
        self.keys
            .intern(&shape)
            .map(KeyId)
            .map_err(|_| exhausted(Table::Keys))
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn max_word_length(&self) -> usize {
        self.max_word_length
    }

    /// Words in ID order.
    pub fn words(&self) -> &[String] {
        self.words.items()
    }

    /// Transitions in input order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.words.get(word).map(WordId)
    }

    pub fn key_id(&self, shape: &KeyShape) -> Option<KeyId> {
        self.keys.get(shape).map(KeyId)
    }

    pub fn key_shape(&self, key: KeyId) -> Option<KeyShape> {
        self.keys.items().get(key.index()).copied()
    }

    /// Group the transitions and freeze the graph.
    pub fn finish(self) -> Result<BuiltGraph, BuildError> {
        let key_count = self.keys.len();
        let options = grouper::group(self.transitions, key_count, self.config.option_order)?;

        log::debug!(
            "built graph: {} words, {} keys, {} options, longest word {} bytes",
            self.words.len(),
            key_count,
            options.options.len(),
            self.max_word_length
        );

        Ok(BuiltGraph {
            words: self.words.into_items(),
            keys: self.keys.into_items(),
            max_word_length: self.max_word_length,
            options,
        })
    }
}

fn exhausted(table: Table) -> BuildError {
    BuildError::IdSpaceExhausted {
        table,
        limit: MAX_IDS,
    }
}

/// A fully built graph, ready to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltGraph {
    /// Words in ID order.
    pub words: Vec<String>,
    /// Key shapes in ID order.
    pub keys: Vec<KeyShape>,
    pub max_word_length: usize,
    pub options: GroupedOptions,
}

impl BuiltGraph {
    pub fn layout(&self) -> Result<TableLayout, FormatError> {
        TableLayout::new(
            self.max_word_length,
            self.words.len(),
            self.options.ranges.len(),
            self.options.options.len(),
        )
    }

    pub fn stats(&self) -> Result<BuildStats, FormatError> {
        let dead_ends = self.options.ranges.iter().filter(|r| r.is_empty()).count();
        Ok(BuildStats::new(&self.layout()?, dead_ends))
    }

    pub fn encode(&self) -> Result<EncodedChain, FormatError> {
        encoder::encode(
            &self.words,
            self.max_word_length,
            &self.options.ranges,
            &self.options.options,
        )
    }
}

/// Build and encode `text` in one go.
pub fn compile(text: &str, config: BuildConfig) -> Result<EncodedChain, BuildError> {
    let mut builder = GraphBuilder::new(config);
    builder.consume_text(text)?;
    Ok(builder.finish()?.encode()?)
}
