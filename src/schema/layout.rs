/// Binary layout of a compiled chain and the constants published with it.
///
/// ```text
/// ┌──────────────────────────────────────────────┐ 0
/// │ WORDS   word_count × max_word_length bytes   │  NUL-padded, no terminator
/// ├──────────────────────────────────────────────┤ keys_offset
/// │ KEYS    key_count × 4 bytes                  │  first: u16le, last: u16le
/// ├──────────────────────────────────────────────┤ options_offset
/// │ OPTIONS option_count × 4 bytes               │  word: u16le, next_key: u16le
/// └──────────────────────────────────────────────┘ total_len
/// ```
///
/// There is no header. A reader needs `KEYS_OFFSET`, `OPTIONS_OFFSET` and
/// `MAX_WORD_LENGTH` (`WORDS_OFFSET` is always 0); they travel next to the
/// blob as a RON sidecar or as generated source constants.
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::ids::{KeyId, OptionId, WordId};
use super::record::{Table, KEY_RECORD_LEN, OPTION_RECORD_LEN};

/// Number of distinct IDs a 16-bit field can address.
pub const MAX_IDS: usize = 1 << 16;

/// Byte used to pad words up to `max_word_length`.
pub const PAD_BYTE: u8 = 0;

/// Offset of the Words section. Fixed.
pub const WORDS_OFFSET: u64 = 0;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("{word} is {len} bytes long, longer than the {max}-byte word field")]
    WordTooLong { word: WordId, len: usize, max: usize },
    #[error("{count} {table} do not fit in 16-bit IDs (limit {limit})")]
    TooManyIds {
        table: Table,
        count: usize,
        limit: usize,
    },
    #[error("inconsistent layout: {0}")]
    InconsistentLayout(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonSer(#[from] ron::Error),
}

/// Sizes of the three sections, from which every offset is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableLayout {
    pub max_word_length: usize,
    pub word_count: usize,
    pub key_count: usize,
    pub option_count: usize,
}

impl TableLayout {
    /// Build a layout from section counts, rejecting counts that overflow
    /// the 16-bit ID space.
    pub fn new(
        max_word_length: usize,
        word_count: usize,
        key_count: usize,
        option_count: usize,
    ) -> Result<Self, FormatError> {
        for (table, count) in [
            (Table::Words, word_count),
            (Table::Keys, key_count),
            (Table::Options, option_count),
        ] {
            if count > MAX_IDS {
                return Err(FormatError::TooManyIds {
                    table,
                    count,
                    limit: MAX_IDS,
                });
            }
        }
        if (max_word_length == 0) != (word_count == 0) {
            return Err(FormatError::InconsistentLayout(format!(
                "{} words with a {}-byte word field",
                word_count, max_word_length
            )));
        }
        let words_len = (word_count as u64).checked_mul(max_word_length as u64);
        let records_len = ((key_count * KEY_RECORD_LEN) + (option_count * OPTION_RECORD_LEN)) as u64;
        if words_len.and_then(|len| len.checked_add(records_len)).is_none() {
            return Err(FormatError::InconsistentLayout(format!(
                "{} words of {} bytes overflow the addressable range",
                word_count, max_word_length
            )));
        }
        Ok(Self {
            max_word_length,
            word_count,
            key_count,
            option_count,
        })
    }

    /// Recover a layout from the four published constants and the size of
    /// the store holding the blob.
    pub fn from_offsets(
        words_offset: u64,
        keys_offset: u64,
        options_offset: u64,
        max_word_length: usize,
        store_len: u64,
    ) -> Result<Self, FormatError> {
        if words_offset != WORDS_OFFSET {
            return Err(FormatError::InconsistentLayout(format!(
                "words section must start at {}, not {}",
                WORDS_OFFSET, words_offset
            )));
        }
        if keys_offset > options_offset || options_offset > store_len {
            return Err(FormatError::InconsistentLayout(format!(
                "offsets out of order: keys {} options {} end {}",
                keys_offset, options_offset, store_len
            )));
        }

        let words_len = keys_offset - words_offset;
        let word_count = match max_word_length {
            0 if words_len == 0 => 0,
            0 => {
                return Err(FormatError::InconsistentLayout(
                    "non-empty words section with a zero-width word field".to_string(),
                ))
            }
            width => exact_count(words_len, width, Table::Words)?,
        };
        let key_count = exact_count(options_offset - keys_offset, KEY_RECORD_LEN, Table::Keys)?;
        let option_count =
            exact_count(store_len - options_offset, OPTION_RECORD_LEN, Table::Options)?;

        Self::new(max_word_length, word_count, key_count, option_count)
    }

    pub fn words_offset(&self) -> u64 {
        WORDS_OFFSET
    }

    // Offsets saturate on hand-built layouts; `new` keeps them exact.
    pub fn keys_offset(&self) -> u64 {
        WORDS_OFFSET.saturating_add(section_len(self.word_count, self.max_word_length))
    }

    pub fn options_offset(&self) -> u64 {
        self.keys_offset()
            .saturating_add(section_len(self.key_count, KEY_RECORD_LEN))
    }

    /// Total blob size in bytes.
    pub fn total_len(&self) -> u64 {
        self.options_offset()
            .saturating_add(section_len(self.option_count, OPTION_RECORD_LEN))
    }

    pub fn word_offset(&self, id: WordId) -> u64 {
        self.words_offset()
            .saturating_add(section_len(id.index(), self.max_word_length))
    }

    pub fn key_offset(&self, id: KeyId) -> u64 {
        self.keys_offset()
            .saturating_add(section_len(id.index(), KEY_RECORD_LEN))
    }

    pub fn option_offset(&self, id: OptionId) -> u64 {
        self.options_offset()
            .saturating_add(section_len(id.index(), OPTION_RECORD_LEN))
    }

    pub fn count(&self, table: Table) -> usize {
        match table {
            Table::Words => self.word_count,
            Table::Keys => self.key_count,
            Table::Options => self.option_count,
        }
    }

    /// Constants for C/C++ readers.
    pub fn c_defines(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "#define WORDS_OFFSET {}", self.words_offset());
        let _ = writeln!(out, "#define KEYS_OFFSET {}", self.keys_offset());
        let _ = writeln!(out, "#define OPTIONS_OFFSET {}", self.options_offset());
        let _ = writeln!(out, "#define MAX_WORD_LENGTH {}", self.max_word_length);
        out
    }

    /// Constants for PHP readers.
    pub fn php_defines(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "define('WORDS_OFFSET', {});", self.words_offset());
        let _ = writeln!(out, "define('KEYS_OFFSET', {});", self.keys_offset());
        let _ = writeln!(out, "define('OPTIONS_OFFSET', {});", self.options_offset());
        let _ = writeln!(out, "define('MAX_WORD_LENGTH', {});", self.max_word_length);
        out
    }

    /// Where the sidecar for a blob at `blob_path` lives.
    pub fn sidecar_path(blob_path: &Path) -> PathBuf {
        blob_path.with_extension("ron")
    }

    /// Save the layout as a RON sidecar.
    pub fn save_ron(&self, path: &Path) -> Result<(), FormatError> {
        let serialized = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load a layout from a RON sidecar, re-checking its limits.
    pub fn load_ron(path: &Path) -> Result<Self, FormatError> {
        let contents = std::fs::read_to_string(path)?;
        let layout: TableLayout = ron::from_str(&contents)?;
        Self::new(
            layout.max_word_length,
            layout.word_count,
            layout.key_count,
            layout.option_count,
        )
    }
}

fn section_len(count: usize, width: usize) -> u64 {
    (count as u64).saturating_mul(width as u64)
}

fn exact_count(len: u64, width: usize, table: Table) -> Result<usize, FormatError> {
    let width = width as u64;
    if len % width != 0 {
        return Err(FormatError::InconsistentLayout(format!(
            "{} section is {} bytes, not a multiple of {}",
            table, len, width
        )));
    }
    Ok((len / width) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableLayout {
        TableLayout::new(5, 3, 4, 6).unwrap()
    }

    #[test]
    fn offsets_follow_counts() {
        let layout = sample();
        assert_eq!(layout.words_offset(), 0);
        assert_eq!(layout.keys_offset(), 15);
        assert_eq!(layout.options_offset(), 31);
        assert_eq!(layout.total_len(), 55);
        assert_eq!(layout.word_offset(WordId(2)), 10);
        assert_eq!(layout.key_offset(KeyId(1)), 19);
        assert_eq!(layout.option_offset(OptionId(5)), 51);
    }

    #[test]
    fn from_offsets_recovers_counts() {
        let layout = sample();
        let recovered = TableLayout::from_offsets(
            0,
            layout.keys_offset(),
            layout.options_offset(),
            layout.max_word_length,
            layout.total_len(),
        )
        .unwrap();
        assert_eq!(recovered, layout);
    }

    #[test]
    fn from_offsets_rejects_ragged_sections() {
        let err = TableLayout::from_offsets(0, 14, 30, 5, 54).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLayout(_)));

        let err = TableLayout::from_offsets(0, 15, 31, 5, 54).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLayout(_)));

        let err = TableLayout::from_offsets(0, 31, 15, 5, 55).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLayout(_)));
    }

    #[test]
    fn rejects_counts_past_id_space() {
        let err = TableLayout::new(4, 1, MAX_IDS + 1, 1).unwrap_err();
        assert!(matches!(
            err,
            FormatError::TooManyIds {
                table: Table::Keys,
                ..
            }
        ));
        assert!(TableLayout::new(4, MAX_IDS, MAX_IDS, MAX_IDS).is_ok());
    }

    #[test]
    fn empty_layout() {
        let layout = TableLayout::new(0, 0, 1, 0).unwrap();
        assert_eq!(layout.keys_offset(), 0);
        assert_eq!(layout.total_len(), 4);
        assert!(TableLayout::new(0, 2, 1, 0).is_err());
    }

    #[test]
    fn oversized_word_field_is_rejected() {
        let err = TableLayout::new(usize::MAX, 4, 1, 0).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLayout(_)));
    }

    #[test]
    fn corrupt_sidecar_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.ron");
        std::fs::write(
            &path,
            format!(
                "(max_word_length: {}, word_count: 4, key_count: 1, option_count: 0)",
                usize::MAX
            ),
        )
        .unwrap();
        assert!(matches!(
            TableLayout::load_ron(&path),
            Err(FormatError::InconsistentLayout(_))
        ));
    }

    #[test]
    fn hand_built_layout_offsets_saturate() {
        let layout = TableLayout {
            max_word_length: usize::MAX,
            word_count: 4,
            key_count: 1,
            option_count: 0,
        };
        let words_len = (usize::MAX as u64).saturating_mul(4);
        assert_eq!(layout.keys_offset(), words_len);
        assert_eq!(layout.total_len(), words_len.saturating_add(4));
        assert_eq!(layout.word_offset(WordId(3)), (usize::MAX as u64).saturating_mul(3));
    }

    #[test]
    fn c_and_php_constants() {
        let layout = sample();
        let c = layout.c_defines();
        assert!(c.contains("#define WORDS_OFFSET 0\n"));
        assert!(c.contains("#define KEYS_OFFSET 15\n"));
        assert!(c.contains("#define OPTIONS_OFFSET 31\n"));
        assert!(c.contains("#define MAX_WORD_LENGTH 5\n"));

        let php = layout.php_defines();
        assert!(php.contains("define('KEYS_OFFSET', 15);"));
        assert!(php.contains("define('MAX_WORD_LENGTH', 5);"));
    }

    #[test]
    fn ron_round_trip() {
        let layout = sample();
        let serialized = ron::to_string(&layout).unwrap();
        let deserialized: TableLayout = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, layout);
    }

    #[test]
    fn save_and_load_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("chain.bin");
        let path = TableLayout::sidecar_path(&blob);
        assert_eq!(path, dir.path().join("chain.ron"));

        let layout = sample();
        layout.save_ron(&path).unwrap();
        assert_eq!(TableLayout::load_ron(&path).unwrap(), layout);
    }
}
