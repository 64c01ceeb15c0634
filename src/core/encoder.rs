/// Encoder — serializes the Words, Keys and Options tables into one blob.

use std::io::{Cursor, Write};
use std::path::Path;

use crate::core::reader::{ReadError, TableReader};
use crate::schema::ids::{OptionId, WordId};
use crate::schema::layout::{FormatError, TableLayout, PAD_BYTE};
use crate::schema::record::{KeyRange, Transition};

/// An encoded blob plus the layout needed to address it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChain {
    pub bytes: Vec<u8>,
    pub layout: TableLayout,
}

impl EncodedChain {
    /// Write the blob to `path` and its layout to the sidecar next to it.
    pub fn save(&self, path: &Path) -> Result<(), FormatError> {
        std::fs::write(path, &self.bytes)?;
        self.layout.save_ron(&TableLayout::sidecar_path(path))?;
        Ok(())
    }

    /// Read the blob in place.
    pub fn reader(&self) -> Result<TableReader<Cursor<&[u8]>>, ReadError> {
        TableReader::from_bytes(&self.bytes, self.layout)
    }
}

/// Encode the three tables into a fresh buffer.
///
/// `ranges` is indexed by key ID and `options` must already be grouped so
/// that each key's transitions sit inside its range.
pub fn encode(
    words: &[String],
    max_word_length: usize,
    ranges: &[KeyRange],
    options: &[Transition],
) -> Result<EncodedChain, FormatError> {
    let layout = TableLayout::new(max_word_length, words.len(), ranges.len(), options.len())?;
    let mut bytes = Vec::with_capacity(layout.total_len() as usize);
    write_tables(&mut bytes, &layout, words, ranges, options)?;

    log::debug!(
        "encoded {} bytes (keys at {}, options at {})",
        bytes.len(),
        layout.keys_offset(),
        layout.options_offset()
    );

    Ok(EncodedChain { bytes, layout })
}

/// Stream the three tables to `out` in layout order.
pub fn write_tables<W: Write>(
    out: &mut W,
    layout: &TableLayout,
    words: &[String],
    ranges: &[KeyRange],
    options: &[Transition],
) -> Result<(), FormatError> {
    check_counts(layout, words, ranges, options)?;

    let mut field = vec![PAD_BYTE; layout.max_word_length];
    for (id, word) in words.iter().enumerate() {
        let raw = word.as_bytes();
        if raw.len() > layout.max_word_length {
            return Err(FormatError::WordTooLong {
                word: WordId(id as u16),
                len: raw.len(),
                max: layout.max_word_length,
            });
        }
        field.fill(PAD_BYTE);
        field[..raw.len()].copy_from_slice(raw);
        out.write_all(&field)?;
    }

    for (key, range) in ranges.iter().enumerate() {
        if !range.is_empty() && range.last.index() >= options.len() {
            return Err(FormatError::InconsistentLayout(format!(
                "key #{} ends at option #{} but only {} options exist",
                key,
                range.last.0,
                options.len()
            )));
        }
        out.write_all(&range.to_bytes())?;
    }

    for (index, option) in options.iter().enumerate() {
        let in_range = ranges
            .get(option.this_key.index())
            .is_some_and(|range| range.contains(OptionId(index as u16)));
        if !in_range {
            return Err(FormatError::InconsistentLayout(format!(
                "option #{} lies outside the range of {}",
                index, option.this_key
            )));
        }
        if option.word.index() >= words.len() || option.next_key.index() >= ranges.len() {
            return Err(FormatError::InconsistentLayout(format!(
                "option #{} points at {} / {} past the end of the tables",
                index, option.word, option.next_key
            )));
        }
        out.write_all(&option.record().to_bytes())?;
    }

    Ok(())
}

fn check_counts(
    layout: &TableLayout,
    words: &[String],
    ranges: &[KeyRange],
    options: &[Transition],
) -> Result<(), FormatError> {
    if layout.word_count != words.len()
        || layout.key_count != ranges.len()
        || layout.option_count != options.len()
    {
        return Err(FormatError::InconsistentLayout(format!(
            "layout declares {}/{}/{} entries, tables hold {}/{}/{}",
            layout.word_count,
            layout.key_count,
            layout.option_count,
            words.len(),
            ranges.len(),
            options.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ids::KeyId;

    fn words() -> Vec<String> {
        vec!["only".to_string()]
    }

    fn single_word_tables() -> (Vec<KeyRange>, Vec<Transition>) {
        let ranges = vec![KeyRange::single(OptionId(0)), KeyRange::EMPTY];
        let options = vec![Transition {
            word: WordId(0),
            this_key: KeyId(0),
            next_key: KeyId(1),
        }];
        (ranges, options)
    }

    #[test]
    fn byte_exact_layout() {
        let (ranges, options) = single_word_tables();
        let chain = encode(&["a".to_string(), "bcd".to_string()], 3, &ranges, &options);
        // word #1 is never referenced but still encoded
        let chain = chain.unwrap();
        assert_eq!(
            chain.bytes,
            vec![
                b'a', 0, 0, b'b', b'c', b'd', // words
                0, 0, 0, 0, // key 0: 0..=0
                1, 0, 0, 0, // key 1: empty
                0, 0, 1, 0, // option 0: word 0 -> key 1
            ]
        );
        assert_eq!(chain.layout.keys_offset(), 6);
        assert_eq!(chain.layout.options_offset(), 14);
    }

    #[test]
    fn rejects_word_wider_than_field() {
        let (ranges, options) = single_word_tables();
        let err = encode(&words(), 3, &ranges, &options).unwrap_err();
        assert!(matches!(err, FormatError::WordTooLong { len: 4, max: 3, .. }));
    }

    #[test]
    fn rejects_ungrouped_options() {
        let (mut ranges, options) = single_word_tables();
        ranges[0] = KeyRange::EMPTY;
        let err = encode(&words(), 4, &ranges, &options).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLayout(_)));
    }

    #[test]
    fn rejects_dangling_links() {
        let (ranges, mut options) = single_word_tables();
        options[0].next_key = KeyId(5);
        let err = encode(&words(), 4, &ranges, &options).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLayout(_)));
    }

    #[test]
    fn rejects_range_past_options() {
        let (mut ranges, options) = single_word_tables();
        ranges[1] = KeyRange::single(OptionId(3));
        let err = encode(&words(), 4, &ranges, &options).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLayout(_)));
    }

    #[test]
    fn save_writes_blob_and_sidecar() {
        let (ranges, options) = single_word_tables();
        let chain = encode(&words(), 4, &ranges, &options).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.bin");
        chain.save(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), chain.bytes);
        let layout = TableLayout::load_ron(&dir.path().join("chain.ron")).unwrap();
        assert_eq!(layout, chain.layout);
    }
}
