/// Decoder — fixed-offset lookups into an encoded chain.
///
/// Every lookup is one seek plus one fixed-size read. The reader keeps no
/// graph state, only a word-sized scratch buffer, so it works the same over
/// a file, a flash region or an in-memory slice.

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use thiserror::Error;

use crate::schema::ids::{KeyId, OptionId, WordId};
use crate::schema::layout::{FormatError, TableLayout, PAD_BYTE, WORDS_OFFSET};
use crate::schema::record::{KeyRange, OptionRecord, Table, KEY_RECORD_LEN, OPTION_RECORD_LEN};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{table} ID {id} out of range ({count} entries)")]
    OutOfRange { table: Table, id: usize, count: usize },
    #[error("read of {len} bytes at offset {offset} runs past the end of the store")]
    Truncated { offset: u64, len: usize },
    #[error("store holds {actual} bytes but the layout needs {expected}")]
    StoreTooSmall { expected: u64, actual: u64 },
    #[error("{key} has range {first}..={last} outside the {count} stored options")]
    CorruptRange {
        key: KeyId,
        first: u16,
        last: u16,
        count: usize,
    },
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(WordId),
    #[error("layout error: {0}")]
    Layout(#[from] FormatError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read-only view of an encoded chain held in a seekable store.
#[derive(Debug)]
pub struct TableReader<S> {
    store: S,
    layout: TableLayout,
    word_buf: Vec<u8>,
}

impl<S: Read + Seek> TableReader<S> {
    /// Wrap `store`, checking `layout` and that the store is large enough for it.
    pub fn new(mut store: S, layout: TableLayout) -> Result<Self, ReadError> {
        let layout = TableLayout::new(
            layout.max_word_length,
            layout.word_count,
            layout.key_count,
            layout.option_count,
        )?;
        let actual = store.seek(SeekFrom::End(0))?;
        if actual < layout.total_len() {
            return Err(ReadError::StoreTooSmall {
                expected: layout.total_len(),
                actual,
            });
        }
        Ok(Self {
            store,
            layout,
            word_buf: vec![PAD_BYTE; layout.max_word_length],
        })
    }

    /// Wrap `store` using only the published constants. The Options
    /// section is taken to run to the end of the store.
    pub fn from_offsets(
        mut store: S,
        keys_offset: u64,
        options_offset: u64,
        max_word_length: usize,
    ) -> Result<Self, ReadError> {
        let store_len = store.seek(SeekFrom::End(0))?;
        let layout = TableLayout::from_offsets(
            WORDS_OFFSET,
            keys_offset,
            options_offset,
            max_word_length,
            store_len,
        )?;
        Self::new(store, layout)
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// The word stored under `id`, without its padding.
    pub fn read_word(&mut self, id: WordId) -> Result<&str, ReadError> {
        self.check(Table::Words, id.index())?;
        let offset = self.layout.word_offset(id);
        read_at(&mut self.store, offset, &mut self.word_buf)?;

        let end = self
            .word_buf
            .iter()
            .rposition(|&b| b != PAD_BYTE)
            .map_or(0, |i| i + 1);
        std::str::from_utf8(&self.word_buf[..end]).map_err(|_| ReadError::InvalidUtf8(id))
    }

    /// The inclusive option range of `id`. Empty ranges come back as-is;
    /// non-empty ones are checked against the Options section.
    pub fn read_key_range(&mut self, id: KeyId) -> Result<KeyRange, ReadError> {
        self.check(Table::Keys, id.index())?;
        let mut buf = [0u8; KEY_RECORD_LEN];
        read_at(&mut self.store, self.layout.key_offset(id), &mut buf)?;

        let range = KeyRange::from_bytes(buf);
        if !range.is_empty() && range.last.index() >= self.layout.option_count {
            return Err(ReadError::CorruptRange {
                key: id,
                first: range.first.0,
                last: range.last.0,
                count: self.layout.option_count,
            });
        }
        Ok(range)
    }

    pub fn read_option(&mut self, id: OptionId) -> Result<OptionRecord, ReadError> {
        self.check(Table::Options, id.index())?;
        let mut buf = [0u8; OPTION_RECORD_LEN];
        read_at(&mut self.store, self.layout.option_offset(id), &mut buf)?;
        Ok(OptionRecord::from_bytes(buf))
    }

    fn check(&self, table: Table, id: usize) -> Result<(), ReadError> {
        let count = self.layout.count(table);
        if id >= count {
            return Err(ReadError::OutOfRange { table, id, count });
        }
        Ok(())
    }
}

impl<'a> TableReader<Cursor<&'a [u8]>> {
    pub fn from_bytes(bytes: &'a [u8], layout: TableLayout) -> Result<Self, ReadError> {
        Self::new(Cursor::new(bytes), layout)
    }
}

fn read_at<S: Read + Seek>(store: &mut S, offset: u64, buf: &mut [u8]) -> Result<(), ReadError> {
    store.seek(SeekFrom::Start(offset))?;
    store.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ReadError::Truncated {
            offset,
            len: buf.len(),
        },
        _ => ReadError::Io(e),
    })
}
