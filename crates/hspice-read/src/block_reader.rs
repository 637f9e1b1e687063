//! HSPICE Data Block Reader
//!
//! Reads the framed numeric payload of one sweep point at a time. A table
//! ends with the record whose last word exceeds [`END_MARKER_THRESHOLD`].

use crate::reader::MmapReader;
use crate::types::{
    Endian, HspiceError, PostVersion, Result, BLOCK_HEADER_SIZE, BLOCK_TRAILER_SIZE,
    END_MARKER_THRESHOLD,
};
use tracing::trace;

// ============================================================================
// Core Structures
// ============================================================================

/// Words of one table with the framing values removed
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Leading sweep value, for swept files
    pub sweep_value: Option<f64>,
    /// Words as read, the sweep value included
    words: Vec<f64>,
    /// Index of the first sample word
    start: usize,
    pub rows: usize,
}

impl RawTable {
    /// Row-major samples, `rows * width` words
    #[inline]
    pub fn samples(&self) -> &[f64] {
        &self.words[self.start..]
    }
}

/// Data block reader
///
/// Shares the cursor with the header stages. Byte order and word size are
/// fixed at construction.
pub struct BlockReader<'r, 'a> {
    reader: &'r mut MmapReader<'a>,
    version: PostVersion,
    endian: Endian,
    scratch: Vec<f32>,
    debug: i32,
    /// Number of records read so far
    block_count: usize,
}

impl<'r, 'a> BlockReader<'r, 'a> {
    pub fn new(
        reader: &'r mut MmapReader<'a>,
        version: PostVersion,
        endian: Endian,
        debug: i32,
    ) -> Self {
        Self {
            reader,
            version,
            endian,
            scratch: Vec::new(),
            debug,
            block_count: 0,
        }
    }

    /// Get item size in bytes
    #[inline]
    fn item_size(&self) -> usize {
        self.version.word_size()
    }

    /// Read one record, appending its words to `out`.
    ///
    /// Returns `true` when the record closes the table.
    pub fn next_block(&mut self, out: &mut Vec<f64>) -> Result<bool> {
        let record = self.reader.read_record_header()?;
        let count = record.items(self.item_size())?;
        let start = out.len();

        match self.version {
            PostVersion::V9007 | PostVersion::V9601 => {
                self.reader
                    .read_f32_into(self.endian, count, &mut self.scratch, out)?
            }
            PostVersion::V2001 => self.reader.read_f64_into(self.endian, count, out)?,
        }

        self.reader.read_record_trailer(&record)?;
        self.block_count += 1;

        if self.debug > 1 {
            trace!(
                offset = record.offset,
                words = count,
                block = self.block_count,
                "data record"
            );
        }

        Ok(out.len() > start && out.last().is_some_and(|&v| v > END_MARKER_THRESHOLD))
    }

    /// Read records until the end marker; the marker stays in the result.
    ///
    /// `tables_left` spreads the capacity estimate over the remaining points.
    pub fn read_table_words(&mut self, tables_left: usize) -> Result<Vec<f64>> {
        let estimated = self.reader.remaining() / tables_left.max(1) / self.estimate_divisor();
        let mut words = Vec::with_capacity(estimated);

        while !self.next_block(&mut words)? {}

        Ok(words)
    }

    /// Read one table and split off the marker and sweep value.
    ///
    /// `width` is the number of words per row.
    pub fn read_table(&mut self, width: usize, swept: bool, tables_left: usize) -> Result<RawTable> {
        let offset = self.reader.position();
        let words = self.read_table_words(tables_left)?;
        split_table(words, width, swept, offset)
    }

    /// Get the number of records read
    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Get format name (for debug output)
    #[inline]
    pub fn format_name(&self) -> &'static str {
        match self.version {
            PostVersion::V9007 | PostVersion::V9601 => "f32",
            PostVersion::V2001 => "f64",
        }
    }

    /// Bytes per word plus amortised framing, for capacity estimation
    #[inline]
    fn estimate_divisor(&self) -> usize {
        self.item_size() + 1
    }
}

/// Check the word count of a table and strip its framing values
pub fn split_table(mut words: Vec<f64>, width: usize, swept: bool, offset: usize) -> Result<RawTable> {
    // End marker
    words.pop();

    let (sweep_value, start) = if swept {
        let value = words.first().copied().ok_or_else(|| {
            HspiceError::format(format!("table at offset {} has no sweep value", offset))
        })?;
        (Some(value), 1)
    } else {
        (None, 0)
    };

    let samples = words.len() - start;
    if width == 0 || samples % width != 0 {
        return Err(HspiceError::format(format!(
            "table at offset {} holds {} words, not a multiple of the record width {}",
            offset, samples, width
        )));
    }

    Ok(RawTable {
        sweep_value,
        words,
        start,
        rows: samples / width,
    })
}

/// Smallest number of bytes a table can occupy in the file
#[inline]
pub fn min_table_bytes(version: PostVersion) -> usize {
    BLOCK_HEADER_SIZE + version.word_size() + BLOCK_TRAILER_SIZE
}

// ============================================================================
// Tests
// ============================================================================
