//! Memory-mapped cursor with HSPICE record framing
//!
//! Every record is `4, ?, 4, nbytes | payload | nbytes` in int32 words.
//! The first and third words double as the byte-order marker.

use crate::types::{
    Endian, HspiceError, Result, BLOCK_HEADER_SIZE, BLOCK_MAGIC, BLOCK_TRAILER_SIZE,
};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Framing of one record, read from its 16-byte header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub endian: Endian,
    /// Payload length in bytes
    pub payload_len: usize,
    /// File offset of the record header
    pub offset: usize,
}

impl RecordHeader {
    /// Number of whole items of `item_size` bytes in the payload
    pub fn items(&self, item_size: usize) -> Result<usize> {
        if self.payload_len % item_size != 0 {
            return Err(HspiceError::format(format!(
                "record at offset {} holds {} bytes, not a multiple of {}",
                self.offset, self.payload_len, item_size
            )));
        }
        Ok(self.payload_len / item_size)
    }
}

/// Cursor over a memory-mapped file
pub struct MmapReader<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Option<Endian>,
}

impl<'a> MmapReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            endian: None,
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte order established by the first record, if any
    #[inline]
    pub fn endian(&self) -> Option<Endian> {
        self.endian
    }

    #[inline]
    pub fn read_bytes(&mut self, count: usize, context: &'static str) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(HspiceError::Truncated {
                context,
                offset: self.pos,
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Read a record header and detect its byte order.
    ///
    /// All records of a file must share the byte order of the first one.
    pub fn read_record_header(&mut self) -> Result<RecordHeader> {
        let offset = self.pos;
        let bytes = self.read_bytes(BLOCK_HEADER_SIZE, "record header")?;

        let endian = if LittleEndian::read_i32(&bytes[0..4]) == BLOCK_MAGIC
            && LittleEndian::read_i32(&bytes[8..12]) == BLOCK_MAGIC
        {
            Endian::Little
        } else if BigEndian::read_i32(&bytes[0..4]) == BLOCK_MAGIC
            && BigEndian::read_i32(&bytes[8..12]) == BLOCK_MAGIC
        {
            Endian::Big
        } else {
            return Err(HspiceError::format(format!(
                "corrupted block header at offset {}",
                offset
            )));
        };

        match self.endian {
            Some(known) if known != endian => {
                return Err(HspiceError::format(format!(
                    "byte order changes at offset {}",
                    offset
                )));
            }
            Some(_) => {}
            None => self.endian = Some(endian),
        }

        let declared = read_i32(endian, &bytes[12..16]);
        let payload_len = usize::try_from(declared).map_err(|_| {
            HspiceError::format(format!(
                "negative record length {} at offset {}",
                declared, offset
            ))
        })?;

        Ok(RecordHeader {
            endian,
            payload_len,
            offset,
        })
    }

    /// Read the trailer and check it repeats the header length
    pub fn read_record_trailer(&mut self, header: &RecordHeader) -> Result<()> {
        let bytes = self.read_bytes(BLOCK_TRAILER_SIZE, "record trailer")?;
        let trailer = read_i32(header.endian, bytes);

        if usize::try_from(trailer).ok() != Some(header.payload_len) {
            return Err(HspiceError::format(format!(
                "block header and trailer mismatch at offset {} ({} != {})",
                header.offset, header.payload_len, trailer
            )));
        }
        Ok(())
    }

    /// Bulk read float32 words, widened to f64 and appended to `out`.
    ///
    /// `scratch` is reused across records to avoid an allocation per record.
    pub fn read_f32_into(
        &mut self,
        endian: Endian,
        count: usize,
        scratch: &mut Vec<f32>,
        out: &mut Vec<f64>,
    ) -> Result<()> {
        let bytes = self.read_bytes(count * 4, "float32 payload")?;
        scratch.clear();
        scratch.resize(count, 0.0);
        match endian {
            Endian::Little => LittleEndian::read_f32_into(bytes, scratch),
            Endian::Big => BigEndian::read_f32_into(bytes, scratch),
        }
        out.extend(scratch.iter().map(|&v| f64::from(v)));
        Ok(())
    }

    /// Bulk read float64 words appended to `out`
    pub fn read_f64_into(&mut self, endian: Endian, count: usize, out: &mut Vec<f64>) -> Result<()> {
        let bytes = self.read_bytes(count * 8, "float64 payload")?;
        let start = out.len();
        out.resize(start + count, 0.0);
        match endian {
            Endian::Little => LittleEndian::read_f64_into(bytes, &mut out[start..]),
            Endian::Big => BigEndian::read_f64_into(bytes, &mut out[start..]),
        }
        Ok(())
    }
}

#[inline]
fn read_i32(endian: Endian, bytes: &[u8]) -> i32 {
    match endian {
        Endian::Little => LittleEndian::read_i32(bytes),
        Endian::Big => BigEndian::read_i32(bytes),
    }
}
