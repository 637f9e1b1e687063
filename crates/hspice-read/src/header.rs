//! Header reader: framed ASCII header records and the fixed-position fields

use crate::reader::MmapReader;
use crate::types::*;
use tracing::trace;

/// Find subsequence in a byte slice
#[inline]
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Concatenate header records until the `$&%#` terminator.
///
/// The returned text stops just before the terminator.
pub fn read_header_text(reader: &mut MmapReader, debug: i32) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(4096);

    loop {
        let record = reader.read_record_header()?;
        let payload = reader.read_bytes(record.payload_len, "header record")?;
        reader.read_record_trailer(&record)?;

        if debug > 1 {
            trace!(
                offset = record.offset,
                bytes = record.payload_len,
                "header record"
            );
        }

        // The terminator may straddle two records
        let search_from = buffer.len().saturating_sub(HEADER_END_MARKER.len() - 1);
        buffer.extend_from_slice(payload);

        if let Some(pos) = find_subsequence(&buffer[search_from..], HEADER_END_MARKER) {
            buffer.truncate(search_from + pos);
            return Ok(buffer);
        }
    }
}

// ============================================================================
// Field extraction
// ============================================================================

#[inline]
fn field(buf: &[u8], start: usize, end: usize) -> &[u8] {
    buf.get(start..end.min(buf.len())).unwrap_or(&[])
}

/// Text of a field as stored, cut at the first NUL
fn field_string(buf: &[u8], start: usize, end: usize) -> String {
    let slice = field(buf, start, end);
    let end_pos = slice.iter().position(|&c| c == 0).unwrap_or(slice.len());
    String::from_utf8_lossy(&slice[..end_pos]).into_owned()
}

/// C `atoi` over a window: leading blanks, optional sign, then digits.
///
/// Returns `None` when no digit follows.
pub(crate) fn leading_int(buf: &[u8]) -> Option<i64> {
    let start = buf.iter().position(|c| !c.is_ascii_whitespace())?;
    let rest = &buf[start..];
    let (negative, digits) = match rest.first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };
    let len = digits.iter().take_while(|c| c.is_ascii_digit()).count();
    if len == 0 {
        return None;
    }
    let value: i64 = std::str::from_utf8(&digits[..len]).ok()?.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse an integer header field that must be present
pub(crate) fn int_field(buf: &[u8], start: usize, end: usize, what: &str) -> Result<i64> {
    leading_int(field(buf, start, end)).ok_or_else(|| {
        HspiceError::format(format!(
            "{} field at {}..{} is not a number: {:?}",
            what,
            start,
            end,
            String::from_utf8_lossy(field(buf, start, end))
        ))
    })
}

fn count_field(buf: &[u8], start: usize, end: usize, what: &str) -> Result<usize> {
    let value = int_field(buf, start, end, what)?;
    usize::try_from(value)
        .map_err(|_| HspiceError::format(format!("negative {}: {}", what, value)))
}

/// Determine the post version from its marker
fn detect_post_version(buf: &[u8]) -> Result<PostVersion> {
    let first = field(buf, POST_START_POSITION1, POST_START_POSITION1 + 4);
    let second = field(buf, POST_START_POSITION2, POST_START_POSITION2 + 4);

    if first == POST_STRING_9007 {
        return Ok(PostVersion::V9007);
    }
    if first == POST_STRING_9601 {
        return Ok(PostVersion::V9601);
    }
    if second == POST_STRING_2001 {
        return Ok(PostVersion::V2001);
    }

    let is_marker = |f: &[u8]| f.len() == 4 && f.iter().all(u8::is_ascii_digit);
    if is_marker(first) {
        return Err(HspiceError::UnsupportedVersion(
            String::from_utf8_lossy(first).into_owned(),
        ));
    }
    if is_marker(second) {
        return Err(HspiceError::UnsupportedVersion(
            String::from_utf8_lossy(second).into_owned(),
        ));
    }
    Err(HspiceError::format("unknown post format"))
}

// ============================================================================
// Header parsing
// ============================================================================

/// Parse the fixed-position fields of the header text
pub fn parse_file_header(buf: &[u8], endian: Endian) -> Result<FileHeader> {
    if buf.len() < VECTOR_DESCRIPTION_START_POSITION {
        return Err(HspiceError::format(format!(
            "header text too short: {} bytes",
            buf.len()
        )));
    }

    let post_version = detect_post_version(buf)?;

    // Only the title loses its padding
    let date = field_string(buf, DATE_START_POSITION, DATE_END_POSITION);
    let title = field_string(buf, TITLE_START_POSITION, DATE_START_POSITION)
        .trim_end()
        .to_string();

    let num_sweeps = count_field(
        buf,
        NUM_OF_SWEEPS_POSITION,
        NUM_OF_SWEEPS_END_POSITION,
        "sweep count",
    )?;
    if num_sweeps > 1 {
        return Err(HspiceError::unsupported(
            "only one-dimensional sweep supported",
        ));
    }

    let num_variables = count_field(
        buf,
        NUM_OF_VARIABLES_POSITION,
        NUM_OF_PROBES_POSITION,
        "variable count",
    )?;
    if num_variables == 0 {
        return Err(HspiceError::format("no variables declared"));
    }
    let num_probes = count_field(
        buf,
        NUM_OF_PROBES_POSITION,
        NUM_OF_SWEEPS_POSITION,
        "probe count",
    )?;

    Ok(FileHeader {
        post_version,
        endian,
        title,
        date,
        num_variables,
        num_probes,
        num_sweeps,
    })
}

/// Vector description section, starting at its fixed position
pub fn vector_description(buf: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(field(buf, VECTOR_DESCRIPTION_START_POSITION, buf.len()))
}
