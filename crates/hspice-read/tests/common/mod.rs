//! Synthetic HSPICE binary files for the integration tests
//!
//! Layout follows the post format: framed header records holding the
//! fixed-position header text, then one run of framed data records per
//! sweep point, each closed by a 1e30 word.

#![allow(dead_code)]

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use hspice_read::{Endian, PostVersion};
use std::io::Write;
use tempfile::NamedTempFile;

/// Offset of the header text within the file (after the first record header)
pub const TEXT_OFFSET: usize = 16;

pub const END_MARKER: f64 = 1e30;

#[derive(Debug, Clone)]
pub struct Fixture {
    pub endian: Endian,
    pub version: PostVersion,
    pub title: String,
    pub date: String,
    pub scale: String,
    /// Frequency scale: dependent variables become complex
    pub frequency: bool,
    pub variables: Vec<String>,
    pub probes: Vec<String>,
    pub sweep: Option<(String, Vec<f64>)>,
    /// Row-major words per table, without sweep value or end marker
    pub tables: Vec<Vec<f64>>,
    /// Bytes of header text per header record
    pub header_chunk: usize,
    /// Words per data record
    pub data_chunk: usize,
}

impl Fixture {
    pub fn new(endian: Endian, version: PostVersion) -> Self {
        Self {
            endian,
            version,
            title: "* synthetic netlist".to_string(),
            date: "10/19/2026 08:55:00".to_string(),
            scale: "TIME".to_string(),
            frequency: false,
            variables: Vec::new(),
            probes: Vec::new(),
            sweep: None,
            tables: Vec::new(),
            header_chunk: 100,
            data_chunk: 37,
        }
    }

    /// TIME plus the given real variables, one table of `rows` rows
    pub fn transient(endian: Endian, version: PostVersion, names: &[&str], rows: usize) -> Self {
        let mut fixture = Self::new(endian, version);
        fixture.variables = names.iter().map(|s| s.to_string()).collect();
        fixture.tables = vec![ramp(rows, fixture.width(), 0.0)];
        fixture
    }

    /// Same columns repeated for every sweep value
    pub fn swept(
        endian: Endian,
        version: PostVersion,
        sweep: &str,
        values: &[f64],
        names: &[&str],
        rows: usize,
    ) -> Self {
        let mut fixture = Self::new(endian, version);
        fixture.variables = names.iter().map(|s| s.to_string()).collect();
        fixture.sweep = Some((sweep.to_string(), values.to_vec()));
        let width = fixture.width();
        fixture.tables = (0..values.len())
            .map(|i| ramp(rows, width, 1000.0 * i as f64))
            .collect();
        fixture
    }

    /// Words per row
    pub fn width(&self) -> usize {
        let per_variable = if self.frequency { 2 } else { 1 };
        1 + self.variables.len() * per_variable + self.probes.len()
    }

    pub fn num_variables(&self) -> usize {
        1 + self.variables.len()
    }

    pub fn header_text(&self) -> String {
        let sweeps = usize::from(self.sweep.is_some());
        let points = self.sweep.as_ref().map_or(0, |(_, v)| v.len());

        let mut text = format!(
            "{:>4}{:>4}{:>4}    ",
            self.num_variables(),
            self.probes.len(),
            sweeps
        );
        match self.version {
            PostVersion::V9007 => text.push_str("9007    "),
            PostVersion::V9601 => text.push_str("9601    "),
            PostVersion::V2001 => text.push_str("    2001"),
        }
        text.push_str(&format!("{:<64}", self.title));
        text.push_str(&format!("{:<24}", self.date));
        text.push_str(&" ".repeat(64));
        match self.version {
            PostVersion::V2001 => text.push_str(&format!("{}{:<10}", " ".repeat(11), points)),
            _ => text.push_str(&format!("{:<10}{}", points, " ".repeat(11))),
        }
        while text.len() < 256 {
            text.push(' ');
        }
        assert_eq!(text.len(), 256, "title or date too long");

        let scale_type = if self.frequency { 2 } else { 1 };
        let mut types = vec![scale_type.to_string()];
        types.extend(self.variables.iter().map(|_| "1".to_string()));
        types.extend(self.probes.iter().map(|_| "8".to_string()));
        text.push_str(&types.join(" "));
        text.push('\n');

        let mut names = vec![self.scale.clone()];
        names.extend(self.variables.iter().cloned());
        names.extend(self.probes.iter().cloned());
        if let Some((name, _)) = &self.sweep {
            names.push(name.clone());
        }
        text.push_str(&names.join(" "));
        text.push_str(" $&%#    ");
        text
    }

    /// Words of each table as stored, sweep value and end marker included
    pub fn stored_tables(&self) -> Vec<Vec<f64>> {
        self.tables
            .iter()
            .enumerate()
            .map(|(i, table)| {
                let mut words = Vec::with_capacity(table.len() + 2);
                if let Some((_, values)) = &self.sweep {
                    words.push(values[i]);
                }
                words.extend_from_slice(table);
                words.push(END_MARKER);
                words
            })
            .collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        // The terminator and the padding after it share the last header record
        let text = self.header_text();
        let (body, tail) = text.split_at(header_terminator(&text));
        for chunk in body.as_bytes().chunks(self.header_chunk) {
            push_record(&mut out, self.endian, chunk);
        }
        push_record(&mut out, self.endian, tail.as_bytes());

        for words in self.stored_tables() {
            for chunk in words.chunks(self.data_chunk) {
                let mut payload = Vec::new();
                for &w in chunk {
                    put_word(&mut payload, self.endian, self.version, w);
                }
                push_record(&mut out, self.endian, &payload);
            }
        }
        out
    }

    /// Bytes of all header records, data excluded
    pub fn header_bytes(&self) -> Vec<u8> {
        Fixture {
            tables: Vec::new(),
            ..self.clone()
        }
        .to_bytes()
    }

    pub fn write_temp(&self) -> NamedTempFile {
        write_bytes(&self.to_bytes())
    }

    /// Value as it reads back: float32 formats round every word
    pub fn stored(&self, value: f64) -> f64 {
        match self.version {
            PostVersion::V2001 => value,
            _ => value as f32 as f64,
        }
    }
}

/// Position of `$&%#` in the header text
pub fn header_terminator(text: &str) -> usize {
    text.find("$&%#").unwrap()
}

/// Increasing scale column, distinct values elsewhere; exact in float32
pub fn ramp(rows: usize, width: usize, offset: f64) -> Vec<f64> {
    let mut words = Vec::with_capacity(rows * width);
    for row in 0..rows {
        words.push(row as f64 * 0.5);
        for col in 1..width {
            words.push(offset + col as f64 * 10.0 + row as f64 * 0.25);
        }
    }
    words
}

pub fn write_bytes(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

fn put_i32(out: &mut Vec<u8>, endian: Endian, value: i32) {
    match endian {
        Endian::Little => out.write_i32::<LittleEndian>(value).unwrap(),
        Endian::Big => out.write_i32::<BigEndian>(value).unwrap(),
    }
}

fn put_word(out: &mut Vec<u8>, endian: Endian, version: PostVersion, value: f64) {
    match (version, endian) {
        (PostVersion::V2001, Endian::Little) => out.write_f64::<LittleEndian>(value).unwrap(),
        (PostVersion::V2001, Endian::Big) => out.write_f64::<BigEndian>(value).unwrap(),
        (_, Endian::Little) => out.write_f32::<LittleEndian>(value as f32).unwrap(),
        (_, Endian::Big) => out.write_f32::<BigEndian>(value as f32).unwrap(),
    }
}

pub fn push_record(out: &mut Vec<u8>, endian: Endian, payload: &[u8]) {
    for word in [4, 0, 4, payload.len() as i32] {
        put_i32(out, endian, word);
    }
    out.extend_from_slice(payload);
    put_i32(out, endian, payload.len() as i32);
}
