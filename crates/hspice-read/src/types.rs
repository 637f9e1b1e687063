//! Common types, errors, and constants for HSPICE file decoding

use num_complex::Complex64;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Header character positions
pub const NUM_OF_VARIABLES_POSITION: usize = 0;
pub const NUM_OF_PROBES_POSITION: usize = 4;
pub const NUM_OF_SWEEPS_POSITION: usize = 8;
pub const NUM_OF_SWEEPS_END_POSITION: usize = 12;
pub const POST_START_POSITION1: usize = 16;
pub const POST_START_POSITION2: usize = 20;
pub const TITLE_START_POSITION: usize = 24;
pub const DATE_START_POSITION: usize = 88;
pub const DATE_END_POSITION: usize = 112;
pub const SWEEP_SIZE_POSITION1: usize = 176;
pub const SWEEP_SIZE_POSITION2: usize = 187;
pub const SWEEP_SIZE_WIDTH: usize = 10;
pub const VECTOR_DESCRIPTION_START_POSITION: usize = 256;

pub const POST_STRING_9007: &[u8; 4] = b"9007";
pub const POST_STRING_9601: &[u8; 4] = b"9601";
pub const POST_STRING_2001: &[u8; 4] = b"2001";

/// Terminates the header text
pub const HEADER_END_MARKER: &[u8; 4] = b"$&%#";

/// Record framing: four int32 words before the payload, one after
pub const BLOCK_HEADER_SIZE: usize = 16;
pub const BLOCK_TRAILER_SIZE: usize = 4;
pub const BLOCK_MAGIC: i32 = 4;

/// Scale type code that marks the dependent variables as complex
pub const FREQUENCY_TYPE: i32 = 2;

/// A data record whose last word exceeds this closes the current table
pub const END_MARKER_THRESHOLD: f64 = 9e29;

// ============================================================================
// Enums
// ============================================================================

/// Byte order detected from the record framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Post format version - determines data precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostVersion {
    /// 9007 format: 4-byte float32
    V9007,
    /// 9601 format: 4-byte float32
    V9601,
    /// 2001 format: 8-byte float64 (double precision)
    V2001,
}

impl PostVersion {
    /// Size of one payload word in bytes
    #[inline]
    pub fn word_size(self) -> usize {
        match self {
            PostVersion::V9007 | PostVersion::V9601 => 4,
            PostVersion::V2001 => 8,
        }
    }

    /// Header window holding the sweep point count
    #[inline]
    pub fn sweep_size_position(self) -> usize {
        match self {
            PostVersion::V9007 | PostVersion::V9601 => SWEEP_SIZE_POSITION1,
            PostVersion::V2001 => SWEEP_SIZE_POSITION2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostVersion::V9007 => "9007",
            PostVersion::V9601 => "9601",
            PostVersion::V2001 => "2001",
        }
    }
}

impl fmt::Display for PostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a column within a data record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Independent,
    Dependent,
}

/// Storage of a column: one word per sample or a (re, im) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    Real,
    Complex,
}

impl NumericType {
    /// Payload words consumed per sample
    #[inline]
    pub fn words(self) -> usize {
        match self {
            NumericType::Real => 1,
            NumericType::Complex => 2,
        }
    }
}

/// How vector names are surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameStyle {
    /// Names exactly as stored in the file
    #[default]
    Verbatim,
    /// Dependent names lower-cased with a `v(...)` wrapper removed
    Legacy,
}

/// Vector data - either real or complex
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl VectorData {
    /// Number of samples (complex pairs count once)
    pub fn len(&self) -> usize {
        match self {
            VectorData::Real(v) => v.len(),
            VectorData::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, VectorData::Complex(_))
    }

    pub fn as_real(&self) -> Option<&[f64]> {
        match self {
            VectorData::Real(v) => Some(v),
            VectorData::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&[Complex64]> {
        match self {
            VectorData::Complex(v) => Some(v),
            VectorData::Real(_) => None,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for HSPICE reading operations
#[derive(Debug, Error)]
pub enum HspiceError {
    /// Path missing, not a regular file, or not readable
    #[error("cannot open {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input violates the binary grammar
    #[error("format error: {0}")]
    Format(String),

    /// Input ended before the bytes a stage requires
    #[error("truncated input while reading {context} at offset {offset}")]
    Truncated { context: &'static str, offset: usize },

    /// Well-formed post marker naming a version this decoder does not implement
    #[error("unsupported post version '{0}'")]
    UnsupportedVersion(String),

    /// Recognised file variant without decoder support
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Cancellation flag was raised between stages
    #[error("read cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HspiceError {
    pub fn format<S: Into<String>>(s: S) -> Self {
        Self::Format(s.into())
    }

    pub fn unsupported<S: Into<String>>(s: S) -> Self {
        Self::Unsupported(s.into())
    }
}

pub type Result<T> = std::result::Result<T, HspiceError>;

// ============================================================================
// Data Structures
// ============================================================================

/// Global metadata from the header text
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub post_version: PostVersion,
    pub endian: Endian,
    pub title: String,
    pub date: String,
    /// Variables including the scale
    pub num_variables: usize,
    pub num_probes: usize,
    /// Sweep parameters declared (0 or 1)
    pub num_sweeps: usize,
}

impl FileHeader {
    /// Total columns: variables plus probes
    #[inline]
    pub fn num_vectors(&self) -> usize {
        self.num_variables + self.num_probes
    }

    #[inline]
    pub fn word_size(&self) -> usize {
        self.post_version.word_size()
    }
}

/// One named column of a data record
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    pub name: String,
    pub kind: VarKind,
    pub numeric: NumericType,
    /// Position within a data record, starting at 0 for the scale
    pub ordinal: usize,
    pub is_probe: bool,
    /// Type code as stored in the vector description
    pub type_code: i32,
}

/// Sweep parameter name and the value of each sweep point
#[derive(Debug, Clone, PartialEq)]
pub struct SweepDescriptor {
    pub name: String,
    pub values: Vec<f64>,
}

/// Decoded columns of one analysis run, in ordinal order
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub vectors: Vec<VectorData>,
}

impl DataTable {
    /// Number of samples per column
    pub fn len(&self) -> usize {
        self.vectors.first().map(VectorData::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, ordinal: usize) -> Option<&VectorData> {
        self.vectors.get(ordinal)
    }
}

/// Single run or one table per sweep point
#[derive(Debug, Clone, PartialEq)]
pub enum Sweeps {
    Single(DataTable),
    Swept {
        sweep: SweepDescriptor,
        tables: Vec<DataTable>,
    },
}

impl Sweeps {
    pub fn tables(&self) -> &[DataTable] {
        match self {
            Sweeps::Single(table) => std::slice::from_ref(table),
            Sweeps::Swept { tables, .. } => tables,
        }
    }

    pub fn sweep(&self) -> Option<&SweepDescriptor> {
        match self {
            Sweeps::Single(_) => None,
            Sweeps::Swept { sweep, .. } => Some(sweep),
        }
    }

    pub fn is_swept(&self) -> bool {
        matches!(self, Sweeps::Swept { .. })
    }
}

/// Everything decoded from one file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResult {
    pub header: FileHeader,
    pub variables: Vec<VariableDescriptor>,
    pub sweeps: Sweeps,
    pub scale_name: String,
    pub title: String,
    pub date: String,
}

impl DecodedResult {
    /// Name of the default scale (independent) variable
    pub fn scale_name(&self) -> &str {
        &self.scale_name
    }

    pub fn tables(&self) -> &[DataTable] {
        self.sweeps.tables()
    }

    pub fn sweep(&self) -> Option<&SweepDescriptor> {
        self.sweeps.sweep()
    }

    /// Ordinal of the first column with this name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Column of the first table by name
    pub fn get(&self, name: &str) -> Option<&VectorData> {
        self.get_in(0, name)
    }

    /// Column of the given table by name
    pub fn get_in(&self, table: usize, name: &str) -> Option<&VectorData> {
        let idx = self.position(name)?;
        self.tables().get(table)?.column(idx)
    }

    /// Samples per column in the first table
    pub fn len(&self) -> usize {
        self.tables().first().map(DataTable::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name-keyed view of one table. A repeated name keeps its last column.
    pub fn table_map(&self, table: usize) -> Option<HashMap<&str, &VectorData>> {
        let table = self.tables().get(table)?;
        Some(
            self.variables
                .iter()
                .zip(table.vectors.iter())
                .map(|(var, data)| (var.name.as_str(), data))
                .collect(),
        )
    }
}

/// Options for a read call
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions<'a> {
    /// 0 is silent; 1 stage diagnostics; 2 adds per-record detail
    pub debug: i32,
    pub name_style: NameStyle,
    /// Checked between stages and between sweep tables
    pub cancel: Option<&'a AtomicBool>,
}

impl<'a> ReadOptions<'a> {
    pub fn with_debug(debug: i32) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    pub fn name_style(mut self, style: NameStyle) -> Self {
        self.name_style = style;
        self
    }

    pub fn cancel_on(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }
}
