//! # HSPICE Binary Result Reader
//!
//! Decodes HSPICE binary output files (.tr0, .ac0, .sw0) into named numeric
//! columns, optionally grouped by sweep point.
//!
//! ## Supported Formats
//!
//! - Post versions 9007 and 9601 (float32 payload)
//! - Post version 2001 (float64 payload)
//! - Little-endian and big-endian files
//! - Single runs and one-dimensional sweeps
//!
//! Every read is self-contained: the file is memory-mapped for the duration
//! of the call and no state is kept between calls, so several files can be
//! decoded from different threads at once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hspice_read::{read, Sweeps, VectorData};
//!
//! let result = read("simulation.tr0", 0).unwrap();
//! println!("Title: {}", result.title);
//! println!("Scale: {}", result.scale_name());
//!
//! match &result.sweeps {
//!     Sweeps::Single(table) => println!("{} points", table.len()),
//!     Sweeps::Swept { sweep, tables } => {
//!         for (value, table) in sweep.values.iter().zip(tables) {
//!             println!("{} = {}: {} points", sweep.name, value, table.len());
//!         }
//!     }
//! }
//!
//! if let Some(VectorData::Real(time)) = result.get("TIME") {
//!     println!("Time points: {}", time.len());
//! }
//! ```
//!
//! ## Diagnostics
//!
//! The `debug` level gates `tracing` events describing each stage (offsets,
//! counts, versions). Install a subscriber to see them:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! let result = hspice_read::read("simulation.tr0", 1).unwrap();
//! ```

mod assemble;
mod block_reader;
mod header;
mod parser;
mod reader;
mod sweep;
mod types;
mod variables;

use std::path::Path;

// Re-export public types
pub use types::{
    // Result types
    DataTable,
    DecodedResult,
    FileHeader,
    NumericType,
    SweepDescriptor,
    Sweeps,
    VarKind,
    VariableDescriptor,
    VectorData,
    // Format tags
    Endian,
    PostVersion,
    // Options
    NameStyle,
    ReadOptions,
    // Error types
    HspiceError,
    Result,
};

pub use assemble::{LegacyRecord, NamedTable};
pub use parser::{FileMetadata, Stage};
pub use sweep::SweepPlan;

// ============================================================================
// Public API Functions
// ============================================================================

/// Read an HSPICE binary file.
///
/// # Arguments
/// * `path` - Path to the result file (.tr0, .ac0, .sw0)
/// * `debug` - Diagnostic verbosity, 0 is silent
///
/// # Returns
/// * `Ok(DecodedResult)` - Decoded tables and metadata
/// * `Err(HspiceError)` - The specific reason the file could not be decoded
pub fn read<P: AsRef<Path>>(path: P, debug: i32) -> Result<DecodedResult> {
    parser::hspice_read_impl(path.as_ref(), &ReadOptions::with_debug(debug))
}

/// Read an HSPICE binary file with explicit options.
///
/// # Example
/// ```rust,no_run
/// use hspice_read::{read_with, NameStyle, ReadOptions};
/// use std::sync::atomic::AtomicBool;
///
/// let cancel = AtomicBool::new(false);
/// let options = ReadOptions::with_debug(0)
///     .name_style(NameStyle::Legacy)
///     .cancel_on(&cancel);
/// let result = read_with("simulation.tr0", &options).unwrap();
/// ```
pub fn read_with<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<DecodedResult> {
    parser::hspice_read_impl(path.as_ref(), options)
}

/// Decode a file already held in memory
pub fn read_from_slice(data: &[u8], options: &ReadOptions) -> Result<DecodedResult> {
    parser::decode_slice(data, options)
}

/// Read the historical 6-element record; `None` on any failure.
///
/// Prefer [`read`], which keeps the reason for a failure.
pub fn read_legacy<P: AsRef<Path>>(path: P, debug: i32) -> Option<LegacyRecord> {
    read(path, debug).ok().map(DecodedResult::into_legacy)
}

/// Read the header, variable table and sweep declaration without the data
pub fn read_metadata<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<FileMetadata> {
    parser::parse_header_only(path.as_ref(), options)
}
