//! HSPICE binary file parser
//!
//! Runs the decoding stages strictly in order over one memory-mapped file:
//! header, variable table, sweep descriptor, data blocks, assembly.

use crate::assemble::{assemble_result, assemble_table};
use crate::block_reader::{min_table_bytes, BlockReader};
use crate::header::{parse_file_header, read_header_text, vector_description};
use crate::reader::MmapReader;
use crate::sweep::{read_sweep_plan, SweepPlan};
use crate::types::*;
use crate::variables::{read_variable_table, record_width, tokenize};
use memmap2::Mmap;
use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::Ordering;
use tracing::{debug, info, instrument, warn};

/// Decoder progress; any stage may end in failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    HeaderRead,
    TableRead,
    SweepDetermined,
    DataRead,
    Assembled,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::HeaderRead => "header",
            Stage::TableRead => "variable table",
            Stage::SweepDetermined => "sweep",
            Stage::DataRead => "data",
            Stage::Assembled => "assembled",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Metadata available without reading the data section
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub header: FileHeader,
    pub variables: Vec<VariableDescriptor>,
    pub sweep: Option<SweepPlan>,
    /// Offset of the first data record
    pub data_position: usize,
}

/// Tracks the current stage and honours the cancellation flag
struct Progress<'o> {
    stage: Stage,
    options: &'o ReadOptions<'o>,
}

impl<'o> Progress<'o> {
    fn new(options: &'o ReadOptions<'o>) -> Self {
        Self {
            stage: Stage::Start,
            options,
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.options.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(HspiceError::Cancelled),
            _ => Ok(()),
        }
    }

    fn advance(&mut self, stage: Stage) -> Result<()> {
        self.stage = stage;
        if self.options.debug > 0 {
            debug!(stage = %stage, "stage complete");
        }
        self.check_cancelled()
    }
}

/// Validate file format before parsing
fn validate_file_format(data: &[u8]) -> Result<()> {
    match data.first() {
        None => Err(HspiceError::Truncated {
            context: "file preamble",
            offset: 0,
        }),
        Some(&first) if first >= b' ' => Err(HspiceError::unsupported(
            "file is in ASCII post format, only binary is supported",
        )),
        Some(_) => Ok(()),
    }
}

/// Header, variable table and sweep stages
fn read_metadata_stages(
    reader: &mut MmapReader,
    progress: &mut Progress,
) -> Result<FileMetadata> {
    let debug = progress.options.debug;

    let text = read_header_text(reader, debug)?;
    let endian = reader
        .endian()
        .ok_or_else(|| HspiceError::format("no header record"))?;
    let header = parse_file_header(&text, endian)?;
    if debug > 0 {
        info!(
            version = %header.post_version,
            endian = ?header.endian,
            variables = header.num_variables,
            probes = header.num_probes,
            sweeps = header.num_sweeps,
            header_bytes = text.len(),
            offset = reader.position(),
            "header read"
        );
    }
    progress.advance(Stage::HeaderRead)?;

    let description = vector_description(&text);
    let tokens = tokenize(&description);
    let variables = read_variable_table(&tokens, &header, progress.options.name_style)?;
    if debug > 0 {
        info!(
            scale = %variables[0].name,
            vectors = variables.len(),
            width = record_width(&variables),
            "variable table read"
        );
    }
    progress.advance(Stage::TableRead)?;

    let sweep = read_sweep_plan(&text, &tokens, &header)?;
    if debug > 0 {
        match &sweep {
            Some(plan) => info!(sweep = %plan.name, points = plan.points, "swept file"),
            None => info!("single-run file"),
        }
    }
    progress.advance(Stage::SweepDetermined)?;

    Ok(FileMetadata {
        header,
        variables,
        sweep,
        data_position: reader.position(),
    })
}

fn decode(data: &[u8], progress: &mut Progress) -> Result<DecodedResult> {
    validate_file_format(data)?;

    let debug = progress.options.debug;
    let mut reader = MmapReader::new(data);
    let meta = read_metadata_stages(&mut reader, progress)?;

    let width = record_width(&meta.variables);
    let points = meta.sweep.as_ref().map_or(1, |plan| plan.points);
    let swept = meta.sweep.is_some();

    // A corrupted point count must not drive the allocation
    let capacity = points.min(reader.remaining() / min_table_bytes(meta.header.post_version) + 1);
    let mut raw_tables = Vec::with_capacity(capacity);
    let mut sweep_values = Vec::with_capacity(if swept { capacity } else { 0 });

    let mut blocks = BlockReader::new(
        &mut reader,
        meta.header.post_version,
        meta.header.endian,
        debug,
    );
    for index in 0..points {
        progress.check_cancelled()?;

        let raw = blocks.read_table(width, swept, points - index)?;
        if debug > 1 {
            debug!(
                table = index,
                rows = raw.rows,
                sweep_value = ?raw.sweep_value,
                "table read"
            );
        }
        if let Some(value) = raw.sweep_value {
            sweep_values.push(value);
        }
        raw_tables.push(raw);
    }
    if debug > 0 {
        info!(
            tables = raw_tables.len(),
            records = blocks.block_count(),
            format = blocks.format_name(),
            "data read"
        );
    }
    progress.advance(Stage::DataRead)?;

    let tables = raw_tables
        .iter()
        .map(|raw| assemble_table(raw, &meta.variables, width))
        .collect();
    drop(raw_tables);

    let result = assemble_result(meta.header, meta.variables, meta.sweep, tables, sweep_values)?;
    progress.advance(Stage::Assembled)?;

    Ok(result)
}

/// Decode an in-memory copy of a file
pub fn decode_slice(data: &[u8], options: &ReadOptions) -> Result<DecodedResult> {
    let mut progress = Progress::new(options);
    let result = decode(data, &mut progress);
    finish(result, &mut progress)
}

fn finish<T>(result: Result<T>, progress: &mut Progress) -> Result<T> {
    match result {
        Ok(value) => {
            progress.stage = Stage::Done;
            Ok(value)
        }
        Err(e) => {
            if progress.options.debug > 0 {
                warn!(after = %progress.stage, error = %e, "HSpiceRead failed");
            }
            Err(e)
        }
    }
}

/// Open and map a file; missing or unreadable paths are `NotFound`
fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let not_found = |source: std::io::Error| HspiceError::NotFound {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => not_found(e),
        _ => HspiceError::Io(e),
    })?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(not_found(std::io::Error::new(
            ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    if metadata.len() == 0 {
        return Ok(None);
    }

    // SAFETY: the map is read-only and dropped before this read returns;
    // concurrent truncation of the file by another process is not guarded.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Some(mmap))
}

/// Main HSPICE file reader
#[instrument(skip_all, fields(path = %path.display()))]
pub fn hspice_read_impl(path: &Path, options: &ReadOptions) -> Result<DecodedResult> {
    if options.debug > 0 {
        info!("reading file");
    }

    let mmap = map_file(path)?;
    let data: &[u8] = mmap.as_deref().unwrap_or_default();

    if options.debug > 0 {
        info!(
            bytes = data.len(),
            mib = data.len() as f64 / 1_048_576.0,
            "file mapped"
        );
    }

    decode_slice(data, options)
}

/// Read only the header, variable table and sweep declaration
pub fn parse_header_only(path: &Path, options: &ReadOptions) -> Result<FileMetadata> {
    let mmap = map_file(path)?;
    let data: &[u8] = mmap.as_deref().unwrap_or_default();

    let mut progress = Progress::new(options);
    let result = validate_file_format(data).and_then(|()| {
        let mut reader = MmapReader::new(data);
        read_metadata_stages(&mut reader, &mut progress)
    });
    finish(result, &mut progress)
}
