//! Result assembler: de-interleave raw tables into named columns

use crate::block_reader::RawTable;
use crate::sweep::SweepPlan;
use crate::types::*;
use num_complex::Complex64;
use std::collections::HashMap;

/// Word offset of each column within a row
fn column_offsets(variables: &[VariableDescriptor]) -> Vec<usize> {
    variables
        .iter()
        .scan(0usize, |offset, var| {
            let at = *offset;
            *offset += var.numeric.words();
            Some(at)
        })
        .collect()
}

/// Split one row-major table into a column per variable.
///
/// Works column by column with a fixed stride, so the numeric type is
/// resolved once per column instead of once per sample.
pub fn assemble_table(raw: &RawTable, variables: &[VariableDescriptor], width: usize) -> DataTable {
    let samples = raw.samples();
    let rows = raw.rows;

    let vectors = variables
        .iter()
        .zip(column_offsets(variables))
        .map(|(var, offset)| match var.numeric {
            NumericType::Real => VectorData::Real(
                samples
                    .get(offset..)
                    .unwrap_or_default()
                    .iter()
                    .step_by(width)
                    .take(rows)
                    .copied()
                    .collect(),
            ),
            NumericType::Complex => VectorData::Complex(
                (0..rows)
                    .map(|row| {
                        let at = row * width + offset;
                        Complex64::new(samples[at], samples[at + 1])
                    })
                    .collect(),
            ),
        })
        .collect();

    DataTable { vectors }
}

/// Package the decoded tables into the result shape
pub fn assemble_result(
    header: FileHeader,
    variables: Vec<VariableDescriptor>,
    plan: Option<SweepPlan>,
    tables: Vec<DataTable>,
    sweep_values: Vec<f64>,
) -> Result<DecodedResult> {
    let sweeps = match plan {
        None => {
            let mut tables = tables.into_iter();
            match (tables.next(), tables.next()) {
                (Some(table), None) => Sweeps::Single(table),
                _ => {
                    return Err(HspiceError::format(
                        "single-run file must hold exactly one table",
                    ))
                }
            }
        }
        Some(plan) => {
            if tables.len() != plan.points || sweep_values.len() != plan.points {
                return Err(HspiceError::format(format!(
                    "sweep '{}' declares {} points but {} tables were read",
                    plan.name,
                    plan.points,
                    tables.len()
                )));
            }
            Sweeps::Swept {
                sweep: SweepDescriptor {
                    name: plan.name,
                    values: sweep_values,
                },
                tables,
            }
        }
    };

    let scale_name = variables
        .first()
        .map(|v| v.name.clone())
        .ok_or_else(|| HspiceError::format("no scale variable"))?;

    Ok(DecodedResult {
        title: header.title.clone(),
        date: header.date.clone(),
        header,
        variables,
        sweeps,
        scale_name,
    })
}

// ============================================================================
// Compatibility record
// ============================================================================

/// Name-keyed table as exposed by the historical reader
pub type NamedTable = HashMap<String, VectorData>;

/// The historical 6-element result record.
///
/// `(sweeps, scale_name, non_default_scales, title, date, plot_name)` where
/// `sweeps` is `(sweep_name, sweep_values, tables)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRecord {
    pub sweeps: (Option<String>, Option<Vec<f64>>, Vec<NamedTable>),
    pub scale_name: String,
    /// Always `None`; this reader only reports the default scale
    pub non_default_scales: Option<HashMap<String, String>>,
    pub title: String,
    pub date: String,
    /// Always `None`
    pub plot_name: Option<String>,
}

fn named_table(variables: &[VariableDescriptor], table: DataTable) -> NamedTable {
    variables
        .iter()
        .map(|v| v.name.clone())
        .zip(table.vectors)
        .collect()
}

impl DecodedResult {
    /// Convert into the historical record shape
    pub fn into_legacy(self) -> LegacyRecord {
        let variables = self.variables;
        let sweeps = match self.sweeps {
            Sweeps::Single(table) => (None, None, vec![named_table(&variables, table)]),
            Sweeps::Swept { sweep, tables } => (
                Some(sweep.name),
                Some(sweep.values),
                tables
                    .into_iter()
                    .map(|t| named_table(&variables, t))
                    .collect(),
            ),
        };

        LegacyRecord {
            sweeps,
            scale_name: self.scale_name,
            non_default_scales: None,
            title: self.title,
            date: self.date,
            plot_name: None,
        }
    }
}
