//! Printable and serializable views of a decoded file

use hspice_read::{
    DataTable, DecodedResult, Endian, FileMetadata, NumericType, VarKind, VariableDescriptor,
    VectorData,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSummary {
    pub name: String,
    pub kind: &'static str,
    pub numeric: &'static str,
    pub probe: bool,
    pub type_code: i32,
}

impl From<&VariableDescriptor> for VariableSummary {
    fn from(v: &VariableDescriptor) -> Self {
        VariableSummary {
            name: v.name.clone(),
            kind: match v.kind {
                VarKind::Independent => "independent",
                VarKind::Dependent => "dependent",
            },
            numeric: match v.numeric {
                NumericType::Real => "real",
                NumericType::Complex => "complex",
            },
            probe: v.is_probe,
            type_code: v.type_code,
        }
    }
}

/// Full samples of one column; complex samples as `[re, im]`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Samples {
    Real(Vec<f64>),
    Complex(Vec<[f64; 2]>),
}

/// Range of one column. Complex columns are summarised by magnitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSummary {
    pub name: String,
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Samples>,
}

impl SignalSummary {
    fn new(name: &str, data: &VectorData, with_values: bool) -> Self {
        let magnitudes: Vec<f64>;
        let series: &[f64] = match data {
            VectorData::Real(v) => v,
            VectorData::Complex(v) => {
                magnitudes = v.iter().map(|c| c.norm()).collect();
                &magnitudes
            }
        };

        let values = with_values.then(|| match data {
            VectorData::Real(v) => Samples::Real(v.clone()),
            VectorData::Complex(v) => Samples::Complex(v.iter().map(|c| [c.re, c.im]).collect()),
        });

        SignalSummary {
            name: name.to_string(),
            first: series.first().copied(),
            last: series.last().copied(),
            min: series.iter().copied().reduce(f64::min),
            max: series.iter().copied().reduce(f64::max),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub sweep_value: Option<f64>,
    pub points: usize,
    pub signals: Vec<SignalSummary>,
}

impl TableSummary {
    fn new(
        variables: &[VariableDescriptor],
        table: &DataTable,
        sweep_value: Option<f64>,
        with_values: bool,
    ) -> Self {
        TableSummary {
            sweep_value,
            points: table.len(),
            signals: variables
                .iter()
                .zip(&table.vectors)
                .map(|(var, data)| SignalSummary::new(&var.name, data, with_values))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub title: String,
    pub date: String,
    pub post_version: String,
    pub endian: &'static str,
    pub scale_name: String,
    pub sweep_name: Option<String>,
    pub sweep_values: Option<Vec<f64>>,
    pub table_count: usize,
    pub variables: Vec<VariableSummary>,
    pub tables: Vec<TableSummary>,
}

fn endian_name(endian: Endian) -> &'static str {
    match endian {
        Endian::Little => "little",
        Endian::Big => "big",
    }
}

impl ResultSummary {
    /// Summarise a decoded file; `with_values` keeps every sample
    pub fn new(result: &DecodedResult, with_values: bool) -> Self {
        let sweep = result.sweep();
        let tables = result
            .tables()
            .iter()
            .enumerate()
            .map(|(i, table)| {
                let sweep_value = sweep.and_then(|s| s.values.get(i).copied());
                TableSummary::new(&result.variables, table, sweep_value, with_values)
            })
            .collect();

        ResultSummary {
            title: result.title.clone(),
            date: result.date.clone(),
            post_version: result.header.post_version.to_string(),
            endian: endian_name(result.header.endian),
            scale_name: result.scale_name().to_string(),
            sweep_name: sweep.map(|s| s.name.clone()),
            sweep_values: sweep.map(|s| s.values.clone()),
            table_count: result.tables().len(),
            variables: result.variables.iter().map(VariableSummary::from).collect(),
            tables,
        }
    }
}

/// Header-only view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSummary {
    pub title: String,
    pub date: String,
    pub post_version: String,
    pub endian: &'static str,
    pub sweep_name: Option<String>,
    pub sweep_points: Option<usize>,
    pub data_offset: usize,
    pub variables: Vec<VariableSummary>,
}

impl From<&FileMetadata> for MetadataSummary {
    fn from(meta: &FileMetadata) -> Self {
        MetadataSummary {
            title: meta.header.title.clone(),
            date: meta.header.date.clone(),
            post_version: meta.header.post_version.to_string(),
            endian: endian_name(meta.header.endian),
            sweep_name: meta.sweep.as_ref().map(|p| p.name.clone()),
            sweep_points: meta.sweep.as_ref().map(|p| p.points),
            data_offset: meta.data_position,
            variables: meta.variables.iter().map(VariableSummary::from).collect(),
        }
    }
}

// ============================================================================
// Text output
// ============================================================================

fn write_variables(f: &mut fmt::Formatter<'_>, variables: &[VariableSummary]) -> fmt::Result {
    let width = variables.iter().map(|v| v.name.len()).max().unwrap_or(0);
    writeln!(f, "variables ({}):", variables.len())?;
    for (i, v) in variables.iter().enumerate() {
        writeln!(
            f,
            "  {:>3}  {:<width$}  {:<7}  {}{}",
            i,
            v.name,
            v.numeric,
            v.kind,
            if v.probe { " probe" } else { "" },
            width = width
        )?;
    }
    Ok(())
}

fn opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.6e}", v))
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "title:   {}", self.title)?;
        writeln!(f, "date:    {}", self.date)?;
        writeln!(f, "format:  {} {}-endian", self.post_version, self.endian)?;
        writeln!(f, "scale:   {}", self.scale_name)?;
        if let Some(name) = &self.sweep_name {
            let points = self.sweep_values.as_ref().map_or(0, Vec::len);
            writeln!(f, "sweep:   {} ({} points)", name, points)?;
        }
        write_variables(f, &self.variables)?;

        for (i, table) in self.tables.iter().enumerate() {
            match (&self.sweep_name, table.sweep_value) {
                (Some(name), Some(value)) => writeln!(
                    f,
                    "table {} [{} = {}]: {} points",
                    i, name, value, table.points
                )?,
                _ => writeln!(f, "table {}: {} points", i, table.points)?,
            }
            let width = table.signals.iter().map(|s| s.name.len()).max().unwrap_or(0);
            for s in &table.signals {
                writeln!(
                    f,
                    "  {:<width$}  first {}  last {}  min {}  max {}",
                    s.name,
                    opt(s.first),
                    opt(s.last),
                    opt(s.min),
                    opt(s.max),
                    width = width
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for MetadataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "title:   {}", self.title)?;
        writeln!(f, "date:    {}", self.date)?;
        writeln!(f, "format:  {} {}-endian", self.post_version, self.endian)?;
        if let (Some(name), Some(points)) = (&self.sweep_name, self.sweep_points) {
            writeln!(f, "sweep:   {} ({} points)", name, points)?;
        }
        writeln!(f, "data at: byte {}", self.data_offset)?;
        write_variables(f, &self.variables)
    }
}
