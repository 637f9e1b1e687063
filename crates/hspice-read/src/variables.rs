//! Variable table reader
//!
//! The vector description is a whitespace separated token list:
//! `type_0 .. type_{V-1} scale name_1 .. name_{V-1} [sweep]`
//! where `V` counts variables (scale included) and probes.

use crate::header::leading_int;
use crate::types::*;

/// Split the vector description into tokens.
///
/// NUL padding is treated like whitespace.
pub fn tokenize(description: &str) -> Vec<&str> {
    description
        .split(|c: char| c.is_ascii_whitespace() || c == '\0')
        .filter(|token| !token.is_empty())
        .collect()
}

fn check_name<'t>(token: Option<&&'t str>, what: &str, ordinal: usize) -> Result<&'t str> {
    let name = token.copied().ok_or_else(|| {
        HspiceError::format(format!("missing {} name for column {}", what, ordinal))
    })?;
    if name.chars().any(char::is_control) {
        return Err(HspiceError::format(format!(
            "{} name for column {} contains control characters",
            what, ordinal
        )));
    }
    Ok(name)
}

/// Lower-case a dependent name and unwrap `v(...)`
pub fn legacy_name(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.strip_prefix("v(") {
        Some(inner) => inner.strip_suffix(')').unwrap_or(inner).to_string(),
        None => lower,
    }
}

/// Read the type codes and names of every column
pub fn read_variable_table(
    tokens: &[&str],
    header: &FileHeader,
    style: NameStyle,
) -> Result<Vec<VariableDescriptor>> {
    let num_vectors = header.num_vectors();

    let mut type_codes = Vec::with_capacity(num_vectors);
    for i in 0..num_vectors {
        let token = tokens.get(i).ok_or_else(|| {
            HspiceError::format(format!("missing type code for column {}", i))
        })?;
        let code = leading_int(token.as_bytes())
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| {
                HspiceError::format(format!("type code {:?} for column {} is not a number", token, i))
            })?;
        type_codes.push(code);
    }

    // Scale is always real; a frequency scale makes the variables complex
    let complex_variables = type_codes[0] == FREQUENCY_TYPE;

    let mut variables = Vec::with_capacity(num_vectors);

    let scale = check_name(tokens.get(num_vectors), "scale", 0)?;
    variables.push(VariableDescriptor {
        name: scale.to_string(),
        kind: VarKind::Independent,
        numeric: NumericType::Real,
        ordinal: 0,
        is_probe: false,
        type_code: type_codes[0],
    });

    for ordinal in 1..num_vectors {
        let raw = check_name(tokens.get(num_vectors + ordinal), "vector", ordinal)?;
        let is_probe = ordinal >= header.num_variables;
        let numeric = if complex_variables && !is_probe {
            NumericType::Complex
        } else {
            NumericType::Real
        };
        let name = match style {
            NameStyle::Verbatim => raw.to_string(),
            NameStyle::Legacy => legacy_name(raw),
        };
        variables.push(VariableDescriptor {
            name,
            kind: VarKind::Dependent,
            numeric,
            ordinal,
            is_probe,
            type_code: type_codes[ordinal],
        });
    }

    Ok(variables)
}

/// Words per data row
pub fn record_width(variables: &[VariableDescriptor]) -> usize {
    variables.iter().map(|v| v.numeric.words()).sum()
}
