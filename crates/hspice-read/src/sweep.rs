//! Sweep descriptor reader
//!
//! The header only declares the sweep parameter and the number of points.
//! Each point's value is the first word of its data table.

use crate::header::int_field;
use crate::types::*;

/// Sweep declared by the header, before the values are read
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub name: String,
    pub points: usize,
}

/// Decide single-run vs swept mode.
///
/// Returns `None` for a single run.
pub fn read_sweep_plan(
    text: &[u8],
    tokens: &[&str],
    header: &FileHeader,
) -> Result<Option<SweepPlan>> {
    if header.num_sweeps == 0 {
        return Ok(None);
    }

    let name = tokens
        .get(2 * header.num_vectors())
        .copied()
        .ok_or_else(|| HspiceError::format("failed to extract sweep name"))?;
    if name.chars().any(char::is_control) {
        return Err(HspiceError::format(
            "sweep name contains control characters",
        ));
    }

    let start = header.post_version.sweep_size_position();
    let points = int_field(text, start, start + SWEEP_SIZE_WIDTH, "sweep size")?;
    if points <= 0 {
        return Err(HspiceError::format(format!(
            "sweep '{}' declares {} points",
            name, points
        )));
    }
    let points = usize::try_from(points)
        .map_err(|_| HspiceError::format(format!("sweep size {} out of range", points)))?;

    Ok(Some(SweepPlan {
        name: name.to_string(),
        points,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(version: PostVersion, sweeps: usize) -> FileHeader {
        FileHeader {
            post_version: version,
            endian: Endian::Little,
            title: String::new(),
            date: String::new(),
            num_variables: 2,
            num_probes: 0,
            num_sweeps: sweeps,
        }
    }

    fn text_with_size(position: usize, size: &str) -> Vec<u8> {
        let mut text = vec![b' '; 256];
        text[position..position + size.len()].copy_from_slice(size.as_bytes());
        text
    }

    #[test]
    fn test_single_run_has_no_plan() {
        let text = vec![b' '; 256];
        let plan = read_sweep_plan(&text, &[], &header(PostVersion::V9601, 0)).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn test_plan_9601() {
        let text = text_with_size(SWEEP_SIZE_POSITION1, "3");
        let tokens = ["1", "1", "TIME", "V(1)", "VDD"];
        let plan = read_sweep_plan(&text, &tokens, &header(PostVersion::V9601, 1))
            .unwrap()
            .unwrap();
        assert_eq!(
            plan,
            SweepPlan {
                name: "VDD".into(),
                points: 3
            }
        );
    }

    #[test]
    fn test_plan_2001_uses_second_position() {
        let text = text_with_size(SWEEP_SIZE_POSITION2, "  12");
        let tokens = ["1", "1", "TIME", "V(1)", "TEMP"];
        let plan = read_sweep_plan(&text, &tokens, &header(PostVersion::V2001, 1))
            .unwrap()
            .unwrap();
        assert_eq!(plan.points, 12);
    }

    #[test]
    fn test_missing_name_rejected() {
        let text = text_with_size(SWEEP_SIZE_POSITION1, "3");
        let tokens = ["1", "1", "TIME", "V(1)"];
        assert!(matches!(
            read_sweep_plan(&text, &tokens, &header(PostVersion::V9601, 1)),
            Err(HspiceError::Format(_))
        ));
    }

    #[test]
    fn test_non_positive_size_rejected() {
        let tokens = ["1", "1", "TIME", "V(1)", "VDD"];
        for size in ["0", "-4"] {
            let text = text_with_size(SWEEP_SIZE_POSITION1, size);
            assert!(matches!(
                read_sweep_plan(&text, &tokens, &header(PostVersion::V9601, 1)),
                Err(HspiceError::Format(_))
            ));
        }
    }
}
