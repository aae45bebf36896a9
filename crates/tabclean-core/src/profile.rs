//! Per-column profile of a loaded table.

use serde::Serialize;

use tabclean_model::{ColumnKind, ColumnValues, Table};
use tabclean_transform::stats;

/// Kind and missing-value counts of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
    /// Cells equal to zero; always 0 for text columns.
    pub zeros: usize,
    /// Mean of the non-missing values, zeros included.
    pub mean: Option<f64>,
}

pub fn profile_table(table: &Table) -> tabclean_model::Result<Vec<ColumnProfile>> {
    Ok(table
        .columns()?
        .into_iter()
        .map(|(name, values)| {
            let kind = values.kind();
            match values {
                ColumnValues::Numeric(values) => ColumnProfile {
                    name,
                    kind,
                    missing: values.iter().filter(|v| v.is_none()).count(),
                    zeros: values.iter().filter(|v| **v == Some(0.0)).count(),
                    mean: stats::mean(&values),
                },
                ColumnValues::Text(values) => ColumnProfile {
                    name,
                    kind,
                    missing: values.iter().filter(|v| v.is_none()).count(),
                    zeros: 0,
                    mean: None,
                },
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_numeric_and_text_columns() {
        let table = Table::new(
            "co2",
            vec![
                (
                    "country".to_string(),
                    ColumnValues::Text(vec![Some("A".into()), None, Some("C".into())]),
                ),
                (
                    "1990".to_string(),
                    ColumnValues::Numeric(vec![Some(0.0), Some(3.0), None]),
                ),
            ],
        )
        .unwrap();
        let profile = profile_table(&table).unwrap();
        assert_eq!(profile[0].kind, ColumnKind::Text);
        assert_eq!(profile[0].missing, 1);
        assert_eq!(profile[1].zeros, 1);
        assert_eq!(profile[1].missing, 1);
        assert_eq!(profile[1].mean, Some(1.5));
    }
}
