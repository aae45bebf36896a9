//! Column kind inference for undeclared columns.

use tabclean_model::{ColumnKind, parse_f64};

/// Per-column counts gathered from raw cells.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ColumnHint {
    /// Cells that are not missing.
    pub non_missing: usize,
    /// Non-missing cells that parse as finite numbers.
    pub numeric: usize,
}

impl ColumnHint {
    pub fn from_cells(cells: &[Option<String>]) -> Self {
        let mut hint = Self::default();
        for cell in cells.iter().flatten() {
            hint.non_missing += 1;
            if parse_f64(cell).is_some() {
                hint.numeric += 1;
            }
        }
        hint
    }

    /// A column is numeric when it has data and every value parses.
    ///
    /// Fully-missing columns stay text so they are never imputed.
    pub fn inferred_kind(self) -> ColumnKind {
        if self.non_missing > 0 && self.numeric == self.non_missing {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }
}

/// Infer the kind of a column from its raw cells.
pub fn infer_kind(cells: &[Option<String>]) -> ColumnKind {
    ColumnHint::from_cells(cells).inferred_kind()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    None
                } else {
                    Some((*v).to_string())
                }
            })
            .collect()
    }

    #[test]
    fn numeric_when_all_values_parse() {
        assert_eq!(infer_kind(&cells(&["1", "2.5", "", "-3"])), ColumnKind::Numeric);
    }

    #[test]
    fn text_when_any_value_fails() {
        assert_eq!(infer_kind(&cells(&["1", "two"])), ColumnKind::Text);
    }

    #[test]
    fn text_when_column_is_empty() {
        assert_eq!(infer_kind(&cells(&["", ""])), ColumnKind::Text);
        assert_eq!(infer_kind(&[]), ColumnKind::Text);
    }

    #[test]
    fn hint_counts() {
        let hint = ColumnHint::from_cells(&cells(&["1", "", "x"]));
        assert_eq!(hint.non_missing, 2);
        assert_eq!(hint.numeric, 1);
    }
}
