//! Load options: null tokens and declared column kinds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabclean_model::{ColumnKind, DEFAULT_NULL_TOKENS};

/// Options controlling how a CSV file becomes a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadOptions {
    /// Cell values read as missing, in addition to blank cells.
    pub null_tokens: Vec<String>,
    /// Declared column kinds. Columns not listed here are inferred.
    pub schema: BTreeMap<String, ColumnKind>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            null_tokens: DEFAULT_NULL_TOKENS
                .iter()
                .map(|token| (*token).to_string())
                .collect(),
            schema: BTreeMap::new(),
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the null tokens.
    #[must_use]
    pub fn with_null_tokens(mut self, tokens: Vec<String>) -> Self {
        self.null_tokens = tokens;
        self
    }

    /// Declare the kind of one column.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.schema.insert(name.into(), kind);
        self
    }

    /// Declare several column kinds at once.
    #[must_use]
    pub fn with_schema(mut self, schema: BTreeMap<String, ColumnKind>) -> Self {
        self.schema.extend(schema);
        self
    }
}
