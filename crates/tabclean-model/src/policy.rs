//! Missing-value encodings.

use serde::{Deserialize, Serialize};

/// How a dataset encodes "missing" in its numeric columns.
///
/// A dataset uses exactly one policy per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentinelPolicy {
    /// Blank cells and null tokens mark missing values.
    #[default]
    #[serde(alias = "nan", alias = "missing")]
    Null,
    /// The literal value `0` marks missing values.
    Zero,
}

impl SentinelPolicy {
    /// Returns true if the cell counts as a sentinel under this policy.
    pub fn is_sentinel(self, value: Option<f64>) -> bool {
        match self {
            Self::Null => value.is_none(),
            Self::Zero => value == Some(0.0),
        }
    }

    /// Returns true if the cell contributes to the column mean.
    pub fn is_observed(self, value: Option<f64>) -> bool {
        value.is_some() && !self.is_sentinel(value)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Zero => "zero",
        }
    }
}

impl std::fmt::Display for SentinelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_policy_leaves_missing_unobserved() {
        let policy = SentinelPolicy::Zero;
        assert!(policy.is_sentinel(Some(0.0)));
        assert!(policy.is_sentinel(Some(-0.0)));
        assert!(!policy.is_sentinel(None));
        assert!(!policy.is_observed(None));
        assert!(policy.is_observed(Some(4.0)));
    }

    #[test]
    fn null_policy_treats_zero_as_observed() {
        let policy = SentinelPolicy::Null;
        assert!(policy.is_sentinel(None));
        assert!(!policy.is_sentinel(Some(0.0)));
        assert!(policy.is_observed(Some(0.0)));
    }

    #[test]
    fn policy_parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            sentinel: SentinelPolicy,
        }
        let parsed: Wrapper = toml::from_str("sentinel = \"zero\"").unwrap();
        assert_eq!(parsed.sentinel, SentinelPolicy::Zero);
        let parsed: Wrapper = toml::from_str("sentinel = \"nan\"").unwrap();
        assert_eq!(parsed.sentinel, SentinelPolicy::Null);
    }
}
