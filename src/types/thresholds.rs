//! Tunable analysis thresholds with range validation and env fallback.
//!
//! Two knobs drive the outlier detector and the health classifier:
//!
//! - `warning_percentile`: percentile rank above which a non-outlier value
//!   triggers a "warning" classification (0.50 - 0.95, default 0.75)
//! - `outlier_iqr_multiplier`: the `k` in `[Q1 - k*IQR, Q3 + k*IQR]`
//!   (0.5 - 3.0, default 1.5)
//!
//! An explicit save of an out-of-range value fails with [`ConfigError`].
//! Reading from an unreliable source (malformed env var, corrupt stored
//! value) instead degrades per-field to the default via
//! [`ThresholdConfig::parse_or_default`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Default percentile rank for the warning classification
pub const DEFAULT_WARNING_PERCENTILE: f64 = 0.75;
/// Default IQR multiplier for outlier bounds
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Valid range for `warning_percentile` (inclusive)
pub const WARNING_PERCENTILE_RANGE: (f64, f64) = (0.50, 0.95);
/// Valid range for `outlier_iqr_multiplier` (inclusive)
pub const IQR_MULTIPLIER_RANGE: (f64, f64) = (0.5, 3.0);

/// A threshold value rejected on an explicit save.
///
/// Names the offending field and its valid range so the caller can surface
/// an actionable message, never a generic failure string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "warning_percentile {value} outside valid range [{}, {}]",
        WARNING_PERCENTILE_RANGE.0,
        WARNING_PERCENTILE_RANGE.1
    )]
    WarningPercentile { value: f64 },

    #[error(
        "outlier_iqr_multiplier {value} outside valid range [{}, {}]",
        IQR_MULTIPLIER_RANGE.0,
        IQR_MULTIPLIER_RANGE.1
    )]
    IqrMultiplier { value: f64 },
}

/// Immutable threshold snapshot for one analysis run.
///
/// An analysis always uses exactly one snapshot; where the snapshot is
/// stored between runs is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub warning_percentile: f64,
    pub outlier_iqr_multiplier: f64,
    /// Whether this snapshot deviates from the defaults
    pub is_custom: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning_percentile: DEFAULT_WARNING_PERCENTILE,
            outlier_iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            is_custom: false,
        }
    }
}

impl ThresholdConfig {
    /// Validate a candidate pair for an explicit save.
    ///
    /// Out-of-range values fail with a [`ConfigError`] naming the field -
    /// never a silent clamp.
    pub fn validated(
        warning_percentile: f64,
        outlier_iqr_multiplier: f64,
    ) -> Result<Self, ConfigError> {
        if !in_range(warning_percentile, WARNING_PERCENTILE_RANGE) {
            return Err(ConfigError::WarningPercentile {
                value: warning_percentile,
            });
        }
        if !in_range(outlier_iqr_multiplier, IQR_MULTIPLIER_RANGE) {
            return Err(ConfigError::IqrMultiplier {
                value: outlier_iqr_multiplier,
            });
        }
        Ok(Self::resolved(warning_percentile, outlier_iqr_multiplier))
    }

    /// Build a config from raw text values from an unreliable source
    /// (environment variables, a corrupt stored config).
    ///
    /// Each field independently falls back to its default when the text is
    /// missing, unparseable, or out of range. Never fails.
    #[must_use]
    pub fn parse_or_default(
        warning_percentile: Option<&str>,
        outlier_iqr_multiplier: Option<&str>,
    ) -> Self {
        let warning = parse_field(
            warning_percentile,
            "warning_percentile",
            WARNING_PERCENTILE_RANGE,
            DEFAULT_WARNING_PERCENTILE,
        );
        let multiplier = parse_field(
            outlier_iqr_multiplier,
            "outlier_iqr_multiplier",
            IQR_MULTIPLIER_RANGE,
            DEFAULT_IQR_MULTIPLIER,
        );
        Self::resolved(warning, multiplier)
    }

    /// Build from already-validated values, deriving `is_custom`.
    fn resolved(warning_percentile: f64, outlier_iqr_multiplier: f64) -> Self {
        let is_custom = warning_percentile != DEFAULT_WARNING_PERCENTILE
            || outlier_iqr_multiplier != DEFAULT_IQR_MULTIPLIER;
        Self {
            warning_percentile,
            outlier_iqr_multiplier,
            is_custom,
        }
    }
}

const fn in_range(value: f64, range: (f64, f64)) -> bool {
    value >= range.0 && value <= range.1
}

/// Parse one raw field, falling back to `default` on any problem.
fn parse_field(raw: Option<&str>, name: &str, range: (f64, f64), default: f64) -> f64 {
    let Some(text) = raw else {
        return default;
    };
    match text.trim().parse::<f64>() {
        Ok(value) if in_range(value, range) => value,
        Ok(value) => {
            warn!(field = name, value, "threshold outside valid range, using default");
            default
        }
        Err(_) => {
            warn!(field = name, raw = text, "unparseable threshold, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_custom() {
        let config = ThresholdConfig::default();
        assert_eq!(config.warning_percentile, 0.75);
        assert_eq!(config.outlier_iqr_multiplier, 1.5);
        assert!(!config.is_custom);
    }

    #[test]
    fn test_validated_accepts_in_range() {
        let config = ThresholdConfig::validated(0.90, 2.0).unwrap();
        assert_eq!(config.warning_percentile, 0.90);
        assert_eq!(config.outlier_iqr_multiplier, 2.0);
        assert!(config.is_custom);
    }

    #[test]
    fn test_validated_accepts_range_endpoints() {
        assert!(ThresholdConfig::validated(0.50, 0.5).is_ok());
        assert!(ThresholdConfig::validated(0.95, 3.0).is_ok());
    }

    #[test]
    fn test_validated_defaults_are_not_custom() {
        let config = ThresholdConfig::validated(0.75, 1.5).unwrap();
        assert!(!config.is_custom);
    }

    #[test]
    fn test_validated_rejects_low_percentile_naming_field() {
        let err = ThresholdConfig::validated(0.40, 1.5).unwrap_err();
        assert_eq!(err, ConfigError::WarningPercentile { value: 0.40 });
        assert!(err.to_string().contains("warning_percentile"));
        assert!(err.to_string().contains("0.5"));
        assert!(err.to_string().contains("0.95"));
    }

    #[test]
    fn test_validated_rejects_out_of_range_multiplier() {
        let err = ThresholdConfig::validated(0.75, 3.5).unwrap_err();
        assert_eq!(err, ConfigError::IqrMultiplier { value: 3.5 });
        assert!(err.to_string().contains("outlier_iqr_multiplier"));
    }

    #[test]
    fn test_parse_or_default_missing_values() {
        let config = ThresholdConfig::parse_or_default(None, None);
        assert_eq!(config, ThresholdConfig::default());
    }

    #[test]
    fn test_parse_or_default_garbage_falls_back() {
        let config = ThresholdConfig::parse_or_default(Some("not-a-number"), Some(""));
        assert_eq!(config, ThresholdConfig::default());
        assert!(!config.is_custom);
    }

    #[test]
    fn test_parse_or_default_out_of_range_falls_back() {
        let config = ThresholdConfig::parse_or_default(Some("0.99"), Some("10.0"));
        assert_eq!(config.warning_percentile, DEFAULT_WARNING_PERCENTILE);
        assert_eq!(config.outlier_iqr_multiplier, DEFAULT_IQR_MULTIPLIER);
        assert!(!config.is_custom);
    }

    #[test]
    fn test_parse_or_default_per_field_fallback() {
        // One good field, one bad: only the bad one falls back
        let config = ThresholdConfig::parse_or_default(Some("0.85"), Some("bogus"));
        assert_eq!(config.warning_percentile, 0.85);
        assert_eq!(config.outlier_iqr_multiplier, DEFAULT_IQR_MULTIPLIER);
        assert!(config.is_custom);
    }
}
