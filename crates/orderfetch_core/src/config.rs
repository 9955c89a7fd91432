//! Fetch engine configuration.
//!
//! # Invariants
//! - `1 <= batch_size <= in_clause_ceiling`.
//! - `1 <= default_limit <= in_clause_ceiling`.
//! - Configuration is owned per service instance; there is no global batch
//!   size.

use crate::repo::order_repo::Page;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Parent keys collected per batched association read.
pub const DEFAULT_BATCH_SIZE: u32 = 100;
/// Many databases cap `IN (...)` lists around one thousand parameters.
pub const DEFAULT_IN_CLAUSE_CEILING: u32 = 1000;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Tunables for the fetch strategies.
///
/// `batch_size` only changes how many `IN` reads the batched strategy
/// issues. Every matching line is loaded for any batch size, so it has no
/// effect on memory or on the returned data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub batch_size: u32,
    pub in_clause_ceiling: u32,
    pub default_limit: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            in_clause_ceiling: DEFAULT_IN_CLAUSE_CEILING,
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl FetchConfig {
    /// Returns a default configuration with a custom batch size.
    pub fn with_batch_size(batch_size: u32) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.in_clause_ceiling == 0 {
            return Err(ConfigError::ZeroInClauseCeiling);
        }
        if self.batch_size == 0 || self.batch_size > self.in_clause_ceiling {
            return Err(ConfigError::BatchSizeOutOfRange {
                batch_size: self.batch_size,
                ceiling: self.in_clause_ceiling,
            });
        }
        if self.default_limit == 0 || self.default_limit > self.in_clause_ceiling {
            return Err(ConfigError::DefaultLimitOutOfRange {
                limit: self.default_limit,
                ceiling: self.in_clause_ceiling,
            });
        }
        Ok(())
    }

    /// Page used by endpoints when the caller omits `limit`.
    pub fn default_page(&self, offset: u32) -> Page {
        Page::new(offset, self.default_limit)
    }
}

/// Rejected fetch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroInClauseCeiling,
    BatchSizeOutOfRange { batch_size: u32, ceiling: u32 },
    DefaultLimitOutOfRange { limit: u32, ceiling: u32 },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroInClauseCeiling => write!(f, "in_clause_ceiling must be positive"),
            Self::BatchSizeOutOfRange {
                batch_size,
                ceiling,
            } => write!(f, "batch_size {batch_size} must be within 1..={ceiling}"),
            Self::DefaultLimitOutOfRange { limit, ceiling } => {
                write!(f, "default_limit {limit} must be within 1..={ceiling}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FetchConfig};

    #[test]
    fn default_config_is_valid() {
        let config = FetchConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.default_page(0).limit, 100);
    }

    #[test]
    fn batch_size_above_ceiling_is_rejected() {
        let config = FetchConfig {
            batch_size: 2000,
            ..FetchConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BatchSizeOutOfRange {
                batch_size: 2000,
                ceiling: 1000,
            })
        );
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = FetchConfig::with_batch_size(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::BatchSizeOutOfRange { .. }));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: FetchConfig = serde_json::from_str(r#"{"batch_size": 10}"#).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.in_clause_ceiling, 1000);
        assert_eq!(config.default_limit, 100);
    }
}
