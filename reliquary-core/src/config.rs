//! Configuration types

use crate::error::{ConfigError, ReliquaryResult};
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Page size used when a search filter does not specify one.
    pub default_page_size: i32,
    /// Hard ceiling on a single search page.
    pub max_page_size: i32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 200,
        }
    }
}

impl VaultConfig {
    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(ReliquaryError::Config) if invalid.
    pub fn validate(&self) -> ReliquaryResult<()> {
        if self.default_page_size <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                value: self.default_page_size.to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }
        if self.max_page_size <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_page_size".to_string(),
                value: self.max_page_size.to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                value: self.default_page_size.to_string(),
                reason: format!("exceeds max_page_size {}", self.max_page_size),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReliquaryError;

    #[test]
    fn test_default_config_is_valid() {
        assert!(VaultConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_nonpositive_page_size() {
        let config = VaultConfig {
            default_page_size: 0,
            max_page_size: 200,
        };
        assert!(matches!(
            config.validate(),
            Err(ReliquaryError::Config(ConfigError::InvalidValue { field, .. })) if field == "default_page_size"
        ));
    }

    #[test]
    fn test_rejects_default_above_max() {
        let config = VaultConfig {
            default_page_size: 500,
            max_page_size: 200,
        };
        assert!(config.validate().is_err());
    }
}
