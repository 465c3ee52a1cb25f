//! Hub configuration.

use serde::Deserialize;

use crate::error::HubError;

pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;
pub const MIN_STACK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Bytes reserved for each context's execution stack.
    pub stack_size: usize,
    /// Record every transfer in the hub's transfer log.
    pub record_transfers: bool,
    /// Kill live contexts when the owning hub is dropped, letting their
    /// bodies run cleanup before the stacks are unwound.
    pub kill_on_drop: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            stack_size: DEFAULT_STACK_SIZE,
            record_transfers: false,
            kill_on_drop: true,
        }
    }
}

impl HubConfig {
    /// Default settings with the transfer log enabled.
    pub fn traced() -> Self {
        HubConfig {
            record_transfers: true,
            ..Default::default()
        }
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn validate(&self) -> Result<(), HubError> {
        if self.stack_size < MIN_STACK_SIZE {
            return Err(HubError::invalid_config(format!(
                "stack_size {} is below the minimum of {} bytes",
                self.stack_size, MIN_STACK_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = HubConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.record_transfers);
        assert!(config.kill_on_drop);
    }

    #[test]
    fn test_small_stack_rejected() {
        let err = HubConfig::default().with_stack_size(1024).validate().unwrap_err();
        assert!(err.to_string().contains("below the minimum"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: HubConfig =
            serde_json::from_str(r#"{"record_transfers": true}"#).unwrap();
        assert_eq!(config, HubConfig::traced());

        let config: HubConfig =
            serde_json::from_str(r#"{"stack_size": 65536, "kill_on_drop": false}"#).unwrap();
        assert_eq!(config.stack_size, 65536);
        assert!(!config.kill_on_drop);
    }
}
