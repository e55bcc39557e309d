//! Payment gateway credentials.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_currency() -> String {
    String::from("INR")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    /// Public key id handed to the checkout widget.
    #[serde(default)]
    pub key_id: String,

    /// Secret used to sign `{order_id}|{payment_id}`.
    #[serde(default)]
    pub key_secret: String,

    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            currency: default_currency(),
        }
    }
}

impl PaymentsConfig {
    pub fn is_configured(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_empty()
    }

    /// Return `self` if both keys are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when either key is missing.
    pub fn require(&self) -> Result<&Self, ConfigError> {
        if self.is_configured() {
            Ok(self)
        } else {
            Err(ConfigError::NotConfigured {
                section: "payments".into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = PaymentsConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.currency, "INR");
        assert!(matches!(
            config.require(),
            Err(ConfigError::NotConfigured { section }) if section == "payments"
        ));
    }

    #[test]
    fn configured_with_both_keys() {
        let config = PaymentsConfig {
            key_id: "rzp_test_key".into(),
            key_secret: "shh".into(),
            ..Default::default()
        };
        assert!(config.require().is_ok());
    }
}
