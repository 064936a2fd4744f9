//! Registry configuration

use super::connection::Role;

/// Role classification settings
///
/// Hints are matched case-sensitively against the connection-time role
/// parameter.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Hint that classifies a connection as a producer
    pub producer_hint: String,

    /// Hint that classifies a connection as a consumer
    pub consumer_hint: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            producer_hint: "raspberrypi".into(),
            consumer_hint: "flutter".into(),
        }
    }
}

impl RegistryConfig {
    /// Set the producer hint
    pub fn producer_hint(mut self, hint: impl Into<String>) -> Self {
        self.producer_hint = hint.into();
        self
    }

    /// Set the consumer hint
    pub fn consumer_hint(mut self, hint: impl Into<String>) -> Self {
        self.consumer_hint = hint.into();
        self
    }

    /// Map a role hint to a role, `None` if the hint is not recognised
    pub fn classify(&self, hint: &str) -> Option<Role> {
        if hint == self.producer_hint {
            Some(Role::Producer)
        } else if hint == self.consumer_hint {
            Some(Role::Consumer)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hints() {
        let config = RegistryConfig::default();

        assert_eq!(config.classify("raspberrypi"), Some(Role::Producer));
        assert_eq!(config.classify("flutter"), Some(Role::Consumer));
        assert_eq!(config.classify("browser"), None);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let config = RegistryConfig::default();

        assert_eq!(config.classify("RaspberryPi"), None);
        assert_eq!(config.classify("FLUTTER"), None);
        assert_eq!(config.classify(""), None);
    }

    #[test]
    fn test_builder_hints() {
        let config = RegistryConfig::default()
            .producer_hint("camera")
            .consumer_hint("viewer");

        assert_eq!(config.classify("camera"), Some(Role::Producer));
        assert_eq!(config.classify("viewer"), Some(Role::Consumer));
        assert_eq!(config.classify("raspberrypi"), None);
    }
}
