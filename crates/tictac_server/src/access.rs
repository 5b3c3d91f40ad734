//! Caller-key access control for subscriptions.

use std::collections::HashSet;

use crate::config::ServerConfig;

/// Decides whether a transport caller may open streams.
pub trait AccessControl: Send + Sync {
    /// Returns true if `caller_key` is allowed.
    fn is_allowed(&self, caller_key: &str) -> bool;
}

/// A fixed set of registered caller keys. An empty set allows every caller.
#[derive(Clone, Debug, Default)]
pub struct CallerKeys {
    keys: HashSet<String>,
}

impl CallerKeys {
    /// Builds the set from registered keys.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Keys listed in the configuration.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.caller_keys.iter().cloned())
    }
}

impl AccessControl for CallerKeys {
    fn is_allowed(&self, caller_key: &str) -> bool {
        self.keys.is_empty() || self.keys.contains(caller_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_allows_all() {
        let keys = CallerKeys::default();
        assert!(keys.is_allowed("anything"));
    }

    #[test]
    fn test_registered_keys_only() {
        let keys = CallerKeys::new(["frontend"]);
        assert!(keys.is_allowed("frontend"));
        assert!(!keys.is_allowed("intruder"));
        assert!(!keys.is_allowed(""));
    }
}
