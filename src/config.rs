//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the dalarray crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # Station Configuration Options
///
/// ## Strict Channel Names
///  > default: [`true`]
///
/// If enabled, enumerating the channels of a [`StationGroup`](crate::station::StationGroup) fails if it has an array member whose name is not a valid channel key.
/// Otherwise such members are skipped (and reported through the [`log`] facade).
///
/// # Attribute Configuration Options
///
/// ## Maximum Attribute Elements
///  > default: `4096`
///
/// The maximum number of elements of a vector attribute.
/// Attributes are intended to hold a scalar or a small vector; setting a longer vector fails.
#[derive(Debug)]
pub struct Config {
    strict_channel_names: bool,
    max_attribute_elements: usize,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            strict_channel_names: true,
            max_attribute_elements: 4096,
        }
    }
}

impl Config {
    /// Get the [strict channel names](#strict-channel-names) configuration.
    #[must_use]
    pub fn strict_channel_names(&self) -> bool {
        self.strict_channel_names
    }

    /// Set the [strict channel names](#strict-channel-names) configuration.
    pub fn set_strict_channel_names(&mut self, strict_channel_names: bool) -> &mut Self {
        self.strict_channel_names = strict_channel_names;
        self
    }

    /// Get the [maximum attribute elements](#maximum-attribute-elements) configuration.
    #[must_use]
    pub fn max_attribute_elements(&self) -> usize {
        self.max_attribute_elements
    }

    /// Set the [maximum attribute elements](#maximum-attribute-elements) configuration.
    pub fn set_max_attribute_elements(&mut self, max_attribute_elements: usize) -> &mut Self {
        self.max_attribute_elements = max_attribute_elements;
        self
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global dalarray configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global dalarray configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert!(config.strict_channel_names());
        assert_eq!(config.max_attribute_elements(), 4096);
    }

    #[test]
    fn config_setters() {
        let mut config = Config::default();
        config
            .set_strict_channel_names(false)
            .set_max_attribute_elements(3);
        assert!(!config.strict_channel_names());
        assert_eq!(config.max_attribute_elements(), 3);
    }
}
