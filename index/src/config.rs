//! Tree configuration.
//!
//! # Environment Variables
//!
//! - `INDEX_MAX_KEYS`: maximum keys per node before it splits (default: `64`)
//! - `INDEX_ALLOW_DUPLICATE`: whether equal keys may coexist (default: `false`)
//!
//! # Invariants
//!
//! - A validated config always has `max_keys >= MIN_MAX_KEYS`.

/// Smallest usable tree order. With fewer than two keys per node a split
/// cannot leave both halves non-empty.
pub const MIN_MAX_KEYS: usize = 2;

/// Construction parameters for a [`crate::BTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum number of keys a node holds before it splits.
    pub max_keys: usize,
    /// When set, equal keys are stored as separate entries instead of the
    /// later insert replacing the earlier payload.
    pub allow_duplicate: bool,
}

/// Error returned when loading or validating configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_keys: Self::DEFAULT_MAX_KEYS,
            allow_duplicate: false,
        }
    }
}

impl TreeConfig {
    /// Default tree order.
    pub const DEFAULT_MAX_KEYS: usize = 64;

    const MAX_KEYS_VAR: &'static str = "INDEX_MAX_KEYS";
    const ALLOW_DUPLICATE_VAR: &'static str = "INDEX_ALLOW_DUPLICATE";

    #[must_use]
    pub const fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    #[must_use]
    pub const fn with_allow_duplicate(mut self, allow_duplicate: bool) -> Self {
        self.allow_duplicate = allow_duplicate;
        self
    }

    /// Check the config can build a tree.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_keys` is below [`MIN_MAX_KEYS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_keys < MIN_MAX_KEYS {
            return Err(ConfigError::InvalidValue {
                name: "max_keys".to_string(),
                message: format!("must be at least {MIN_MAX_KEYS}, got {}", self.max_keys),
            });
        }
        Ok(())
    }

    /// Load configuration from environment variables, falling back to the
    /// defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value or the
    /// resulting config fails [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_keys = std::env::var(Self::MAX_KEYS_VAR).ok();
        let allow_duplicate = std::env::var(Self::ALLOW_DUPLICATE_VAR).ok();
        Self::from_values(max_keys.as_deref(), allow_duplicate.as_deref())
    }

    /// Build a config from optional raw setting values.
    fn from_values(
        max_keys: Option<&str>,
        allow_duplicate: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_keys: max_keys.map_or(Ok(Self::DEFAULT_MAX_KEYS), parse_max_keys)?,
            allow_duplicate: allow_duplicate.map_or(Ok(false), parse_bool)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_max_keys(value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue {
            name: TreeConfig::MAX_KEYS_VAR.to_string(),
            message: format!("'{value}' is not a valid key count"),
        })
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: TreeConfig::ALLOW_DUPLICATE_VAR.to_string(),
            message: format!("'{value}' is not a boolean"),
        }),
    }
}
