//! Engine configuration via `typelite.toml`
//!
//! Every field has a serde default, so an empty file is a valid config.
//! Out-of-range values are repaired by [`EngineConfig::normalize`] rather
//! than rejected; `Engine::new` always normalizes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use typelite_core::{Error, Result};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "typelite.toml";

/// Default key namespace
pub const DEFAULT_NAMESPACE: &str = "tl";
/// Default page size when a request leaves `per_page` at 0
pub const DEFAULT_PER_PAGE: usize = 20;
/// Upper bound on page size
pub const DEFAULT_MAX_PER_PAGE: usize = 250;
/// Upper bound on dictionary terms a prefix token expands to
pub const DEFAULT_PREFIX_EXPANSION_LIMIT: usize = 128;

/// Engine configuration
///
/// # Example
///
/// ```toml
/// namespace = "shop"
/// default_per_page = 25
/// max_per_page = 100
/// prefix_expansion_limit = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Prefix for every store key the engine writes
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Page size used when a request asks for 0
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,
    /// Largest page size a request may ask for
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
    /// Dictionary terms a prefix token may expand to; 0 means unlimited
    #[serde(default = "default_prefix_expansion_limit")]
    pub prefix_expansion_limit: usize,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

fn default_max_per_page() -> usize {
    DEFAULT_MAX_PER_PAGE
}

fn default_prefix_expansion_limit() -> usize {
    DEFAULT_PREFIX_EXPANSION_LIMIT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            prefix_expansion_limit: default_prefix_expansion_limit(),
        }
    }
}

impl EngineConfig {
    /// Builder: set the key namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Builder: set default and maximum page sizes
    pub fn with_page_sizes(mut self, default_per_page: usize, max_per_page: usize) -> Self {
        self.default_per_page = default_per_page;
        self.max_per_page = max_per_page;
        self
    }

    /// Builder: set the prefix expansion limit
    pub fn with_prefix_expansion_limit(mut self, limit: usize) -> Self {
        self.prefix_expansion_limit = limit;
        self
    }

    /// Replace zero or inconsistent values with usable ones
    ///
    /// Empty namespace and zero page sizes fall back to the defaults; a
    /// default page size above the maximum is lowered to the maximum.
    pub fn normalize(mut self) -> Self {
        if self.namespace.trim().is_empty() {
            self.namespace = default_namespace();
        }
        if self.max_per_page == 0 {
            self.max_per_page = DEFAULT_MAX_PER_PAGE;
        }
        if self.default_per_page == 0 {
            self.default_per_page = DEFAULT_PER_PAGE;
        }
        if self.default_per_page > self.max_per_page {
            self.default_per_page = self.max_per_page;
        }
        self
    }

    /// Parse config from TOML text
    ///
    /// # Errors
    ///
    /// Returns `Config` if the text is not valid TOML for this struct.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Read and parse config from a file path
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Serialize this config to TOML and write it to the given path
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Effective page size for a requested one
    pub fn page_size(&self, requested: usize) -> usize {
        let size = if requested == 0 {
            self.default_per_page
        } else {
            requested
        };
        size.clamp(1, self.max_per_page.max(1))
    }

    /// Expansion limit as passed to dictionary scans
    pub fn expansion_limit(&self) -> Option<usize> {
        match self.prefix_expansion_limit {
            0 => None,
            n => Some(n),
        }
    }
}
