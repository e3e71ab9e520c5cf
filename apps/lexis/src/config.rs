//! # Configuration
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. `lexis.toml` (or the file named with `--config`)
//! 3. CLI flags
//!
//! Transport secrets and switches (`LEXIS_API_KEY`, `LEXIS_RATE_LIMIT`,
//! `LEXIS_CORS_ORIGINS`, `LEXIS_LOG_FORMAT`) are read from the environment
//! where they are used.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [storage]
//! backend = "redb"
//! path = "/var/lib/lexis/concepts.redb"
//!
//! [lifecycle]
//! retire_when_retired = "idempotent"
//! ```

use lexis_core::{
    EngineSettings, LexisError, Locale, NameMatching, PagingLimits, RequestContext, RetirePolicy,
    Session, primitives,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "lexis.toml";

/// Largest config file accepted.
const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Requests per second, 0 disables limiting. `LEXIS_RATE_LIMIT` wins.
    pub rate_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            body_limit: 2 * 1024 * 1024,
            rate_limit: 100,
        }
    }
}

/// Which `ConceptStore` backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Volatile, starts empty.
    Memory,
    #[default]
    Redb,
}

impl BackendKind {
    pub fn parse(token: &str) -> Result<Self, LexisError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redb" => Ok(Self::Redb),
            other => Err(LexisError::InvalidArgument(format!(
                "unknown backend '{}' (expected memory or redb)",
                other
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Redb,
            path: PathBuf::from("lexis.redb"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Locale used when a request does not send `Accept-Language`.
    pub locale: String,
    /// Actor recorded in audit info.
    pub actor: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            locale: primitives::DEFAULT_LOCALE.to_string(),
            actor: primitives::DEFAULT_ACTOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    pub retire_when_retired: RetirePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: primitives::DEFAULT_PAGE_SIZE,
            max_limit: primitives::MAX_PAGE_SIZE,
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub context: ContextConfig,
    pub resolver: ResolverConfig,
    pub lifecycle: LifecycleConfig,
    pub paging: PagingConfig,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, LexisError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| LexisError::InvalidArgument(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// A named file must exist. Without one, `lexis.toml` in the working
    /// directory is used if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, LexisError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(&path)
            .map_err(|e| LexisError::Io(format!("config '{}': {}", path.display(), e)))?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(LexisError::InvalidArgument(format!(
                "config '{}' is larger than {} bytes",
                path.display(),
                MAX_CONFIG_SIZE
            )));
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|e| LexisError::Io(format!("config '{}': {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), "configuration loaded");
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), LexisError> {
        if self.paging.default_limit == 0 || self.paging.max_limit == 0 {
            return Err(LexisError::InvalidArgument(
                "paging limits must be greater than zero".to_string(),
            ));
        }
        if self.context.locale.trim().is_empty() {
            return Err(LexisError::InvalidArgument(
                "context.locale must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Engine switches derived from this config.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            name_matching: if self.resolver.case_sensitive {
                NameMatching::CaseSensitive
            } else {
                NameMatching::CaseInsensitive
            },
            retire_policy: self.lifecycle.retire_when_retired,
            paging: PagingLimits {
                default_limit: self.paging.default_limit,
                max_limit: self.paging.max_limit,
            },
        }
    }

    /// Request context used when the caller supplies nothing more specific.
    #[must_use]
    pub fn default_context(&self) -> RequestContext {
        RequestContext::new(
            Locale::new(self.context.locale.trim()),
            self.context.actor.as_str(),
        )
    }

    /// Open a session on the configured backend.
    pub fn open_session(&self) -> Result<Session, LexisError> {
        let session = match self.storage.backend {
            BackendKind::Memory => Session::new(),
            BackendKind::Redb => Session::with_redb(&self.storage.path)?,
        };
        Ok(session.with_settings(self.engine_settings()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
