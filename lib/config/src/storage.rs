use std::{collections::HashSet, fmt};

use da_gateway_types::{BackendType, EigenDABackend};
use serde::Deserialize;

use crate::utils::comma_separated;

/// Async put workers are bounded to keep the replication channel small.
const MAX_ASYNC_PUT_WORKERS: usize = 100;

/// Secondary tier a configured target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetTier {
    Cache,
    Fallback,
}

impl fmt::Display for TargetTier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Cache => "cache",
            Self::Fallback => "fallback",
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("no EigenDA backends are enabled")]
    NoBackendsEnabled,
    #[error("dispersal backend is set to {0}, but the {0} backend is not enabled")]
    DispersalBackendNotEnabled(EigenDABackend),
    #[error("duplicate {tier} target `{name}`")]
    DuplicateTarget { tier: TargetTier, name: String },
    #[error("target `{0}` is configured as both a cache and a fallback target")]
    TargetInBothTiers(String),
    #[error("unknown {tier} target `{name}`")]
    UnknownTarget { tier: TargetTier, name: String },
    #[error("async_put_workers must be less than 100, got {0}")]
    TooManyAsyncWorkers(usize),
    #[error(
        "error_on_secondary_insert_failure is only supported with synchronous writes \
         (async_put_workers = 0), got async_put_workers = {0}"
    )]
    StrictModeRequiresSyncWrites(usize),
    #[error("secondary_write_max_attempts must be positive")]
    ZeroWriteAttempts,
}

/// Routing and secondary storage configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageConfig {
    /// Primary backends to build.
    #[serde(
        default = "StorageConfig::default_backends_to_enable",
        deserialize_with = "comma_separated"
    )]
    pub backends_to_enable: Vec<EigenDABackend>,
    /// Backend receiving writes at startup. Can be switched at runtime.
    #[serde(default = "StorageConfig::default_dispersal_backend")]
    pub dispersal_backend: EigenDABackend,
    /// Names of the secondary backends consulted before the primary on reads, in order.
    #[serde(default, deserialize_with = "comma_separated")]
    pub cache_targets: Vec<String>,
    /// Names of the secondary backends consulted after a failed primary read, in order.
    #[serde(default, deserialize_with = "comma_separated")]
    pub fallback_targets: Vec<String>,
    /// `0` means secondary writes happen synchronously within the request.
    #[serde(default)]
    pub async_put_workers: usize,
    /// Replicate payloads into secondary storage after a cache miss served by the primary.
    #[serde(default)]
    pub write_on_cache_miss: bool,
    /// Fail requests if any secondary write fails, rather than only if all of them fail.
    #[serde(default)]
    pub error_on_secondary_insert_failure: bool,
    #[serde(default = "StorageConfig::default_secondary_write_max_attempts")]
    pub secondary_write_max_attempts: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backends_to_enable: Self::default_backends_to_enable(),
            dispersal_backend: Self::default_dispersal_backend(),
            cache_targets: Vec::new(),
            fallback_targets: Vec::new(),
            async_put_workers: 0,
            write_on_cache_miss: false,
            error_on_secondary_insert_failure: false,
            secondary_write_max_attempts: Self::default_secondary_write_max_attempts(),
        }
    }
}

impl StorageConfig {
    fn default_backends_to_enable() -> Vec<EigenDABackend> {
        vec![EigenDABackend::V2]
    }

    const fn default_dispersal_backend() -> EigenDABackend {
        EigenDABackend::V2
    }

    const fn default_secondary_write_max_attempts() -> usize {
        5
    }

    pub fn async_writes_enabled(&self) -> bool {
        self.async_put_workers > 0
    }

    /// Resolved cache targets. Only meaningful after [`Self::validate()`] succeeded.
    pub fn cache_backends(&self) -> Vec<BackendType> {
        self.cache_targets
            .iter()
            .map(|name| BackendType::parse(name))
            .collect()
    }

    /// Resolved fallback targets. Only meaningful after [`Self::validate()`] succeeded.
    pub fn fallback_backends(&self) -> Vec<BackendType> {
        self.fallback_targets
            .iter()
            .map(|name| BackendType::parse(name))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backends_to_enable.is_empty() {
            return Err(ConfigError::NoBackendsEnabled);
        }
        if !self.backends_to_enable.contains(&self.dispersal_backend) {
            return Err(ConfigError::DispersalBackendNotEnabled(
                self.dispersal_backend,
            ));
        }

        let caches = Self::resolve_targets(&self.cache_targets, TargetTier::Cache)?;
        let fallbacks = Self::resolve_targets(&self.fallback_targets, TargetTier::Fallback)?;
        if let Some(name) = self
            .cache_targets
            .iter()
            .zip(&caches)
            .find_map(|(name, backend)| fallbacks.contains(backend).then_some(name))
        {
            return Err(ConfigError::TargetInBothTiers(name.clone()));
        }

        if self.async_put_workers >= MAX_ASYNC_PUT_WORKERS {
            return Err(ConfigError::TooManyAsyncWorkers(self.async_put_workers));
        }
        if self.error_on_secondary_insert_failure && self.async_writes_enabled() {
            return Err(ConfigError::StrictModeRequiresSyncWrites(
                self.async_put_workers,
            ));
        }
        if self.secondary_write_max_attempts == 0 {
            return Err(ConfigError::ZeroWriteAttempts);
        }
        Ok(())
    }

    fn resolve_targets(
        names: &[String],
        tier: TargetTier,
    ) -> Result<Vec<BackendType>, ConfigError> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let backend = BackendType::parse(name);
            if backend == BackendType::Unknown {
                return Err(ConfigError::UnknownTarget {
                    tier,
                    name: name.clone(),
                });
            }
            if !seen.insert(backend) {
                return Err(ConfigError::DuplicateTarget {
                    tier,
                    name: name.clone(),
                });
            }
            resolved.push(backend);
        }
        Ok(resolved)
    }
}
