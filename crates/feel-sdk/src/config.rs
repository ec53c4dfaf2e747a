//! Configuration types for FeelEngine

use feel_compiler::CompilerOptions;
use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeelConfig {
    /// Compiler options
    pub compiler: CompilerOptions,

    /// Artifact cache configuration
    pub cache: CacheConfig,

    /// Log each compilation at info level
    pub enable_tracing: bool,
}

impl FeelConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            compiler: CompilerOptions::default(),
            cache: CacheConfig::default(),
            enable_tracing: false,
        }
    }

    /// Set compiler options
    pub fn with_compiler(mut self, compiler: CompilerOptions) -> Self {
        self.compiler = compiler;
        self
    }

    /// Set cache configuration
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Enable tracing
    pub fn with_tracing(mut self, enable: bool) -> Self {
        self.enable_tracing = enable;
        self
    }
}

impl Default for FeelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Artifact cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Reuse compiled artifacts across calls
    pub enabled: bool,

    /// Keys longer than this are replaced by their SHA-256 digest
    pub fingerprint_hash_threshold: usize,
}

impl CacheConfig {
    /// Disable the cache
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the hashing threshold
    pub fn with_fingerprint_hash_threshold(mut self, threshold: usize) -> Self {
        self.fingerprint_hash_threshold = threshold;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fingerprint_hash_threshold: 64,
        }
    }
}
