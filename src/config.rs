//! Configuration module for the multilingual vector database.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `GLOSSA_` and use double
//! underscores to separate nested levels:
//! - `GLOSSA_INDEX__KIND=hnsw` sets `index.kind`
//! - `GLOSSA_SEARCH__TOP_K=10` sets `search.top_k`
//! - `GLOSSA_PERSISTENCE__ENABLED=false` sets `persistence.enabled`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{GlossaError, GlossaResult};
use crate::vector::IndexKind;

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".glossa";

/// Name of the settings file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "GLOSSA_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the metadata snapshot and vector segments
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Workspace root directory (where .glossa is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Include the module target in each line
    #[serde(default = "default_false")]
    pub with_target: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    /// ANN backend used for every language index
    #[serde(default)]
    pub kind: IndexKind,

    /// Maximum number of IVF clusters
    #[serde(default = "default_nlist")]
    pub nlist: usize,

    /// IVF clusters probed per query
    #[serde(default = "default_nprobe")]
    pub nprobe: usize,

    /// Vectors required before IVF trains its centroids
    #[serde(default = "default_training_threshold")]
    pub training_threshold: usize,

    /// Minimum HNSW candidate list size at query time
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,

    /// Languages whose indices are created at startup
    #[serde(default = "default_preload_languages")]
    pub preload_languages: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a hit
    #[serde(default = "default_similarity_threshold")]
    pub threshold: f32,

    /// Added to the score when query and document share cultural context
    #[serde(default = "default_cultural_boost")]
    pub cultural_boost: f32,

    /// Added to the score when query and document share phonetic traits
    #[serde(default = "default_phonetic_boost")]
    pub phonetic_boost: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Maximum number of cached embeddings
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// How long to wait for an injected embedding backend
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,

    /// Model used when no model lists the requested language
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Model descriptors keyed by name
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, ModelConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ModelConfig {
    pub dimension: usize,

    #[serde(default)]
    pub languages: Vec<String>,

    /// Higher priority wins when several models cover a language
    #[serde(default)]
    pub priority: i32,

    /// Custom models get linguistic feature amplification
    #[serde(default = "default_false")]
    pub is_custom: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PersistenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Flush after this many added documents (0 disables autosave)
    #[serde(default = "default_autosave_every")]
    pub autosave_every: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_data_path() -> PathBuf {
    PathBuf::from(".glossa/data")
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_nlist() -> usize {
    100
}
fn default_nprobe() -> usize {
    8
}
fn default_training_threshold() -> usize {
    256
}
fn default_ef_search() -> usize {
    50
}
fn default_preload_languages() -> Vec<String> {
    ["fr", "yua", "quc", "qu", "nah", "gn", "es", "en"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_top_k() -> usize {
    5
}
fn default_similarity_threshold() -> f32 {
    0.7
}
fn default_cultural_boost() -> f32 {
    0.1
}
fn default_phonetic_boost() -> f32 {
    0.05
}
fn default_cache_capacity() -> usize {
    10_000
}
fn default_backend_timeout_ms() -> u64 {
    2_000
}
fn default_fallback_model() -> String {
    "multilingual".to_string()
}
fn default_autosave_every() -> usize {
    100
}

fn model(dimension: usize, languages: &[&str], priority: i32, is_custom: bool) -> ModelConfig {
    ModelConfig {
        dimension,
        languages: languages.iter().map(|l| l.to_string()).collect(),
        priority,
        is_custom,
    }
}

fn default_models() -> BTreeMap<String, ModelConfig> {
    let mut models = BTreeMap::new();
    models.insert(
        "multilingual".to_string(),
        model(384, &["fr", "es", "en"], 1, false),
    );
    models.insert(
        "indigenous".to_string(),
        model(768, &["yua", "quc", "qu", "nah", "gn"], 2, true),
    );
    models.insert(
        "mayan".to_string(),
        model(512, &["yua", "quc", "cak", "kek"], 3, true),
    );
    models
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_path: default_data_path(),
            workspace_root: None,
            debug: false,
            logging: LoggingConfig::default(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
            embedding: EmbeddingConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: false,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::default(),
            nlist: default_nlist(),
            nprobe: default_nprobe(),
            training_threshold: default_training_threshold(),
            ef_search: default_ef_search(),
            preload_languages: default_preload_languages(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            threshold: default_similarity_threshold(),
            cultural_boost: default_cultural_boost(),
            phonetic_boost: default_phonetic_boost(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            backend_timeout_ms: default_backend_timeout_ms(),
            fallback_model: default_fallback_model(),
            models: default_models(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            autosave_every: default_autosave_every(),
        }
    }
}

fn env_provider() -> Env {
    // Double underscore separates nested levels; single underscores stay in field names
    Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources, discovering `.glossa/` upwards
    /// from the current directory.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_discovered(&start)
    }

    /// Like [`load`](Self::load), but starts discovery at `start`.
    pub fn load_discovered(start: &Path) -> Result<Self, Box<figment::Error>> {
        let workspace_root = Self::find_workspace_root(start);
        let config_path = workspace_root
            .as_ref()
            .map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path).map(|mut settings| {
            if settings.workspace_root.is_none() {
                settings.workspace_root = workspace_root;
            }
            settings
        })
    }

    /// Load configuration from a specific file, then apply env overrides.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
    }

    /// Walks `start` and its ancestors looking for a `.glossa` directory.
    pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Data directory, resolved against the workspace root when relative.
    pub fn resolved_data_path(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) if self.data_path.is_relative() => root.join(&self.data_path),
            _ => self.data_path.clone(),
        }
    }

    /// Logging settings with the global debug switch applied.
    pub fn logging_config(&self) -> LoggingConfig {
        let mut logging = self.logging.clone();
        if self.debug {
            logging.level = "debug".to_string();
        }
        logging
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> GlossaResult<()> {
        let invalid = |reason: String| Err(GlossaError::InvalidConfig { reason });

        if self.search.top_k == 0 {
            return invalid("search.top_k must be at least 1".to_string());
        }
        if !(-1.0..=1.0).contains(&self.search.threshold) {
            return invalid(format!(
                "search.threshold must lie in [-1, 1], got {}",
                self.search.threshold
            ));
        }
        if self.index.nprobe == 0 || self.index.nlist == 0 {
            return invalid("index.nprobe and index.nlist must be at least 1".to_string());
        }
        if self.embedding.models.is_empty() {
            return invalid("embedding.models must define at least one model".to_string());
        }
        if let Some((name, _)) = self
            .embedding
            .models
            .iter()
            .find(|(_, model)| model.dimension == 0)
        {
            return invalid(format!("model '{name}' has dimension 0"));
        }
        if !self.embedding.models.contains_key(&self.embedding.fallback_model) {
            return invalid(format!(
                "fallback model '{}' is not defined in embedding.models",
                self.embedding.fallback_model
            ));
        }
        Ok(())
    }
}
