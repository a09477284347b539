//! Per-language indices and the registry that owns them.
//!
//! Each [`LanguageIndex`] sits behind its own `RwLock`: searches share read
//! access, inserts take the write lock, and different languages never
//! contend.

mod language;

pub use language::LanguageIndex;

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::error::{GlossaError, GlossaResult, PersistenceError};
use crate::vector::{IndexKind, VectorDimension};

pub type SharedIndex = Arc<RwLock<LanguageIndex>>;

/// Longest accepted language code.
const MAX_LANGUAGE_LEN: usize = 16;

/// Checks that `code` is usable as an index key and directory name.
pub fn validate_language(code: &str) -> GlossaResult<()> {
    let reason = if code.is_empty() {
        Some("language code is empty")
    } else if code.len() > MAX_LANGUAGE_LEN {
        Some("language code is longer than 16 characters")
    } else if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some("only ASCII letters, digits, '-' and '_' are allowed")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(GlossaError::InvalidLanguage {
            code: code.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// All language indices of one database instance.
#[derive(Debug)]
pub struct IndexRegistry {
    indices: DashMap<String, SharedIndex>,
    kind: IndexKind,
    config: IndexConfig,
}

impl IndexRegistry {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            indices: DashMap::new(),
            kind: config.kind,
            config: config.clone(),
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn get(&self, language: &str) -> Option<SharedIndex> {
        self.indices.get(language).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the index for `language`, creating it with `dimension` if absent.
    ///
    /// An existing index is returned as is, even when its dimension differs;
    /// the insert path reports that mismatch.
    pub fn get_or_create(&self, language: &str, dimension: VectorDimension) -> SharedIndex {
        if let Some(index) = self.get(language) {
            return index;
        }
        let entry = self.indices.entry(language.to_string()).or_insert_with(|| {
            debug!(language, dimension = dimension.get(), kind = %self.kind, "creating language index");
            Arc::new(RwLock::new(LanguageIndex::new(
                language,
                dimension,
                self.kind,
                &self.config,
            )))
        });
        Arc::clone(entry.value())
    }

    /// Creates the index for `language`, or confirms the existing one.
    ///
    /// Fails when an index exists with a different dimension.
    pub fn create(
        &self,
        language: &str,
        dimension: VectorDimension,
        model: &str,
    ) -> GlossaResult<SharedIndex> {
        validate_language(language)?;
        let index = self.get_or_create(language, dimension);
        let existing = index.read().dimension();
        if existing != dimension {
            return Err(GlossaError::DimensionMismatch {
                language: language.to_string(),
                model: model.to_string(),
                expected: existing.get(),
                actual: dimension.get(),
            });
        }
        Ok(index)
    }

    /// Language codes with an index, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.indices.iter().map(|e| e.key().clone()).collect();
        languages.sort_unstable();
        languages
    }

    /// Every index, sorted by language, detached from the map.
    pub fn all(&self) -> Vec<(String, SharedIndex)> {
        let mut all: Vec<_> = self
            .indices
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn total_documents(&self) -> usize {
        self.all().iter().map(|(_, index)| index.read().len()).sum()
    }

    /// Document count per language, sorted by language.
    pub fn document_counts(&self) -> Vec<(String, usize)> {
        self.all()
            .into_iter()
            .map(|(language, index)| {
                let count = index.read().len();
                (language, count)
            })
            .collect()
    }

    pub fn memory_bytes(&self) -> usize {
        self.all()
            .iter()
            .map(|(_, index)| index.read().memory_bytes())
            .sum()
    }

    /// Rebuilds every backend; failures are logged and counted.
    pub fn optimize_all(&self) -> usize {
        let mut failures = 0;
        for (language, index) in self.all() {
            if let Err(e) = index.write().optimize() {
                warn!(language = %language, error = %e, "index rebuild failed");
                failures += 1;
            }
        }
        failures
    }

    /// Writes each non-empty index into `base/<language>/`.
    pub fn save_segments(&self, base: &Path) -> Result<usize, PersistenceError> {
        let mut saved = 0;
        for (language, index) in self.all() {
            let index = index.read();
            if index.is_empty() {
                continue;
            }
            index.save(&base.join(&language))?;
            saved += 1;
        }
        Ok(saved)
    }
}
