//! Static table of embedding model descriptors.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::EmbeddingConfig;
use crate::error::{GlossaError, GlossaResult};
use crate::vector::VectorDimension;

/// Immutable description of one embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingModel {
    pub name: String,
    pub dimension: VectorDimension,
    pub languages: BTreeSet<String>,
    /// Higher wins when several models list the same language.
    pub priority: i32,
    /// Custom models amplify linguistic features into the vector.
    pub is_custom: bool,
}

impl EmbeddingModel {
    pub fn supports(&self, language: &str) -> bool {
        self.languages.contains(language)
    }
}

/// Resolves a language code to the model that embeds it.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<Arc<EmbeddingModel>>,
    fallback: Arc<EmbeddingModel>,
}

impl ModelRegistry {
    /// Builds the registry from the `[embedding]` settings section.
    ///
    /// Models are kept in name order so ties on priority resolve the same
    /// way on every run.
    pub fn from_config(config: &EmbeddingConfig) -> GlossaResult<Self> {
        let mut models = Vec::with_capacity(config.models.len());
        for (name, model) in &config.models {
            let dimension =
                VectorDimension::new(model.dimension).map_err(|_| GlossaError::InvalidConfig {
                    reason: format!("model '{name}' has dimension 0"),
                })?;
            models.push(Arc::new(EmbeddingModel {
                name: name.clone(),
                dimension,
                languages: model.languages.iter().cloned().collect(),
                priority: model.priority,
                is_custom: model.is_custom,
            }));
        }

        let fallback = models
            .iter()
            .find(|m| m.name == config.fallback_model)
            .cloned()
            .ok_or_else(|| GlossaError::InvalidConfig {
                reason: format!(
                    "fallback model '{}' is not defined in embedding.models",
                    config.fallback_model
                ),
            })?;

        Ok(Self { models, fallback })
    }

    /// Highest-priority model listing `language`, or the fallback model.
    pub fn select_model(&self, language: &str) -> Arc<EmbeddingModel> {
        let mut best: Option<&Arc<EmbeddingModel>> = None;
        for model in self.models.iter().filter(|m| m.supports(language)) {
            if best.is_none_or(|b| model.priority > b.priority) {
                best = Some(model);
            }
        }
        Arc::clone(best.unwrap_or(&self.fallback))
    }

    pub fn get(&self, name: &str) -> Option<Arc<EmbeddingModel>> {
        self.models.iter().find(|m| m.name == name).cloned()
    }

    pub fn fallback(&self) -> &Arc<EmbeddingModel> {
        &self.fallback
    }

    pub fn models(&self) -> &[Arc<EmbeddingModel>] {
        &self.models
    }

    /// Every language some model lists explicitly, sorted.
    pub fn known_languages(&self) -> BTreeSet<String> {
        self.models
            .iter()
            .flat_map(|m| m.languages.iter().cloned())
            .collect()
    }
}
