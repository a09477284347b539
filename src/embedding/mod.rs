//! Embedding generation: model selection, caching and fallback.

mod cache;
mod generator;
mod registry;

pub use cache::{CacheKey, EmbeddingCache};
pub use generator::{Embedding, EmbeddingBackend, EmbeddingGenerator, EmbeddingSource};
pub use registry::{EmbeddingModel, ModelRegistry};
