//! Text to unit vector, never failing.
//!
//! Generation order for a `(text, language)` pair:
//! 1. resolve the model through the [`ModelRegistry`]
//! 2. serve from the [`EmbeddingCache`] when possible
//! 3. ask the injected [`EmbeddingBackend`], bounded by a timeout
//! 4. otherwise (or when the backend fails) build a deterministic
//!    pseudo-embedding, feature-amplified for custom models
//! 5. if even that is unusable, return a random low-magnitude unit vector
//!
//! Only steps 3 and 4 populate the cache, so cached vectors are always
//! reproducible.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::cache::{CacheKey, EmbeddingCache};
use super::registry::{EmbeddingModel, ModelRegistry};
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, EmbeddingResult};
use crate::features::FeatureRegistry;
use crate::types::text_hash;
use crate::vector::{l2_norm, normalize};

/// Dimension bands amplified for custom models: `(start, end, factor)`.
const GLOTTAL_BAND: (usize, usize, f32) = (0, 50, 1.3);
const EJECTIVE_BAND: (usize, usize, f32) = (50, 100, 1.2);
const NASAL_BAND: (usize, usize, f32) = (100, 150, 1.15);

/// Stride used to spread root perturbations across dimensions.
const ROOT_STRIDE: usize = 37;

/// Scale of the random fallback vector before normalization.
const FALLBACK_SCALE: f32 = 0.1;

/// A real encoder plugged in behind the generator.
///
/// Calls run on a separate thread; the generator stops waiting after the
/// configured timeout and degrades to the pseudo-embedding.
pub trait EmbeddingBackend: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Embeds `text`. The result must have `model.dimension` entries; it is
    /// normalized by the generator.
    fn infer(&self, text: &str, language: &str, model: &EmbeddingModel) -> EmbeddingResult<Vec<f32>>;
}

/// Where an embedding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSource {
    Cache,
    Backend,
    Pseudo,
    /// Random vector; not reproducible and never cached.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Embedding {
    pub model: Arc<EmbeddingModel>,
    pub vector: Arc<[f32]>,
    pub source: EmbeddingSource,
}

pub struct EmbeddingGenerator {
    models: Arc<ModelRegistry>,
    features: Arc<FeatureRegistry>,
    cache: EmbeddingCache,
    backend: Option<Arc<dyn EmbeddingBackend>>,
    backend_timeout: Duration,
    fallbacks: AtomicU64,
}

impl std::fmt::Debug for EmbeddingGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingGenerator")
            .field("models", &self.models.models().len())
            .field("cached", &self.cache.len())
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("backend_timeout", &self.backend_timeout)
            .finish()
    }
}

impl EmbeddingGenerator {
    pub fn new(
        config: &EmbeddingConfig,
        models: Arc<ModelRegistry>,
        features: Arc<FeatureRegistry>,
    ) -> Self {
        Self {
            models,
            features,
            cache: EmbeddingCache::new(config.cache_capacity),
            backend: None,
            backend_timeout: Duration::from_millis(config.backend_timeout_ms),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Routes cache misses through `backend` first.
    pub fn with_backend(mut self, backend: Arc<dyn EmbeddingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Number of random fallback vectors handed out.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Returns a unit vector of the selected model's dimension.
    pub fn generate(&self, text: &str, language: &str) -> Embedding {
        let model = self.models.select_model(language);
        let key = CacheKey::new(&model.name, language, text_hash(text));

        if let Some(vector) = self.cache.get(&key) {
            debug!(model = %model.name, language, "embedding cache hit");
            return Embedding {
                model,
                vector,
                source: EmbeddingSource::Cache,
            };
        }

        match self.compute(text, language, &model) {
            Ok((vector, source)) => {
                let vector: Arc<[f32]> = Arc::from(vector);
                self.cache.insert(key, Arc::clone(&vector));
                Embedding {
                    model,
                    vector,
                    source,
                }
            }
            Err(e) => {
                warn!(model = %model.name, language, error = %e, "embedding generation degraded to fallback vector");
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                Embedding {
                    vector: Arc::from(fallback_vector(model.dimension.get())),
                    model,
                    source: EmbeddingSource::Fallback,
                }
            }
        }
    }

    fn compute(
        &self,
        text: &str,
        language: &str,
        model: &Arc<EmbeddingModel>,
    ) -> EmbeddingResult<(Vec<f32>, EmbeddingSource)> {
        if let Some(backend) = &self.backend {
            match self.infer_with_timeout(backend, text, language, model) {
                Ok(vector) => return Ok((vector, EmbeddingSource::Backend)),
                Err(e) => {
                    warn!(backend = backend.name(), language, error = %e, "embedding backend failed, using pseudo-embedding");
                }
            }
        }

        let raw = if model.is_custom {
            self.custom_embedding(text, language, model.dimension.get())
        } else {
            standard_embedding(text, model.dimension.get())
        };
        finish(raw, model.dimension.get()).map(|v| (v, EmbeddingSource::Pseudo))
    }

    fn infer_with_timeout(
        &self,
        backend: &Arc<dyn EmbeddingBackend>,
        text: &str,
        language: &str,
        model: &Arc<EmbeddingModel>,
    ) -> EmbeddingResult<Vec<f32>> {
        let (tx, rx) = bounded(1);
        let worker_backend = Arc::clone(backend);
        let worker_model = Arc::clone(model);
        let (text_owned, language_owned) = (text.to_string(), language.to_string());

        std::thread::Builder::new()
            .name("glossa-embed".to_string())
            .spawn(move || {
                let result = worker_backend.infer(&text_owned, &language_owned, &worker_model);
                // Receiver may have timed out already
                let _ = tx.send(result);
            })
            .map_err(|e| EmbeddingError::Backend {
                backend: backend.name().to_string(),
                reason: format!("failed to spawn worker: {e}"),
            })?;

        let vector = match rx.recv_timeout(self.backend_timeout) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => {
                return Err(EmbeddingError::BackendTimeout {
                    backend: backend.name().to_string(),
                    timeout_ms: self.backend_timeout.as_millis() as u64,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(EmbeddingError::BackendDisconnected {
                    backend: backend.name().to_string(),
                });
            }
        };

        finish(vector, model.dimension.get())
    }

    /// Hash-seeded base vector with phonetic band amplification and root
    /// perturbations.
    ///
    /// Features are read from the lower-cased text because the cache key is
    /// case-insensitive.
    fn custom_embedding(&self, text: &str, language: &str, dimension: usize) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let mut rng = seeded_rng(&lowered);
        let mut vector: Vec<f32> = (0..dimension)
            .map(|_| rng.random_range(-1.0f32..1.0))
            .collect();

        let features = self.features.extract_features(&lowered, language);
        let bands = [
            (features.has_glottal_stop, GLOTTAL_BAND),
            (features.has_ejective, EJECTIVE_BAND),
            (features.has_nasalization, NASAL_BAND),
        ];
        for (_, (start, end, factor)) in bands.into_iter().filter(|(active, _)| *active) {
            let end = end.min(dimension);
            if start < end {
                vector[start..end].iter_mut().for_each(|v| *v *= factor);
            }
        }

        for (i, root) in self
            .features
            .extract_roots(&lowered, language)
            .iter()
            .enumerate()
        {
            vector[(i * ROOT_STRIDE) % dimension] += root.importance;
        }

        vector
    }
}

/// Hash-seeded stand-in for a real encoder.
fn standard_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut rng = seeded_rng(&text.to_lowercase());
    (0..dimension)
        .map(|_| rng.random_range(-0.5f32..0.5))
        .collect()
}

fn seeded_rng(lowered: &str) -> StdRng {
    let hash = text_hash(lowered);
    let seed = u64::from_str_radix(&hash[..16], 16).unwrap_or_default();
    StdRng::seed_from_u64(seed)
}

/// Validates a raw vector and normalizes it to unit length.
fn finish(mut vector: Vec<f32>, dimension: usize) -> EmbeddingResult<Vec<f32>> {
    if vector.len() != dimension {
        return Err(EmbeddingError::WrongDimension {
            expected: dimension,
            actual: vector.len(),
        });
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::NonFinite);
    }
    if normalize(&mut vector) == 0.0 {
        return Err(EmbeddingError::ZeroNorm);
    }
    Ok(vector)
}

/// Small random unit vector used when nothing better is available.
fn fallback_vector(dimension: usize) -> Vec<f32> {
    let mut rng = rand::rng();
    let mut vector: Vec<f32> = (0..dimension)
        .map(|_| (rng.random::<f32>() - 0.5) * FALLBACK_SCALE)
        .collect();
    if normalize(&mut vector) == 0.0 && dimension > 0 {
        vector[0] = 1.0;
    }
    debug_assert!(dimension == 0 || (l2_norm(&vector) - 1.0).abs() < 1e-4);
    vector
}
