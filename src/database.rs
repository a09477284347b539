//! The database facade tying embeddings, indices, search and persistence
//! together.
//!
//! A [`VectorDatabase`] is an ordinary value: build one per data directory,
//! share it by reference (it is `Send + Sync`), and call
//! [`close`](VectorDatabase::close) for the final flush.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::embedding::{Embedding, EmbeddingBackend, EmbeddingGenerator, EmbeddingModel, ModelRegistry};
use crate::error::{GlossaError, GlossaResult};
use crate::features::{FeatureRegistry, PhoneticProfile};
use crate::index::{IndexRegistry, LanguageIndex, validate_language};
use crate::search::SearchEngine;
use crate::stats::{MemoryUsage, Stats, StatsSnapshot};
use crate::storage::{JsonFileBackend, MetadataBackend, MetadataStore, Snapshot, SnapshotHeader};
use crate::types::{DocId, Document, Metadata, SearchOptions, SearchResult, SlotCounter, document_id};
use crate::vector::{VectorDimension, VectorSlot};

/// Directory under the data path holding one vector segment per language.
const VECTORS_DIR: &str = "vectors";

/// Configures optional collaborators before building a [`VectorDatabase`].
pub struct VectorDatabaseBuilder {
    settings: Settings,
    embedding_backend: Option<Arc<dyn EmbeddingBackend>>,
    metadata_backend: Option<Arc<dyn MetadataBackend>>,
    features: Option<FeatureRegistry>,
}

impl VectorDatabaseBuilder {
    /// Routes embedding generation through a real encoder.
    pub fn embedding_backend(mut self, backend: Arc<dyn EmbeddingBackend>) -> Self {
        self.embedding_backend = Some(backend);
        self
    }

    /// Replaces the default `snapshot.json` file with another durable store.
    pub fn metadata_backend(mut self, backend: Arc<dyn MetadataBackend>) -> Self {
        self.metadata_backend = Some(backend);
        self
    }

    /// Uses a custom set of feature extractors instead of the built-in one.
    pub fn feature_registry(mut self, features: FeatureRegistry) -> Self {
        self.features = Some(features);
        self
    }

    pub fn build(self) -> GlossaResult<VectorDatabase> {
        let settings = self.settings;
        settings.validate()?;

        let models = Arc::new(ModelRegistry::from_config(&settings.embedding)?);
        let features = Arc::new(self.features.unwrap_or_else(FeatureRegistry::with_defaults));

        let mut generator =
            EmbeddingGenerator::new(&settings.embedding, Arc::clone(&models), Arc::clone(&features));
        if let Some(backend) = self.embedding_backend {
            generator = generator.with_backend(backend);
        }
        let generator = Arc::new(generator);

        let indices = Arc::new(IndexRegistry::new(&settings.index));
        for language in &settings.index.preload_languages {
            let model = models.select_model(language);
            indices.create(language, model.dimension, &model.name)?;
        }

        let data_path = settings.resolved_data_path();
        let persistence = if settings.persistence.enabled {
            Some(
                self.metadata_backend
                    .unwrap_or_else(|| Arc::new(JsonFileBackend::new(&data_path))),
            )
        } else {
            None
        };

        let metadata = MetadataStore::new();
        let stats = Arc::new(Stats::new());
        let search = SearchEngine::new(
            Arc::clone(&indices),
            Arc::clone(&generator),
            Arc::clone(&features),
            metadata.clone(),
            Arc::clone(&stats),
        );

        debug!(
            kind = %settings.index.kind,
            languages = indices.len(),
            persistence = persistence.is_some(),
            "vector database ready"
        );

        Ok(VectorDatabase {
            settings,
            data_path,
            models,
            features,
            generator,
            indices,
            metadata,
            search,
            stats,
            slots: SlotCounter::new(),
            persistence,
            persist_state: Mutex::new(None),
            unsaved: AtomicUsize::new(0),
        })
    }
}

/// Multilingual document store with per-language indices.
pub struct VectorDatabase {
    settings: Settings,
    data_path: PathBuf,
    models: Arc<ModelRegistry>,
    features: Arc<FeatureRegistry>,
    generator: Arc<EmbeddingGenerator>,
    indices: Arc<IndexRegistry>,
    metadata: MetadataStore,
    search: SearchEngine,
    stats: Arc<Stats>,
    slots: SlotCounter,
    persistence: Option<Arc<dyn MetadataBackend>>,
    /// Held for the whole of every save and load; remembers when the first
    /// snapshot was created.
    persist_state: Mutex<Option<DateTime<Utc>>>,
    unsaved: AtomicUsize,
}

impl std::fmt::Debug for VectorDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDatabase")
            .field("data_path", &self.data_path)
            .field("languages", &self.indices.languages())
            .field("documents", &self.metadata.len())
            .field("persistence", &self.persistence.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

impl VectorDatabase {
    /// Empty database with the built-in collaborators.
    pub fn new(settings: Settings) -> GlossaResult<Self> {
        Self::builder(settings).build()
    }

    pub fn builder(settings: Settings) -> VectorDatabaseBuilder {
        VectorDatabaseBuilder {
            settings,
            embedding_backend: None,
            metadata_backend: None,
            features: None,
        }
    }

    /// Builds a database and loads any saved state.
    ///
    /// A snapshot that cannot be read is logged and the database starts
    /// empty.
    pub fn open(settings: Settings) -> GlossaResult<Self> {
        let db = Self::new(settings)?;
        if let Err(e) = db.load() {
            warn!(error = %e, "could not load saved state, continuing in memory");
        }
        Ok(db)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Model that embeds `language`.
    pub fn model_for(&self, language: &str) -> Arc<EmbeddingModel> {
        self.models.select_model(language)
    }

    /// Unit-length embedding for `text`, never failing.
    pub fn embed(&self, text: &str, language: &str) -> Embedding {
        self.generator.generate(text, language)
    }

    /// Search options seeded from the `[search]` settings.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::from_config(&self.settings.search)
    }

    /// Embeds and stores a document, returning its id.
    ///
    /// Fails only on configuration problems: an invalid language code, or a
    /// language index whose dimension disagrees with the selected model.
    pub fn add_document(&self, text: &str, language: &str, metadata: Metadata) -> GlossaResult<DocId> {
        validate_language(language)?;

        let embedding = self.generator.generate(text, language);
        let cultural_context = self.features.cultural_context(text, language);
        let phonetic_profile = PhoneticProfile::analyze(text);
        let index = self.indices.get_or_create(language, embedding.model.dimension);

        let stored = {
            let mut index = index.write();
            if index.dimension() != embedding.model.dimension {
                return Err(GlossaError::DimensionMismatch {
                    language: language.to_string(),
                    model: embedding.model.name.clone(),
                    expected: index.dimension().get(),
                    actual: embedding.model.dimension.get(),
                });
            }

            let slot = self.claim_slot()?;
            let added_at = Utc::now();
            let document = Document {
                id: document_id(text, language, &metadata, added_at, slot),
                text: text.to_string(),
                language: language.to_string(),
                embedding: embedding.vector.to_vec(),
                metadata,
                added_at,
                vector_slot: slot,
                model: embedding.model.name.clone(),
                cultural_context,
                phonetic_profile,
            };
            index.insert(document)?
        };

        let id = self.metadata.insert(Arc::clone(&stored));
        self.stats.record_add();
        debug!(id = %id, language, slot = %stored.vector_slot, source = ?embedding.source, "document added");

        self.maybe_autosave();
        Ok(id)
    }

    fn claim_slot(&self) -> GlossaResult<VectorSlot> {
        self.slots
            .next_slot()
            .ok_or_else(|| GlossaError::SlotExhausted {
                count: self.slots.current_count(),
            })
    }

    fn maybe_autosave(&self) {
        let every = self.settings.persistence.autosave_every;
        if self.persistence.is_none() || every == 0 {
            return;
        }
        let pending = self.unsaved.fetch_add(1, Ordering::AcqRel) + 1;
        if pending >= every {
            debug!(pending, "autosave triggered");
            self.flush();
        }
    }

    pub fn get_document(&self, id: &DocId) -> Option<Arc<Document>> {
        self.metadata.get(id)
    }

    /// Ranked results for `query`; a missing index or no match yields `[]`.
    pub fn search(&self, query: &str, language: &str, options: &SearchOptions) -> Vec<SearchResult> {
        self.search.search(query, language, options)
    }

    /// Creates the index for `language` ahead of the first document.
    pub fn create_index(&self, language: &str) -> GlossaResult<()> {
        let model = self.models.select_model(language);
        self.indices.create(language, model.dimension, &model.name)?;
        Ok(())
    }

    /// Languages with an index, sorted.
    pub fn languages(&self) -> Vec<String> {
        self.indices.languages()
    }

    pub fn document_count(&self) -> usize {
        self.metadata.len()
    }

    /// Writes the metadata snapshot and vector segments.
    ///
    /// Does nothing when persistence is disabled. Saves are serialized, so a
    /// later save never loses documents to an earlier one.
    pub fn save(&self) -> GlossaResult<()> {
        let Some(backend) = &self.persistence else {
            debug!("persistence disabled, skipping save");
            return Ok(());
        };

        let mut created = self.persist_state.lock();
        let pending = self.unsaved.load(Ordering::Acquire);
        let documents: Vec<Document> = self
            .metadata
            .documents()
            .iter()
            .map(|d| d.as_ref().clone())
            .collect();

        let mut header =
            SnapshotHeader::new(self.indices.kind(), documents.len(), self.slots.current_count());
        if let Some(first) = *created {
            header.created_at = first;
        }

        let created_at = header.created_at;
        let count = documents.len();
        backend.save(&Snapshot { header, documents })?;
        let segments = self.indices.save_segments(&self.data_path.join(VECTORS_DIR))?;

        *created = Some(created_at);
        // Adds counted after `pending` was read still wait for the next save
        self.unsaved.fetch_sub(pending, Ordering::AcqRel);
        info!(backend = backend.name(), documents = count, segments, "database saved");
        Ok(())
    }

    /// [`save`](Self::save), logging instead of failing. Returns whether the
    /// save succeeded.
    pub fn flush(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "save failed, continuing in memory");
                false
            }
        }
    }

    /// Loads saved documents, returning how many were added.
    ///
    /// Documents already present are skipped. When this database has
    /// already handed out slots, loaded documents get fresh ones so they
    /// never collide with documents added since startup. Languages whose
    /// saved documents disagree on dimension are skipped with a warning.
    pub fn load(&self) -> GlossaResult<usize> {
        let Some(backend) = &self.persistence else {
            return Ok(0);
        };

        let mut created = self.persist_state.lock();
        let Some(snapshot) = backend.load()? else {
            debug!(backend = backend.name(), "no saved snapshot");
            return Ok(0);
        };

        if snapshot.header.index_kind != self.indices.kind() {
            info!(
                saved = %snapshot.header.index_kind,
                configured = %self.indices.kind(),
                "index kind changed, rebuilding from embeddings"
            );
        }

        let mut incoming: Vec<Document> = snapshot
            .documents
            .into_iter()
            .filter(|document| !self.metadata.contains(&document.id))
            .collect();

        let reslot = self.slots.current_count() > 0;
        if reslot {
            incoming.sort_by_key(|d| d.vector_slot);
            for document in &mut incoming {
                document.vector_slot = self.claim_slot()?;
            }
        } else if snapshot.header.next_slot > 0 {
            self.slots
                .advance_past(VectorSlot::new(snapshot.header.next_slot - 1));
        }

        let mut by_language: BTreeMap<String, Vec<Document>> = BTreeMap::new();
        for document in incoming {
            by_language
                .entry(document.language.clone())
                .or_default()
                .push(document);
        }

        let mut loaded = 0;
        for (language, documents) in by_language {
            match self.load_language(&language, documents) {
                Ok(count) => loaded += count,
                Err(e) => warn!(language = %language, error = %e, "skipping saved language"),
            }
        }

        let saved_at = snapshot.header.created_at;
        let first = created.map_or(saved_at, |first| first.min(saved_at));
        *created = Some(first);

        info!(documents = loaded, reslot, languages = self.indices.len(), "database loaded");
        Ok(loaded)
    }

    fn load_language(&self, language: &str, documents: Vec<Document>) -> GlossaResult<usize> {
        validate_language(language)?;
        let Some(first) = documents.first() else {
            return Ok(0);
        };
        let dimension = VectorDimension::new(first.embedding.len())?;
        let model = self.models.select_model(language);
        if model.dimension != dimension {
            warn!(
                language,
                saved = dimension.get(),
                model = %model.name,
                configured = model.dimension.get(),
                "saved dimension differs from configured model; new documents will be rejected"
            );
        }

        let max_slot = documents.iter().map(|d| d.vector_slot).max();
        let count = documents.len();

        // Adds to this language wait until the saved documents are in
        let shared = self.indices.get_or_create(language, dimension);
        let mut index = shared.write();

        if index.is_empty() {
            let restored = LanguageIndex::restore(
                language,
                dimension,
                self.indices.kind(),
                &self.settings.index,
                documents,
                Some(&self.data_path.join(VECTORS_DIR).join(language)),
            )?;
            self.metadata.insert_batch(restored.documents());
            *index = restored;
        } else {
            for mut document in documents {
                if index.contains_slot(document.vector_slot) {
                    document.vector_slot = self.claim_slot()?;
                }
                let stored = index.insert(document)?;
                self.metadata.insert(stored);
            }
        }

        if let Some(slot) = max_slot {
            self.slots.advance_past(slot);
        }
        Ok(count)
    }

    /// Rebuilds every index backend, records the time, then flushes.
    pub fn optimize(&self) -> DateTime<Utc> {
        let failures = self.indices.optimize_all();
        let when = self.stats.mark_optimized();
        info!(indices = self.indices.len(), failures, "optimization finished");
        self.flush();
        when
    }

    pub fn clear_cache(&self) {
        self.generator.cache().clear();
    }

    pub fn stats(&self) -> StatsSnapshot {
        let cache = self.generator.cache();
        StatsSnapshot {
            total_vectors: u64::from(self.slots.current_count()),
            total_documents: self.metadata.len(),
            total_indices: self.indices.len(),
            cached_embeddings: cache.len(),
            cache_hit_rate: cache.hit_rate(),
            fallback_embeddings: self.generator.fallback_count(),
            search_count: self.stats.search_count(),
            avg_search_time_ms: self.stats.avg_search_time_ms(),
            last_optimization: self.stats.last_optimization(),
            index_kind: self.indices.kind(),
            documents_per_language: self.indices.document_counts().into_iter().collect(),
            memory: MemoryUsage {
                index_bytes: self.indices.memory_bytes(),
                metadata_bytes: self.metadata.memory_bytes(),
                cache_bytes: cache.memory_bytes(),
            },
        }
    }

    /// Final save; consumes the database.
    pub fn close(self) -> GlossaResult<()> {
        self.save()
    }
}
