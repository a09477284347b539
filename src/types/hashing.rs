//! SHA-256 helpers for cache keys and document ids.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::{DocId, Metadata};
use crate::vector::VectorSlot;

/// Length of a document id in hex characters.
const DOC_ID_LEN: usize = 16;

/// Calculate SHA256 hash of content
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Case-insensitive text hash used for embedding cache keys and seeds.
pub fn text_hash(text: &str) -> String {
    calculate_hash(&text.to_lowercase())
}

/// Derives a document id from everything that identifies one insertion.
///
/// The slot makes ids unique even for identical text added in the same
/// nanosecond.
pub fn document_id(
    text: &str,
    language: &str,
    metadata: &Metadata,
    added_at: DateTime<Utc>,
    slot: VectorSlot,
) -> DocId {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0]);
    hasher.update(language.as_bytes());
    hasher.update([0]);
    // BTreeMap serializes with sorted keys
    if let Ok(canonical) = serde_json::to_vec(metadata) {
        hasher.update(&canonical);
    }
    hasher.update([0]);
    let nanos = added_at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| added_at.timestamp_micros());
    hasher.update(nanos.to_le_bytes());
    hasher.update(slot.get().to_le_bytes());

    let digest = format!("{:x}", hasher.finalize());
    DocId::new(&digest[..DOC_ID_LEN])
}
