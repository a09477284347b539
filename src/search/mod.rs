//! Query execution over the language indices.

mod boost;
mod engine;

pub use boost::{QuerySignals, adjusted_score};
pub use engine::SearchEngine;
