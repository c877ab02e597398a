//! lex-rag: hybrid retrieval and draft-validation engine for Brazilian
//! judicial decision drafting.
//!
//! The crate wires a knowledge graph of binding precedents (súmulas, temas
//! repetitivos, legal domains), a content-addressed draft cache with
//! confidence-tiered TTLs, a citation hallucination detector, and a hybrid
//! search stack (graph + vector + keyword, fused with Reciprocal Rank
//! Fusion) into a single generation pipeline.

pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod hallucination;
pub mod pipeline;
pub mod qa;
pub mod rag;
pub mod search;
pub mod types;

// Re-export primary types for convenience
pub use cache::{cache_key, ttl_for_confidence, CacheStore, CachedDraft, DraftCache, MemoryCache};
pub use config::{CacheConfig, FeatureFlags, LexConfig, SearchConfig};
pub use error::LexError;
pub use graph::LegalGraph;
pub use hallucination::{HallucinationDetector, HallucinationReport, ReferenceDb};
pub use pipeline::{DraftGenerator, GeneratedDraft, Pipeline, PipelineResult};
pub use qa::{run_parallel_qa, QaReport, QaScore, QaValidator};
pub use rag::{build_rag_query, extract_legal_terms, RagProvider};
pub use search::{
    reciprocal_rank_fusion, HybridQuery, HybridResults, HybridSearch, VectorSearchProvider,
};
pub use types::{CaseInput, SearchItem, Tribunal};

// Re-export common types
pub use anyhow::{Error, Result};
