//! Hybrid retrieval: rank fusion, the multi-stage orchestrator, and
//! prompt-context assembly.

pub mod context;
pub mod hybrid;
pub mod rrf;

pub use context::{
    build_augmented_context, format_context_for_prompt, AugmentedContext, ContextOptions,
    MandatoryCitation,
};
pub use hybrid::{
    HybridQuery, HybridResults, HybridSearch, HybridSearchOptions, ScenarioMatch, SearchMetadata,
    SearchTiming, SourceCounts, VectorHit, VectorSearchProvider,
};
pub use rrf::{reciprocal_rank_fusion, DEFAULT_RRF_K};
