//! Knowledge graph index for the Brazilian legal knowledge base.

pub mod legal_graph;

pub use legal_graph::{
    AppliedConcept, Detalhamento, DomainItem, EdgeProperties, EdgeType, GraphDocument, GraphEdge,
    GraphMetadata, GraphNode, KeywordMatch, LegalGraph, Modifier, QueryContext, RelatedSource,
    RelationKind, RelationPath, RelationStep, TemaDetail, TraversalDirection, TraversedNode,
};
