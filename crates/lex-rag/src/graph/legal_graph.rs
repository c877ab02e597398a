//! Legal knowledge graph index.
//!
//! Loads the static node/edge graph (súmulas, temas, domínios, artigos,
//! conceitos) once and serves point lookups, bounded-depth traversals, and
//! keyword search over it. The graph is immutable after load; share it with
//! `Arc<LegalGraph>` across concurrent pipeline invocations.

use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use crate::error::{LexError, LoadError};
use crate::types::{Cenario, NodeType, Obrigatoriedade, Tribunal};

/// On-disk graph document: `{ metadata, nodes, edges }`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub metadata: GraphMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphMetadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub node_types: Vec<String>,
    #[serde(default)]
    pub edge_types: Vec<String>,
    #[serde(default)]
    pub stats: serde_json::Value,
}

/// Nested detail block some graph builds use instead of top-level
/// cenarios/vedacoes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detalhamento {
    #[serde(default)]
    pub cenarios: Vec<Cenario>,
    #[serde(default)]
    pub vedacoes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub numero: Option<u32>,
    #[serde(default)]
    pub texto: Option<String>,
    #[serde(default)]
    pub tese: Option<String>,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub tribunal: Option<Tribunal>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub cenarios: Vec<Cenario>,
    #[serde(default)]
    pub vedacoes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detalhamento: Option<Detalhamento>,
}

impl GraphNode {
    /// Body text: `texto` for súmulas, `tese` for temas.
    pub fn body_text(&self) -> Option<&str> {
        self.texto.as_deref().or(self.tese.as_deref())
    }

    /// Display name: `nome` for domínios, `descricao` otherwise.
    pub fn display_name(&self) -> Option<&str> {
        self.nome.as_deref().or(self.descricao.as_deref())
    }

    /// Cenarios from the top-level field, falling back to `detalhamento`.
    pub fn resolved_cenarios(&self) -> &[Cenario] {
        if !self.cenarios.is_empty() {
            return &self.cenarios;
        }
        self.detalhamento
            .as_ref()
            .map(|d| d.cenarios.as_slice())
            .unwrap_or(&[])
    }

    /// Vedacoes from the top-level field, falling back to `detalhamento`.
    pub fn resolved_vedacoes(&self) -> &[String] {
        if !self.vedacoes.is_empty() {
            return &self.vedacoes;
        }
        self.detalhamento
            .as_ref()
            .map(|d| d.vedacoes.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Requires,
    Governs,
    RelatedTo,
    Modifies,
    Cites,
    AppliesTo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    #[serde(default)]
    pub obrigatoriedade: Option<Obrigatoriedade>,
    #[serde(default)]
    pub prioridade: Option<u32>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub contexto: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub properties: EdgeProperties,
}

/// Traversal direction for multi-hop queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    Outgoing,
    Incoming,
    Both,
}

/// A súmula or tema required by a domain, with requirement metadata pulled
/// from the REQUIRES edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainItem {
    pub node: GraphNode,
    pub obrigatoriedade: Obrigatoriedade,
    pub prioridade: u32,
}

/// A tema together with its resolved cenarios and vedacoes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemaDetail {
    pub node: GraphNode,
    pub cenarios: Vec<Cenario>,
    pub vedacoes: Vec<String>,
}

/// Node reached by a multi-hop traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversedNode {
    pub node: GraphNode,
    pub hop_distance: usize,
    /// Node ids from the start node to this node, inclusive.
    pub path: Vec<String>,
}

/// One edge step within a relationship path; `reversed` means the edge was
/// followed against its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationStep {
    pub edge: GraphEdge,
    pub reversed: bool,
}

/// A simple path connecting two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationPath {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<RelationStep>,
    pub length: usize,
}

/// Keyword search hit with its accumulated relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub node: GraphNode,
    pub relevance_score: u32,
}

/// How a related legal source is connected to the queried node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    RelatedTo,
    SameDomain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedSource {
    pub node: GraphNode,
    pub relation: RelationKind,
    pub description: Option<String>,
    pub shared_domain: Option<String>,
}

/// A node that modifies or supersedes a súmula, via an incoming MODIFIES edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub node: GraphNode,
    pub modification_type: Option<String>,
    pub description: Option<String>,
}

/// A concept applied by a mandatory or applicable item.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedConcept {
    pub node: GraphNode,
    pub applied_by: String,
    pub context: Option<String>,
}

/// Composed retrieval context for a legal query.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub domain: Option<GraphNode>,
    pub mandatory_sumulas: Vec<DomainItem>,
    pub applicable_temas: Vec<TemaDetail>,
    pub related_by_keyword: Vec<KeywordMatch>,
    pub concepts_applied: Vec<AppliedConcept>,
}

/// The loaded, indexed legal knowledge graph.
#[derive(Debug)]
pub struct LegalGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    id_to_node: HashMap<String, NodeIndex>,
    metadata: GraphMetadata,
}

impl LegalGraph {
    /// Load the graph from a JSON file. Malformed files are fatal.
    pub fn load(path: &Path) -> Result<Self, LexError> {
        let content = std::fs::read_to_string(path).map_err(|e| LexError::GraphLoad {
            path: path.to_path_buf(),
            source: LoadError::Io(e),
        })?;
        let document: GraphDocument =
            serde_json::from_str(&content).map_err(|e| LexError::GraphLoad {
                path: path.to_path_buf(),
                source: LoadError::Json(e),
            })?;
        Ok(Self::from_document(document))
    }

    /// Build the index from an already-parsed document.
    ///
    /// Edges referencing unknown node ids are skipped with a warning; the
    /// loader tolerates them so a partially-enriched graph still serves.
    pub fn from_document(document: GraphDocument) -> Self {
        let mut graph = DiGraph::with_capacity(document.nodes.len(), document.edges.len());
        let mut id_to_node = HashMap::with_capacity(document.nodes.len());

        for node in document.nodes {
            let id = node.id.clone();
            let idx = graph.add_node(node);
            id_to_node.insert(id, idx);
        }

        for edge in document.edges {
            let (Some(&source), Some(&target)) =
                (id_to_node.get(&edge.source), id_to_node.get(&edge.target))
            else {
                tracing::warn!(
                    source = %edge.source,
                    target = %edge.target,
                    edge_type = ?edge.edge_type,
                    "edge references unknown node, skipping"
                );
                continue;
            };
            graph.add_edge(source, target, edge);
        }

        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            version = %document.metadata.version,
            "legal knowledge graph loaded"
        );

        Self {
            graph,
            id_to_node,
            metadata: document.metadata,
        }
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn stats(&self) -> &serde_json::Value {
        &self.metadata.stats
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.id_to_node.get(id).map(|&idx| &self.graph[idx])
    }

    /// All nodes of a given type, in load order.
    pub fn nodes_by_type(&self, node_type: NodeType) -> Vec<&GraphNode> {
        self.graph
            .node_weights()
            .filter(|n| n.node_type == node_type)
            .collect()
    }

    /// The Dominio node for a domain name (e.g. "bancario").
    pub fn domain(&self, name: &str) -> Option<&GraphNode> {
        self.node(&format!("DOMINIO_{name}"))
    }

    /// All known domain names.
    pub fn all_domains(&self) -> Vec<String> {
        self.nodes_by_type(NodeType::Dominio)
            .into_iter()
            .map(|n| n.id.trim_start_matches("DOMINIO_").to_string())
            .collect()
    }

    /// Edges at a node in load order. petgraph iterates adjacency newest
    /// first, so restore insertion order to keep priority ties deterministic.
    fn ordered_edges(
        &self,
        idx: NodeIndex,
        direction: Direction,
    ) -> Vec<EdgeReference<'_, GraphEdge>> {
        let mut edges: Vec<_> = self.graph.edges_directed(idx, direction).collect();
        edges.sort_by_key(|e| e.id().index());
        edges
    }

    /// Súmulas and temas required by a domain, sorted ascending by priority.
    ///
    /// Follows outgoing REQUIRES edges from the DOMINIO node; requirement
    /// metadata defaults to SEMPRE/999 when the edge carries none. Unknown
    /// domains yield an empty list.
    pub fn sumulas_for_domain(&self, domain: &str) -> Vec<DomainItem> {
        let Some(&idx) = self.id_to_node.get(&format!("DOMINIO_{domain}")) else {
            return Vec::new();
        };

        let mut results: Vec<DomainItem> = self
            .ordered_edges(idx, Direction::Outgoing)
            .into_iter()
            .filter(|e| e.weight().edge_type == EdgeType::Requires)
            .filter_map(|e| {
                let target = &self.graph[e.target()];
                if !matches!(target.node_type, NodeType::Sumula | NodeType::Tema) {
                    return None;
                }
                Some(DomainItem {
                    node: target.clone(),
                    obrigatoriedade: e
                        .weight()
                        .properties
                        .obrigatoriedade
                        .unwrap_or(Obrigatoriedade::Sempre),
                    prioridade: e.weight().properties.prioridade.unwrap_or(999),
                })
            })
            .collect();

        // Stable sort: ties keep edge-encounter order.
        results.sort_by_key(|item| item.prioridade);
        results
    }

    /// Súmulas/temas whose requirement is unconditional.
    pub fn mandatory_sumulas_for_domain(&self, domain: &str) -> Vec<DomainItem> {
        self.sumulas_for_domain(domain)
            .into_iter()
            .filter(|item| item.obrigatoriedade == Obrigatoriedade::Sempre)
            .collect()
    }

    /// Temas required by a domain, with cenarios and vedacoes resolved.
    pub fn temas_for_domain(&self, domain: &str) -> Vec<TemaDetail> {
        self.sumulas_for_domain(domain)
            .into_iter()
            .filter(|item| item.node.node_type == NodeType::Tema)
            .map(|item| TemaDetail {
                cenarios: item.node.resolved_cenarios().to_vec(),
                vedacoes: item.node.resolved_vedacoes().to_vec(),
                node: item.node,
            })
            .collect()
    }

    /// Tema lookup by number, with cenarios and vedacoes resolved.
    pub fn tema_with_cenarios(&self, numero: u32) -> Option<TemaDetail> {
        let node = self
            .graph
            .node_weights()
            .find(|n| n.node_type == NodeType::Tema && n.numero == Some(numero))?;
        Some(TemaDetail {
            cenarios: node.resolved_cenarios().to_vec(),
            vedacoes: node.resolved_vedacoes().to_vec(),
            node: node.clone(),
        })
    }

    /// Breadth-first traversal up to `max_hops`, following only edges whose
    /// type is in `edge_types`. The start node is excluded from results;
    /// already-visited nodes are not re-queued, so each reachable node is
    /// reported at its shortest hop distance.
    pub fn multi_hop_query(
        &self,
        start: &str,
        edge_types: &[EdgeType],
        max_hops: usize,
        direction: TraversalDirection,
    ) -> Vec<TraversedNode> {
        if !self.id_to_node.contains_key(start) {
            return Vec::new();
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut results = Vec::new();
        let mut queue: VecDeque<(String, usize, Vec<String>)> = VecDeque::new();
        queue.push_back((start.to_string(), 0, vec![start.to_string()]));

        while let Some((node_id, depth, path)) = queue.pop_front() {
            if visited.contains(&node_id) || depth > max_hops {
                continue;
            }
            visited.insert(node_id.clone());

            let Some(&idx) = self.id_to_node.get(&node_id) else {
                continue;
            };
            if depth > 0 {
                results.push(TraversedNode {
                    node: self.graph[idx].clone(),
                    hop_distance: depth,
                    path: path.clone(),
                });
            }

            if depth < max_hops {
                for (neighbor_idx, _) in self.neighbors(idx, edge_types, direction) {
                    let neighbor_id = &self.graph[neighbor_idx].id;
                    if !visited.contains(neighbor_id) {
                        let mut next_path = path.clone();
                        next_path.push(neighbor_id.clone());
                        queue.push_back((neighbor_id.clone(), depth + 1, next_path));
                    }
                }
            }
        }

        results
    }

    fn neighbors(
        &self,
        idx: NodeIndex,
        edge_types: &[EdgeType],
        direction: TraversalDirection,
    ) -> Vec<(NodeIndex, &GraphEdge)> {
        let mut neighbors = Vec::new();
        if matches!(
            direction,
            TraversalDirection::Outgoing | TraversalDirection::Both
        ) {
            for e in self.ordered_edges(idx, Direction::Outgoing) {
                if edge_types.contains(&e.weight().edge_type) {
                    neighbors.push((e.target(), e.weight()));
                }
            }
        }
        if matches!(
            direction,
            TraversalDirection::Incoming | TraversalDirection::Both
        ) {
            for e in self.ordered_edges(idx, Direction::Incoming) {
                if edge_types.contains(&e.weight().edge_type) {
                    neighbors.push((e.source(), e.weight()));
                }
            }
        }
        neighbors
    }

    /// All simple paths connecting `a` to `b` up to `max_hops` edges, found
    /// by BFS exploring both edge directions at each step. Sorted ascending
    /// by path length.
    pub fn find_relationship(&self, a: &str, b: &str, max_hops: usize) -> Vec<RelationPath> {
        if !self.id_to_node.contains_key(a) {
            return Vec::new();
        }

        let mut visited: HashSet<(String, usize)> = HashSet::new();
        let mut paths = Vec::new();
        let mut queue: VecDeque<(String, Vec<String>, Vec<RelationStep>)> = VecDeque::new();
        queue.push_back((a.to_string(), vec![a.to_string()], Vec::new()));

        while let Some((node_id, path, steps)) = queue.pop_front() {
            if path.len() > max_hops + 1 {
                continue;
            }
            if !visited.insert((node_id.clone(), path.len())) {
                continue;
            }

            if node_id == b && path.len() > 1 {
                paths.push(RelationPath {
                    nodes: path
                        .iter()
                        .filter_map(|id| self.node(id).cloned())
                        .collect(),
                    length: path.len() - 1,
                    edges: steps,
                });
                continue;
            }

            let Some(&idx) = self.id_to_node.get(&node_id) else {
                continue;
            };

            for e in self.ordered_edges(idx, Direction::Outgoing) {
                let target_id = &self.graph[e.target()].id;
                if !path.contains(target_id) {
                    let mut next_path = path.clone();
                    next_path.push(target_id.clone());
                    let mut next_steps = steps.clone();
                    next_steps.push(RelationStep {
                        edge: e.weight().clone(),
                        reversed: false,
                    });
                    queue.push_back((target_id.clone(), next_path, next_steps));
                }
            }

            for e in self.ordered_edges(idx, Direction::Incoming) {
                let source_id = &self.graph[e.source()].id;
                if !path.contains(source_id) {
                    let mut next_path = path.clone();
                    next_path.push(source_id.clone());
                    let mut next_steps = steps.clone();
                    next_steps.push(RelationStep {
                        edge: e.weight().clone(),
                        reversed: true,
                    });
                    queue.push_back((source_id.clone(), next_path, next_steps));
                }
            }
        }

        paths.sort_by_key(|p| p.length);
        paths
    }

    /// Case- and diacritic-insensitive keyword search over node keywords,
    /// body text, and display name. Scores accumulate per node: exact keyword
    /// match 10, partial keyword match 5, body text substring 3, name
    /// substring 4. Zero-score nodes are excluded; results sorted descending.
    pub fn search_by_keyword(
        &self,
        keyword: &str,
        node_types: Option<&[NodeType]>,
    ) -> Vec<KeywordMatch> {
        let needle = fold_for_search(keyword);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for node in self.graph.node_weights() {
            if let Some(types) = node_types {
                if !types.contains(&node.node_type) {
                    continue;
                }
            }

            let mut score = 0u32;

            for kw in &node.keywords {
                let folded = fold_for_search(kw);
                if folded.contains(&needle) {
                    score += if folded == needle { 10 } else { 5 };
                }
            }

            if let Some(text) = node.body_text() {
                if fold_for_search(text).contains(&needle) {
                    score += 3;
                }
            }

            if let Some(name) = node.display_name() {
                if fold_for_search(name).contains(&needle) {
                    score += 4;
                }
            }

            if score > 0 {
                results.push(KeywordMatch {
                    node: node.clone(),
                    relevance_score: score,
                });
            }
        }

        results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        results
    }

    /// Nodes related to `id` through RELATED_TO edges (either direction) or
    /// by governing the same domains. Deduplicated by id.
    pub fn related_legal_sources(&self, id: &str) -> Vec<RelatedSource> {
        let Some(&idx) = self.id_to_node.get(id) else {
            return Vec::new();
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut results = Vec::new();

        let mut edges = self.ordered_edges(idx, Direction::Outgoing);
        edges.extend(self.ordered_edges(idx, Direction::Incoming));
        for e in edges {
            if e.weight().edge_type != EdgeType::RelatedTo {
                continue;
            }
            let other_idx = if e.source() == idx { e.target() } else { e.source() };
            let other = &self.graph[other_idx];
            if seen.insert(other.id.clone()) {
                results.push(RelatedSource {
                    node: other.clone(),
                    relation: RelationKind::RelatedTo,
                    description: e.weight().properties.descricao.clone(),
                    shared_domain: None,
                });
            }
        }

        let current = &self.graph[idx];
        for domain in &current.domains {
            for item in self.sumulas_for_domain(domain) {
                if item.node.id != id && seen.insert(item.node.id.clone()) {
                    results.push(RelatedSource {
                        node: item.node,
                        relation: RelationKind::SameDomain,
                        description: None,
                        shared_domain: Some(domain.clone()),
                    });
                }
            }
        }

        results
    }

    /// Nodes that modify or supersede the given súmula (incoming MODIFIES).
    pub fn modifiers(&self, id: &str) -> Vec<Modifier> {
        let Some(&idx) = self.id_to_node.get(id) else {
            return Vec::new();
        };
        self.ordered_edges(idx, Direction::Incoming)
            .into_iter()
            .filter(|e| e.weight().edge_type == EdgeType::Modifies)
            .map(|e| Modifier {
                node: self.graph[e.source()].clone(),
                modification_type: e.weight().properties.tipo.clone(),
                description: e.weight().properties.descricao.clone(),
            })
            .collect()
    }

    /// Artigos cited as legal basis (outgoing CITES with tipo BASE_LEGAL).
    pub fn legal_basis(&self, id: &str) -> Vec<&GraphNode> {
        let Some(&idx) = self.id_to_node.get(id) else {
            return Vec::new();
        };
        self.ordered_edges(idx, Direction::Outgoing)
            .into_iter()
            .filter(|e| {
                e.weight().edge_type == EdgeType::Cites
                    && e.weight().properties.tipo.as_deref() == Some("BASE_LEGAL")
            })
            .map(|e| &self.graph[e.target()])
            .collect()
    }

    /// Compose the retrieval context for a legal query: mandatory súmulas,
    /// applicable temas with cenarios, up to three keyword matches per term
    /// (deduplicated against the mandatory set), and concepts applied by any
    /// mandatory or applicable item via APPLIES_TO edges.
    pub fn build_query_context(&self, domain: &str, keywords: &[String]) -> QueryContext {
        let mut context = QueryContext {
            domain: self.domain(domain).cloned(),
            mandatory_sumulas: self.mandatory_sumulas_for_domain(domain),
            applicable_temas: self.temas_for_domain(domain),
            related_by_keyword: Vec::new(),
            concepts_applied: Vec::new(),
        };

        let mut seen: HashSet<String> = context
            .mandatory_sumulas
            .iter()
            .map(|item| item.node.id.clone())
            .collect();

        for keyword in keywords {
            let matches = self.search_by_keyword(
                keyword,
                Some(&[NodeType::Sumula, NodeType::Tema, NodeType::Conceito]),
            );
            for m in matches.into_iter().take(3) {
                if seen.insert(m.node.id.clone()) {
                    context.related_by_keyword.push(m);
                }
            }
        }

        let mut concept_ids: HashSet<String> = HashSet::new();
        let item_ids: Vec<String> = context
            .mandatory_sumulas
            .iter()
            .map(|item| item.node.id.clone())
            .chain(context.applicable_temas.iter().map(|t| t.node.id.clone()))
            .collect();

        for item_id in item_ids {
            let Some(&idx) = self.id_to_node.get(&item_id) else {
                continue;
            };
            for e in self.ordered_edges(idx, Direction::Outgoing) {
                if e.weight().edge_type != EdgeType::AppliesTo {
                    continue;
                }
                let concept = &self.graph[e.target()];
                if concept.node_type == NodeType::Conceito && concept_ids.insert(concept.id.clone())
                {
                    context.concepts_applied.push(AppliedConcept {
                        node: concept.clone(),
                        applied_by: item_id.clone(),
                        context: e.weight().properties.contexto.clone(),
                    });
                }
            }
        }

        context
    }
}

/// Lowercase and strip Portuguese diacritics for accent-insensitive matching.
fn fold_for_search(text: &str) -> String {
    text.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
