//! Hybrid retrieval orchestrator.
//!
//! Fuses three stages over one query: the graph lookup (instant, always on),
//! vector similarity via an injected provider, and a keyword stage backed by
//! the graph's keyword index. Vector and keyword run concurrently; a missing
//! or failing provider degrades that stage to empty results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::SearchConfig;
use crate::graph::{GraphNode, LegalGraph, TemaDetail};
use crate::search::rrf::reciprocal_rank_fusion;
use crate::types::{Cenario, Obrigatoriedade, SearchItem, SourcePayload};

/// Domains where the Tema 1368 interest/correction scenario can apply.
const TEMA_1368_DOMAINS: [&str; 4] = [
    "bancario",
    "obrigacional",
    "cobranca",
    "responsabilidade_civil",
];

/// One hit from an external vector index.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorHit {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub numero: Option<u32>,
    #[serde(default)]
    pub texto: Option<String>,
    #[serde(default)]
    pub tribunal: Option<crate::types::Tribunal>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
    pub score: f32,
}

/// Vector similarity search over an external index. Injected where available;
/// the orchestrator works without one.
#[async_trait]
pub trait VectorSearchProvider: Send + Sync {
    async fn search(
        &self,
        embedding: &[f32],
        domain: Option<&str>,
        top_k: usize,
    ) -> anyhow::Result<Vec<VectorHit>>;
}

/// A retrieval query assembled from the case input.
#[derive(Debug, Clone, Default)]
pub struct HybridQuery {
    pub text: String,
    pub embedding: Option<Vec<f32>>,
    pub domain: Option<String>,
    pub legal_terms: Vec<String>,
    /// "contratual" or "extracontratual"; drives Tema 1368 matching.
    pub natureza_dano: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub graph: usize,
    pub vector: usize,
    pub bm25: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTiming {
    pub graph_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_ms: Option<u64>,
    pub bm25_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub sources: SourceCounts,
    pub timing: SearchTiming,
}

/// The Tema 1368 scenario that applies to this case, when one matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMatch {
    pub tema_numero: u32,
    pub cenario: Cenario,
    pub vedacoes: Vec<String>,
}

/// Fused retrieval output plus per-stage accounting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HybridResults {
    pub items: Vec<SearchItem>,
    pub metadata: SearchMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioMatch>,
    /// Captured stage error, reported rather than thrown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct HybridSearchOptions {
    pub top_k: usize,
    pub include_scenarios: bool,
}

fn graph_node_item(node: &GraphNode, obrigatoriedade: Obrigatoriedade, prioridade: u32) -> SearchItem {
    SearchItem {
        id: Some(node.id.clone()),
        node_type: Some(node.node_type),
        numero: node.numero,
        texto: node.body_text().map(str::to_string),
        tribunal: node.tribunal,
        domains: node.domains.clone(),
        keywords: node.keywords.clone(),
        cenarios: node.resolved_cenarios().to_vec(),
        content_hash: None,
        source: SourcePayload::Graph {
            obrigatoriedade,
            prioridade,
        },
        rrf: None,
    }
}

pub struct HybridSearch {
    graph: Arc<LegalGraph>,
    vector_provider: Option<Arc<dyn VectorSearchProvider>>,
    config: SearchConfig,
}

impl HybridSearch {
    pub fn new(
        graph: Arc<LegalGraph>,
        vector_provider: Option<Arc<dyn VectorSearchProvider>>,
        config: SearchConfig,
    ) -> Self {
        Self {
            graph,
            vector_provider,
            config,
        }
    }

    pub fn graph(&self) -> &Arc<LegalGraph> {
        &self.graph
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Graph stage: mandatory and applicable citations for the domain, in
    /// priority order. Synchronous and infallible.
    pub fn graph_lookup(&self, domain: &str) -> Vec<SearchItem> {
        let items: Vec<SearchItem> = self
            .graph
            .sumulas_for_domain(domain)
            .into_iter()
            .map(|entry| graph_node_item(&entry.node, entry.obrigatoriedade, entry.prioridade))
            .collect();
        tracing::debug!(domain = %domain, results = items.len(), "graph lookup done");
        items
    }

    /// Vector stage. No provider or a failing provider yields empty results
    /// with a warning; retrieval never fails on this stage.
    pub async fn vector_search(
        &self,
        embedding: &[f32],
        domain: Option<&str>,
        top_k: usize,
    ) -> (Vec<SearchItem>, Option<String>) {
        let Some(provider) = &self.vector_provider else {
            tracing::warn!("no vector provider configured, skipping vector search");
            return (Vec::new(), None);
        };

        match provider.search(embedding, domain, top_k).await {
            Ok(hits) => {
                let items = hits
                    .into_iter()
                    .enumerate()
                    .map(|(idx, hit)| SearchItem {
                        id: hit.id,
                        node_type: None,
                        numero: hit.numero,
                        texto: hit.texto,
                        tribunal: hit.tribunal,
                        domains: hit.domains,
                        keywords: hit.keywords,
                        cenarios: vec![],
                        content_hash: hit.content_hash,
                        source: SourcePayload::Vector {
                            score: hit.score,
                            rank: idx + 1,
                        },
                        rrf: None,
                    })
                    .collect::<Vec<_>>();
                tracing::debug!(results = items.len(), "vector search done");
                (items, None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "vector search failed, continuing without it");
                (Vec::new(), Some(e.to_string()))
            }
        }
    }

    /// Keyword stage backed by the graph's keyword index. Each term
    /// contributes at most `ceil(top_k / terms)` matches; results are
    /// deduplicated by id and sorted by relevance.
    pub fn keyword_search(
        &self,
        terms: &[String],
        domain: Option<&str>,
        top_k: usize,
    ) -> Vec<SearchItem> {
        use crate::types::NodeType;

        if terms.is_empty() {
            return Vec::new();
        }

        let per_term = top_k.div_ceil(terms.len());
        let mut items = Vec::new();

        for term in terms {
            let matches = self
                .graph
                .search_by_keyword(term, Some(&[NodeType::Sumula, NodeType::Tema]));
            for matched in matches.into_iter().take(per_term) {
                if let Some(domain) = domain {
                    if !matched.node.domains.iter().any(|d| d == domain) {
                        continue;
                    }
                }
                let node = &matched.node;
                items.push(SearchItem {
                    id: Some(node.id.clone()),
                    node_type: Some(node.node_type),
                    numero: node.numero,
                    texto: node.body_text().map(str::to_string),
                    tribunal: node.tribunal,
                    domains: node.domains.clone(),
                    keywords: node.keywords.clone(),
                    cenarios: vec![],
                    content_hash: None,
                    source: SourcePayload::Bm25 {
                        relevance_score: matched.relevance_score,
                        matched_term: term.clone(),
                    },
                    rrf: None,
                });
            }
        }

        let mut seen = HashSet::new();
        let mut unique: Vec<SearchItem> = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        unique.sort_by(|a, b| {
            let score = |item: &SearchItem| match &item.source {
                SourcePayload::Bm25 { relevance_score, .. } => *relevance_score,
                _ => 0,
            };
            score(b).cmp(&score(a))
        });
        unique.truncate(top_k);

        tracing::debug!(terms = terms.len(), results = unique.len(), "keyword search done");
        unique
    }

    /// Match the case against the Tema 1368 scenarios. The action type maps
    /// to a scenario label, combined with the contractual/extra-contractual
    /// nature of the damage; matching is a substring check on the cenário
    /// tipo.
    pub fn check_tema_1368_scenario(
        &self,
        tipo_acao: &str,
        natureza_dano: &str,
    ) -> Option<ScenarioMatch> {
        let tema: TemaDetail = self.graph.tema_with_cenarios(1368)?;
        if tema.cenarios.is_empty() {
            return None;
        }

        let extracontratual = natureza_dano == "extracontratual";
        let target = match tipo_acao.to_lowercase().as_str() {
            "dano_moral" => {
                if extracontratual {
                    "Dano moral extracontratual".to_string()
                } else {
                    "Dano moral contratual".to_string()
                }
            }
            "dano_material" | "indenizacao" => {
                if extracontratual {
                    "Dano material extracontratual".to_string()
                } else {
                    "Dano material contratual".to_string()
                }
            }
            other => other.to_string(),
        };
        let target = target.to_lowercase();

        let cenario = tema
            .cenarios
            .iter()
            .find(|c| c.tipo.to_lowercase().contains(&target))?
            .clone();

        Some(ScenarioMatch {
            tema_numero: tema.node.numero.unwrap_or(1368),
            cenario,
            vedacoes: tema.vedacoes.clone(),
        })
    }

    /// Run all stages, fuse with RRF, and truncate to `top_k`. Stage failures
    /// degrade; the graph stage alone is enough to produce results.
    pub async fn hybrid_search(
        &self,
        query: &HybridQuery,
        options: &HybridSearchOptions,
    ) -> HybridResults {
        let start = Instant::now();
        let top_k = options.top_k;

        let mut metadata = SearchMetadata {
            query: query.text.clone(),
            domain: query.domain.clone(),
            ..SearchMetadata::default()
        };

        let graph_start = Instant::now();
        let graph_results = match query.domain.as_deref() {
            Some(domain) => self.graph_lookup(domain),
            None => Vec::new(),
        };
        metadata.timing.graph_ms = graph_start.elapsed().as_millis() as u64;
        metadata.sources.graph = graph_results.len();

        // Vector and keyword stages are independent; run them together.
        let vector_future = async {
            match &query.embedding {
                Some(embedding) => {
                    let stage_start = Instant::now();
                    let (items, error) = self
                        .vector_search(embedding, query.domain.as_deref(), top_k)
                        .await;
                    (items, error, Some(stage_start.elapsed().as_millis() as u64))
                }
                None => (Vec::new(), None, None),
            }
        };
        let keyword_future = async {
            let stage_start = Instant::now();
            let items = self.keyword_search(&query.legal_terms, query.domain.as_deref(), top_k);
            (items, stage_start.elapsed().as_millis() as u64)
        };
        let ((vector_results, vector_error, vector_ms), (bm25_results, bm25_ms)) =
            tokio::join!(vector_future, keyword_future);

        metadata.timing.vector_ms = vector_ms;
        metadata.sources.vector = vector_results.len();
        metadata.timing.bm25_ms = bm25_ms;
        metadata.sources.bm25 = bm25_results.len();

        let fused = reciprocal_rank_fusion(
            &[graph_results, vector_results, bm25_results],
            self.config.rrf_k as u32,
        );
        let mut items = fused;
        items.truncate(top_k);

        let scenario = if options.include_scenarios
            && query
                .domain
                .as_deref()
                .is_some_and(|d| TEMA_1368_DOMAINS.contains(&d))
        {
            query
                .legal_terms
                .iter()
                .find(|t| {
                    matches!(
                        t.to_lowercase().as_str(),
                        "dano_moral" | "dano_material" | "indenizacao"
                    )
                })
                .and_then(|tipo_acao| {
                    self.check_tema_1368_scenario(
                        tipo_acao,
                        query.natureza_dano.as_deref().unwrap_or("contratual"),
                    )
                })
        } else {
            None
        };

        metadata.timing.total_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            domain = query.domain.as_deref().unwrap_or("-"),
            results = items.len(),
            graph = metadata.sources.graph,
            vector = metadata.sources.vector,
            bm25 = metadata.sources.bm25,
            total_ms = metadata.timing.total_ms,
            "hybrid search completed"
        );

        HybridResults {
            items,
            metadata,
            scenario,
            error: vector_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LexConfig;
    use crate::graph::{GraphDocument, LegalGraph};
    use anyhow::anyhow;

    fn graph_document() -> GraphDocument {
        serde_json::from_value(serde_json::json!({
            "nodes": [
                {
                    "id": "DOMINIO_bancario",
                    "type": "Dominio",
                    "nome": "Direito Bancário",
                    "keywords": ["banco", "contrato bancário"]
                },
                {
                    "id": "STJ_297",
                    "type": "Sumula",
                    "numero": 297,
                    "texto": "O Código de Defesa do Consumidor é aplicável às instituições financeiras.",
                    "tribunal": "STJ",
                    "domains": ["bancario"],
                    "keywords": ["cdc", "instituição financeira"]
                },
                {
                    "id": "TEMA_952",
                    "type": "Tema",
                    "numero": 952,
                    "tese": "Tese sobre planos de saúde e reajuste por faixa etária.",
                    "tribunal": "STJ",
                    "domains": ["bancario"],
                    "keywords": ["juros", "capitalização"]
                },
                {
                    "id": "TEMA_1368",
                    "type": "Tema",
                    "numero": 1368,
                    "tese": "Aplicação da taxa SELIC na atualização de dívidas civis.",
                    "tribunal": "STJ",
                    "domains": ["obrigacional"],
                    "detalhamento": {
                        "cenarios": [
                            {"tipo": "Dano moral contratual", "correcao": "SELIC desde o vencimento"},
                            {"tipo": "Dano material extracontratual", "correcao": "SELIC desde o evento", "juros": "embutidos na SELIC"}
                        ],
                        "vedacoes": ["Vedada a cumulação da SELIC com outros índices"]
                    }
                }
            ],
            "edges": [
                {
                    "source": "DOMINIO_bancario",
                    "target": "STJ_297",
                    "type": "REQUIRES",
                    "properties": {"obrigatoriedade": "SEMPRE", "prioridade": 1}
                },
                {
                    "source": "DOMINIO_bancario",
                    "target": "TEMA_952",
                    "type": "REQUIRES",
                    "properties": {"obrigatoriedade": "QUANDO_APLICAVEL", "prioridade": 2}
                }
            ]
        }))
        .unwrap()
    }

    fn search(provider: Option<Arc<dyn VectorSearchProvider>>) -> HybridSearch {
        let graph = Arc::new(LegalGraph::from_document(graph_document()));
        HybridSearch::new(graph, provider, LexConfig::default().search)
    }

    fn options() -> HybridSearchOptions {
        HybridSearchOptions {
            top_k: 7,
            include_scenarios: true,
        }
    }

    struct FixedProvider {
        hits: Vec<VectorHit>,
    }

    #[async_trait]
    impl VectorSearchProvider for FixedProvider {
        async fn search(
            &self,
            _embedding: &[f32],
            _domain: Option<&str>,
            _top_k: usize,
        ) -> anyhow::Result<Vec<VectorHit>> {
            Ok(self.hits.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl VectorSearchProvider for FailingProvider {
        async fn search(
            &self,
            _embedding: &[f32],
            _domain: Option<&str>,
            _top_k: usize,
        ) -> anyhow::Result<Vec<VectorHit>> {
            Err(anyhow!("qdrant unreachable"))
        }
    }

    #[test]
    fn graph_lookup_orders_by_priority_and_tags_source() {
        let search = search(None);
        let items = search.graph_lookup("bancario");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.as_deref(), Some("STJ_297"));
        assert!(items[0].is_mandatory());
        assert_eq!(items[1].id.as_deref(), Some("TEMA_952"));
    }

    #[test]
    fn keyword_search_filters_domain_and_dedups() {
        let search = search(None);
        let items = search.keyword_search(
            &["juros".to_string(), "cdc".to_string()],
            Some("bancario"),
            7,
        );
        let ids: Vec<_> = items.iter().filter_map(|i| i.id.as_deref()).collect();
        assert!(ids.contains(&"TEMA_952"));
        assert!(ids.contains(&"STJ_297"));
        // TEMA_1368 matches nothing and is outside the domain anyway.
        assert!(!ids.contains(&"TEMA_1368"));
    }

    #[test]
    fn keyword_search_with_no_terms_is_empty() {
        let search = search(None);
        assert!(search.keyword_search(&[], Some("bancario"), 7).is_empty());
    }

    #[tokio::test]
    async fn hybrid_without_provider_still_returns_graph_results() {
        let search = search(None);
        let query = HybridQuery {
            text: "revisão de contrato bancário".into(),
            domain: Some("bancario".into()),
            legal_terms: vec!["cdc".into()],
            ..HybridQuery::default()
        };
        let results = search.hybrid_search(&query, &options()).await;

        assert!(!results.items.is_empty());
        assert_eq!(results.metadata.sources.graph, 2);
        assert_eq!(results.metadata.sources.vector, 0);
        assert!(results.error.is_none());
        // Every fused item carries its annotation.
        assert!(results.items.iter().all(|i| i.rrf.is_some()));
    }

    #[tokio::test]
    async fn item_found_by_multiple_stages_ranks_first() {
        let search = search(None);
        // STJ_297 appears in both the graph stage (rank 1) and the keyword
        // stage, so fusion must put it on top.
        let query = HybridQuery {
            text: "aplicabilidade do cdc".into(),
            domain: Some("bancario".into()),
            legal_terms: vec!["cdc".into()],
            ..HybridQuery::default()
        };
        let results = search.hybrid_search(&query, &options()).await;
        assert_eq!(results.items[0].id.as_deref(), Some("STJ_297"));
        assert_eq!(results.items[0].rrf.as_ref().unwrap().sources.len(), 2);
    }

    #[tokio::test]
    async fn failing_vector_provider_degrades_with_captured_error() {
        let search = search(Some(Arc::new(FailingProvider)));
        let query = HybridQuery {
            text: "qualquer".into(),
            embedding: Some(vec![0.1, 0.2]),
            domain: Some("bancario".into()),
            ..HybridQuery::default()
        };
        let results = search.hybrid_search(&query, &options()).await;

        assert!(!results.items.is_empty());
        assert_eq!(results.metadata.sources.vector, 0);
        assert!(results.error.as_deref().unwrap().contains("qdrant"));
    }

    #[tokio::test]
    async fn vector_hits_join_the_fusion() {
        let provider = FixedProvider {
            hits: vec![VectorHit {
                id: Some("STJ_297".into()),
                numero: Some(297),
                texto: None,
                tribunal: None,
                domains: vec![],
                keywords: vec![],
                content_hash: None,
                score: 0.93,
            }],
        };
        let search = search(Some(Arc::new(provider)));
        let query = HybridQuery {
            text: "cdc bancos".into(),
            embedding: Some(vec![0.5; 4]),
            domain: Some("bancario".into()),
            ..HybridQuery::default()
        };
        let results = search.hybrid_search(&query, &options()).await;

        assert_eq!(results.metadata.sources.vector, 1);
        assert_eq!(results.items[0].id.as_deref(), Some("STJ_297"));
    }

    #[test]
    fn tema_1368_scenario_matches_by_action_and_nature() {
        let search = search(None);

        let matched = search
            .check_tema_1368_scenario("dano_moral", "contratual")
            .unwrap();
        assert_eq!(matched.tema_numero, 1368);
        assert_eq!(matched.cenario.tipo, "Dano moral contratual");
        assert_eq!(matched.vedacoes.len(), 1);

        let matched = search
            .check_tema_1368_scenario("indenizacao", "extracontratual")
            .unwrap();
        assert_eq!(matched.cenario.tipo, "Dano material extracontratual");

        assert!(search
            .check_tema_1368_scenario("dano_moral", "extracontratual")
            .is_none());
    }

    #[tokio::test]
    async fn scenario_only_checked_for_eligible_domains() {
        let search = search(None);
        let mut query = HybridQuery {
            text: "danos morais por cobrança indevida".into(),
            domain: Some("bancario".into()),
            legal_terms: vec!["dano_moral".into()],
            natureza_dano: Some("contratual".into()),
            ..HybridQuery::default()
        };

        let results = search.hybrid_search(&query, &options()).await;
        assert!(results.scenario.is_some());

        query.domain = Some("saude".into());
        let results = search.hybrid_search(&query, &options()).await;
        assert!(results.scenario.is_none());
    }
}
