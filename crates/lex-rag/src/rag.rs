//! RAG query preparation and precedent formatting.
//!
//! Turns case input into a retrieval query (with legal terms extracted from
//! the free text) and renders retrieved precedents as a markdown block for
//! prompt injection.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::search::{HybridQuery, HybridResults, HybridSearch, HybridSearchOptions};
use crate::types::{CaseInput, NodeType, SearchItem};

static SUMULA_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s[úu]mula\s+(\d+)").expect("súmula term pattern is valid"));

static ARTIGO_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)art(?:igo)?\.?\s*(\d+)\s+(?:do\s+)?(\w+)").expect("artigo term pattern is valid")
});

static TEMA_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)tema(?:\s+repetitivo)?\s+(\d+)").expect("tema term pattern is valid")
});

static LEI_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)lei\s+([\d.]+/\d+)").expect("lei term pattern is valid"));

/// Extract normalized legal-term references ("súmula 297", "art. 406 cc",
/// "tema 952", "lei 8.078/90") from free text, deduplicated in first-seen
/// order per pattern.
pub fn extract_legal_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut seen = HashSet::new();
    let mut add = |term: String| {
        if seen.insert(term.clone()) {
            terms.push(term);
        }
    };

    for captures in SUMULA_TERM_RE.captures_iter(text) {
        add(format!("súmula {}", &captures[1]));
    }
    for captures in ARTIGO_TERM_RE.captures_iter(text) {
        add(format!("art. {} {}", &captures[1], captures[2].to_lowercase()));
    }
    for captures in TEMA_TERM_RE.captures_iter(text) {
        add(format!("tema {}", &captures[1]));
    }
    for captures in LEI_TERM_RE.captures_iter(text) {
        add(format!("lei {}", &captures[1]));
    }

    terms
}

/// Assemble the retrieval query from the case input: concatenated narrative
/// fields, extracted legal terms, and the caller's domain classification.
pub fn build_rag_query(input: &CaseInput) -> HybridQuery {
    let text = [&input.fatos, &input.questoes, &input.pedidos]
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let legal_terms = extract_legal_terms(&text);

    HybridQuery {
        text,
        embedding: None,
        domain: input.domain.clone(),
        legal_terms,
        natureza_dano: input.natureza_dano.clone(),
    }
}

fn type_label(item: &SearchItem) -> &'static str {
    match item.node_type {
        Some(NodeType::Sumula) => "Súmula",
        Some(NodeType::Tema) => "Tema",
        Some(NodeType::Artigo) => "Artigo",
        Some(NodeType::Conceito) => "Conceito",
        Some(NodeType::Dominio) => "Dominio",
        None => "Precedente",
    }
}

/// Render precedents as a markdown block capped at roughly `max_tokens`
/// (4 chars per token). Items that would overflow the budget are dropped,
/// keeping fusion order.
pub fn format_precedents_for_prompt(precedents: &[SearchItem], max_tokens: usize) -> String {
    if precedents.is_empty() {
        return String::new();
    }

    let max_chars = max_tokens * 4;
    let mut output = String::from("## JURISPRUDÊNCIA RELEVANTE (RAG)\n\n");

    for item in precedents {
        let entry = format!(
            "### {} {}/{}\n{}\n\n",
            type_label(item),
            item.numero.map_or_else(String::new, |n| n.to_string()),
            item.tribunal.map_or_else(|| "STJ".to_string(), |t| t.to_string()),
            item.texto.as_deref().unwrap_or_default()
        );
        if output.len() + entry.len() > max_chars {
            break;
        }
        output.push_str(&entry);
    }

    output
}

/// Retrieval seam used by the pipeline. Lets tests substitute a canned
/// retriever for the full hybrid stack.
#[async_trait]
pub trait RagProvider: Send + Sync {
    async fn retrieve(&self, input: &CaseInput) -> anyhow::Result<HybridResults>;
}

#[async_trait]
impl RagProvider for HybridSearch {
    async fn retrieve(&self, input: &CaseInput) -> anyhow::Result<HybridResults> {
        let query = build_rag_query(input);
        let options = HybridSearchOptions {
            top_k: self.config().top_k,
            include_scenarios: true,
        };
        Ok(self.hybrid_search(&query, &options).await)
    }
}
