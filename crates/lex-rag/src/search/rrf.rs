//! Reciprocal Rank Fusion over ranked result lists.
//!
//! Each source list contributes `1 / (k + rank + 1)` per item (0-based rank);
//! items appearing in several lists accumulate. Ties keep first-encounter
//! order, so the earliest source list wins on equal scores.

use std::collections::HashMap;

use crate::types::{RrfInfo, RrfSource, SearchItem};

/// Default rank-fusion constant. Dampens the gap between top ranks.
pub const DEFAULT_RRF_K: u32 = 60;

struct Entry {
    item: SearchItem,
    score: f64,
    sources: Vec<RrfSource>,
}

/// Identity for merging across sources: id, then content hash, then numero,
/// then the full serialized item. Items with none of these never merge.
fn fusion_key(item: &SearchItem) -> String {
    if let Some(id) = &item.id {
        return id.clone();
    }
    if let Some(hash) = &item.content_hash {
        return hash.clone();
    }
    if let Some(numero) = item.numero {
        return numero.to_string();
    }
    serde_json::to_string(item).unwrap_or_default()
}

/// Fuse ranked lists into one list ordered by descending RRF score. The first
/// occurrence of an item supplies its envelope fields; later occurrences only
/// add score. Every output item carries its [`RrfInfo`] annotation.
pub fn reciprocal_rank_fusion(sources: &[Vec<SearchItem>], k: u32) -> Vec<SearchItem> {
    let mut entries: Vec<Entry> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for (source_index, list) in sources.iter().enumerate() {
        for (rank, item) in list.iter().enumerate() {
            let contribution = 1.0 / (f64::from(k) + rank as f64 + 1.0);
            let key = fusion_key(item);
            let source = RrfSource {
                source_index,
                rank: rank + 1,
            };
            match index_by_key.get(&key) {
                Some(&i) => {
                    entries[i].score += contribution;
                    entries[i].sources.push(source);
                }
                None => {
                    index_by_key.insert(key, entries.len());
                    entries.push(Entry {
                        item: item.clone(),
                        score: contribution,
                        sources: vec![source],
                    });
                }
            }
        }
    }

    // Stable sort keeps insertion order on equal scores.
    entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    entries
        .into_iter()
        .map(|entry| SearchItem {
            rrf: Some(RrfInfo {
                score: entry.score,
                sources: entry.sources,
            }),
            ..entry.item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourcePayload;

    fn item(id: &str) -> SearchItem {
        SearchItem {
            id: Some(id.to_string()),
            node_type: None,
            numero: None,
            texto: None,
            tribunal: None,
            domains: vec![],
            keywords: vec![],
            cenarios: vec![],
            content_hash: None,
            source: SourcePayload::Vector { score: 0.5, rank: 0 },
            rrf: None,
        }
    }

    fn ids(items: &[SearchItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_deref().unwrap_or("")).collect()
    }

    #[test]
    fn single_source_preserves_order() {
        let source = vec![item("a"), item("b"), item("c")];
        let fused = reciprocal_rank_fusion(&[source], DEFAULT_RRF_K);
        assert_eq!(ids(&fused), vec!["a", "b", "c"]);
    }

    #[test]
    fn item_in_two_sources_outranks_single_source_items() {
        let first = vec![item("a"), item("b")];
        let second = vec![item("c"), item("b")];
        let fused = reciprocal_rank_fusion(&[first, second], DEFAULT_RRF_K);

        // "b" appears at rank 1 and rank 1, beating both rank-0 singles:
        // 1/62 + 1/62 > 1/61.
        assert_eq!(fused[0].id.as_deref(), Some("b"));
        let rrf = fused[0].rrf.as_ref().unwrap();
        assert_eq!(rrf.sources.len(), 2);
        assert_eq!(rrf.sources[0].source_index, 0);
        assert_eq!(rrf.sources[0].rank, 2);
        assert_eq!(rrf.sources[1].source_index, 1);
        assert_eq!(rrf.sources[1].rank, 2);
    }

    #[test]
    fn scores_follow_the_formula() {
        let fused = reciprocal_rank_fusion(&[vec![item("a"), item("b")]], 60);
        let a = fused[0].rrf.as_ref().unwrap();
        let b = fused[1].rrf.as_ref().unwrap();
        assert!((a.score - 1.0 / 61.0).abs() < 1e-12);
        assert!((b.score - 1.0 / 62.0).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_first_encounter_order() {
        // Same rank in disjoint lists produces equal scores.
        let first = vec![item("x")];
        let second = vec![item("y")];
        let fused = reciprocal_rank_fusion(&[first, second], DEFAULT_RRF_K);
        assert_eq!(ids(&fused), vec!["x", "y"]);
    }

    #[test]
    fn falls_back_to_content_hash_and_numero() {
        let mut by_hash = item("");
        by_hash.id = None;
        by_hash.content_hash = Some("deadbeef".into());

        let mut by_numero = item("");
        by_numero.id = None;
        by_numero.numero = Some(297);

        let fused = reciprocal_rank_fusion(
            &[vec![by_hash.clone(), by_numero.clone()], vec![by_hash, by_numero]],
            DEFAULT_RRF_K,
        );
        // Both merged across sources instead of duplicating.
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].rrf.as_ref().unwrap().sources.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(reciprocal_rank_fusion(&[], DEFAULT_RRF_K).is_empty());
        assert!(reciprocal_rank_fusion(&[vec![], vec![]], DEFAULT_RRF_K).is_empty());
    }

    #[test]
    fn first_occurrence_supplies_the_envelope() {
        let mut graph_item = item("a");
        graph_item.texto = Some("texto do grafo".into());
        let mut vector_item = item("a");
        vector_item.texto = Some("texto do vetor".into());

        let fused = reciprocal_rank_fusion(&[vec![graph_item], vec![vector_item]], DEFAULT_RRF_K);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].texto.as_deref(), Some("texto do grafo"));
    }
}
