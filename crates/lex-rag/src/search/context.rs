//! Augmented-context assembly for prompt injection.
//!
//! Partitions fused search results into mandatory citations, applicable
//! temas, and related sources, trims to a token budget (mandatory items are
//! never dropped), and renders the result as plain prompt text.

use serde::{Deserialize, Serialize};

use crate::search::hybrid::{HybridResults, ScenarioMatch};
use crate::types::{NodeType, SearchItem, Tribunal};

/// Token-budget buffer reserved for formatting overhead when trimming.
const TRIM_BUFFER_TOKENS: usize = 200;

/// A citation the draft must include, stripped to its prompt-relevant fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MandatoryCitation {
    pub id: Option<String>,
    pub node_type: Option<NodeType>,
    pub numero: Option<u32>,
    pub texto: Option<String>,
    pub tribunal: Option<Tribunal>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AugmentedContext {
    pub mandatory_citations: Vec<MandatoryCitation>,
    pub applicable_temas: Vec<SearchItem>,
    pub related_sources: Vec<SearchItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_rules: Option<ScenarioMatch>,
    pub estimated_tokens: usize,
}

pub struct ContextOptions {
    pub max_tokens: usize,
    pub include_related: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            include_related: true,
        }
    }
}

/// Rough token count: 1 token is about 4 characters of Portuguese text.
fn estimate_tokens<T: Serialize>(value: &T) -> usize {
    let serialized = serde_json::to_string(value).unwrap_or_default();
    serialized.len().div_ceil(4)
}

/// Partition search results into the three context tiers and trim related
/// sources to fit the token budget. Mandatory citations always survive.
pub fn build_augmented_context(
    results: &HybridResults,
    options: &ContextOptions,
) -> AugmentedContext {
    let mut context = AugmentedContext {
        scenario_rules: results.scenario.clone(),
        ..AugmentedContext::default()
    };

    for item in &results.items {
        if item.is_mandatory() {
            context.mandatory_citations.push(MandatoryCitation {
                id: item.id.clone(),
                node_type: item.node_type,
                numero: item.numero,
                texto: item.texto.clone(),
                tribunal: item.tribunal,
            });
        } else if item.node_type == Some(NodeType::Tema) && !item.cenarios.is_empty() {
            context.applicable_temas.push(item.clone());
        } else if options.include_related {
            context.related_sources.push(item.clone());
        }
    }

    context.estimated_tokens = estimate_tokens(&context);

    if context.estimated_tokens > options.max_tokens {
        let mandatory_tokens = estimate_tokens(&context.mandatory_citations);
        let remaining = options
            .max_tokens
            .saturating_sub(mandatory_tokens + TRIM_BUFFER_TOKENS);

        if remaining > 0 {
            // Greedy keep in original (fusion) order.
            let mut used = 0;
            context.related_sources.retain(|item| {
                let item_tokens = estimate_tokens(item);
                if used + item_tokens < remaining {
                    used += item_tokens;
                    true
                } else {
                    false
                }
            });
        } else {
            context.related_sources.clear();
        }

        context.estimated_tokens = estimate_tokens(&context);
    }

    context
}

fn citation_heading(node_type: Option<NodeType>) -> &'static str {
    match node_type {
        Some(NodeType::Sumula) => "Sumula",
        _ => "Tema",
    }
}

fn tribunal_label(tribunal: Option<Tribunal>) -> String {
    tribunal.map_or_else(|| "STJ".to_string(), |t| t.to_string())
}

/// Render the context as the plain-text block injected into the generation
/// prompt. Pure function of the context.
pub fn format_context_for_prompt(context: &AugmentedContext) -> String {
    let mut prompt = String::new();

    if !context.mandatory_citations.is_empty() {
        prompt.push_str("## CITACOES OBRIGATORIAS\n\n");
        for item in &context.mandatory_citations {
            prompt.push_str(&format!(
                "### {} {}/{}\n",
                citation_heading(item.node_type),
                item.numero.map_or_else(String::new, |n| n.to_string()),
                tribunal_label(item.tribunal)
            ));
            if let Some(texto) = &item.texto {
                prompt.push_str(texto);
            }
            prompt.push_str("\n\n");
        }
    }

    if !context.applicable_temas.is_empty() {
        prompt.push_str("## TEMAS REPETITIVOS APLICAVEIS\n\n");
        for tema in &context.applicable_temas {
            prompt.push_str(&format!(
                "### Tema {}/{}\n",
                tema.numero.map_or_else(String::new, |n| n.to_string()),
                tribunal_label(tema.tribunal)
            ));
            prompt.push_str(&format!(
                "Tese: {}\n",
                tema.texto.as_deref().unwrap_or_default()
            ));
            if !tema.cenarios.is_empty() {
                prompt.push_str("\nCenarios:\n");
                for cenario in &tema.cenarios {
                    prompt.push_str(&format!(
                        "- {}: {}\n",
                        cenario.tipo,
                        cenario.correcao.as_deref().unwrap_or_default()
                    ));
                }
            }
            prompt.push('\n');
        }
    }

    if let Some(rules) = &context.scenario_rules {
        prompt.push_str("## REGRA ESPECIFICA DO TEMA 1368 (SELIC)\n\n");
        prompt.push_str(&format!("Cenario aplicavel: {}\n", rules.cenario.tipo));
        prompt.push_str(&format!(
            "Correcao: {}\n",
            rules.cenario.correcao.as_deref().unwrap_or_default()
        ));
        if let Some(juros) = &rules.cenario.juros {
            prompt.push_str(&format!("Juros: {juros}\n"));
        }
        if !rules.vedacoes.is_empty() {
            prompt.push_str("\nVedacoes:\n");
            for vedacao in &rules.vedacoes {
                prompt.push_str(&format!("- {vedacao}\n"));
            }
        }
        prompt.push('\n');
    }

    if !context.related_sources.is_empty() {
        prompt.push_str("## FONTES RELACIONADAS\n\n");
        for item in context.related_sources.iter().take(5) {
            let label = item
                .numero
                .map(|n| n.to_string())
                .or_else(|| item.id.clone())
                .unwrap_or_default();
            let texto = item.texto.as_deref().unwrap_or_default();
            let snippet: String = texto.chars().take(100).collect();
            prompt.push_str(&format!(
                "- {} {}: {}...\n",
                citation_heading(item.node_type),
                label,
                snippet
            ));
        }
        prompt.push('\n');
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cenario, Obrigatoriedade, SourcePayload};

    fn mandatory_item(id: &str, numero: u32) -> SearchItem {
        SearchItem {
            id: Some(id.to_string()),
            node_type: Some(NodeType::Sumula),
            numero: Some(numero),
            texto: Some(format!("Texto da súmula {numero}.")),
            tribunal: Some(Tribunal::Stj),
            domains: vec!["bancario".into()],
            keywords: vec![],
            cenarios: vec![],
            content_hash: None,
            source: SourcePayload::Graph {
                obrigatoriedade: Obrigatoriedade::Sempre,
                prioridade: 1,
            },
            rrf: None,
        }
    }

    fn tema_item(numero: u32) -> SearchItem {
        SearchItem {
            id: Some(format!("TEMA_{numero}")),
            node_type: Some(NodeType::Tema),
            numero: Some(numero),
            texto: Some(format!("Tese do tema {numero}.")),
            cenarios: vec![Cenario {
                tipo: "Dano moral contratual".into(),
                correcao: Some("SELIC".into()),
                juros: None,
            }],
            source: SourcePayload::Graph {
                obrigatoriedade: Obrigatoriedade::QuandoAplicavel,
                prioridade: 2,
            },
            ..mandatory_item("", numero)
        }
    }

    fn related_item(id: &str, texto_len: usize) -> SearchItem {
        SearchItem {
            id: Some(id.to_string()),
            node_type: Some(NodeType::Sumula),
            texto: Some("x".repeat(texto_len)),
            source: SourcePayload::Vector { score: 0.8, rank: 1 },
            ..mandatory_item(id, 1)
        }
    }

    fn results(items: Vec<SearchItem>) -> HybridResults {
        HybridResults {
            items,
            ..HybridResults::default()
        }
    }

    #[test]
    fn partitions_items_into_tiers() {
        let results = results(vec![
            mandatory_item("STJ_297", 297),
            tema_item(952),
            related_item("STJ_54", 50),
        ]);
        let context = build_augmented_context(&results, &ContextOptions::default());

        assert_eq!(context.mandatory_citations.len(), 1);
        assert_eq!(context.applicable_temas.len(), 1);
        assert_eq!(context.related_sources.len(), 1);
        assert!(context.estimated_tokens > 0);
    }

    #[test]
    fn include_related_false_drops_optional_items() {
        let results = results(vec![mandatory_item("STJ_297", 297), related_item("STJ_54", 50)]);
        let options = ContextOptions {
            include_related: false,
            ..ContextOptions::default()
        };
        let context = build_augmented_context(&results, &options);
        assert!(context.related_sources.is_empty());
    }

    #[test]
    fn over_budget_keeps_mandatory_and_trims_related() {
        let results = results(vec![
            mandatory_item("STJ_297", 297),
            related_item("A", 4000),
            related_item("B", 4000),
            related_item("C", 40),
        ]);
        let options = ContextOptions {
            max_tokens: 1500,
            include_related: true,
        };
        let context = build_augmented_context(&results, &options);

        assert_eq!(context.mandatory_citations.len(), 1);
        // The first oversized related item fits the remaining budget, the
        // second does not; greedy keep is in original order.
        assert!(context.related_sources.len() < 3);
        assert!(context.estimated_tokens <= 1500);
    }

    #[test]
    fn tiny_budget_clears_related_entirely() {
        let results = results(vec![mandatory_item("STJ_297", 297), related_item("A", 4000)]);
        let options = ContextOptions {
            max_tokens: 10,
            include_related: true,
        };
        let context = build_augmented_context(&results, &options);
        assert!(context.related_sources.is_empty());
        assert_eq!(context.mandatory_citations.len(), 1);
    }

    #[test]
    fn prompt_contains_portuguese_section_headings() {
        let mut results = results(vec![mandatory_item("STJ_297", 297), tema_item(952)]);
        results.scenario = Some(ScenarioMatch {
            tema_numero: 1368,
            cenario: Cenario {
                tipo: "Dano moral contratual".into(),
                correcao: Some("SELIC desde o vencimento".into()),
                juros: Some("embutidos".into()),
            },
            vedacoes: vec!["Vedada a cumulação".into()],
        });
        let context = build_augmented_context(&results, &ContextOptions::default());
        let prompt = format_context_for_prompt(&context);

        assert!(prompt.contains("## CITACOES OBRIGATORIAS"));
        assert!(prompt.contains("### Sumula 297/STJ"));
        assert!(prompt.contains("## TEMAS REPETITIVOS APLICAVEIS"));
        assert!(prompt.contains("Tese: Tese do tema 952."));
        assert!(prompt.contains("## REGRA ESPECIFICA DO TEMA 1368 (SELIC)"));
        assert!(prompt.contains("Juros: embutidos"));
        assert!(prompt.contains("- Vedada a cumulação"));
    }

    #[test]
    fn related_sources_abbreviated_to_five_items() {
        let items: Vec<SearchItem> = (0..8).map(|i| related_item(&format!("S{i}"), 300)).collect();
        let results = results(items);
        let context = build_augmented_context(
            &results,
            &ContextOptions {
                max_tokens: 100_000,
                include_related: true,
            },
        );
        let prompt = format_context_for_prompt(&context);

        assert_eq!(prompt.matches("- Sumula ").count(), 5);
        // Long bodies are clipped to 100 chars.
        assert!(!prompt.contains(&"x".repeat(150)));
    }

    #[test]
    fn empty_results_render_an_empty_prompt() {
        let context = build_augmented_context(&results(vec![]), &ContextOptions::default());
        assert_eq!(format_context_for_prompt(&context), "");
    }
}
