use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// High court issuing a súmula or tema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tribunal {
    Stj,
    Stf,
}

impl Tribunal {
    /// The other high court. Used to detect wrong-tribunal attributions.
    pub fn other(self) -> Self {
        match self {
            Tribunal::Stj => Tribunal::Stf,
            Tribunal::Stf => Tribunal::Stj,
        }
    }
}

impl fmt::Display for Tribunal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tribunal::Stj => write!(f, "STJ"),
            Tribunal::Stf => write!(f, "STF"),
        }
    }
}

impl FromStr for Tribunal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STJ" => Ok(Tribunal::Stj),
            "STF" => Ok(Tribunal::Stf),
            other => Err(format!("unknown tribunal: {other}")),
        }
    }
}

/// Node category in the legal knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Sumula,
    Tema,
    Dominio,
    Artigo,
    Conceito,
}

/// Whether a required citation applies unconditionally or only when the
/// scenario fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Obrigatoriedade {
    Sempre,
    QuandoAplicavel,
}

/// A scenario attached to a repetitive-issue tema, describing which monetary
/// correction/interest rule applies to a given damage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cenario {
    pub tipo: String,
    #[serde(default)]
    pub correcao: Option<String>,
    #[serde(default)]
    pub juros: Option<String>,
}

/// Case input fields used for retrieval and cache-key derivation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseInput {
    pub fatos: String,
    pub questoes: String,
    pub pedidos: String,
    pub classe: String,
    pub assunto: String,
    /// Legal domain (e.g. "bancario"), when the caller already classified it.
    #[serde(default)]
    pub domain: Option<String>,
    /// "contratual" or "extracontratual"; drives Tema 1368 scenario matching.
    #[serde(default)]
    pub natureza_dano: Option<String>,
}

/// Which retrieval stage produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Graph,
    Vector,
    Bm25,
}

/// Source-specific payload carried alongside the common item envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SourcePayload {
    Graph {
        obrigatoriedade: Obrigatoriedade,
        prioridade: u32,
    },
    Vector {
        score: f32,
        rank: usize,
    },
    Bm25 {
        relevance_score: u32,
        matched_term: String,
    },
}

impl SourcePayload {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourcePayload::Graph { .. } => SourceKind::Graph,
            SourcePayload::Vector { .. } => SourceKind::Vector,
            SourcePayload::Bm25 { .. } => SourceKind::Bm25,
        }
    }
}

/// Rank contribution of one source list to a fused item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrfSource {
    pub source_index: usize,
    /// 1-based rank within the contributing list.
    pub rank: usize,
}

/// Fusion annotation attached to items after Reciprocal Rank Fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrfInfo {
    pub score: f64,
    pub sources: Vec<RrfSource>,
}

/// Normalized result item produced by any retrieval source.
///
/// Graph, vector, and keyword search each fill the envelope fields they know
/// about; the [`SourcePayload`] variant carries what is specific to the stage
/// that produced the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub numero: Option<u32>,
    #[serde(default)]
    pub texto: Option<String>,
    #[serde(default)]
    pub tribunal: Option<Tribunal>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub cenarios: Vec<Cenario>,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(flatten)]
    pub source: SourcePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrf: Option<RrfInfo>,
}

impl SearchItem {
    /// Whether this item is a mandatory citation for its domain.
    pub fn is_mandatory(&self) -> bool {
        matches!(
            self.source,
            SourcePayload::Graph {
                obrigatoriedade: Obrigatoriedade::Sempre,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tribunal_round_trips_through_serde() {
        let json = serde_json::to_string(&Tribunal::Stj).unwrap();
        assert_eq!(json, "\"STJ\"");
        let back: Tribunal = serde_json::from_str("\"STF\"").unwrap();
        assert_eq!(back, Tribunal::Stf);
    }

    #[test]
    fn tribunal_parses_case_insensitively() {
        assert_eq!("stj".parse::<Tribunal>().unwrap(), Tribunal::Stj);
        assert_eq!("STF".parse::<Tribunal>().unwrap(), Tribunal::Stf);
        assert!("TST".parse::<Tribunal>().is_err());
    }

    #[test]
    fn obrigatoriedade_uses_screaming_snake_case() {
        let json = serde_json::to_string(&Obrigatoriedade::QuandoAplicavel).unwrap();
        assert_eq!(json, "\"QUANDO_APLICAVEL\"");
    }

    #[test]
    fn mandatory_only_for_graph_sempre() {
        let item = SearchItem {
            id: Some("STJ_297".into()),
            node_type: Some(NodeType::Sumula),
            numero: Some(297),
            texto: None,
            tribunal: Some(Tribunal::Stj),
            domains: vec![],
            keywords: vec![],
            cenarios: vec![],
            content_hash: None,
            source: SourcePayload::Graph {
                obrigatoriedade: Obrigatoriedade::Sempre,
                prioridade: 1,
            },
            rrf: None,
        };
        assert!(item.is_mandatory());

        let vector = SearchItem {
            source: SourcePayload::Vector { score: 0.9, rank: 1 },
            ..item
        };
        assert!(!vector.is_mandatory());
    }
}
