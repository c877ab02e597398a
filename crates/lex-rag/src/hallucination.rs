//! Hallucination detector for generated drafts.
//!
//! Extracts súmula, tema, and artigo citations from free text and
//! cross-references them against the reference knowledge base. A citation
//! that does not exist, or exists under the wrong court, is reported as a
//! structured issue; findings are data for the caller, never errors.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{LexError, LoadError};
use crate::types::Tribunal;

// "Súmula [n.º] 297 do STJ" / "... do STF", with or without accents.
static SUMULA_DO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)s[úu]mula\s+(?:n[.ºo°]\s*)?(\d+)\s+do\s+(STJ|STF)")
        .expect("súmula-do pattern is valid")
});

// "Súmula 297/STJ".
static SUMULA_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)s[úu]mula\s+(?:n[.ºo°]\s*)?(\d+)/(STJ|STF)")
        .expect("súmula-slash pattern is valid")
});

// "Tema Repetitivo 952", "Tema 952", "Tema n. 952".
static TEMA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)tema\s+(?:repetitivo\s+)?(?:n[.ºo°]\s*)?(\d+)").expect("tema pattern is valid")
});

// "art. 37" or "artigo 37", optionally with an ordinal suffix like "5º".
static ARTIGO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:art\.|artigo)\s*(\d+)[oº°]?").expect("artigo pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumulaCitation {
    pub numero: String,
    pub tribunal: Tribunal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemaCitation {
    pub numero: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtigoCitation {
    pub numero: String,
}

/// All citations extracted from one text, deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citations {
    pub sumulas: Vec<SumulaCitation>,
    pub temas: Vec<TemaCitation>,
    pub artigos: Vec<ArtigoCitation>,
}

/// Extract legal citations from a text. Súmulas are deduplicated by
/// (numero, tribunal); temas and artigos by numero.
pub fn extract_citations(text: &str) -> Citations {
    let mut citations = Citations::default();

    let mut sumulas_seen: HashSet<(String, Tribunal)> = HashSet::new();
    for pattern in [&*SUMULA_DO_RE, &*SUMULA_SLASH_RE] {
        for captures in pattern.captures_iter(text) {
            let numero = captures[1].to_string();
            let Ok(tribunal) = Tribunal::from_str(&captures[2]) else {
                continue;
            };
            if sumulas_seen.insert((numero.clone(), tribunal)) {
                citations.sumulas.push(SumulaCitation { numero, tribunal });
            }
        }
    }

    let mut temas_seen: HashSet<String> = HashSet::new();
    for captures in TEMA_RE.captures_iter(text) {
        let numero = captures[1].to_string();
        if temas_seen.insert(numero.clone()) {
            citations.temas.push(TemaCitation { numero });
        }
    }

    let mut artigos_seen: HashSet<String> = HashSet::new();
    for captures in ARTIGO_RE.captures_iter(text) {
        let numero = captures[1].to_string();
        if artigos_seen.insert(numero.clone()) {
            citations.artigos.push(ArtigoCitation { numero });
        }
    }

    citations
}

#[derive(Debug, Clone, Deserialize)]
pub struct SumulaEntry {
    pub texto: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemaEntry {
    pub tese: String,
    #[serde(default)]
    pub tribunal: Option<Tribunal>,
    #[serde(default)]
    pub situacao: Option<String>,
}

#[derive(Deserialize)]
struct SumulasFile {
    sumulas: HashMap<Tribunal, HashMap<String, SumulaEntry>>,
}

#[derive(Deserialize)]
struct TemasFile {
    temas: HashMap<String, TemaEntry>,
}

/// Read-only citation reference database: súmulas keyed by tribunal and
/// numero, temas keyed by numero.
pub struct ReferenceDb {
    sumulas: HashMap<Tribunal, HashMap<String, SumulaEntry>>,
    temas: HashMap<String, TemaEntry>,
}

impl ReferenceDb {
    /// Load both lookup tables from JSON files. Malformed files are fatal.
    pub fn load(sumulas_path: &Path, temas_path: &Path) -> Result<Self, LexError> {
        let sumulas: SumulasFile = read_json(sumulas_path)?;
        let temas: TemasFile = read_json(temas_path)?;
        Ok(Self {
            sumulas: sumulas.sumulas,
            temas: temas.temas,
        })
    }

    /// Build directly from in-memory tables, for tests.
    pub fn from_tables(
        sumulas: HashMap<Tribunal, HashMap<String, SumulaEntry>>,
        temas: HashMap<String, TemaEntry>,
    ) -> Self {
        Self { sumulas, temas }
    }

    fn sumula(&self, tribunal: Tribunal, numero: &str) -> Option<&SumulaEntry> {
        self.sumulas.get(&tribunal)?.get(numero)
    }

    fn tema(&self, numero: &str) -> Option<&TemaEntry> {
        self.temas.get(numero)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LexError> {
    let content = std::fs::read_to_string(path).map_err(|e| LexError::ReferenceDbLoad {
        path: path.to_path_buf(),
        source: LoadError::Io(e),
    })?;
    serde_json::from_str(&content).map_err(|e| LexError::ReferenceDbLoad {
        path: path.to_path_buf(),
        source: LoadError::Json(e),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    SumulaNaoEncontrada,
    TribunalIncorreto,
    TemaNaoEncontrado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Medium,
    High,
}

/// One fabricated or misattributed citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub numero: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tribunal: Option<Tribunal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tribunal_correto: Option<Tribunal>,
}

/// Outcome of validating a single súmula citation.
#[derive(Debug, Clone, PartialEq)]
pub enum SumulaValidation {
    Valid { texto: String },
    WrongTribunal { correct: Tribunal, texto: String },
    NotFound,
}

/// Outcome of validating a single tema citation.
#[derive(Debug, Clone, PartialEq)]
pub enum TemaValidation {
    Valid {
        tese: String,
        tribunal: Option<Tribunal>,
        situacao: Option<String>,
    },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationReport {
    pub hallucinated: bool,
    pub issues: Vec<Issue>,
    pub citations_checked: usize,
    pub issues_count: usize,
}

pub struct HallucinationDetector {
    db: ReferenceDb,
}

impl HallucinationDetector {
    pub fn new(db: ReferenceDb) -> Self {
        Self { db }
    }

    /// Check a súmula citation: valid under the cited tribunal, valid only
    /// under the other tribunal (misattribution), or absent from both.
    pub fn validate_sumula_citation(&self, numero: &str, tribunal: Tribunal) -> SumulaValidation {
        if let Some(entry) = self.db.sumula(tribunal, numero) {
            return SumulaValidation::Valid {
                texto: entry.texto.clone(),
            };
        }
        if let Some(entry) = self.db.sumula(tribunal.other(), numero) {
            return SumulaValidation::WrongTribunal {
                correct: tribunal.other(),
                texto: entry.texto.clone(),
            };
        }
        SumulaValidation::NotFound
    }

    pub fn validate_tema_citation(&self, numero: &str) -> TemaValidation {
        match self.db.tema(numero) {
            Some(entry) => TemaValidation::Valid {
                tese: entry.tese.clone(),
                tribunal: entry.tribunal,
                situacao: entry.situacao.clone(),
            },
            None => TemaValidation::NotFound,
        }
    }

    /// Extract and validate every citation in the text. Artigos are counted
    /// toward `citations_checked` but not validated, since no reference table
    /// exists for them.
    pub fn detect(&self, text: &str) -> HallucinationReport {
        let citations = extract_citations(text);
        let mut issues = Vec::new();
        let mut citations_checked = 0;

        for sumula in &citations.sumulas {
            citations_checked += 1;
            match self.validate_sumula_citation(&sumula.numero, sumula.tribunal) {
                SumulaValidation::Valid { .. } => {}
                SumulaValidation::WrongTribunal { correct, .. } => issues.push(Issue {
                    kind: IssueKind::TribunalIncorreto,
                    severity: Severity::Medium,
                    numero: sumula.numero.clone(),
                    tribunal: Some(sumula.tribunal),
                    tribunal_correto: Some(correct),
                }),
                SumulaValidation::NotFound => issues.push(Issue {
                    kind: IssueKind::SumulaNaoEncontrada,
                    severity: Severity::High,
                    numero: sumula.numero.clone(),
                    tribunal: Some(sumula.tribunal),
                    tribunal_correto: None,
                }),
            }
        }

        for tema in &citations.temas {
            citations_checked += 1;
            if matches!(self.validate_tema_citation(&tema.numero), TemaValidation::NotFound) {
                issues.push(Issue {
                    kind: IssueKind::TemaNaoEncontrado,
                    severity: Severity::High,
                    numero: tema.numero.clone(),
                    tribunal: None,
                    tribunal_correto: None,
                });
            }
        }

        citations_checked += citations.artigos.len();

        let hallucinated = !issues.is_empty();
        if hallucinated {
            tracing::warn!(
                issues = issues.len(),
                checked = citations_checked,
                "hallucinated citations detected in draft"
            );
        }

        HallucinationReport {
            hallucinated,
            issues_count: issues.len(),
            issues,
            citations_checked,
        }
    }
}
