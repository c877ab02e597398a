//! Deterministic cache-key derivation and the confidence-tiered TTL policy.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::CaseInput;

/// Default key prefix; the version tag orphans old entries when bumped.
pub const DEFAULT_CACHE_PREFIX: &str = "lex:v2.7:";

/// TTL for drafts with QA confidence >= 0.90: 7 days.
pub const TTL_HIGH_CONFIDENCE: u64 = 604_800;
/// TTL for drafts with QA confidence >= 0.70: 1 day.
pub const TTL_MEDIUM_CONFIDENCE: u64 = 86_400;

/// Collapse whitespace, trim, and lowercase, so semantically identical inputs
/// map to the same key.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical serialization shape for key derivation. Field order is fixed by
/// the struct, so the digest is stable across processes.
#[derive(Serialize)]
struct NormalizedInput {
    fatos: String,
    questoes: String,
    pedidos: String,
    classe: String,
    assunto: String,
}

/// Derive the cache key: normalize the five case fields, serialize
/// canonically, SHA-256, keep the first 16 hex chars, prepend the prefix.
pub fn cache_key(input: &CaseInput, prefix: &str) -> String {
    let normalized = NormalizedInput {
        fatos: normalize_text(&input.fatos),
        questoes: normalize_text(&input.questoes),
        pedidos: normalize_text(&input.pedidos),
        classe: normalize_text(&input.classe),
        assunto: normalize_text(&input.assunto),
    };
    let canonical =
        serde_json::to_string(&normalized).expect("normalized case input serializes to JSON");
    let digest = Sha256::digest(canonical.as_bytes());

    let mut key = String::with_capacity(prefix.len() + 16);
    key.push_str(prefix);
    for byte in &digest[..8] {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

/// TTL in seconds for a QA confidence score. Zero means "do not persist".
pub fn ttl_for_confidence(confidence: f64) -> u64 {
    if confidence >= 0.90 {
        TTL_HIGH_CONFIDENCE
    } else if confidence >= 0.70 {
        TTL_MEDIUM_CONFIDENCE
    } else {
        0
    }
}
