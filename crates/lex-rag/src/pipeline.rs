//! Pipeline orchestrator.
//!
//! Wires the draft cache, RAG retrieval, generation, parallel QA, and
//! hallucination detection into a single `execute` call. Generation is the
//! only phase whose failure aborts the run; every other phase degrades.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{ttl_for_confidence, CachedDraft, DraftCache};
use crate::hallucination::{HallucinationDetector, HallucinationReport};
use crate::qa::{run_parallel_qa, QaReport, QaValidator};
use crate::rag::{format_precedents_for_prompt, RagProvider};
use crate::types::CaseInput;

/// Draft generation seam. The implementation owns prompt assembly and the
/// LLM call; the pipeline only supplies the retrieved context block.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn generate(&self, input: &CaseInput, rag_context: &str) -> Result<GeneratedDraft>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDraft {
    pub minuta: String,
    pub tokens: u64,
}

/// Per-phase wall-clock timings in milliseconds. Phases that did not run
/// stay `None`; `total_ms` is always set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub cache_check_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hallucination_ms: Option<u64>,
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub minuta: String,
    pub qa: QaReport,
    pub cached: bool,
    pub timing: PhaseTiming,
    pub tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hallucinations: Option<HallucinationReport>,
}

pub struct Pipeline {
    cache: DraftCache,
    generator: Arc<dyn DraftGenerator>,
    qa_estrutural: Arc<dyn QaValidator>,
    qa_semantico: Arc<dyn QaValidator>,
    rag_provider: Option<Arc<dyn RagProvider>>,
    detector: Option<Arc<HallucinationDetector>>,
    precedent_tokens: usize,
}

impl Pipeline {
    pub fn new(
        cache: DraftCache,
        generator: Arc<dyn DraftGenerator>,
        qa_estrutural: Arc<dyn QaValidator>,
        qa_semantico: Arc<dyn QaValidator>,
        rag_provider: Option<Arc<dyn RagProvider>>,
        detector: Option<Arc<HallucinationDetector>>,
        precedent_tokens: usize,
    ) -> Self {
        Self {
            cache,
            generator,
            qa_estrutural,
            qa_semantico,
            rag_provider,
            detector,
            precedent_tokens,
        }
    }

    /// Run the six pipeline phases for one case. A cache hit short-circuits
    /// after phase one. Only generator failure propagates.
    pub async fn execute(&self, input: &CaseInput) -> Result<PipelineResult> {
        let total_start = Instant::now();
        let mut timing = PhaseTiming::default();

        // Phase 1: cache lookup.
        let cache_start = Instant::now();
        let cache_key = self.cache.key_for(input);
        let cached = self.cache.get(&cache_key).await;
        timing.cache_check_ms = cache_start.elapsed().as_millis() as u64;

        if let Some(hit) = cached {
            tracing::debug!(key = %cache_key, "cache hit");
            timing.total_ms = total_start.elapsed().as_millis() as u64;
            return Ok(PipelineResult {
                minuta: hit.minuta,
                qa: hit.qa,
                cached: true,
                timing,
                tokens: hit.tokens,
                hallucinations: None,
            });
        }

        // Phase 2: RAG context retrieval. Failure degrades to no context.
        let mut rag_context = String::new();
        if let Some(provider) = &self.rag_provider {
            let rag_start = Instant::now();
            match provider.retrieve(input).await {
                Ok(results) => {
                    rag_context =
                        format_precedents_for_prompt(&results.items, self.precedent_tokens);
                    tracing::debug!(
                        precedents = results.items.len(),
                        chars = rag_context.len(),
                        "RAG context retrieved"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "RAG retrieval failed, continuing without context");
                }
            }
            timing.rag_ms = Some(rag_start.elapsed().as_millis() as u64);
        }

        // Phase 3: generation. The one unrecoverable phase.
        let generation_start = Instant::now();
        let draft = self
            .generator
            .generate(input, &rag_context)
            .await
            .context("draft generation failed")?;
        timing.generation_ms = Some(generation_start.elapsed().as_millis() as u64);

        // Phase 4: QA validation, always.
        let qa_start = Instant::now();
        let qa = run_parallel_qa(
            &draft.minuta,
            self.qa_estrutural.as_ref(),
            self.qa_semantico.as_ref(),
        )
        .await;
        timing.qa_ms = Some(qa_start.elapsed().as_millis() as u64);

        // Phase 5: hallucination detection, when a detector is configured.
        let hallucinations = self.detector.as_ref().map(|detector| {
            let detection_start = Instant::now();
            let report = detector.detect(&draft.minuta);
            timing.hallucination_ms = Some(detection_start.elapsed().as_millis() as u64);
            report
        });

        // Phase 6: cache write, gated on QA confidence.
        let ttl = ttl_for_confidence(qa.confidence);
        if ttl > 0 {
            let entry = CachedDraft {
                minuta: draft.minuta.clone(),
                qa: qa.clone(),
                tokens: draft.tokens,
                cached_at: Utc::now(),
            };
            self.cache.put(&cache_key, &entry, ttl).await;
            tracing::debug!(key = %cache_key, ttl, "result cached");
        }

        timing.total_ms = total_start.elapsed().as_millis() as u64;

        Ok(PipelineResult {
            minuta: draft.minuta,
            qa,
            cached: false,
            timing,
            tokens: draft.tokens,
            hallucinations,
        })
    }

    /// Shut down the cache backend.
    pub async fn shutdown(&self) {
        self.cache.quit().await;
    }
}
