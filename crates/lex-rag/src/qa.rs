//! Parallel QA runner.
//!
//! Runs the structural and semantic validators concurrently and merges their
//! scores into a single confidence signal. A failing validator never blocks
//! or fails the run; its absence just shifts the weight to the other score.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Weight of the structural score in the merged result.
pub const STRUCTURAL_WEIGHT: f64 = 0.4;
/// Weight of the semantic score in the merged result.
pub const SEMANTIC_WEIGHT: f64 = 0.6;

/// Raw result of one QA validator: a 0-100 score plus free-form detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaScore {
    pub score: f64,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// A single QA validator (structural or semantic) over a draft text.
#[async_trait]
pub trait QaValidator: Send + Sync {
    async fn validate(&self, minuta: &str) -> anyhow::Result<QaScore>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaTiming {
    pub parallel: bool,
    pub total_ms: u64,
}

/// Merged QA outcome: both raw sub-results (None on failure), the weighted
/// final score, and any per-validator errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    pub score_final: u32,
    pub confidence: f64,
    pub qa_estrutural: Option<QaScore>,
    pub qa_semantico: Option<QaScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub timing: QaTiming,
}

/// Merge structural and semantic scores: both present -> weighted 0.4/0.6
/// round; one present -> that score; none -> 0. Confidence is the final
/// score scaled to [0, 1].
pub fn merge_qa_scores(
    estrutural: Option<&QaScore>,
    semantico: Option<&QaScore>,
) -> (u32, f64) {
    let score_final = match (estrutural, semantico) {
        (Some(e), Some(s)) => {
            (e.score * STRUCTURAL_WEIGHT + s.score * SEMANTIC_WEIGHT).round() as u32
        }
        (Some(e), None) => e.score.round() as u32,
        (None, Some(s)) => s.score.round() as u32,
        (None, None) => 0,
    };
    (score_final, f64::from(score_final) / 100.0)
}

/// Run both validators concurrently and merge. Never returns an error;
/// validator failures are captured in the report's `errors`.
pub async fn run_parallel_qa(
    minuta: &str,
    estrutural: &dyn QaValidator,
    semantico: &dyn QaValidator,
) -> QaReport {
    let start = Instant::now();
    let mut errors = Vec::new();

    let (estrutural_result, semantico_result) =
        tokio::join!(estrutural.validate(minuta), semantico.validate(minuta));

    let qa_estrutural = match estrutural_result {
        Ok(score) => Some(score),
        Err(e) => {
            tracing::error!(error = %e, "structural QA failed");
            errors.push(format!("estrutural: {e}"));
            None
        }
    };

    let qa_semantico = match semantico_result {
        Ok(score) => Some(score),
        Err(e) => {
            tracing::error!(error = %e, "semantic QA failed");
            errors.push(format!("semantico: {e}"));
            None
        }
    };

    let (score_final, confidence) = merge_qa_scores(qa_estrutural.as_ref(), qa_semantico.as_ref());

    QaReport {
        score_final,
        confidence,
        qa_estrutural,
        qa_semantico,
        errors,
        timing: QaTiming {
            parallel: true,
            total_ms: start.elapsed().as_millis() as u64,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Duration;

    struct FixedValidator {
        score: f64,
        delay: Duration,
    }

    #[async_trait]
    impl QaValidator for FixedValidator {
        async fn validate(&self, _minuta: &str) -> anyhow::Result<QaScore> {
            tokio::time::sleep(self.delay).await;
            Ok(QaScore {
                score: self.score,
                details: serde_json::Value::Null,
            })
        }
    }

    struct FailingValidator;

    #[async_trait]
    impl QaValidator for FailingValidator {
        async fn validate(&self, _minuta: &str) -> anyhow::Result<QaScore> {
            Err(anyhow!("validator crashed"))
        }
    }

    fn score(value: f64) -> QaScore {
        QaScore {
            score: value,
            details: serde_json::Value::Null,
        }
    }

    #[test]
    fn merge_weights_structural_40_semantic_60() {
        let (final_score, confidence) = merge_qa_scores(Some(&score(85.0)), Some(&score(90.0)));
        assert_eq!(final_score, 88);
        assert!((confidence - 0.88).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_falls_back_to_single_score() {
        assert_eq!(merge_qa_scores(Some(&score(72.0)), None).0, 72);
        assert_eq!(merge_qa_scores(None, Some(&score(64.0))).0, 64);
    }

    #[test]
    fn merge_defaults_to_zero() {
        let (final_score, confidence) = merge_qa_scores(None, None);
        assert_eq!(final_score, 0);
        assert_eq!(confidence, 0.0);
    }

    #[tokio::test]
    async fn validators_run_concurrently() {
        let estrutural = FixedValidator {
            score: 80.0,
            delay: Duration::from_millis(30),
        };
        let semantico = FixedValidator {
            score: 90.0,
            delay: Duration::from_millis(30),
        };

        let start = std::time::Instant::now();
        let report = run_parallel_qa("minuta", &estrutural, &semantico).await;
        let elapsed = start.elapsed();

        // Sequential execution would take >= 60ms.
        assert!(elapsed < Duration::from_millis(55), "took {elapsed:?}");
        assert_eq!(report.score_final, 86);
        assert!(report.errors.is_empty());
        assert!(report.timing.parallel);
    }

    #[tokio::test]
    async fn failure_of_one_validator_degrades_to_other_score() {
        let semantico = FixedValidator {
            score: 90.0,
            delay: Duration::from_millis(1),
        };
        let report = run_parallel_qa("minuta", &FailingValidator, &semantico).await;

        assert!(report.qa_estrutural.is_none());
        assert_eq!(report.score_final, 90);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("estrutural:"));
    }

    #[tokio::test]
    async fn both_validators_failing_yields_zero_confidence() {
        let report = run_parallel_qa("minuta", &FailingValidator, &FailingValidator).await;
        assert_eq!(report.score_final, 0);
        assert_eq!(report.confidence, 0.0);
        assert_eq!(report.errors.len(), 2);
    }
}
