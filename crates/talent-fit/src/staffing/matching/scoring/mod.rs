mod prompt;
mod rules;

pub use prompt::{build_prompt, SCORING_SYSTEM_PROMPT};
pub use rules::ScoringRules;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::store::SimilarityMatch;
use crate::staffing::domain::CandidateId;
use crate::staffing::embedding::EmbeddingGateway;

/// LLM verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate_id: CandidateId,
    pub score: u8,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    candidate_id: i64,
    score: i64,
    reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring request failed: {0}")]
    Scoring(String),
    #[error("malformed score response: {0}")]
    MalformedScoreResponse(String),
}

/// Prompts the chat model with a candidate pool and parses its verdicts.
pub struct ScoringEngine {
    gateway: EmbeddingGateway,
    rules: ScoringRules,
}

impl ScoringEngine {
    pub fn new(gateway: EmbeddingGateway, rules: ScoringRules) -> Self {
        Self { gateway, rules }
    }

    pub fn build_prompt(&self, project_summary: &str, candidates: &[SimilarityMatch]) -> String {
        build_prompt(project_summary, candidates, &self.rules)
    }

    /// One chat completion; returns the first choice verbatim.
    #[tracing::instrument(skip_all, fields(prompt_chars = prompt.len()))]
    pub async fn score(&self, prompt: &str) -> Result<String, ScoringError> {
        let choices = self
            .gateway
            .chat(Some(SCORING_SYSTEM_PROMPT), prompt)
            .await
            .map_err(|err| ScoringError::Scoring(err.to_string()))?;

        let raw = choices
            .into_iter()
            .next()
            .ok_or_else(|| ScoringError::Scoring("no choices returned".to_string()))?;
        debug!(response_chars = raw.len(), "scoring response received");
        Ok(raw)
    }

    pub fn parse(&self, raw: &str) -> Result<Vec<CandidateScore>, ScoringError> {
        parse_scores(raw)
    }
}

/// Strict decode of `[{candidate_id, score, reason}]`. Scores outside 0..=100 are rejected.
pub fn parse_scores(raw: &str) -> Result<Vec<CandidateScore>, ScoringError> {
    let entries: Vec<RawScore> = serde_json::from_str(raw.trim())
        .map_err(|err| ScoringError::MalformedScoreResponse(err.to_string()))?;

    entries
        .into_iter()
        .map(|entry| {
            let score = u8::try_from(entry.score)
                .ok()
                .filter(|score| *score <= 100)
                .ok_or_else(|| {
                    ScoringError::MalformedScoreResponse(format!(
                        "score {} for candidate {} is outside 0-100",
                        entry.score, entry.candidate_id
                    ))
                })?;
            Ok(CandidateScore {
                candidate_id: CandidateId(entry.candidate_id),
                score,
                reason: entry.reason,
            })
        })
        .collect()
}
