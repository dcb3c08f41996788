//! Core data models for stock analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::Credential;

/// Shown when the service answers without any usable text
pub const NO_ANALYSIS_PLACEHOLDER: &str = "No analysis available";

//
// ================= Request =================
//

/// One outbound analysis request, created on selection and discarded on completion
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub request_id: Uuid,
    pub symbol: String,
    pub credential: Option<Credential>,
}

impl AnalysisRequest {
    pub fn new(symbol: impl Into<String>, credential: Option<Credential>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            symbol: symbol.into(),
            credential,
        }
    }
}

//
// ================= Result =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub content: String,
    #[serde(default)]
    pub references: Vec<String>,
    pub model: String,
    pub received_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(content: impl Into<String>, references: Vec<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            references,
            model: model.into(),
            received_at: Utc::now(),
        }
    }
}

/// Split analysis text into display paragraphs on blank lines
pub fn paragraphs(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_split_skips_blank_blocks() {
        let split: Vec<_> =
            paragraphs("First paragraph.\n\n\n\nSecond one\nstill second.\n\n   \n\nThird.").collect();
        assert_eq!(
            split,
            vec!["First paragraph.", "Second one\nstill second.", "Third."]
        );
    }

    #[test]
    fn test_requests_get_distinct_ids() {
        let a = AnalysisRequest::new("AAPL", None);
        let b = AnalysisRequest::new("AAPL", None);
        assert_ne!(a.request_id, b.request_id);
        assert!(a.credential.is_none());
    }
}
