//! Analysis providers
//!
//! A provider turns one `AnalysisRequest` into an `AnalysisResult` by asking a
//! hosted language model. The presenter only sees this trait.

use crate::error::AnalysisError;
use crate::models::{AnalysisRequest, AnalysisResult};
use async_trait::async_trait;

pub mod perplexity;
pub mod think;

pub use perplexity::PerplexityClient;
pub use think::strip_think_tags;

/// Source of stock summaries
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> std::result::Result<AnalysisResult, AnalysisError>;
}

/// Offline provider for demos & testing
/// Keeps the app usable without network access or an API key
pub struct MockAnalysisProvider;

#[async_trait]
impl AnalysisProvider for MockAnalysisProvider {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> std::result::Result<AnalysisResult, AnalysisError> {
        if request.credential.is_none() {
            return Err(AnalysisError::MissingCredential);
        }

        let content = format!(
            "**{symbol}** traded in line with the broader market over the past week.\n\n\
             Recent coverage focused on guidance for the coming quarter; analyst ratings \
             for {symbol} were largely unchanged.\n\n\
             _Offline sample generated without contacting the analysis service._",
            symbol = request.symbol
        );

        Ok(AnalysisResult::new(content, vec![], "offline"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use crate::models::paragraphs;

    #[tokio::test]
    async fn test_mock_provider_mentions_symbol() {
        let request = AnalysisRequest::new("TSLA", Some(Credential::new("k").unwrap()));
        let result = MockAnalysisProvider.analyze(&request).await.unwrap();
        assert!(result.content.contains("TSLA"));
        assert_eq!(paragraphs(&result.content).count(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_requires_credential() {
        let request = AnalysisRequest::new("TSLA", None);
        let err = MockAnalysisProvider.analyze(&request).await.unwrap_err();
        assert_eq!(err, AnalysisError::MissingCredential);
    }
}
