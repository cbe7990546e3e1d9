use async_trait::async_trait;

/// One round trip to the classification model.
///
/// Implementations perform exactly one request per `ask` call. Pacing, retries and timeouts
/// belong to the caller.
#[async_trait]
pub trait RelevanceOracle: Send + Sync {
    /// Returns the model's raw answer for whether `keyword` is relevant to `topic`.
    async fn ask(&self, keyword: &str, topic: &str) -> Result<String, OracleError>;

    /// Checks that the oracle can be called at all, before a job starts spending its budget.
    fn preflight(&self) -> Result<(), OracleError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("rate limited")]
    RateLimited,
    #[error("API error: {status}")]
    ApiError { status: u16 },
    #[error("transport error: {0}")]
    TransportError(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("oracle not configured: {0}")]
    NotConfigured(String),
}

impl OracleError {
    /// Whether the error counts against the retry budget.
    ///
    /// Rate limiting is retried without consuming an attempt; configuration errors are never
    /// retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OracleError::ApiError { .. }
                | OracleError::TransportError(_)
                | OracleError::MalformedResponse(_)
        )
    }
}
