use crate::error::ClassifyError;
use crate::types::ChatCompletionRequest;
use async_trait::async_trait;

/// Classifies account names. Always returns one label per input, in input order.
#[async_trait]
pub trait Engine {
    async fn classify(&self, accounts: &[String]) -> Vec<String>;
}

/// One round trip to the external classifier, returning the raw reply text.
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    async fn complete(&self, request: ChatCompletionRequest) -> Result<String, ClassifyError>;
}
