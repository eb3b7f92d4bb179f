//! Answer generator trait for composing answers from retrieved context.

use async_trait::async_trait;

use crate::error::Result;

/// A language model that answers a question grounded in a context block.
///
/// The context is the string assembled by
/// [`build_context`](crate::context::build_context); implementations decide
/// how to frame it in a prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer to `question` using `context` as evidence.
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String>;

    /// The generator name for diagnostics.
    fn name(&self) -> &str;
}
