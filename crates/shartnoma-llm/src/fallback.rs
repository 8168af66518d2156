//! Primary/secondary provider chain

use crate::LlmError;
use async_trait::async_trait;
use shartnoma_domain::traits::LlmProvider as LlmProviderTrait;
use tracing::warn;

/// Tries the primary provider and falls back to the secondary on any error
///
/// The error returned when both fail is the secondary's.
pub struct FallbackProvider<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackProvider<P, S>
where
    P: LlmProviderTrait<Error = LlmError>,
    S: LlmProviderTrait<Error = LlmError>,
{
    /// Chain two providers
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P, S> LlmProviderTrait for FallbackProvider<P, S>
where
    P: LlmProviderTrait<Error = LlmError>,
    S: LlmProviderTrait<Error = LlmError>,
{
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        match self.primary.generate(prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("Primary model '{}' failed ({}), using '{}'", self.primary.model_name(), e, self.secondary.model_name());
                self.secondary.generate(prompt).await
            }
        }
    }

    async fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error> {
        match self.primary.generate_structured(prompt, schema).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("Primary model '{}' failed ({}), using '{}'", self.primary.model_name(), e, self.secondary.model_name());
                self.secondary.generate_structured(prompt, schema).await
            }
        }
    }

    fn is_retryable(&self, error: &Self::Error) -> bool {
        error.is_transient()
    }

    fn model_name(&self) -> &str {
        self.primary.model_name()
    }
}
