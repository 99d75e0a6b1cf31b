//! Marketing copy generation
//!
//! `ContentGenerator` is the seam the workbook processor depends on.
//! `PromptedGenerator` implements it by rendering a prompt template and
//! sending it to a `TextGenerator` backend.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::prompt_resolver::{render_template, PromptError, PromptKey, PromptResolver};

/// Generation errors, always attributable to the row being processed
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("OPENAI_API_KEY is missing. Set it before generating content.")]
    MissingApiKey,

    #[error("Text generation network error: {0}")]
    Network(String),

    #[error("Text generation API error {0}: {1}")]
    Api(u16, String),

    #[error("Text generation response could not be parsed: {0}")]
    Parse(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// Raw prompt-in, text-out backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// The three generation operations used per row
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Suggest an H2 subtopic for the keyword
    async fn generate_h2_heading(&self, keyword: &str) -> Result<String, GenerationError>;

    /// Paragraph of roughly `target_words` words about `subtopic`
    async fn generate_paragraph(
        &self,
        keyword: &str,
        subtopic: &str,
        target_words: usize,
    ) -> Result<String, GenerationError>;

    /// Suggest an H3 subtopic different from `other_heading`
    async fn generate_h3_heading(
        &self,
        keyword: &str,
        other_heading: &str,
    ) -> Result<String, GenerationError>;
}

/// Template-driven generator
pub struct PromptedGenerator {
    prompts: Arc<PromptResolver>,
    backend: Arc<dyn TextGenerator>,
}

impl PromptedGenerator {
    pub fn new(prompts: Arc<PromptResolver>, backend: Arc<dyn TextGenerator>) -> Self {
        Self { prompts, backend }
    }

    async fn run(&self, key: PromptKey, vars: &[(&str, &str)]) -> Result<String, GenerationError> {
        let template = self.prompts.resolve_key(key).await?;
        let prompt = render_template(&template, vars)?;
        tracing::debug!(prompt_key = %key, "Requesting generated text");
        let text = self.backend.complete(&prompt).await?;
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl ContentGenerator for PromptedGenerator {
    async fn generate_h2_heading(&self, keyword: &str) -> Result<String, GenerationError> {
        self.run(PromptKey::H2Heading, &[("keyword", keyword)]).await
    }

    async fn generate_paragraph(
        &self,
        keyword: &str,
        subtopic: &str,
        target_words: usize,
    ) -> Result<String, GenerationError> {
        let target = target_words.to_string();
        self.run(
            PromptKey::Paragraph,
            &[
                ("keyword", keyword),
                ("subtopic", subtopic),
                ("target_words", &target),
            ],
        )
        .await
    }

    async fn generate_h3_heading(
        &self,
        keyword: &str,
        other_heading: &str,
    ) -> Result<String, GenerationError> {
        self.run(
            PromptKey::H3Heading,
            &[("keyword", keyword), ("h2_keyword", other_heading)],
        )
        .await
    }
}
