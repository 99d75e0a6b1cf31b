//! Service modules for the enrichment pipeline
//!
//! Leaves first: prompt resolution, text generation, storefront publishing,
//! then the workbook processor that drives them and the background runner.

pub mod background_runner;
pub mod content_generator;
pub mod content_rules;
pub mod openai_client;
pub mod prompt_resolver;
pub mod storefront_client;
pub mod workbook_processor;

pub use content_generator::{ContentGenerator, GenerationError, PromptedGenerator, TextGenerator};
pub use openai_client::OpenAiClient;
pub use prompt_resolver::{PromptError, PromptKey, PromptResolver};
pub use storefront_client::{CollectionPublisher, ShopifyClient, StorefrontError};
pub use workbook_processor::{ProcessorError, WorkbookProcessor};
