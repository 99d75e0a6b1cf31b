//! Prompt template resolution
//!
//! Compiled-in defaults merged with user overrides persisted as a flat JSON
//! object. Overrides are loaded lazily, cached, and replaced wholesale on save.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

const DEFAULT_H2_HEADING: &str = "Given the main collection keyword: {keyword}. Suggest one complementary, \
semantically relevant H2 subtopic that helps shoppers discover related items.\n\
- Keep it 2-5 words.\n\
- Avoid repeating the main keyword verbatim.\n\
- Be specific, non-brand, and non-location.\n\
Return just the phrase.";

const DEFAULT_PARAGRAPH: &str = "Write an informative, customer-friendly paragraph (~{target_words} words) expanding \
on the subtopic: {subtopic} in the context of {keyword}.\n\
- Tone: helpful, concise, non-fluffy.\n\
- Include practical shopping guidance (fit, fabrics, occasions, styling).\n\
- No brand claims, no pricing.\n\
- Avoid keyword stuffing.\n\
- Return plain HTML <p> only (no inline styles).";

const DEFAULT_H3_HEADING: &str = "For the main keyword {keyword}, suggest another complementary subtopic for an H3 heading \
that differs from {h2_keyword}.\n\
- 2-5 words, concise, non-brand.\n\
Return just the phrase.";

/// Prompt resolver errors
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Unknown prompt key: {0}")]
    UnknownKey(String),

    #[error("Unknown placeholder {{{0}}} in prompt template")]
    UnknownPlaceholder(String),

    #[error("Unbalanced brace in prompt template")]
    UnbalancedBrace,

    #[error("Prompt store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The three prompt templates the generator uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PromptKey {
    H2Heading,
    Paragraph,
    H3Heading,
}

impl PromptKey {
    pub const ALL: [PromptKey; 3] = [PromptKey::H2Heading, PromptKey::Paragraph, PromptKey::H3Heading];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKey::H2Heading => "h2_heading",
            PromptKey::Paragraph => "paragraph",
            PromptKey::H3Heading => "h3_heading",
        }
    }

    /// Compiled-in template
    pub fn default_template(&self) -> &'static str {
        match self {
            PromptKey::H2Heading => DEFAULT_H2_HEADING,
            PromptKey::Paragraph => DEFAULT_PARAGRAPH,
            PromptKey::H3Heading => DEFAULT_H3_HEADING,
        }
    }
}

impl fmt::Display for PromptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptKey {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| PromptError::UnknownKey(s.to_string()))
    }
}

/// Resolves prompt templates, preferring persisted overrides
pub struct PromptResolver {
    prompt_file: PathBuf,
    overrides: RwLock<Option<HashMap<PromptKey, String>>>,
}

impl PromptResolver {
    pub fn new(prompt_file: PathBuf) -> Self {
        Self {
            prompt_file,
            overrides: RwLock::new(None),
        }
    }

    /// Template for a key name; unknown names fail with `UnknownKey`
    pub async fn resolve(&self, key: &str) -> Result<String, PromptError> {
        let key: PromptKey = key.parse()?;
        self.resolve_key(key).await
    }

    /// Override if present and non-blank, else the default
    pub async fn resolve_key(&self, key: PromptKey) -> Result<String, PromptError> {
        let overrides = self.load_overrides().await?;
        Ok(overrides
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.default_template().to_string()))
    }

    /// All three templates currently in effect
    pub async fn effective_prompts(&self) -> Result<BTreeMap<String, String>, PromptError> {
        let overrides = self.load_overrides().await?;
        Ok(PromptKey::ALL
            .into_iter()
            .map(|key| {
                let template = overrides
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| key.default_template().to_string());
                (key.as_str().to_string(), template)
            })
            .collect())
    }

    /// Only the user-provided overrides
    pub async fn overrides(&self) -> Result<BTreeMap<String, String>, PromptError> {
        let overrides = self.load_overrides().await?;
        Ok(overrides
            .into_iter()
            .map(|(key, value)| (key.as_str().to_string(), value))
            .collect())
    }

    /// Persist non-blank recognized overrides and replace the cache
    ///
    /// Keys omitted or left blank fall back to their defaults afterwards.
    pub async fn save(&self, prompts: &HashMap<String, String>) -> Result<(), PromptError> {
        let mut sanitized: HashMap<PromptKey, String> = HashMap::new();
        for (name, value) in prompts {
            let Ok(key) = name.parse::<PromptKey>() else {
                warn!(key = %name, "Ignoring unknown prompt key on save");
                continue;
            };
            let cleaned = value.trim();
            if !cleaned.is_empty() {
                sanitized.insert(key, cleaned.to_string());
            }
        }

        let on_disk: BTreeMap<&str, &str> = sanitized
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let serialized = serde_json::to_string_pretty(&on_disk)?;

        let mut cache = self.overrides.write().await;
        tokio::fs::write(&self.prompt_file, serialized).await?;
        info!(
            path = %self.prompt_file.display(),
            overrides = sanitized.len(),
            "Prompt overrides saved"
        );
        *cache = Some(sanitized);
        Ok(())
    }

    async fn load_overrides(&self) -> Result<HashMap<PromptKey, String>, PromptError> {
        if let Some(cached) = self.overrides.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let mut cache = self.overrides.write().await;
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }

        let loaded = match tokio::fs::read_to_string(&self.prompt_file).await {
            Ok(content) => parse_overrides(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(PromptError::Io(e)),
        };
        *cache = Some(loaded.clone());
        Ok(loaded)
    }
}

/// Parse persisted overrides, dropping anything unrecognized
///
/// Malformed content yields no overrides rather than an error.
fn parse_overrides(content: &str) -> HashMap<PromptKey, String> {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Prompt store is not valid JSON, using defaults");
            return HashMap::new();
        }
    };

    let Value::Object(entries) = value else {
        warn!("Prompt store is not a JSON object, using defaults");
        return HashMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(name, value)| {
            let key = name.parse::<PromptKey>().ok()?;
            let text = value.as_str()?.trim();
            (!text.is_empty()).then(|| (key, text.to_string()))
        })
        .collect()
}

/// Substitute `{name}` placeholders; `{{` and `}}` produce literal braces
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => return Err(PromptError::UnbalancedBrace),
                    }
                }
                let value = vars
                    .iter()
                    .find(|(var, _)| *var == name)
                    .map(|(_, value)| *value)
                    .ok_or(PromptError::UnknownPlaceholder(name))?;
                output.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '}' => return Err(PromptError::UnbalancedBrace),
            _ => output.push(ch),
        }
    }

    Ok(output)
}
