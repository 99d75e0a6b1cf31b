//! Test Helper Utilities
//!
//! Shared fakes and fixtures for kwc-enrich integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use kwc_common::Settings;
use kwc_enrich::services::{
    CollectionPublisher, ContentGenerator, GenerationError, PromptResolver, StorefrontError,
};
use kwc_enrich::AppState;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DEFAULT_H2: &str = "Beach Outings";
pub const DEFAULT_H3: &str = "Evening Events";

/// `n` space-separated filler words
pub fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

/// Generator fake with queued replies per operation
///
/// When a queue is empty the generator falls back to `DEFAULT_H2`,
/// `DEFAULT_H3`, or a paragraph of exactly the requested length.
#[derive(Default)]
pub struct ScriptedGenerator {
    h2: Mutex<VecDeque<String>>,
    h3: Mutex<VecDeque<String>>,
    paragraphs: Mutex<VecDeque<String>>,
    failing: bool,
    pub h2_calls: AtomicUsize,
    pub h3_calls: AtomicUsize,
    pub paragraph_calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with an API error
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_h2<I: IntoIterator<Item = &'static str>>(self, replies: I) -> Self {
        self.h2.lock().unwrap().extend(replies.into_iter().map(String::from));
        self
    }

    pub fn with_h3<I: IntoIterator<Item = &'static str>>(self, replies: I) -> Self {
        self.h3.lock().unwrap().extend(replies.into_iter().map(String::from));
        self
    }

    pub fn with_paragraphs<I: IntoIterator<Item = String>>(self, replies: I) -> Self {
        self.paragraphs.lock().unwrap().extend(replies);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.h2_calls.load(Ordering::SeqCst)
            + self.h3_calls.load(Ordering::SeqCst)
            + self.paragraph_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), GenerationError> {
        if self.failing {
            Err(GenerationError::Api(500, "upstream unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate_h2_heading(&self, _keyword: &str) -> Result<String, GenerationError> {
        self.h2_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .h2
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_H2.to_string()))
    }

    async fn generate_paragraph(
        &self,
        _keyword: &str,
        _subtopic: &str,
        target_words: usize,
    ) -> Result<String, GenerationError> {
        self.paragraph_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .paragraphs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| words(target_words)))
    }

    async fn generate_h3_heading(
        &self,
        _keyword: &str,
        _other_heading: &str,
    ) -> Result<String, GenerationError> {
        self.h3_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .h3
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_H3.to_string()))
    }
}

/// Publisher fake that records every upsert
#[derive(Default)]
pub struct RecordingPublisher {
    pub upserts: Mutex<Vec<(String, String)>>,
    failing: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.upserts
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }
}

#[async_trait]
impl CollectionPublisher for RecordingPublisher {
    async fn upsert_collection(
        &self,
        title: &str,
        html_body: &str,
    ) -> Result<Option<u64>, StorefrontError> {
        if self.failing {
            return Err(StorefrontError::Api(502, "storefront down".to_string()));
        }
        let mut upserts = self.upserts.lock().unwrap();
        upserts.push((title.to_string(), html_body.to_string()));
        Ok(Some(upserts.len() as u64))
    }
}

/// Write a single-sheet workbook of text cells
pub fn write_xlsx(path: &Path, headers: &[&str], rows: &[Vec<&str>]) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            if !value.is_empty() {
                worksheet
                    .write_string(row as u32 + 1, col as u16, *value)
                    .unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Settings rooted in `root`, with input/output directories created
pub fn test_settings(root: &Path) -> Settings {
    let settings = Settings {
        openai_api_key: None,
        openai_model: "test-model".to_string(),
        openai_base_url: "http://127.0.0.1:9".to_string(),
        shopify_store_domain: None,
        shopify_access_token: None,
        shopify_api_version: "2024-01".to_string(),
        input_dir: root.join("input"),
        output_dir: root.join("output"),
        prompt_file: root.join("prompts.json"),
        poll_interval_minutes: 1440,
        enable_background_runner: false,
        bind_address: "127.0.0.1:0".to_string(),
        log_level: "debug".to_string(),
    };
    settings.ensure_directories().unwrap();
    settings
}

/// App state over `root` with the given fakes
pub fn test_state(
    root: &Path,
    generator: Arc<dyn ContentGenerator>,
    publisher: Option<Arc<dyn CollectionPublisher>>,
) -> AppState {
    let settings = test_settings(root);
    let prompts = Arc::new(PromptResolver::new(settings.prompt_file.clone()));
    AppState::new(settings, prompts, generator, publisher)
}

/// Path of `name` inside the input directory under `root`
pub fn input_path(root: &Path, name: &str) -> PathBuf {
    root.join("input").join(name)
}
