//! Testing utilities including mock implementations.
//!
//! These let the workflow run end to end without a network, an extraction
//! service, or a terminal.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{
    ExtractionError, ExtractionResult, FetchError, FetchResult, PromptError, PromptResult,
};
use crate::extractor::{ExtractedFields, FieldExtractor};
use crate::fetcher::ListingFetcher;
use crate::prompt::Prompter;

/// Canned outcome for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Body(String),
    Status(u16, String),
    NoResponse,
    BadRequest,
}

/// Mock fetcher. Unknown URLs behave like an unreachable host.
#[derive(Default, Clone)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, url: impl Into<String>, response: MockResponse) -> Self {
        self.responses.write().unwrap().insert(url.into(), response);
        self
    }

    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_response(url, MockResponse::Body(body.into()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl ListingFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        self.calls.write().unwrap().push(url.to_string());

        let response = self.responses.read().unwrap().get(url).cloned();
        match response.unwrap_or(MockResponse::NoResponse) {
            MockResponse::Body(body) => Ok(body),
            MockResponse::Status(status, body) => Err(FetchError::Http {
                url: url.to_string(),
                status,
                body,
            }),
            MockResponse::NoResponse => Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".into(),
            }),
            MockResponse::BadRequest => Err(FetchError::Setup {
                url: url.to_string(),
                message: "relative URL without a base".into(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock extractor returning fixed fields, or failing when built with
/// [`MockExtractor::failing`].
#[derive(Default, Clone)]
pub struct MockExtractor {
    fields: Option<ExtractedFields>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    pub fn returning(fields: ExtractedFields) -> Self {
        Self {
            fields: Some(fields),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Raw texts passed to `extract`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl FieldExtractor for MockExtractor {
    async fn extract(&self, raw_text: &str) -> ExtractionResult<ExtractedFields> {
        self.calls.write().unwrap().push(raw_text.to_string());
        self.fields
            .clone()
            .ok_or(ExtractionError::MissingCredential("MOCK_API_KEY"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Type this text
    Text(String),
    /// Accept the offered default (empty text when there is none)
    Default,
    /// Pick this index
    Choice(usize),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Answer::Text(value.into())
    }
}

/// A question the prompter was asked, with the default it offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asked {
    pub label: String,
    pub default: Option<String>,
}

/// Prompter that replays a fixed script of answers and records every question.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<Asked>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[Asked] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, label: &str, default: Option<String>) -> PromptResult<Answer> {
        self.asked.push(Asked {
            label: label.to_string(),
            default,
        });
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::Exhausted(label.to_string()))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, label: &str, default: Option<&str>) -> PromptResult<String> {
        match self.next(label, default.map(str::to_string))? {
            Answer::Text(text) if text.is_empty() => Ok(default.unwrap_or_default().to_string()),
            Answer::Text(text) => Ok(text),
            Answer::Default => Ok(default.unwrap_or_default().to_string()),
            Answer::Choice(index) => Err(PromptError::InvalidInput {
                label: label.to_string(),
                value: index.to_string(),
            }),
        }
    }

    fn select(
        &mut self,
        label: &str,
        choices: &[&str],
        default: Option<usize>,
    ) -> PromptResult<usize> {
        let offered = default.and_then(|i| choices.get(i)).map(|c| c.to_string());
        match self.next(label, offered)? {
            Answer::Choice(index) => Ok(index),
            Answer::Default => Ok(default.unwrap_or(0)),
            Answer::Text(text) => choices
                .iter()
                .position(|choice| *choice == text)
                .ok_or(PromptError::InvalidInput {
                    label: label.to_string(),
                    value: text,
                }),
        }
    }
}
