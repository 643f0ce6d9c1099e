//! Field extractor.
//!
//! Turns a fetched listing into a best-effort guess of the job fields. The
//! output is never trusted: the add-job flow shows every field to the user
//! for confirmation before anything is stored.

use std::sync::LazyLock;

use async_trait::async_trait;
use openai_client::{truncate_to_char_boundary, ChatRequest, Message, OpenAIClient};
use regex::Regex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ExtractionError, ExtractionResult};
use crate::models::JobStatus;

/// Completion budget for the extraction call.
pub const MAX_COMPLETION_TOKENS: u32 = 100;

/// Listing text sent to the service is cut to this many bytes, on a char
/// boundary.
pub const MAX_LISTING_BYTES: usize = 12_000;

const SYSTEM_PROMPT: &str = "You extract job posting details. Reply with exactly five lines, \
each starting with its label: Job Title, Company, Location, Date Posted, Status. \
Leave the value empty when the listing does not say.";

/// Best-effort structured guess. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub date_posted: String,
    pub status: JobStatus,
}

/// Extracts job fields from raw listing text.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, raw_text: &str) -> ExtractionResult<ExtractedFields>;

    fn name(&self) -> &str;
}

/// Extractor backed by a single bounded OpenAI chat completion.
pub struct OpenAiExtractor {
    client: OpenAIClient,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Build from config. Fails with [`ExtractionError::MissingCredential`]
    /// when no API key is configured.
    pub fn from_config(config: &Config) -> ExtractionResult<Self> {
        let api_key = config
            .openai_api_key
            .as_deref()
            .ok_or(ExtractionError::MissingCredential("OPENAI_API_KEY"))?;

        let client = OpenAIClient::new(api_key).with_timeout(config.extraction_timeout)?;
        Ok(Self::new(client, config.openai_model.clone()))
    }
}

#[async_trait]
impl FieldExtractor for OpenAiExtractor {
    async fn extract(&self, raw_text: &str) -> ExtractionResult<ExtractedFields> {
        let request = ChatRequest::new(&self.model)
            .message(Message::system(SYSTEM_PROMPT))
            .message(Message::user(build_prompt(raw_text)))
            .temperature(0.0)
            .max_tokens(MAX_COMPLETION_TOKENS);

        let response = self.client.chat_completion(request).await?;
        debug!(completion = %response.content, "Extraction completion received");

        let fields = parse_completion(&response.content);
        info!(
            title = %fields.job_title,
            company = %fields.company,
            "Extracted listing fields"
        );
        Ok(fields)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Stand-in used when the extraction service cannot be configured. Every call
/// reports the missing credential so the user sees it on first use.
pub struct UnavailableExtractor {
    missing: &'static str,
}

impl UnavailableExtractor {
    pub fn missing_credential(variable: &'static str) -> Self {
        Self { missing: variable }
    }
}

#[async_trait]
impl FieldExtractor for UnavailableExtractor {
    async fn extract(&self, _raw_text: &str) -> ExtractionResult<ExtractedFields> {
        Err(ExtractionError::MissingCredential(self.missing))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Reduce the listing to readable text and append the labelled template.
pub fn build_prompt(raw_text: &str) -> String {
    let text = listing_text(raw_text);
    let text = truncate_to_char_boundary(&text, MAX_LISTING_BYTES);
    format!(
        "Extract the following job information from this job listing:\n\n{}\n\n\
         Job Title: \nCompany: \nLocation: \nDate Posted: \nStatus: ",
        text
    )
}

static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|tr|section)>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\f]+").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Strip markup from a listing page. Plain text passes through unchanged
/// apart from whitespace cleanup.
pub fn listing_text(html: &str) -> String {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = BLOCK_END.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let text = INLINE_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone, Copy)]
enum Slot {
    Title,
    Company,
    Location,
    DatePosted,
    Status,
}

const LABELS: [(&str, Slot); 7] = [
    ("job title", Slot::Title),
    ("title", Slot::Title),
    ("company", Slot::Company),
    ("location", Slot::Location),
    ("date posted", Slot::DatePosted),
    ("posted", Slot::DatePosted),
    ("status", Slot::Status),
];

fn labelled(line: &str) -> Option<(Slot, &str)> {
    let (label, value) = line.split_once(':')?;
    let label = label.trim().trim_start_matches(['-', '*']).trim();
    LABELS
        .iter()
        .find(|(name, _)| label.eq_ignore_ascii_case(name))
        .map(|(_, slot)| (*slot, value.trim()))
}

/// Parse the completion into fields.
///
/// Labelled lines are matched in any order. Unlabelled lines then fill the
/// slots no label claimed, in field order, so a plain positional reply works
/// too. An unrecognised status falls back to Applied.
pub fn parse_completion(completion: &str) -> ExtractedFields {
    let mut values: [String; 5] = Default::default();
    let mut claimed = [false; 5];
    let mut unlabelled = Vec::new();

    for line in completion.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match labelled(line) {
            Some((slot, value)) => {
                let slot = slot as usize;
                claimed[slot] = true;
                if values[slot].is_empty() {
                    values[slot] = value.to_string();
                }
            }
            None => unlabelled.push(line),
        }
    }

    let open_slots = (0..values.len()).filter(|&slot| !claimed[slot]);
    for (slot, line) in open_slots.zip(unlabelled) {
        values[slot] = line.to_string();
    }

    let [job_title, company, location, date_posted, status] = values;
    ExtractedFields {
        job_title,
        company,
        location,
        date_posted,
        status: status.parse().unwrap_or_default(),
    }
}
