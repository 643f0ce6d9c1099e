//! Personal job-application tracker
//!
//! Record job postings from a listing URL, keep them in a local SQLite
//! table, and list, update, or delete them from an interactive menu.
//!
//! # Modules
//!
//! - [`store`] - SQLite-backed job table
//! - [`fetcher`] - Listing page retrieval with classified failures
//! - [`extractor`] - Best-effort field extraction via OpenAI
//! - [`prompt`] - Terminal prompts
//! - [`workflow`] - Main menu and add-job flow
//! - [`testing`] - Mock capabilities for tests

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod prompt;
pub mod store;
pub mod testing;
pub mod workflow;

pub use config::Config;
pub use error::{ExtractionError, FetchError, PromptError, StoreError};
pub use extractor::{ExtractedFields, FieldExtractor, OpenAiExtractor, UnavailableExtractor};
pub use fetcher::{HttpFetcher, ListingFetcher};
pub use models::{Job, JobStatus, NewJob};
pub use prompt::{Prompter, TerminalPrompter};
pub use store::JobStore;
pub use workflow::{AddJobOutcome, MenuAction, StepError, Tracker, CLEAR_FIELD};
