//! Workflow controller.
//!
//! Owns the store and the three capabilities, and drives two flows: the main
//! menu loop and the add-job pipeline (fetch, extract, confirm, insert).
//! Errors are handled at the step that raised them; the menu always comes
//! back unless the user picks Exit or the terminal goes away.

use console::style;
use futures::StreamExt;
use openai_client::truncate_to_char_boundary;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::{FetchError, PromptError, StoreError};
use crate::extractor::{ExtractedFields, FieldExtractor};
use crate::fetcher::ListingFetcher;
use crate::models::{JobStatus, NewJob};
use crate::prompt::{check_choice, select_status, Prompter};
use crate::store::JobStore;

/// Error bodies are cut to this many bytes in logs.
const LOGGED_BODY_LIMIT: usize = 500;

/// Typed at a confirmation prompt to blank a pre-filled field.
pub const CLEAR_FIELD: &str = "-";

/// Actions offered by the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddJob,
    ListJobs,
    UpdateStatus,
    DeleteJob,
    Exit,
}

impl MenuAction {
    /// Menu order.
    pub const ALL: [MenuAction; 5] = [
        MenuAction::AddJob,
        MenuAction::ListJobs,
        MenuAction::UpdateStatus,
        MenuAction::DeleteJob,
        MenuAction::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::AddJob => "Add Job",
            MenuAction::ListJobs => "List Jobs",
            MenuAction::UpdateStatus => "Update Job Status",
            MenuAction::DeleteJob => "Delete Job",
            MenuAction::Exit => "Exit",
        }
    }
}

/// Failure of a single menu step. Never ends the menu loop.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StepResult<T> = std::result::Result<T, StepError>;

/// How an add-job run ended without a step error.
#[derive(Debug)]
pub enum AddJobOutcome {
    /// Stored under this id
    Added(i64),
    /// The listing could not be fetched; nothing was stored
    FetchFailed(FetchError),
}

/// Interactive tracker. Holds the only store handle for the process.
pub struct Tracker<P: Prompter> {
    store: JobStore,
    fetcher: Box<dyn ListingFetcher>,
    extractor: Box<dyn FieldExtractor>,
    prompter: P,
}

impl<P: Prompter> Tracker<P> {
    pub fn new(
        store: JobStore,
        fetcher: Box<dyn ListingFetcher>,
        extractor: Box<dyn FieldExtractor>,
        prompter: P,
    ) -> Self {
        Self {
            store,
            fetcher,
            extractor,
            prompter,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Run the main menu until Exit, then close the store.
    ///
    /// An out-of-range selection re-presents the menu. Any other failure to
    /// read the selection (e.g. stdin closed) ends the loop, since no further
    /// input can arrive.
    pub async fn run(&mut self) -> Result<(), StoreError> {
        info!(
            fetcher = self.fetcher.name(),
            extractor = self.extractor.name(),
            "Job tracker started"
        );

        loop {
            println!();
            let action = match self.prompt_menu() {
                Ok(action) => action,
                Err(e @ PromptError::InvalidChoice { .. }) => {
                    warn!(error = %e, "Ignoring invalid menu selection");
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Could not read menu selection, shutting down");
                    break;
                }
            };

            if action == MenuAction::Exit {
                break;
            }
            self.dispatch(action).await;
        }

        self.store.close().await?;
        println!("{}", style("Goodbye!").cyan());
        Ok(())
    }

    fn prompt_menu(&mut self) -> Result<MenuAction, PromptError> {
        let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();
        let label = "What would you like to do?";
        let index = self.prompter.select(label, &labels, Some(0))?;
        let index = check_choice(label, index, MenuAction::ALL.len())?;
        Ok(MenuAction::ALL[index])
    }

    /// Run one non-Exit action, logging whatever went wrong.
    pub async fn dispatch(&mut self, action: MenuAction) {
        let result = match action {
            MenuAction::AddJob => self.add_job().await.map(|_| ()),
            MenuAction::ListJobs => self.list_jobs().await.map(|_| ()),
            MenuAction::UpdateStatus => self.update_job_status().await.map(|_| ()),
            MenuAction::DeleteJob => self.delete_job().await.map(|_| ()),
            MenuAction::Exit => Ok(()),
        };

        if let Err(e) = result {
            error!(action = action.label(), error = %e, "Action failed");
        }
    }

    /// Fetch a listing, extract a guess, let the user confirm it, store it.
    pub async fn add_job(&mut self) -> StepResult<AddJobOutcome> {
        let url = self
            .prompter
            .input("Enter the job listing URL:", None)?
            .trim()
            .to_string();

        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                report_fetch_error(&e);
                return Ok(AddJobOutcome::FetchFailed(e));
            }
        };

        let extracted = match self.extractor.extract(&body).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(url = %url, error = %e, "Extraction failed, continuing with empty fields");
                ExtractedFields::default()
            }
        };

        let job = self.confirm_fields(&url, extracted)?;
        let id = self.store.insert(&job).await?;

        info!(id, title = %job.title, company = %job.company, "Job added");
        println!("{} {}", style("Inserted job with ID:").green(), id);
        Ok(AddJobOutcome::Added(id))
    }

    /// Show every field for review. Enter keeps the pre-filled value and
    /// [`CLEAR_FIELD`] blanks it.
    fn confirm_fields(&mut self, url: &str, extracted: ExtractedFields) -> StepResult<NewJob> {
        println!(
            "{}",
            style(format!(
                "Press Enter to keep a value, or type {} to clear it.",
                CLEAR_FIELD
            ))
            .dim()
        );
        let p = &mut self.prompter;
        let title = p.input("Job Title:", Some(extracted.job_title.as_str()))?;
        let company = p.input("Company:", Some(extracted.company.as_str()))?;
        let location = p.input("Location:", Some(extracted.location.as_str()))?;
        let url = p.input("Job URL:", Some(url))?;
        let date_posted = p.input("Date Posted:", Some(extracted.date_posted.as_str()))?;
        let status = select_status(p, "Application Status:", extracted.status)?;

        Ok(NewJob {
            title: answer(&title),
            company: answer(&company),
            location: optional(&location),
            url: answer(&url),
            date_posted: optional(&date_posted),
            status: Some(status),
        })
    }

    /// Print every job. Returns how many were listed.
    pub async fn list_jobs(&mut self) -> StepResult<usize> {
        let mut jobs = self.store.list_all();
        let mut count = 0;

        while let Some(job) = jobs.next().await {
            println!("{}", job?);
            count += 1;
        }

        if count == 0 {
            println!("{}", style("No jobs recorded yet.").dim());
        }
        Ok(count)
    }

    /// Ask for an id and a new status. Returns rows affected.
    pub async fn update_job_status(&mut self) -> StepResult<u64> {
        let id = self.prompter.input_id("Job ID:")?;
        let status = select_status(&mut self.prompter, "New status:", JobStatus::default())?;

        let rows = self.store.update_status(id, status).await?;
        if rows == 0 {
            warn!(id, "Update matched no job");
            println!("{}", style(format!("No job with ID {}", id)).yellow());
        } else {
            println!("Row(s) updated: {}", rows);
        }
        Ok(rows)
    }

    /// Ask for an id and delete that job. Returns rows affected.
    pub async fn delete_job(&mut self) -> StepResult<u64> {
        let id = self.prompter.input_id("Job ID:")?;

        let rows = self.store.delete(id).await?;
        if rows == 0 {
            warn!(id, "Delete matched no job");
            println!("{}", style(format!("No job with ID {}", id)).yellow());
        } else {
            println!("Row(s) deleted: {}", rows);
        }
        Ok(rows)
    }
}

fn answer(value: &str) -> String {
    match value.trim() {
        CLEAR_FIELD => String::new(),
        trimmed => trimmed.to_string(),
    }
}

fn optional(value: &str) -> Option<String> {
    let value = answer(value);
    (!value.is_empty()).then_some(value)
}

fn report_fetch_error(e: &FetchError) {
    match e {
        FetchError::Network { url, message } => {
            error!(
                url = %url,
                error = %message,
                "Failed to fetch listing: request was made but no response received"
            );
        }
        FetchError::Http { url, status, body } => {
            error!(
                url = %url,
                status,
                body = %truncate_to_char_boundary(body, LOGGED_BODY_LIMIT),
                "Failed to fetch listing: HTTP error status {}",
                status
            );
        }
        FetchError::Setup { url, message } => {
            error!(
                url = %url,
                error = %message,
                "Failed to fetch listing: request setup error"
            );
        }
    }
}
