//! Interaction layer.
//!
//! Two prompt shapes cover the whole tool: free text with an optional default
//! and a single choice from an ordered list. Validation beyond that is the
//! caller's job, except that a choice outside the list is always rejected.

use console::Term;
use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::error::{PromptError, PromptResult};
use crate::models::JobStatus;

pub trait Prompter {
    /// Ask for free text. An empty answer yields `default` when one is given,
    /// so a pre-filled value cannot be blanked from here; callers that allow
    /// clearing define their own marker.
    fn input(&mut self, label: &str, default: Option<&str>) -> PromptResult<String>;

    /// Ask for one of `choices`; returns its index.
    fn select(
        &mut self,
        label: &str,
        choices: &[&str],
        default: Option<usize>,
    ) -> PromptResult<usize>;

    /// Ask for a job id.
    fn input_id(&mut self, label: &str) -> PromptResult<i64> {
        let raw = self.input(label, None)?;
        raw.trim()
            .parse::<i64>()
            .map_err(|_| PromptError::InvalidInput {
                label: label.to_string(),
                value: raw,
            })
    }
}

/// Reject indices outside `0..len`.
pub fn check_choice(label: &str, index: usize, len: usize) -> PromptResult<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(PromptError::InvalidChoice {
            label: label.to_string(),
            index,
            len,
        })
    }
}

/// Ask for a status. Only the four known statuses can come back.
pub fn select_status<P: Prompter + ?Sized>(
    prompter: &mut P,
    label: &str,
    default: JobStatus,
) -> PromptResult<JobStatus> {
    let labels = JobStatus::labels();
    let index = prompter.select(label, &labels, Some(default.index()))?;
    let index = check_choice(label, index, JobStatus::ALL.len())?;
    Ok(JobStatus::ALL[index])
}

/// Prompts on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
    term: Term,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            term: Term::stderr(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn input(&mut self, label: &str, default: Option<&str>) -> PromptResult<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(label)
            .allow_empty(true);
        if let Some(default) = default.filter(|d| !d.is_empty()) {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text_on(&self.term)?)
    }

    fn select(
        &mut self,
        label: &str,
        choices: &[&str],
        default: Option<usize>,
    ) -> PromptResult<usize> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(label)
            .items(choices)
            .default(default.unwrap_or(0))
            .interact_on(&self.term)?;
        check_choice(label, index, choices.len())
    }

    fn input_id(&mut self, label: &str) -> PromptResult<i64> {
        // dialoguer re-prompts until the text parses
        Ok(Input::<i64>::with_theme(&self.theme)
            .with_prompt(label)
            .interact_text_on(&self.term)?)
    }
}
