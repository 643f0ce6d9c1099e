use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application status enum. Persisted as its display string.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobStatus {
    #[default]
    Applied,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    #[serde(rename = "Offer Received")]
    OfferReceived,
    Rejected,
}

impl JobStatus {
    /// All statuses in menu order.
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::InterviewScheduled,
        JobStatus::OfferReceived,
        JobStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::InterviewScheduled => "Interview Scheduled",
            JobStatus::OfferReceived => "Offer Received",
            JobStatus::Rejected => "Rejected",
        }
    }

    /// Position in [`JobStatus::ALL`], used as a select default.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(JobStatus::as_str).collect()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| anyhow::anyhow!("Invalid job status: {}", s))
    }
}

/// A tracked application as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: String,
    pub date_posted: Option<String>,
    pub status: JobStatus,
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} @ {}", self.id, self.title, self.company)?;
        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            write!(f, " ({})", location)?;
        }
        write!(f, " [{}]", self.status)?;
        if let Some(date) = self.date_posted.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " posted {}", date)?;
        }
        if !self.url.is_empty() {
            write!(f, " {}", self.url)?;
        }
        Ok(())
    }
}

/// Input for inserting a job. The store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: String,
    pub date_posted: Option<String>,
    pub status: Option<JobStatus>,
}

impl NewJob {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_date_posted(mut self, date_posted: impl Into<String>) -> Self {
        self.date_posted = Some(date_posted.into());
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }
}
