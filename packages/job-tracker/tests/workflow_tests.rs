//! End-to-end tests for the menu loop and the add-job flow, driven by
//! scripted prompts and mock capabilities.

use std::time::{SystemTime, UNIX_EPOCH};

use futures::TryStreamExt;
use job_tracker::testing::{Answer, MockExtractor, MockFetcher, MockResponse, ScriptedPrompter};
use job_tracker::{
    AddJobOutcome, ExtractedFields, FetchError, Job, JobStatus, JobStore, NewJob, PromptError,
    StepError, Tracker, CLEAR_FIELD,
};

const LISTING_URL: &str = "https://jobs.example.com/view/123";

fn extracted() -> ExtractedFields {
    ExtractedFields {
        job_title: "Backend Engineer".into(),
        company: "Acme".into(),
        location: "Remote".into(),
        date_posted: "2024-01-01".into(),
        status: JobStatus::InterviewScheduled,
    }
}

async fn tracker_with(
    fetcher: &MockFetcher,
    extractor: &MockExtractor,
    answers: Vec<Answer>,
) -> Tracker<ScriptedPrompter> {
    Tracker::new(
        JobStore::in_memory().await.unwrap(),
        Box::new(fetcher.clone()),
        Box::new(extractor.clone()),
        ScriptedPrompter::new(answers),
    )
}

/// A fresh database file under the temp dir, plus its connection URL.
fn temp_database() -> (std::path::PathBuf, String) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "job-tracker-{}-{}.db",
        std::process::id(),
        nanos
    ));
    let database_url = format!("sqlite://{}", path.display());
    (path, database_url)
}

async fn jobs(store: &JobStore) -> Vec<Job> {
    store.list_all().try_collect().await.unwrap()
}

fn accept_all(url: &str) -> Vec<Answer> {
    vec![
        Answer::text(url),
        Answer::Default, // title
        Answer::Default, // company
        Answer::Default, // location
        Answer::Default, // url
        Answer::Default, // date posted
        Answer::Default, // status
    ]
}

#[tokio::test]
async fn add_job_stores_confirmed_extraction() {
    let fetcher = MockFetcher::new().with_body(LISTING_URL, "<h1>Backend Engineer</h1>");
    let extractor = MockExtractor::returning(extracted());
    let mut tracker = tracker_with(&fetcher, &extractor, accept_all(LISTING_URL)).await;

    let outcome = tracker.add_job().await.unwrap();
    let id = match outcome {
        AddJobOutcome::Added(id) => id,
        other => panic!("expected Added, got {other:?}"),
    };

    let stored = tracker.store().get(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Backend Engineer");
    assert_eq!(stored.company, "Acme");
    assert_eq!(stored.location.as_deref(), Some("Remote"));
    assert_eq!(stored.url, LISTING_URL);
    assert_eq!(stored.date_posted.as_deref(), Some("2024-01-01"));
    assert_eq!(stored.status, JobStatus::InterviewScheduled);

    assert_eq!(extractor.calls(), vec!["<h1>Backend Engineer</h1>".to_string()]);
}

#[tokio::test]
async fn add_job_prefills_every_field_for_review() {
    let fetcher = MockFetcher::new().with_body(LISTING_URL, "listing");
    let extractor = MockExtractor::returning(extracted());
    let mut tracker = tracker_with(&fetcher, &extractor, accept_all(LISTING_URL)).await;

    tracker.add_job().await.unwrap();

    let offered: Vec<(String, Option<String>)> = tracker
        .prompter()
        .asked()
        .iter()
        .map(|a| (a.label.clone(), a.default.clone()))
        .collect();

    assert_eq!(
        offered,
        vec![
            ("Enter the job listing URL:".to_string(), None),
            ("Job Title:".to_string(), Some("Backend Engineer".to_string())),
            ("Company:".to_string(), Some("Acme".to_string())),
            ("Location:".to_string(), Some("Remote".to_string())),
            ("Job URL:".to_string(), Some(LISTING_URL.to_string())),
            ("Date Posted:".to_string(), Some("2024-01-01".to_string())),
            (
                "Application Status:".to_string(),
                Some("Interview Scheduled".to_string())
            ),
        ]
    );
}

#[tokio::test]
async fn add_job_uses_user_overrides() {
    let fetcher = MockFetcher::new().with_body(LISTING_URL, "listing");
    let extractor = MockExtractor::returning(extracted());
    let answers = vec![
        Answer::text(LISTING_URL),
        Answer::text("Staff Engineer"),
        Answer::Default,
        Answer::text("Berlin"),
        Answer::Default,
        Answer::Default,
        Answer::Choice(3),
    ];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;

    tracker.add_job().await.unwrap();

    let all = jobs(tracker.store()).await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Staff Engineer");
    assert_eq!(all[0].company, "Acme");
    assert_eq!(all[0].location.as_deref(), Some("Berlin"));
    assert_eq!(all[0].status, JobStatus::Rejected);
}

#[tokio::test]
async fn http_error_aborts_before_extraction_or_insert() {
    let fetcher = MockFetcher::new()
        .with_response(LISTING_URL, MockResponse::Status(404, "Not Found".into()));
    let extractor = MockExtractor::returning(extracted());
    let mut tracker = tracker_with(&fetcher, &extractor, accept_all(LISTING_URL)).await;

    let outcome = tracker.add_job().await.unwrap();

    assert!(matches!(
        outcome,
        AddJobOutcome::FetchFailed(FetchError::Http { status: 404, .. })
    ));
    assert_eq!(extractor.call_count(), 0);
    assert!(jobs(tracker.store()).await.is_empty());
    // Only the URL was asked for
    assert_eq!(tracker.prompter().asked().len(), 1);
}

#[tokio::test]
async fn network_and_setup_failures_are_classified() {
    let fetcher = MockFetcher::new().with_response("/relative", MockResponse::BadRequest);
    let extractor = MockExtractor::returning(extracted());
    let answers = vec![
        Answer::text("https://unreachable.example.com"),
        Answer::text("/relative"),
    ];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;

    assert!(matches!(
        tracker.add_job().await.unwrap(),
        AddJobOutcome::FetchFailed(FetchError::Network { .. })
    ));
    assert!(matches!(
        tracker.add_job().await.unwrap(),
        AddJobOutcome::FetchFailed(FetchError::Setup { .. })
    ));
    assert!(jobs(tracker.store()).await.is_empty());
}

#[tokio::test]
async fn extraction_failure_falls_back_to_empty_fields() {
    let fetcher = MockFetcher::new().with_body(LISTING_URL, "listing");
    let extractor = MockExtractor::failing();
    let answers = vec![
        Answer::text(LISTING_URL),
        Answer::text("Engineer"),
        Answer::text("Acme"),
        Answer::Default,
        Answer::Default,
        Answer::Default,
        Answer::Default,
    ];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;

    let outcome = tracker.add_job().await.unwrap();
    assert!(matches!(outcome, AddJobOutcome::Added(_)));

    let title_prompt = &tracker.prompter().asked()[1];
    assert_eq!(title_prompt.default.as_deref(), Some(""));

    let all = jobs(tracker.store()).await;
    assert_eq!(all[0].title, "Engineer");
    assert_eq!(all[0].location, None);
    assert_eq!(all[0].date_posted, None);
    assert_eq!(all[0].url, LISTING_URL);
    assert_eq!(all[0].status, JobStatus::Applied);
}

#[tokio::test]
async fn update_status_reports_rows_affected() {
    let fetcher = MockFetcher::new();
    let extractor = MockExtractor::failing();
    let answers = vec![
        Answer::text("1"),
        Answer::Choice(2),
        Answer::text("99"),
        Answer::Choice(3),
    ];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;
    tracker
        .store()
        .insert(&NewJob::new("Engineer", "Acme"))
        .await
        .unwrap();

    assert_eq!(tracker.update_job_status().await.unwrap(), 1);
    assert_eq!(tracker.update_job_status().await.unwrap(), 0);

    let all = jobs(tracker.store()).await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, JobStatus::OfferReceived);
}

#[tokio::test]
async fn update_rejects_status_outside_the_enumeration() {
    let fetcher = MockFetcher::new();
    let extractor = MockExtractor::failing();
    let answers = vec![Answer::text("1"), Answer::Choice(7)];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;
    tracker
        .store()
        .insert(&NewJob::new("Engineer", "Acme"))
        .await
        .unwrap();

    let err = tracker.update_job_status().await.unwrap_err();
    assert!(matches!(
        err,
        StepError::Prompt(PromptError::InvalidChoice { index: 7, .. })
    ));
    assert_eq!(jobs(tracker.store()).await[0].status, JobStatus::Applied);
}

#[tokio::test]
async fn delete_removes_only_existing_ids() {
    let fetcher = MockFetcher::new();
    let extractor = MockExtractor::failing();
    let answers = vec![Answer::text("1"), Answer::text("1"), Answer::text("not-a-number")];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;
    for title in ["a", "b"] {
        tracker
            .store()
            .insert(&NewJob::new(title, "Co"))
            .await
            .unwrap();
    }

    assert_eq!(tracker.delete_job().await.unwrap(), 1);
    assert_eq!(tracker.delete_job().await.unwrap(), 0);
    assert!(matches!(
        tracker.delete_job().await,
        Err(StepError::Prompt(PromptError::InvalidInput { .. }))
    ));

    let remaining: Vec<i64> = jobs(tracker.store()).await.iter().map(|j| j.id).collect();
    assert_eq!(remaining, vec![2]);
}

#[tokio::test]
async fn list_jobs_counts_records() {
    let fetcher = MockFetcher::new();
    let extractor = MockExtractor::failing();
    let mut tracker = tracker_with(&fetcher, &extractor, vec![]).await;

    assert_eq!(tracker.list_jobs().await.unwrap(), 0);
    tracker
        .store()
        .insert(&NewJob::new("Engineer", "Acme"))
        .await
        .unwrap();
    assert_eq!(tracker.list_jobs().await.unwrap(), 1);
}

#[tokio::test]
async fn menu_survives_failures_and_closes_store_on_exit() {
    let fetcher = MockFetcher::new()
        .with_response(LISTING_URL, MockResponse::Status(500, "oops".into()));
    let extractor = MockExtractor::returning(extracted());
    let answers = vec![
        Answer::Choice(0), // Add Job
        Answer::text(LISTING_URL),
        Answer::Choice(9), // out of range, menu shown again
        Answer::Choice(3), // Delete Job
        Answer::text("abc"),
        Answer::Choice(1), // List Jobs
        Answer::Choice(4), // Exit
    ];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;

    tracker.run().await.unwrap();

    assert!(tracker.store().is_closed());
    assert_eq!(tracker.prompter().remaining(), 0);
    assert_eq!(fetcher.calls(), vec![LISTING_URL.to_string()]);
    assert_eq!(extractor.call_count(), 0);
}

#[tokio::test]
async fn menu_survives_store_errors() {
    let (path, database_url) = temp_database();
    let store = JobStore::connect(&database_url).await.unwrap();

    let other = sqlx::SqlitePool::connect(&database_url).await.unwrap();
    sqlx::query("DROP TABLE jobs").execute(&other).await.unwrap();
    other.close().await;

    let fetcher = MockFetcher::new().with_body(LISTING_URL, "listing");
    let extractor = MockExtractor::returning(extracted());
    let mut answers = vec![Answer::Choice(0)]; // Add Job, insert fails
    answers.extend(accept_all(LISTING_URL));
    answers.extend([
        Answer::Choice(1), // List Jobs, query fails
        Answer::Choice(4), // Exit
    ]);
    let mut tracker = Tracker::new(
        store,
        Box::new(fetcher.clone()),
        Box::new(extractor.clone()),
        ScriptedPrompter::new(answers),
    );

    tracker.run().await.unwrap();

    assert!(tracker.store().is_closed());
    assert_eq!(tracker.prompter().remaining(), 0);
    assert_eq!(extractor.call_count(), 1);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn add_job_clear_marker_blanks_prefilled_fields() {
    let fetcher = MockFetcher::new().with_body(LISTING_URL, "listing");
    let extractor = MockExtractor::returning(extracted());
    let answers = vec![
        Answer::text(LISTING_URL),
        Answer::Default, // title
        Answer::Default, // company
        Answer::text(CLEAR_FIELD), // location
        Answer::Default, // url
        Answer::text(CLEAR_FIELD), // date posted
        Answer::Default, // status
    ];
    let mut tracker = tracker_with(&fetcher, &extractor, answers).await;

    let outcome = tracker.add_job().await.unwrap();
    assert!(matches!(outcome, AddJobOutcome::Added(1)));

    let job = tracker.store().get(1).await.unwrap().unwrap();
    assert_eq!(job.title, "Backend Engineer");
    assert_eq!(job.location, None);
    assert_eq!(job.date_posted, None);
    assert_eq!(job.url, LISTING_URL);
}

#[tokio::test]
async fn menu_ends_when_input_runs_out() {
    let fetcher = MockFetcher::new();
    let extractor = MockExtractor::failing();
    let mut tracker = tracker_with(&fetcher, &extractor, vec![]).await;

    tracker.run().await.unwrap();
    assert!(tracker.store().is_closed());
}

#[tokio::test]
async fn full_session_persists_to_disk() {
    let (path, database_url) = temp_database();

    let fetcher = MockFetcher::new().with_body(LISTING_URL, "listing");
    let extractor = MockExtractor::returning(extracted());
    let mut answers = vec![Answer::Choice(0)];
    answers.extend(accept_all(LISTING_URL));
    answers.extend([
        Answer::Choice(2), // Update Job Status
        Answer::text("1"),
        Answer::Choice(2), // Offer Received
        Answer::Choice(1), // List Jobs
        Answer::Choice(4), // Exit
    ]);

    let mut tracker = Tracker::new(
        JobStore::connect(&database_url).await.unwrap(),
        Box::new(fetcher.clone()),
        Box::new(extractor.clone()),
        ScriptedPrompter::new(answers),
    );
    tracker.run().await.unwrap();

    let reopened = JobStore::connect(&database_url).await.unwrap();
    let all = jobs(&reopened).await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, 1);
    assert_eq!(all[0].title, "Backend Engineer");
    assert_eq!(all[0].status, JobStatus::OfferReceived);

    assert_eq!(reopened.delete(1).await.unwrap(), 1);
    assert!(jobs(&reopened).await.is_empty());

    reopened.close().await.unwrap();
    let _ = std::fs::remove_file(&path);
}
