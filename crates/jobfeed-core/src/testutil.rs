//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls. Enabled for other crates' tests via
//! the `testutil` feature.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::fetch::FetchRequest;
use crate::models::{CanonicalJob, NewJob, RawJob, StoredJob};
use crate::taxonomy::{Category, EmploymentType, ExperienceLevel};
use crate::traits::{Fetcher, JobSource, JobStore};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns queued responses and records every request.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self::with_responses(vec![Ok(body.to_string())])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A fetcher whose every call fails with an HTTP 500.
    pub fn always_failing() -> Self {
        let responses = (0..64)
            .map(|_| Err(AppError::HttpError("HTTP 500 for mock".into())))
            .collect();
        Self::with_responses(responses)
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock source returning a fixed batch of records, or an error.
pub struct MockSource {
    name: String,
    jobs: Vec<RawJob>,
    listed: Option<usize>,
    error: Mutex<Option<AppError>>,
}

impl MockSource {
    pub fn new(name: &str, jobs: Vec<RawJob>) -> Self {
        Self {
            name: name.to_string(),
            jobs,
            listed: None,
            error: Mutex::new(None),
        }
    }

    /// Report `listed` postings, as if the rest had been dropped as unusable.
    pub fn with_listed(mut self, listed: usize) -> Self {
        self.listed = Some(listed);
        self
    }

    pub fn with_error(name: &str, error: AppError) -> Self {
        Self {
            name: name.to_string(),
            jobs: Vec::new(),
            listed: None,
            error: Mutex::new(Some(error)),
        }
    }
}

impl JobSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, _limit: usize) -> Result<Vec<RawJob>, AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.jobs.clone())
    }

    async fn scrape_counted(&self, limit: usize) -> Result<(Vec<RawJob>, usize), AppError> {
        let jobs = self.scrape(limit).await?;
        let listed = self.listed.unwrap_or(jobs.len());
        Ok((jobs, listed))
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory store keyed by `job_url`, with the same conflict rules as the
/// database repository.
#[derive(Clone)]
pub struct MockStore {
    rows: Arc<Mutex<HashMap<String, StoredJob>>>,
    /// When set, every write fails with this database error message.
    write_error: Arc<Mutex<Option<String>>>,
    /// When set, lookups miss but inserts conflict (simulates a racing writer).
    insert_conflict: bool,
}

impl MockStore {
    pub fn empty() -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
            write_error: Arc::new(Mutex::new(None)),
            insert_conflict: false,
        }
    }

    pub fn with_write_error(message: &str) -> Self {
        let store = Self::empty();
        *store.write_error.lock().unwrap() = Some(message.to_string());
        store
    }

    pub fn with_insert_conflict(mut self) -> Self {
        self.insert_conflict = true;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, job_url: &str) -> Option<StoredJob> {
        self.rows.lock().unwrap().get(job_url).cloned()
    }

    fn check_write(&self) -> Result<(), AppError> {
        match self.write_error.lock().unwrap().as_ref() {
            Some(message) => Err(AppError::DatabaseError(message.clone())),
            None => Ok(()),
        }
    }
}

impl JobStore for MockStore {
    async fn find_by_url(&self, job_url: &str) -> Result<Option<StoredJob>, AppError> {
        Ok(self.get(job_url))
    }

    async fn insert(&self, job: &NewJob) -> Result<Option<Uuid>, AppError> {
        self.check_write()?;
        if self.insert_conflict {
            return Ok(None);
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&job.job.job_url) {
            return Ok(None);
        }
        let now = Utc::now();
        let id = Uuid::new_v4();
        rows.insert(
            job.job.job_url.clone(),
            StoredJob {
                id,
                job: job.job.clone(),
                ago_time: job.ago_time.clone(),
                fingerprint: job.fingerprint.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(Some(id))
    }

    async fn upsert(&self, job: &NewJob) -> Result<Uuid, AppError> {
        self.check_write()?;
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        match rows.get_mut(&job.job.job_url) {
            Some(existing) => {
                let stored = &mut existing.job;
                stored.position = job.job.position.clone();
                stored.company = job.job.company.clone();
                stored.location = job.job.location.clone();
                stored.salary = job.job.salary.clone();
                stored.company_logo = job.job.company_logo.clone();
                stored.date = job.job.date;
                stored.keyword = job.job.keyword.clone();
                stored.source = job.job.source.clone();
                existing.ago_time = job.ago_time.clone();
                existing.fingerprint = job.fingerprint.clone();
                existing.updated_at = now;
                Ok(existing.id)
            }
            None => {
                let id = Uuid::new_v4();
                rows.insert(
                    job.job.job_url.clone(),
                    StoredJob {
                        id,
                        job: job.job.clone(),
                        ago_time: job.ago_time.clone(),
                        fingerprint: job.fingerprint.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(id)
            }
        }
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.row_count() as i64)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A raw record with just enough to normalize.
pub fn make_raw_job(job_url: &str) -> RawJob {
    RawJob {
        position: Some("Software Engineer".into()),
        company: Some("Acme".into()),
        job_url: Some(job_url.to_string()),
        source: Some("mock".into()),
        ..Default::default()
    }
}

pub fn make_canonical_job(job_url: &str) -> CanonicalJob {
    CanonicalJob {
        position: "Software Engineer".into(),
        company: "Acme".into(),
        location: "Jakarta".into(),
        description: None,
        requirements: None,
        job_url: job_url.to_string(),
        date: Utc::now(),
        salary: "Not disclosed".into(),
        company_logo: None,
        keyword: "General".into(),
        category: Category::Technology,
        employment_type: EmploymentType::FullTime,
        experience_level: ExperienceLevel::MidLevel,
        is_remote: false,
        source: "mock".into(),
    }
}
