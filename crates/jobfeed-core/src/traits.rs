use std::future::Future;

use uuid::Uuid;

use crate::error::AppError;
use crate::fetch::FetchRequest;
use crate::models::{NewJob, RawJob, StoredJob};

/// Performs one HTTP GET attempt.
///
/// Implementations send the request's headers verbatim and return the body
/// for 2xx responses; anything else is an error. Retries and pacing live in
/// [`FetchClient`](crate::fetch::FetchClient).
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// A job source the orchestrator can run by name.
pub trait JobSource: Send + Sync {
    /// Identifier used in run options and reports.
    fn name(&self) -> &str;

    /// Fetch and parse up to `limit` postings. Every call re-fetches.
    ///
    /// A source with nothing to offer this round returns an empty list;
    /// `Err` is reserved for faults in the adapter itself.
    fn scrape(&self, limit: usize) -> impl Future<Output = Result<Vec<RawJob>, AppError>> + Send;

    /// [`scrape`](Self::scrape) plus the number of postings the source listed,
    /// counted before any it could not use were dropped.
    fn scrape_counted(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<(Vec<RawJob>, usize), AppError>> + Send {
        async move {
            let jobs = self.scrape(limit).await?;
            let listed = jobs.len();
            Ok((jobs, listed))
        }
    }
}

/// Persists scraped jobs keyed by their unique `job_url`.
pub trait JobStore: Send + Sync + Clone {
    fn find_by_url(
        &self,
        job_url: &str,
    ) -> impl Future<Output = Result<Option<StoredJob>, AppError>> + Send;

    /// Insert a job unless its URL is already stored.
    ///
    /// Returns `None` when another row already holds the URL.
    fn insert(&self, job: &NewJob) -> impl Future<Output = Result<Option<Uuid>, AppError>> + Send;

    /// Insert a job, or overwrite the mutable fields of the row with its URL.
    fn upsert(&self, job: &NewJob) -> impl Future<Output = Result<Uuid, AppError>> + Send;

    fn count(&self) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// A no-op JobStore for dry runs.
#[derive(Debug, Clone)]
pub struct NullStore;

impl JobStore for NullStore {
    async fn find_by_url(&self, _job_url: &str) -> Result<Option<StoredJob>, AppError> {
        Ok(None)
    }

    async fn insert(&self, _job: &NewJob) -> Result<Option<Uuid>, AppError> {
        Ok(Some(Uuid::nil()))
    }

    async fn upsert(&self, _job: &NewJob) -> Result<Uuid, AppError> {
        Ok(Uuid::nil())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(0)
    }
}
