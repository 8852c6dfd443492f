use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::humanize::ago;
use crate::models::{CanonicalJob, NewJob};
use crate::traits::JobStore;

/// How a job whose URL is already stored is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Keep the stored row untouched and count a duplicate.
    #[default]
    Skip,
    /// Overwrite the stored row's mutable fields.
    Upsert,
}

impl PersistMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistMode::Skip => "skip",
            PersistMode::Upsert => "upsert",
        }
    }
}

impl fmt::Display for PersistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PersistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(PersistMode::Skip),
            "upsert" => Ok(PersistMode::Upsert),
            _ => Err(format!("Unknown persist mode: {}", s)),
        }
    }
}

/// Result of persisting one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted(Uuid),
    Upserted(Uuid),
    Duplicate,
    Failed,
}

/// Writes canonical jobs to a [`JobStore`], deduplicating on `job_url`.
///
/// Store errors never escape: they are logged with the job's identifying
/// fields and reported as [`PersistOutcome::Failed`].
#[derive(Clone)]
pub struct Persister<S> {
    store: S,
    mode: PersistMode,
}

impl<S: JobStore> Persister<S> {
    pub fn new(store: S, mode: PersistMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> PersistMode {
        self.mode
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn persist(&self, job: CanonicalJob) -> PersistOutcome {
        self.persist_at(job, Utc::now()).await
    }

    /// Persist with `now` as the reference instant for `ago_time`.
    pub async fn persist_at(&self, job: CanonicalJob, now: DateTime<Utc>) -> PersistOutcome {
        match self.mode {
            PersistMode::Skip => self.insert_new(job, now).await,
            PersistMode::Upsert => self.upsert(job, now).await,
        }
    }

    async fn insert_new(&self, job: CanonicalJob, now: DateTime<Utc>) -> PersistOutcome {
        match self.store.find_by_url(&job.job_url).await {
            Ok(Some(existing)) => {
                tracing::debug!(job_url = %job.job_url, id = %existing.id, "Duplicate, skipping");
                return PersistOutcome::Duplicate;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    job_url = %job.job_url,
                    position = %job.position,
                    company = %job.company,
                    error = %e,
                    "Duplicate lookup failed"
                );
                return PersistOutcome::Failed;
            }
        }

        let ago_time = ago(job.date, now);
        let new_job = NewJob::new(job, ago_time);
        match self.store.insert(&new_job).await {
            Ok(Some(id)) => {
                tracing::info!(
                    %id,
                    position = %new_job.job.position,
                    company = %new_job.job.company,
                    "Saved"
                );
                PersistOutcome::Inserted(id)
            }
            // Another writer stored the URL between lookup and insert.
            Ok(None) => {
                tracing::debug!(job_url = %new_job.job.job_url, "Lost insert race, skipping");
                PersistOutcome::Duplicate
            }
            Err(e) => {
                tracing::error!(
                    job_url = %new_job.job.job_url,
                    position = %new_job.job.position,
                    company = %new_job.job.company,
                    error = %e,
                    "Failed to save job"
                );
                PersistOutcome::Failed
            }
        }
    }

    async fn upsert(&self, job: CanonicalJob, now: DateTime<Utc>) -> PersistOutcome {
        let ago_time = ago(job.date, now);
        let new_job = NewJob::new(job, ago_time);
        match self.store.upsert(&new_job).await {
            Ok(id) => {
                tracing::info!(
                    %id,
                    position = %new_job.job.position,
                    company = %new_job.job.company,
                    "Upserted"
                );
                PersistOutcome::Upserted(id)
            }
            Err(e) => {
                tracing::error!(
                    job_url = %new_job.job.job_url,
                    position = %new_job.job.position,
                    company = %new_job.job.company,
                    error = %e,
                    "Failed to upsert job"
                );
                PersistOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::testutil::{MockStore, make_canonical_job};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn skip_mode_inserts_then_reports_duplicate() {
        let store = MockStore::empty();
        let persister = Persister::new(store.clone(), PersistMode::Skip);

        let first = persister
            .persist_at(make_canonical_job("https://x.com/1"), now())
            .await;
        let second = persister
            .persist_at(make_canonical_job("https://x.com/1"), now())
            .await;

        assert!(matches!(first, PersistOutcome::Inserted(_)));
        assert_eq!(second, PersistOutcome::Duplicate);
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn ago_time_is_computed_at_write_time() {
        let store = MockStore::empty();
        let persister = Persister::new(store.clone(), PersistMode::Skip);

        let mut job = make_canonical_job("https://x.com/2");
        job.date = now() - Duration::days(3);
        persister.persist_at(job, now()).await;

        let stored = store.get("https://x.com/2").unwrap();
        assert_eq!(stored.ago_time, "3 days ago");
    }

    #[tokio::test]
    async fn lost_insert_race_counts_as_duplicate() {
        let store = MockStore::empty().with_insert_conflict();
        let persister = Persister::new(store.clone(), PersistMode::Skip);

        let outcome = persister
            .persist_at(make_canonical_job("https://x.com/3"), now())
            .await;

        assert_eq!(outcome, PersistOutcome::Duplicate);
    }

    #[tokio::test]
    async fn insert_error_is_reported_not_propagated() {
        let store = MockStore::with_write_error("disk full");
        let persister = Persister::new(store.clone(), PersistMode::Skip);

        let outcome = persister
            .persist_at(make_canonical_job("https://x.com/4"), now())
            .await;

        assert_eq!(outcome, PersistOutcome::Failed);
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn upsert_mode_overwrites_mutable_fields() {
        let store = MockStore::empty();
        let persister = Persister::new(store.clone(), PersistMode::Upsert);

        let first = persister
            .persist_at(make_canonical_job("https://x.com/5"), now())
            .await;

        let mut updated = make_canonical_job("https://x.com/5");
        updated.position = "Staff Engineer".into();
        updated.salary = "IDR 20000000".into();
        let second = persister.persist_at(updated, now()).await;

        let (PersistOutcome::Upserted(a), PersistOutcome::Upserted(b)) = (first, second) else {
            panic!("expected two upserts, got {first:?} and {second:?}");
        };
        assert_eq!(a, b);
        assert_eq!(store.row_count(), 1);
        let stored = store.get("https://x.com/5").unwrap();
        assert_eq!(stored.job.position, "Staff Engineer");
        assert_eq!(stored.job.salary, "IDR 20000000");
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("UPSERT".parse::<PersistMode>().unwrap(), PersistMode::Upsert);
        assert_eq!("skip".parse::<PersistMode>().unwrap(), PersistMode::Skip);
        assert!("merge".parse::<PersistMode>().is_err());
    }
}
