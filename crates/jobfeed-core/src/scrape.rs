use serde::Serialize;

use crate::models::CanonicalJob;
use crate::normalize::normalize;
use crate::persist::{PersistMode, PersistOutcome, Persister};
use crate::traits::{JobSource, JobStore};

pub const DEFAULT_LIMIT: usize = 100;

/// Options for a single scrape run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum records processed per source.
    pub limit: usize,
    /// Source names to run, in order. `None` runs every registered source.
    pub sources: Option<Vec<String>>,
    /// Normalize but do not persist.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            sources: None,
            dry_run: false,
        }
    }
}

/// Counters accumulated while processing records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub scraped: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl RunStats {
    fn record(&mut self, outcome: PersistOutcome) {
        match outcome {
            PersistOutcome::Inserted(_) | PersistOutcome::Upserted(_) => self.saved += 1,
            PersistOutcome::Duplicate => self.duplicates += 1,
            PersistOutcome::Failed => self.failed += 1,
        }
    }

    fn merge(&mut self, other: &RunStats) {
        self.scraped += other.scraped;
        self.saved += other.saved;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Completed,
    Failed { error: String },
    NotImplemented,
}

/// Outcome of one source within a run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub status: SourceStatus,
    /// Postings the source listed, before unusable ones were dropped and
    /// before the limit is applied.
    pub fetched: usize,
    pub stats: RunStats,
}

impl SourceReport {
    fn new(name: &str, status: SourceStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            fetched: 0,
            stats: RunStats::default(),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub mode: PersistMode,
    pub totals: RunStats,
    /// Rows in the store after the run. `None` for dry runs or when the count failed.
    pub stored_total: Option<i64>,
    pub sources: Vec<SourceReport>,
    /// What a dry run would have saved.
    pub preview: Vec<CanonicalJob>,
}

/// Runs sources one after another and feeds their records through
/// normalization and persistence.
///
/// Sources are registered up front and looked up by name. A failing source
/// is reported and skipped; the run always completes with a [`RunReport`].
pub struct ScrapeService<S, St>
where
    S: JobSource,
    St: JobStore,
{
    sources: Vec<S>,
    persister: Persister<St>,
}

impl<S, St> ScrapeService<S, St>
where
    S: JobSource,
    St: JobStore,
{
    pub fn new(sources: Vec<S>, persister: Persister<St>) -> Self {
        Self { sources, persister }
    }

    /// Names of every registered source, in registration order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub async fn run(&self, options: &RunOptions) -> RunReport {
        let names = options
            .sources
            .clone()
            .unwrap_or_else(|| self.source_names());

        if options.dry_run {
            tracing::warn!("Dry run: nothing will be saved");
        }

        let mut totals = RunStats::default();
        let mut reports = Vec::with_capacity(names.len());
        let mut preview = Vec::new();

        for name in &names {
            let report = self.run_source(name, options, &mut preview).await;
            totals.merge(&report.stats);
            reports.push(report);
        }

        let stored_total = if options.dry_run {
            None
        } else {
            match self.persister.store().count().await {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to count stored jobs");
                    None
                }
            }
        };

        tracing::info!(
            scraped = totals.scraped,
            saved = totals.saved,
            duplicates = totals.duplicates,
            failed = totals.failed,
            "Run complete"
        );

        RunReport {
            dry_run: options.dry_run,
            mode: self.persister.mode(),
            totals,
            stored_total,
            sources: reports,
            preview,
        }
    }

    async fn run_source(
        &self,
        name: &str,
        options: &RunOptions,
        preview: &mut Vec<CanonicalJob>,
    ) -> SourceReport {
        let Some(source) = self
            .sources
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
        else {
            tracing::warn!(source = %name, "No scraper registered for source");
            return SourceReport::new(name, SourceStatus::NotImplemented);
        };

        tracing::info!(source = %name, limit = options.limit, "Scraping");
        let (raw_jobs, listed) = match source.scrape_counted(options.limit).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(source = %name, error = %e, "Source failed");
                return SourceReport::new(
                    name,
                    SourceStatus::Failed {
                        error: e.to_string(),
                    },
                );
            }
        };

        let mut report = SourceReport::new(name, SourceStatus::Completed);
        report.fetched = listed;
        if raw_jobs.is_empty() {
            tracing::warn!(source = %name, "No data from source");
        }

        for raw in raw_jobs.into_iter().take(options.limit) {
            report.stats.scraped += 1;

            let job = match normalize(raw) {
                Ok(job) => job,
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "Dropping unusable record");
                    report.stats.failed += 1;
                    continue;
                }
            };

            if options.dry_run {
                tracing::info!("[DRY RUN] {} @ {}", job.position, job.company);
                preview.push(job);
                continue;
            }

            let outcome = self.persister.persist(job).await;
            report.stats.record(outcome);
        }

        tracing::info!(
            source = %name,
            fetched = report.fetched,
            saved = report.stats.saved,
            duplicates = report.stats.duplicates,
            "Source done"
        );
        report
    }
}
