use chrono::DateTime;
use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::RawJob;
use jobfeed_core::traits::{Fetcher, JobSource};
use serde_json::Value;

use super::{capitalize, text_at};

/// Lever boards polled by default, by company slug.
pub const LEVER_COMPANIES: &[&str] = &["gojek", "tokopedia", "bukalapak"];

/// Lever-hosted careers boards, one request per company.
///
/// A company whose board cannot be fetched is skipped. The `limit` is not
/// forwarded because Lever returns the whole board.
pub struct LeverSource<F> {
    client: FetchClient<F>,
    companies: Vec<String>,
}

impl<F: Fetcher> LeverSource<F> {
    pub fn new(client: FetchClient<F>) -> Self {
        Self::with_companies(client, LEVER_COMPANIES.iter().map(|c| c.to_string()).collect())
    }

    pub fn with_companies(client: FetchClient<F>, companies: Vec<String>) -> Self {
        Self { client, companies }
    }
}

impl<F: Fetcher> JobSource for LeverSource<F> {
    fn name(&self) -> &str {
        "lever"
    }

    async fn scrape(&self, limit: usize) -> Result<Vec<RawJob>, AppError> {
        self.scrape_counted(limit).await.map(|(jobs, _)| jobs)
    }

    /// `listed` counts every posting on the boards, usable or not.
    async fn scrape_counted(&self, _limit: usize) -> Result<(Vec<RawJob>, usize), AppError> {
        let mut jobs = Vec::new();
        let mut listed = 0;

        for company in &self.companies {
            let url = format!("https://api.lever.co/v0/postings/{company}?mode=json");
            let Some(Value::Array(postings)) = self.client.get_json(&url).await else {
                tracing::warn!(source = "lever", %company, "No postings from board");
                continue;
            };

            let before = jobs.len();
            listed += postings.len();
            jobs.extend(postings.iter().filter_map(|p| parse_posting(p, company)));
            tracing::debug!(
                %company,
                fetched = postings.len(),
                kept = jobs.len() - before,
                "Board parsed"
            );
        }

        Ok((jobs, listed))
    }
}

/// Postings without a title or hosted URL are dropped.
fn parse_posting(posting: &Value, company: &str) -> Option<RawJob> {
    let position = text_at(posting, "/text")?;
    let job_url = text_at(posting, "/hostedUrl")?;

    let date = posting
        .get("createdAt")
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .map(|date| date.to_rfc3339());

    Some(RawJob {
        position: Some(position),
        company: Some(capitalize(company)),
        location: text_at(posting, "/categories/location"),
        description: text_at(posting, "/description"),
        requirements: text_at(posting, "/lists/0/content"),
        job_url: Some(job_url),
        date,
        category: text_at(posting, "/categories/team"),
        source: Some("lever".to_string()),
        ..Default::default()
    })
}
