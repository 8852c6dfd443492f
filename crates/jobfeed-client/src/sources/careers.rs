use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::RawJob;
use jobfeed_core::traits::{Fetcher, JobSource};
use serde_json::Value;
use url::Url;

use super::schema_org::extract_job_postings;
use super::{capitalize, text_at};

/// Careers JSON APIs keyed by a fragment of the careers page host.
pub const KNOWN_CAREER_APIS: &[(&str, &str)] = &[
    ("gotocompany.com", "https://careers.gotocompany.com/api/jobs"),
    ("shopee.co.id", "https://careers.shopee.co.id/api/job-list"),
    ("blibli.com", "https://careers.blibli.com/api/jobs"),
    ("traveloka.com", "https://api.traveloka.com/careers/jobs"),
    ("tiket.com", "https://www.tiket.com/careers/api/jobs"),
];

/// Company careers pages.
///
/// Each page is read through its company's careers API when one is known;
/// otherwise, or when the API fails, the page's own Schema.org markup is used.
pub struct CareersSource<F> {
    client: FetchClient<F>,
    targets: Vec<String>,
}

impl<F: Fetcher> CareersSource<F> {
    pub fn new(client: FetchClient<F>, targets: Vec<String>) -> Self {
        Self { client, targets }
    }

    async fn from_known_api(&self, page: &str) -> Option<Vec<RawJob>> {
        let (fragment, api) = known_api(page)?;
        let Some(Value::Array(items)) = self.client.get_json(api).await else {
            tracing::warn!(%page, %api, "Careers API unavailable");
            return None;
        };

        let company = capitalize(fragment.split('.').next().unwrap_or(fragment));
        Some(
            items
                .iter()
                .map(|item| parse_api_job(item, &company, page))
                .collect(),
        )
    }

    async fn from_page_markup(&self, page: &str) -> Vec<RawJob> {
        let Some(html) = self.client.get_text(page).await else {
            tracing::warn!(%page, "Failed to fetch careers page");
            return Vec::new();
        };

        let mut jobs = extract_job_postings(&html);
        for job in &mut jobs {
            job.job_url.get_or_insert_with(|| page.to_string());
        }
        jobs
    }
}

impl<F: Fetcher> JobSource for CareersSource<F> {
    fn name(&self) -> &str {
        "careers"
    }

    async fn scrape(&self, _limit: usize) -> Result<Vec<RawJob>, AppError> {
        let mut jobs = Vec::new();

        for page in &self.targets {
            tracing::info!(%page, "Processing careers page");
            match self.from_known_api(page).await {
                Some(found) => {
                    tracing::info!(%page, count = found.len(), "Careers API succeeded");
                    jobs.extend(found);
                }
                None => jobs.extend(self.from_page_markup(page).await),
            }
        }

        Ok(jobs)
    }
}

/// The API registered for the page's host, if any.
fn known_api(page: &str) -> Option<(&'static str, &'static str)> {
    let host = Url::parse(page)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase));
    let haystack = host.as_deref().unwrap_or(page);

    KNOWN_CAREER_APIS
        .iter()
        .find(|(fragment, _)| haystack.contains(*fragment))
        .copied()
}

fn parse_api_job(item: &Value, company: &str, page: &str) -> RawJob {
    RawJob {
        position: text_at(item, "/title").or_else(|| text_at(item, "/jobTitle")),
        company: Some(text_at(item, "/company").unwrap_or_else(|| company.to_string())),
        location: text_at(item, "/location"),
        job_url: Some(
            text_at(item, "/apply_url")
                .or_else(|| text_at(item, "/url"))
                .unwrap_or_else(|| page.to_string()),
        ),
        date: text_at(item, "/posted_at"),
        keyword: text_at(item, "/department"),
        source: Some("internal-api".to_string()),
        ..Default::default()
    }
}
