use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::{RawJob, RawSalary};
use jobfeed_core::traits::{Fetcher, JobSource};
use serde_json::Value;

use super::{fetch_items, number_at, scalar_at, text_at};

const API_URL: &str = "https://www.techinasia.com/api/2.0/job-postings";

/// Tech in Asia job postings, filtered to Indonesia by the API.
pub struct TechInAsiaSource<F> {
    client: FetchClient<F>,
    limit_cap: Option<usize>,
}

impl<F: Fetcher> TechInAsiaSource<F> {
    pub fn new(client: FetchClient<F>) -> Self {
        Self {
            client,
            limit_cap: None,
        }
    }

    /// Never request more than `cap` postings, whatever the run limit.
    pub fn with_limit_cap(mut self, cap: usize) -> Self {
        self.limit_cap = Some(cap);
        self
    }
}

impl<F: Fetcher> JobSource for TechInAsiaSource<F> {
    fn name(&self) -> &str {
        "techinasia"
    }

    async fn scrape(&self, limit: usize) -> Result<Vec<RawJob>, AppError> {
        let limit = self.limit_cap.map_or(limit, |cap| limit.min(cap));
        let url = format!("{API_URL}?country_name[]=Indonesia&limit={limit}");
        let items = fetch_items(&self.client, self.name(), &url, "data").await;
        Ok(items.iter().map(parse_job).collect())
    }
}

fn parse_job(item: &Value) -> RawJob {
    let slug = text_at(item, "/slug").or_else(|| scalar_at(item, "/id"));

    RawJob {
        position: text_at(item, "/title"),
        company: Some(
            text_at(item, "/company/name").unwrap_or_else(|| "Unknown Company".to_string()),
        ),
        location: Some("Indonesia".to_string()),
        description: text_at(item, "/description"),
        job_url: slug.map(|slug| format!("https://www.techinasia.com/jobs/{slug}")),
        date: text_at(item, "/updated_at").or_else(|| text_at(item, "/created_at")),
        salary: salary(item),
        company_logo: text_at(item, "/company/avatar_url"),
        keyword: Some(text_at(item, "/category/name").unwrap_or_else(|| "Tech".to_string())),
        category: Some("Technology".to_string()),
        source: Some("techinasia".to_string()),
        ..Default::default()
    }
}

/// Only a positive lower bound counts as a disclosed salary.
fn salary(item: &Value) -> Option<RawSalary> {
    number_at(item, "/salary_min").filter(|min| *min > 0.0)?;
    let min = scalar_at(item, "/salary_min")?;
    let max = scalar_at(item, "/salary_max").unwrap_or_default();
    let currency = text_at(item, "/salary_currency").unwrap_or_else(|| "IDR".to_string());
    Some(RawSalary::Range { currency, min, max })
}

#[cfg(test)]
mod tests {
    use jobfeed_core::fetch::RetryPolicy;
    use jobfeed_core::testutil::MockFetcher;
    use serde_json::json;

    use super::*;

    fn source(fetcher: MockFetcher) -> TechInAsiaSource<MockFetcher> {
        TechInAsiaSource::new(FetchClient::new(fetcher, RetryPolicy::without_delays()))
    }

    #[tokio::test]
    async fn maps_postings() {
        let body = json!({
            "data": [
                {
                    "id": "t-1",
                    "slug": "senior-go-engineer-acme",
                    "title": "Senior Go Engineer",
                    "company": { "name": "Acme", "avatar_url": "https://cdn.example/a.png" },
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": "2024-02-01T00:00:00Z",
                    "category": { "name": "Engineering" },
                    "salary_min": 15000000,
                    "salary_max": 25000000,
                    "salary_currency": "IDR"
                },
                { "id": 88, "title": "Intern", "salary_min": 0, "salary_max": 0 }
            ]
        });
        let fetcher = MockFetcher::new(&body.to_string());

        let jobs = source(fetcher.clone()).scrape(20).await.unwrap();

        assert_eq!(
            fetcher.requested_urls(),
            vec!["https://www.techinasia.com/api/2.0/job-postings?country_name[]=Indonesia&limit=20"]
        );
        let first = &jobs[0];
        assert_eq!(
            first.job_url.as_deref(),
            Some("https://www.techinasia.com/jobs/senior-go-engineer-acme")
        );
        assert_eq!(first.date.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(first.keyword.as_deref(), Some("Engineering"));
        assert_eq!(
            first.salary.as_ref().map(|s| s.to_string()).as_deref(),
            Some("IDR 15000000 - 25000000")
        );
        assert_eq!(first.location.as_deref(), Some("Indonesia"));

        let second = &jobs[1];
        assert_eq!(
            second.job_url.as_deref(),
            Some("https://www.techinasia.com/jobs/88")
        );
        assert_eq!(second.company.as_deref(), Some("Unknown Company"));
        assert_eq!(second.keyword.as_deref(), Some("Tech"));
        assert_eq!(second.salary, None);
    }

    #[tokio::test]
    async fn limit_cap_bounds_the_requested_page() {
        let fetcher = MockFetcher::new(r#"{"data":[]}"#);

        source(fetcher.clone()).with_limit_cap(20).scrape(100).await.unwrap();
        source(fetcher.clone()).with_limit_cap(20).scrape(5).await.unwrap();

        assert_eq!(
            fetcher.requested_urls(),
            vec![
                "https://www.techinasia.com/api/2.0/job-postings?country_name[]=Indonesia&limit=20",
                "https://www.techinasia.com/api/2.0/job-postings?country_name[]=Indonesia&limit=5",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failing_endpoint_yields_no_records() {
        let fetcher = MockFetcher::always_failing();
        let source =
            TechInAsiaSource::new(FetchClient::new(fetcher.clone(), RetryPolicy::default()));

        let jobs = source.scrape(20).await.unwrap();

        assert!(jobs.is_empty());
        assert_eq!(fetcher.request_count(), 3);
    }
}
