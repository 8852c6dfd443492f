use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::{RawJob, RawSalary};
use jobfeed_core::traits::{Fetcher, JobSource};
use serde_json::Value;

use super::{fetch_items, number_at, scalar_at, text_at};

const API_URL: &str = "https://glints.com/api/job-posts";
const JOB_URL: &str = "https://glints.com/opportunities/jobs";

/// Glints job board (tech-heavy, JSON API).
pub struct GlintsSource<F> {
    client: FetchClient<F>,
}

impl<F: Fetcher> GlintsSource<F> {
    pub fn new(client: FetchClient<F>) -> Self {
        Self { client }
    }
}

impl<F: Fetcher> JobSource for GlintsSource<F> {
    fn name(&self) -> &str {
        "glints"
    }

    async fn scrape(&self, limit: usize) -> Result<Vec<RawJob>, AppError> {
        let url = format!("{API_URL}?country=ID&limit={limit}");
        let items = fetch_items(&self.client, self.name(), &url, "data").await;
        Ok(items.iter().map(parse_job).collect())
    }
}

fn parse_job(item: &Value) -> RawJob {
    RawJob {
        position: text_at(item, "/title"),
        company: text_at(item, "/company/name"),
        location: text_at(item, "/CityInfo/name"),
        description: text_at(item, "/description"),
        requirements: text_at(item, "/requirements"),
        job_url: scalar_at(item, "/id").map(|id| format!("{JOB_URL}/{id}")),
        date: text_at(item, "/createdAt"),
        salary: salary(item),
        company_logo: text_at(item, "/company/logo"),
        keyword: Some(text_at(item, "/category").unwrap_or_else(|| "Tech".to_string())),
        category: Some("Technology".to_string()),
        employment_type: text_at(item, "/type"),
        is_remote: item.get("isRemote").and_then(Value::as_bool),
        source: Some("glints".to_string()),
    }
}

/// Both bounds of the estimate, with thousands separators.
fn salary(item: &Value) -> Option<RawSalary> {
    let min = number_at(item, "/salaryEstimate/minAmount").filter(|v| *v != 0.0)?;
    let max = number_at(item, "/salaryEstimate/maxAmount").filter(|v| *v != 0.0)?;
    let currency =
        text_at(item, "/salaryEstimate/currency").unwrap_or_else(|| "IDR".to_string());
    Some(RawSalary::Range {
        currency,
        min: group_thousands(min),
        max: group_thousands(max),
    })
}

/// Round to a whole number and separate thousands with commas.
fn group_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use jobfeed_core::fetch::RetryPolicy;
    use jobfeed_core::testutil::MockFetcher;
    use serde_json::json;

    use super::*;

    fn source(fetcher: MockFetcher) -> GlintsSource<MockFetcher> {
        GlintsSource::new(FetchClient::new(fetcher, RetryPolicy::without_delays()))
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(5_000_000.0), "5,000,000");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1_000.4), "1,000");
    }

    #[tokio::test]
    async fn maps_job_posts() {
        let body = json!({
            "data": [{
                "id": "abc-123",
                "title": "Backend Engineer",
                "company": { "name": "Acme", "logo": "https://cdn.example/acme.png" },
                "CityInfo": { "name": "Jakarta Selatan" },
                "createdAt": "2024-03-19T08:00:00.000Z",
                "salaryEstimate": { "minAmount": 5000000, "maxAmount": 8000000, "currency": "IDR" },
                "type": "FULL_TIME",
                "isRemote": true
            }]
        });
        let fetcher = MockFetcher::new(&body.to_string());
        let jobs = source(fetcher.clone()).scrape(10).await.unwrap();

        assert_eq!(
            fetcher.requested_urls(),
            vec!["https://glints.com/api/job-posts?country=ID&limit=10"]
        );
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.position.as_deref(), Some("Backend Engineer"));
        assert_eq!(job.company.as_deref(), Some("Acme"));
        assert_eq!(job.location.as_deref(), Some("Jakarta Selatan"));
        assert_eq!(
            job.job_url.as_deref(),
            Some("https://glints.com/opportunities/jobs/abc-123")
        );
        assert_eq!(
            job.salary.as_ref().map(|s| s.to_string()).as_deref(),
            Some("IDR 5,000,000 - 8,000,000")
        );
        assert_eq!(job.keyword.as_deref(), Some("Tech"));
        assert_eq!(job.category.as_deref(), Some("Technology"));
        assert_eq!(job.is_remote, Some(true));
        assert_eq!(job.source.as_deref(), Some("glints"));
    }

    #[tokio::test]
    async fn partial_salary_is_not_disclosed() {
        let body = json!({
            "data": [{ "id": 7, "title": "QA", "salaryEstimate": { "minAmount": 5000000 } }]
        });
        let jobs = source(MockFetcher::new(&body.to_string()))
            .scrape(5)
            .await
            .unwrap();

        assert_eq!(jobs[0].salary, None);
        assert_eq!(
            jobs[0].job_url.as_deref(),
            Some("https://glints.com/opportunities/jobs/7")
        );
    }

    #[tokio::test]
    async fn missing_data_key_yields_nothing() {
        let jobs = source(MockFetcher::new(r#"{"error":"rate limited"}"#))
            .scrape(5)
            .await
            .unwrap();
        assert!(jobs.is_empty());
    }
}
