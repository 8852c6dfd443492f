use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::RawJob;
use jobfeed_core::traits::{Fetcher, JobSource};
use serde_json::Value;

use super::{fetch_items, scalar_at, text_at};

const API_URL: &str = "https://www.kalibrr.com/api/job_board/jobs";

/// Kalibrr job board (JSON API).
pub struct KalibrrSource<F> {
    client: FetchClient<F>,
}

impl<F: Fetcher> KalibrrSource<F> {
    pub fn new(client: FetchClient<F>) -> Self {
        Self { client }
    }
}

impl<F: Fetcher> JobSource for KalibrrSource<F> {
    fn name(&self) -> &str {
        "kalibrr"
    }

    async fn scrape(&self, limit: usize) -> Result<Vec<RawJob>, AppError> {
        let url = format!("{API_URL}?country=Indonesia&limit={limit}");
        let items = fetch_items(&self.client, self.name(), &url, "jobs").await;
        Ok(items.iter().map(parse_job).collect())
    }
}

fn parse_job(item: &Value) -> RawJob {
    let job_url = match (scalar_at(item, "/company_id"), scalar_at(item, "/id")) {
        (Some(company_id), Some(id)) => {
            Some(format!("https://www.kalibrr.com/c/{company_id}/jobs/{id}"))
        }
        _ => None,
    };

    RawJob {
        position: text_at(item, "/name"),
        company: text_at(item, "/company_name"),
        location: text_at(item, "/location/name"),
        description: text_at(item, "/description"),
        requirements: text_at(item, "/requirements"),
        job_url,
        date: text_at(item, "/created_at"),
        company_logo: text_at(item, "/company_logo"),
        keyword: text_at(item, "/primary_role"),
        source: Some("kalibrr".to_string()),
        ..Default::default()
    }
}
