//! Schema.org `JobPosting` extraction from embedded JSON-LD.

use std::sync::LazyLock;

use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::{RawJob, RawSalary};
use jobfeed_core::traits::{Fetcher, JobSource};
use scraper::{Html, Selector};
use serde_json::Value;

use super::{scalar_text, text_at};

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid JSON-LD selector")
});

const REMOTE_LOCATION_TYPES: &[&str] = &["TELECOMMUTE", "REMOTE"];
const REMOTE_MARKERS: &[&str] = &["remote", "work from home"];

/// A listing page whose postings are published as Schema.org JSON-LD.
pub struct SchemaOrgSource<F> {
    client: FetchClient<F>,
    name: &'static str,
    url: &'static str,
}

impl<F: Fetcher> SchemaOrgSource<F> {
    pub fn jobstreet(client: FetchClient<F>) -> Self {
        Self {
            client,
            name: "jobstreet",
            url: "https://www.jobstreet.co.id/jobs",
        }
    }

    pub fn urbanhire(client: FetchClient<F>) -> Self {
        Self {
            client,
            name: "urbanhire",
            url: "https://www.urbanhire.com/jobs",
        }
    }
}

impl<F: Fetcher> JobSource for SchemaOrgSource<F> {
    fn name(&self) -> &str {
        self.name
    }

    async fn scrape(&self, _limit: usize) -> Result<Vec<RawJob>, AppError> {
        let Some(html) = self.client.get_text(self.url).await else {
            tracing::warn!(source = %self.name, url = %self.url, "Failed to fetch listing page");
            return Ok(Vec::new());
        };

        let mut jobs = extract_job_postings(&html);
        for job in &mut jobs {
            job.source = Some(self.name.to_string());
        }
        Ok(jobs)
    }
}

/// Every `JobPosting` found in the page's JSON-LD blocks.
///
/// A block may hold a single object, a top-level array, or an `@graph`
/// array. Blocks that fail to decode are skipped.
pub fn extract_job_postings(html: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let mut jobs = Vec::new();

    for script in document.select(&LD_JSON) {
        let text = script.text().collect::<String>();
        let data: Value = match serde_json::from_str(text.trim()) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable JSON-LD block");
                continue;
            }
        };

        let nodes: Vec<&Value> = match &data {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => match map.get("@graph") {
                Some(Value::Array(graph)) => graph.iter().collect(),
                _ => vec![&data],
            },
            _ => Vec::new(),
        };

        jobs.extend(nodes.into_iter().filter(|n| is_job_posting(n)).map(parse_posting));
    }

    jobs
}

fn is_job_posting(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(kind)) => kind == "JobPosting",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn parse_posting(posting: &Value) -> RawJob {
    RawJob {
        position: text_at(posting, "/title"),
        company: text_at(posting, "/hiringOrganization/name"),
        location: location(posting.get("jobLocation")),
        description: text_at(posting, "/description"),
        requirements: text_or_first(posting.get("qualifications"))
            .or_else(|| text_or_first(posting.get("skills"))),
        job_url: text_at(posting, "/url"),
        date: text_at(posting, "/datePosted"),
        salary: salary(posting.get("baseSalary")),
        employment_type: text_or_first(posting.get("employmentType")),
        category: text_or_first(posting.get("industry")),
        is_remote: Some(is_remote(posting)),
        source: Some("schema.org".to_string()),
        ..Default::default()
    }
}

/// `None` when the location is absent or yields nothing usable.
fn location(job_location: Option<&Value>) -> Option<String> {
    let place = match job_location? {
        Value::String(text) => return non_empty(text),
        Value::Array(places) => places.first()?,
        other => other,
    };

    match place.get("address")? {
        Value::String(text) => non_empty(text),
        address @ Value::Object(_) => {
            let parts: Vec<String> = ["addressLocality", "addressRegion", "addressCountry"]
                .iter()
                .filter_map(|key| address.get(*key))
                .filter_map(|part| match part {
                    Value::Object(_) => text_at(part, "/name"),
                    other => scalar_text(other),
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

fn is_remote(posting: &Value) -> bool {
    let declared = match posting.get("jobLocationType") {
        Some(Value::String(kind)) => REMOTE_LOCATION_TYPES.contains(&kind.as_str()),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .any(|kind| REMOTE_LOCATION_TYPES.contains(&kind)),
        _ => false,
    };
    if declared {
        return true;
    }

    let location_text = serde_json::json!([
        posting.get("applicantLocationRequirements"),
        posting.get("jobLocation"),
    ])
    .to_string()
    .to_lowercase();
    REMOTE_MARKERS.iter().any(|marker| location_text.contains(marker))
}

/// `baseSalary` as text, a min/max range, or a single value.
fn salary(base: Option<&Value>) -> Option<RawSalary> {
    let base = base?;
    if let Value::String(text) = base {
        return non_empty(text).map(RawSalary::Text);
    }
    if !base.is_object() {
        return None;
    }

    let currency = text_at(base, "/currency").unwrap_or_else(|| "IDR".to_string());
    let quantity = base.get("value");
    let bound = |key: &str| {
        base.get(key)
            .or_else(|| quantity.and_then(|q| q.get(key)))
            .and_then(disclosed)
    };

    if let (Some(min), Some(max)) = (bound("minValue"), bound("maxValue")) {
        return Some(RawSalary::Range { currency, min, max });
    }

    let value = match quantity? {
        nested @ Value::Object(_) => nested.get("value").and_then(disclosed),
        scalar => disclosed(scalar),
    }?;
    Some(RawSalary::Amount { currency, value })
}

/// Scalar text, treating zero and empty as undisclosed.
fn disclosed(value: &Value) -> Option<String> {
    let text = scalar_text(value)?;
    match value {
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        _ if text.trim() == "0" => None,
        _ => Some(text),
    }
}

fn text_or_first(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => non_empty(text),
        Value::Array(items) => items.iter().find_map(|item| item.as_str().and_then(non_empty)),
        _ => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use jobfeed_core::fetch::RetryPolicy;
    use jobfeed_core::testutil::MockFetcher;

    use super::*;

    fn page(blocks: &[&str]) -> String {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect();
        format!("<html><head>{scripts}</head><body><h1>Jobs</h1></body></html>")
    }

    #[test]
    fn remote_location_type_marks_job_remote() {
        let html = page(&[
            r#"{"@type":"JobPosting","title":"X","hiringOrganization":{"name":"Y"},"jobLocationType":"REMOTE"}"#,
        ]);

        let jobs = extract_job_postings(&html);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].position.as_deref(), Some("X"));
        assert_eq!(jobs[0].company.as_deref(), Some("Y"));
        assert_eq!(jobs[0].is_remote, Some(true));
        assert_eq!(jobs[0].location, None);
        assert_eq!(jobs[0].salary, None);
    }

    #[test]
    fn finds_postings_in_graph_and_arrays() {
        let html = page(&[
            r#"{"@context":"https://schema.org","@graph":[{"@type":"Organization","name":"Acme"},{"@type":"JobPosting","title":"A","url":"https://x.com/a"}]}"#,
            r#"[{"@type":["JobPosting","Thing"],"title":"B"},{"@type":"BreadcrumbList"}]"#,
            r#"{not json"#,
        ]);

        let titles: Vec<_> = extract_job_postings(&html)
            .into_iter()
            .filter_map(|j| j.position)
            .collect();

        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn maps_structured_address_and_salary() {
        let html = page(&[r#"{
            "@type": "JobPosting",
            "title": "Accountant",
            "datePosted": "2024-03-19",
            "employmentType": ["PART_TIME"],
            "industry": "Finance",
            "skills": "Excel",
            "jobLocation": {
                "@type": "Place",
                "address": {
                    "addressLocality": "Bandung",
                    "addressRegion": "Jawa Barat",
                    "addressCountry": { "@type": "Country", "name": "ID" }
                }
            },
            "baseSalary": {
                "@type": "MonetaryAmount",
                "currency": "IDR",
                "value": { "@type": "QuantitativeValue", "minValue": 6000000, "maxValue": 9000000, "unitText": "MONTH" }
            }
        }"#]);

        let job = extract_job_postings(&html).remove(0);

        assert_eq!(job.location.as_deref(), Some("Bandung, Jawa Barat, ID"));
        assert_eq!(
            job.salary.map(|s| s.to_string()).as_deref(),
            Some("IDR 6000000 - 9000000")
        );
        assert_eq!(job.employment_type.as_deref(), Some("PART_TIME"));
        assert_eq!(job.requirements.as_deref(), Some("Excel"));
        assert_eq!(job.category.as_deref(), Some("Finance"));
        assert_eq!(job.is_remote, Some(false));
    }

    #[test]
    fn salary_shapes() {
        let text = serde_json::json!("Competitive");
        let single = serde_json::json!({ "value": 7500000 });
        let nested = serde_json::json!({ "currency": "USD", "value": { "value": 4000 } });
        let zero = serde_json::json!({ "minValue": 0, "maxValue": 0 });

        assert_eq!(salary(Some(&text)), Some(RawSalary::Text("Competitive".into())));
        assert_eq!(
            salary(Some(&single)).map(|s| s.to_string()).as_deref(),
            Some("IDR 7500000")
        );
        assert_eq!(
            salary(Some(&nested)).map(|s| s.to_string()).as_deref(),
            Some("USD 4000")
        );
        assert_eq!(salary(Some(&zero)), None);
        assert_eq!(salary(None), None);
    }

    #[test]
    fn float_salary_bounds_render_as_whole_numbers() {
        let range = serde_json::json!({
            "currency": "IDR",
            "minValue": 5000000.0,
            "maxValue": 9000000.0
        });

        assert_eq!(
            salary(Some(&range)).map(|s| s.to_string()).as_deref(),
            Some("IDR 5000000 - 9000000")
        );
    }

    #[test]
    fn location_text_mentioning_remote_marks_job_remote() {
        let html = page(&[
            r#"{"@type":"JobPosting","title":"Writer","jobLocation":"Work From Home, Indonesia"}"#,
        ]);

        let job = extract_job_postings(&html).remove(0);

        assert_eq!(job.location.as_deref(), Some("Work From Home, Indonesia"));
        assert_eq!(job.is_remote, Some(true));
    }

    #[tokio::test]
    async fn source_name_overrides_schema_org_tag() {
        let html = page(&[
            r#"{"@type":"JobPosting","title":"Kasir","url":"https://js.example/1"}"#,
        ]);
        let fetcher = MockFetcher::new(&html);
        let source = SchemaOrgSource::jobstreet(FetchClient::new(
            fetcher.clone(),
            RetryPolicy::without_delays(),
        ));

        let jobs = source.scrape(10).await.unwrap();

        assert_eq!(fetcher.requested_urls(), vec!["https://www.jobstreet.co.id/jobs"]);
        assert_eq!(jobs[0].source.as_deref(), Some("jobstreet"));
    }
}
