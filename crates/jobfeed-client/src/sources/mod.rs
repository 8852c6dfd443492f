//! Source adapters: one per external job board family.
//!
//! Every adapter maps a source-specific payload into [`RawJob`]s. A fetch
//! failure or an unexpected payload shape is "no data this round": it is
//! logged and yields an empty list rather than an error.

mod careers;
mod glints;
mod kalibrr;
mod lever;
mod linkedin;
mod schema_org;
mod techinasia;

use std::fmt;
use std::str::FromStr;

use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::RawJob;
use jobfeed_core::traits::{Fetcher, JobSource};
use serde_json::Value;

pub use careers::{CareersSource, KNOWN_CAREER_APIS};
pub use glints::GlintsSource;
pub use kalibrr::KalibrrSource;
pub use lever::{LEVER_COMPANIES, LeverSource};
pub use linkedin::{LinkedInSource, parse_cards};
pub use schema_org::{SchemaOrgSource, extract_job_postings};
pub use techinasia::TechInAsiaSource;

/// Every source the `scrape` run knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Glints,
    Kalibrr,
    TechInAsia,
    JobStreet,
    Urbanhire,
    LinkedIn,
    Lever,
}

impl SourceKind {
    /// Default run order.
    pub const ALL: [SourceKind; 7] = [
        SourceKind::Glints,
        SourceKind::Kalibrr,
        SourceKind::TechInAsia,
        SourceKind::JobStreet,
        SourceKind::Urbanhire,
        SourceKind::LinkedIn,
        SourceKind::Lever,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Glints => "glints",
            SourceKind::Kalibrr => "kalibrr",
            SourceKind::TechInAsia => "techinasia",
            SourceKind::JobStreet => "jobstreet",
            SourceKind::Urbanhire => "urbanhire",
            SourceKind::LinkedIn => "linkedin",
            SourceKind::Lever => "lever",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown source: {}", s))
    }
}

/// A configured adapter of any kind.
pub enum Source<F> {
    Glints(GlintsSource<F>),
    Kalibrr(KalibrrSource<F>),
    TechInAsia(TechInAsiaSource<F>),
    SchemaOrg(SchemaOrgSource<F>),
    LinkedIn(LinkedInSource<F>),
    Lever(LeverSource<F>),
    Careers(CareersSource<F>),
}

impl<F: Fetcher> Source<F> {
    pub fn new(kind: SourceKind, client: FetchClient<F>) -> Self {
        match kind {
            SourceKind::Glints => Source::Glints(GlintsSource::new(client)),
            SourceKind::Kalibrr => Source::Kalibrr(KalibrrSource::new(client)),
            SourceKind::TechInAsia => Source::TechInAsia(TechInAsiaSource::new(client)),
            SourceKind::JobStreet => Source::SchemaOrg(SchemaOrgSource::jobstreet(client)),
            SourceKind::Urbanhire => Source::SchemaOrg(SchemaOrgSource::urbanhire(client)),
            SourceKind::LinkedIn => Source::LinkedIn(LinkedInSource::new(client)),
            SourceKind::Lever => Source::Lever(LeverSource::new(client)),
        }
    }

    /// Company careers pages, refreshed through their known APIs or markup.
    pub fn careers(client: FetchClient<F>, targets: Vec<String>) -> Self {
        Source::Careers(CareersSource::new(client, targets))
    }
}

impl<F: Fetcher> JobSource for Source<F> {
    fn name(&self) -> &str {
        match self {
            Source::Glints(s) => s.name(),
            Source::Kalibrr(s) => s.name(),
            Source::TechInAsia(s) => s.name(),
            Source::SchemaOrg(s) => s.name(),
            Source::LinkedIn(s) => s.name(),
            Source::Lever(s) => s.name(),
            Source::Careers(s) => s.name(),
        }
    }

    async fn scrape(&self, limit: usize) -> Result<Vec<RawJob>, AppError> {
        match self {
            Source::Glints(s) => s.scrape(limit).await,
            Source::Kalibrr(s) => s.scrape(limit).await,
            Source::TechInAsia(s) => s.scrape(limit).await,
            Source::SchemaOrg(s) => s.scrape(limit).await,
            Source::LinkedIn(s) => s.scrape(limit).await,
            Source::Lever(s) => s.scrape(limit).await,
            Source::Careers(s) => s.scrape(limit).await,
        }
    }

    async fn scrape_counted(&self, limit: usize) -> Result<(Vec<RawJob>, usize), AppError> {
        match self {
            Source::Glints(s) => s.scrape_counted(limit).await,
            Source::Kalibrr(s) => s.scrape_counted(limit).await,
            Source::TechInAsia(s) => s.scrape_counted(limit).await,
            Source::SchemaOrg(s) => s.scrape_counted(limit).await,
            Source::LinkedIn(s) => s.scrape_counted(limit).await,
            Source::Lever(s) => s.scrape_counted(limit).await,
            Source::Careers(s) => s.scrape_counted(limit).await,
        }
    }
}

/// Tech in Asia postings requested per careers refresh.
pub const REFRESH_TECHINASIA_LIMIT: usize = 20;

/// The careers refresh: the given careers pages, then a short Tech in Asia page.
pub fn refresh_sources<F: Fetcher>(
    client: &FetchClient<F>,
    targets: Vec<String>,
) -> Vec<Source<F>> {
    vec![
        Source::careers(client.clone(), targets),
        Source::TechInAsia(
            TechInAsiaSource::new(client.clone()).with_limit_cap(REFRESH_TECHINASIA_LIMIT),
        ),
    ]
}

/// One adapter per kind, in the given order.
pub fn registry<F: Fetcher>(kinds: &[SourceKind], client: &FetchClient<F>) -> Vec<Source<F>> {
    kinds
        .iter()
        .map(|kind| Source::new(*kind, client.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

/// Fetch a JSON document and pull the array under `key`.
///
/// Any failure is logged and reported as an empty list.
async fn fetch_items<F: Fetcher>(
    client: &FetchClient<F>,
    source: &str,
    url: &str,
    key: &str,
) -> Vec<Value> {
    let Some(body) = client.get_json(url).await else {
        tracing::warn!(%source, %url, "No data from source API");
        return Vec::new();
    };
    match body.get(key).and_then(Value::as_array) {
        Some(items) => items.clone(),
        None => {
            tracing::warn!(%source, %url, %key, "Response is missing the expected list");
            Vec::new()
        }
    }
}

/// A string at a JSON pointer. Empty strings count as absent.
fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// A string or number at a JSON pointer, rendered as text.
fn scalar_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(scalar_text)
}

/// Whole-valued floats render without a fraction: `5000000.0` reads "5000000".
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        _ => None,
    }
}

/// A number at a JSON pointer; numeric strings are accepted.
fn number_at(value: &Value, pointer: &str) -> Option<f64> {
    match value.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Upper-case the first character, as company slugs are displayed.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use jobfeed_core::fetch::RetryPolicy;
    use jobfeed_core::persist::{PersistMode, Persister};
    use jobfeed_core::scrape::{RunOptions, ScrapeService, SourceStatus};
    use jobfeed_core::testutil::{MockFetcher, MockStore};
    use serde_json::json;

    use super::*;

    #[test]
    fn kind_round_trips_through_names() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
        assert_eq!("LinkedIn".parse::<SourceKind>().unwrap(), SourceKind::LinkedIn);
        assert!("indeed".parse::<SourceKind>().is_err());
    }

    #[test]
    fn json_helpers_read_nested_values() {
        let value = json!({
            "company": { "name": "Acme", "blank": "  " },
            "id": 42,
            "salary": "5000000",
        });

        assert_eq!(text_at(&value, "/company/name").as_deref(), Some("Acme"));
        assert_eq!(text_at(&value, "/company/blank"), None);
        assert_eq!(text_at(&value, "/id"), None);
        assert_eq!(scalar_at(&value, "/id").as_deref(), Some("42"));
        assert_eq!(number_at(&value, "/salary"), Some(5_000_000.0));
        assert_eq!(number_at(&value, "/missing"), None);
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(scalar_text(&json!(5000000.0)).as_deref(), Some("5000000"));
        assert_eq!(scalar_text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(scalar_text(&json!(1.5)).as_deref(), Some("1.5"));
        assert_eq!(scalar_text(&json!("  ")), None);
    }

    #[test]
    fn capitalizes_company_slugs() {
        assert_eq!(capitalize("gojek"), "Gojek");
        assert_eq!(capitalize(""), "");
    }

    fn client(fetcher: MockFetcher) -> FetchClient<MockFetcher> {
        FetchClient::new(fetcher, RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn source_failing_every_attempt_reports_zero_and_run_continues() {
        let failing = MockFetcher::always_failing();
        let body = json!({ "data": [{ "id": 1, "title": "Backend Engineer" }] });
        let working = MockFetcher::new(&body.to_string());
        let store = MockStore::empty();
        let service = ScrapeService::new(
            vec![
                Source::new(SourceKind::TechInAsia, client(failing.clone())),
                Source::new(SourceKind::Glints, client(working)),
            ],
            Persister::new(store.clone(), PersistMode::Skip),
        );

        let report = service.run(&RunOptions::default()).await;

        assert_eq!(failing.request_count(), 3);
        assert_eq!(report.sources[0].name, "techinasia");
        assert_eq!(report.sources[0].status, SourceStatus::Completed);
        assert_eq!(report.sources[0].fetched, 0);
        assert_eq!(report.sources[1].stats.saved, 1);
        assert_eq!(report.totals.saved, 1);
        assert!(store.get("https://glints.com/opportunities/jobs/1").is_some());
    }

    #[tokio::test]
    async fn refresh_runs_careers_then_capped_techinasia() {
        let fetcher = MockFetcher::with_responses(vec![
            Ok("<html><body>No postings</body></html>".to_string()),
            Ok(r#"{"data":[]}"#.to_string()),
        ]);
        let client = FetchClient::new(fetcher.clone(), RetryPolicy::without_delays());

        let sources = refresh_sources(&client, vec!["https://career.astra.co.id".to_string()]);
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["careers", "techinasia"]);

        for source in &sources {
            source.scrape(100).await.unwrap();
        }
        assert_eq!(
            fetcher.requested_urls(),
            vec![
                "https://career.astra.co.id",
                "https://www.techinasia.com/api/2.0/job-postings?country_name[]=Indonesia&limit=20",
            ]
        );
    }
}
