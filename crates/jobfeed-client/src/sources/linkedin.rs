use std::sync::LazyLock;

use jobfeed_core::error::AppError;
use jobfeed_core::fetch::FetchClient;
use jobfeed_core::models::RawJob;
use jobfeed_core::traits::{Fetcher, JobSource};
use regex::Regex;

const SEARCH_URL: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// One job card: title, company, location, then the first link after them.
static CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)<div class="base-card relative w-full hover:no-underline.*?"#,
        r#"<h3 class="base-search-card__title">(.*?)</h3>.*?"#,
        r#"<h4 class="base-search-card__subtitle">(.*?)</h4>.*?"#,
        r#"<span class="job-search-card__location">(.*?)</span>.*?"#,
        r#"<a.*?href="(.*?)".*?>"#,
    ))
    .expect("valid LinkedIn card regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// LinkedIn's public guest search, scraped from card markup.
///
/// Returns nothing when the markup no longer matches.
pub struct LinkedInSource<F> {
    client: FetchClient<F>,
}

impl<F: Fetcher> LinkedInSource<F> {
    pub fn new(client: FetchClient<F>) -> Self {
        Self { client }
    }
}

impl<F: Fetcher> JobSource for LinkedInSource<F> {
    fn name(&self) -> &str {
        "linkedin"
    }

    async fn scrape(&self, limit: usize) -> Result<Vec<RawJob>, AppError> {
        let url = format!("{SEARCH_URL}?location=Indonesia&start=0&count={limit}");
        let Some(html) = self.client.get_text(&url).await else {
            tracing::warn!(source = "linkedin", %url, "Failed to fetch search results");
            return Ok(Vec::new());
        };

        let jobs = parse_cards(&html);
        if jobs.is_empty() {
            tracing::warn!(source = "linkedin", "No job cards matched; markup may have changed");
        }
        Ok(jobs)
    }
}

/// Job cards in a guest search page. Cards missing any field are discarded.
pub fn parse_cards(html: &str) -> Vec<RawJob> {
    CARD.captures_iter(html)
        .filter_map(|caps| {
            let title = strip_tags(caps.get(1)?.as_str())?;
            let company = strip_tags(caps.get(2)?.as_str())?;
            let location = strip_tags(caps.get(3)?.as_str())?;
            let link = decode_entities(caps.get(4)?.as_str().trim());
            if link.is_empty() {
                return None;
            }

            Some(RawJob {
                position: Some(title),
                company: Some(company),
                location: Some(location),
                job_url: Some(link),
                source: Some("linkedin".to_string()),
                ..Default::default()
            })
        })
        .collect()
}

fn strip_tags(fragment: &str) -> Option<String> {
    let text = TAG.replace_all(fragment, "");
    let text = text.trim();
    (!text.is_empty()).then(|| decode_entities(text))
}

/// Decode the handful of entities HTML attribute escaping produces.
fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
