use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::taxonomy::{Category, EmploymentType, ExperienceLevel};

/// Salary as exposed by a source, before it is flattened to display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSalary {
    /// Free text, passed through verbatim.
    Text(String),
    /// A min/max pair, already formatted by the adapter.
    Range {
        currency: String,
        min: String,
        max: String,
    },
    /// A single amount.
    Amount { currency: String, value: String },
}

impl fmt::Display for RawSalary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawSalary::Text(text) => write!(f, "{text}"),
            RawSalary::Range { currency, min, max } => write!(f, "{currency} {min} - {max}"),
            RawSalary::Amount { currency, value } => write!(f, "{currency} {value}"),
        }
    }
}

/// Loosely-typed job record as produced by a source adapter.
///
/// Nothing is guaranteed present; adapters fill in whatever the source exposes
/// and the normalizer applies defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawJob {
    pub position: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub job_url: Option<String>,
    /// Posted date as the source wrote it.
    pub date: Option<String>,
    pub salary: Option<RawSalary>,
    pub company_logo: Option<String>,
    /// Search tag hint.
    pub keyword: Option<String>,
    /// Category hint (team, industry). Used as a keyword fallback.
    pub category: Option<String>,
    pub employment_type: Option<String>,
    pub is_remote: Option<bool>,
    pub source: Option<String>,
}

/// A fully-normalized job record with every default applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalJob {
    pub position: String,
    pub company: String,
    pub location: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    /// Unique key across all stored jobs.
    pub job_url: String,
    pub date: DateTime<Utc>,
    pub salary: String,
    pub company_logo: Option<String>,
    pub keyword: String,
    pub category: Category,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub is_remote: bool,
    pub source: String,
}

impl CanonicalJob {
    /// SHA-256 over lower-cased `position|company|location`.
    ///
    /// Identifies the same posting seen through different sources. Not a
    /// uniqueness key: `job_url` is.
    pub fn fingerprint(&self) -> String {
        compute_hash(
            &format!("{}|{}|{}", self.position, self.company, self.location).to_lowercase(),
        )
    }
}

/// DTO for writing a job: the canonical record plus its write-time snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    #[serde(flatten)]
    pub job: CanonicalJob,
    /// Human-relative rendering of `job.date`, frozen at write time.
    pub ago_time: String,
    pub fingerprint: String,
}

impl NewJob {
    pub fn new(job: CanonicalJob, ago_time: String) -> Self {
        let fingerprint = job.fingerprint();
        Self {
            job,
            ago_time,
            fingerprint,
        }
    }
}

/// A persisted job row.
#[derive(Debug, Clone, Serialize)]
pub struct StoredJob {
    pub id: Uuid,
    #[serde(flatten)]
    pub job: CanonicalJob,
    pub ago_time: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for the paginated job listing.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    /// 1-indexed page number.
    pub page: u32,
    pub per_page: u32,
}

impl JobQuery {
    pub const DEFAULT_PER_PAGE: u32 = 20;

    /// Row offset for the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(self.per_page())
    }

    pub fn per_page(&self) -> u32 {
        if self.per_page == 0 {
            Self::DEFAULT_PER_PAGE
        } else {
            self.per_page
        }
    }
}

/// One page of stored jobs.
#[derive(Debug, Clone, Serialize)]
pub struct JobPage {
    pub jobs: Vec<StoredJob>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl JobPage {
    pub fn last_page(&self) -> u32 {
        if self.total <= 0 {
            return 1;
        }
        let per_page = i64::from(self.per_page.max(1));
        ((self.total + per_page - 1) / per_page) as u32
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
