//! Raw-to-canonical job normalization.
//!
//! Every step is a standalone function so it can be tested on its own;
//! [`normalize_at`] chains them and applies the field defaults.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::AppError;
use crate::models::{CanonicalJob, RawJob};
use crate::taxonomy::{Category, EmploymentType, ExperienceLevel};

pub const DEFAULT_POSITION: &str = "Unknown";
pub const DEFAULT_COMPANY: &str = "Unknown";
pub const DEFAULT_LOCATION: &str = "Indonesia";
pub const DEFAULT_SALARY: &str = "Not disclosed";
pub const DEFAULT_KEYWORD: &str = "General";
pub const DEFAULT_SOURCE: &str = "unknown";

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern should compile"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("DKI Jakarta", "Jakarta"),
    ("Jakarta Raya", "Jakarta"),
    ("Jabodetabek", "Jakarta"),
    ("ID", "Indonesia"),
];

/// One classification rule: any keyword substring selects the label.
struct Rule<L: 'static> {
    keywords: &'static [&'static str],
    label: L,
}

// Order matters: the first rule with a hit wins.
const CATEGORY_RULES: &[Rule<Category>] = &[
    Rule {
        keywords: &[
            "developer",
            "engineer",
            "programmer",
            "software",
            "tech",
            "data",
            "it ",
            "devops",
            "backend",
            "frontend",
        ],
        label: Category::Technology,
    },
    Rule {
        keywords: &[
            "marketing",
            "seo",
            "content",
            "social media",
            "digital marketing",
            "brand",
        ],
        label: Category::Marketing,
    },
    Rule {
        keywords: &[
            "sales",
            "business development",
            "account manager",
            "relationship manager",
        ],
        label: Category::Sales,
    },
    Rule {
        keywords: &["designer", "ui", "ux", "graphic", "creative"],
        label: Category::Design,
    },
    Rule {
        keywords: &["finance", "accounting", "accountant", "financial", "treasurer"],
        label: Category::Finance,
    },
    Rule {
        keywords: &[
            "hr",
            "human resource",
            "recruiter",
            "talent acquisition",
            "people",
        ],
        label: Category::Hr,
    },
    Rule {
        keywords: &[
            "operations",
            "operation manager",
            "logistics",
            "supply chain",
        ],
        label: Category::Operations,
    },
    Rule {
        keywords: &["customer service", "customer support", "cs ", "support"],
        label: Category::CustomerService,
    },
    Rule {
        keywords: &["product manager", "product owner", "product"],
        label: Category::Product,
    },
];

const EMPLOYMENT_RULES: &[Rule<EmploymentType>] = &[
    Rule {
        keywords: &["full", "permanent"],
        label: EmploymentType::FullTime,
    },
    Rule {
        keywords: &["part"],
        label: EmploymentType::PartTime,
    },
    Rule {
        keywords: &["contract", "freelance"],
        label: EmploymentType::Contract,
    },
    Rule {
        keywords: &["intern"],
        label: EmploymentType::Internship,
    },
];

const EXPERIENCE_RULES: &[Rule<ExperienceLevel>] = &[
    Rule {
        keywords: &["senior", "lead", "principal"],
        label: ExperienceLevel::Senior,
    },
    Rule {
        keywords: &["junior", "entry", "graduate"],
        label: ExperienceLevel::EntryLevel,
    },
    Rule {
        keywords: &["intern"],
        label: ExperienceLevel::Internship,
    },
];

fn first_match<L: Copy>(rules: &[Rule<L>], text: &str) -> Option<L> {
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|rule| rule.label)
}

/// Strip markup tags, collapse whitespace runs, and trim.
///
/// Returns `None` for absent input or text that is empty once cleaned.
pub fn clean_text(text: Option<&str>) -> Option<String> {
    let text = text?;
    let stripped = TAG.replace_all(text, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let cleaned = collapsed.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Trim and map well-known aliases to their canonical names.
pub fn normalize_location(location: &str) -> String {
    let location = location.trim();
    LOCATION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == location)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| location.to_string())
}

pub fn categorize(position: &str, description: Option<&str>) -> Category {
    let text = format!("{} {}", position, description.unwrap_or_default()).to_lowercase();
    first_match(CATEGORY_RULES, &text).unwrap_or_default()
}

pub fn normalize_employment_type(raw: Option<&str>) -> EmploymentType {
    raw.and_then(|raw| first_match(EMPLOYMENT_RULES, &raw.to_lowercase()))
        .unwrap_or_default()
}

pub fn detect_experience_level(position: &str, requirements: Option<&str>) -> ExperienceLevel {
    let text = format!("{} {}", position, requirements.unwrap_or_default()).to_lowercase();
    first_match(EXPERIENCE_RULES, &text).unwrap_or_default()
}

/// Parse the date formats sources are known to emit.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}

/// Normalize with the current time as the fallback posting date.
pub fn normalize(raw: RawJob) -> Result<CanonicalJob, AppError> {
    normalize_at(raw, Utc::now())
}

/// Normalize a raw record, using `now` for a missing or unparseable date.
///
/// Fails only when the record has no job URL: without it the record cannot be
/// deduplicated or stored.
pub fn normalize_at(raw: RawJob, now: DateTime<Utc>) -> Result<CanonicalJob, AppError> {
    let job_url = raw
        .job_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(AppError::MissingField("job_url"))?
        .to_string();

    let position = clean_text(raw.position.as_deref());
    let company = clean_text(raw.company.as_deref());
    let description = clean_text(raw.description.as_deref());
    let requirements = clean_text(raw.requirements.as_deref());

    let position_text = position.as_deref().unwrap_or_default();
    let category = categorize(position_text, description.as_deref());
    // Sources without a separate requirements field put seniority in the description.
    let experience_level =
        detect_experience_level(position_text, requirements.as_deref().or(description.as_deref()));
    let employment_type = normalize_employment_type(raw.employment_type.as_deref());

    let location = raw
        .location
        .as_deref()
        .map(normalize_location)
        .filter(|location| !location.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let date = raw.date.as_deref().and_then(parse_date).unwrap_or(now);

    let salary = raw
        .salary
        .map(|salary| salary.to_string().trim().to_string())
        .filter(|salary| !salary.is_empty())
        .unwrap_or_else(|| DEFAULT_SALARY.to_string());

    let keyword = raw
        .keyword
        .or(raw.category)
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .unwrap_or_else(|| DEFAULT_KEYWORD.to_string());

    Ok(CanonicalJob {
        position: position.unwrap_or_else(|| DEFAULT_POSITION.to_string()),
        company: company.unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
        location,
        description,
        requirements,
        job_url,
        date,
        salary,
        company_logo: raw.company_logo.filter(|logo| !logo.trim().is_empty()),
        keyword,
        category,
        employment_type,
        experience_level,
        is_remote: raw.is_remote.unwrap_or(false),
        source: raw
            .source
            .filter(|source| !source.is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
    })
}
