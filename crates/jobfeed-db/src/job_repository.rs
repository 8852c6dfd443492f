use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use jobfeed_core::error::AppError;
use jobfeed_core::models::{CanonicalJob, JobPage, JobQuery, NewJob, StoredJob};
use jobfeed_core::traits::JobStore;

const COLUMNS: &str = r#"
    id, position, company, location, description, requirements, job_url, date,
    ago_time, salary, company_logo, keyword, category, employment_type,
    experience_level, is_remote, source, fingerprint, created_at, updated_at
"#;

/// Optional case-insensitive substring filters, bound as `$1..$3`.
const FILTERS: &str = r#"
    WHERE ($1::text IS NULL OR keyword ILIKE $1)
      AND ($2::text IS NULL OR location ILIKE $2)
      AND ($3::text IS NULL OR company ILIKE $3)
"#;

/// PostgreSQL-backed job store keyed uniquely by `job_url`.
#[derive(Clone)]
pub struct JobRepository {
    pool: Pool<Postgres>,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_url(&self, job_url: &str) -> Result<Option<StoredJob>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM scraped_jobs WHERE job_url = $1");
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(job_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Insert unless the URL is already stored. `None` on conflict.
    pub async fn insert(&self, job: &NewJob) -> Result<Option<Uuid>, AppError> {
        let row: Option<(Uuid,)> = bind_job(
            sqlx::query_as(
                r#"
                INSERT INTO scraped_jobs (
                    position, company, location, description, requirements, job_url, date,
                    ago_time, salary, company_logo, keyword, category, employment_type,
                    experience_level, is_remote, source, fingerprint
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                ON CONFLICT (job_url) DO NOTHING
                RETURNING id
                "#,
            ),
            job,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(|(id,)| id))
    }

    /// Insert, or overwrite the mutable fields of the row holding the URL.
    pub async fn upsert(&self, job: &NewJob) -> Result<Uuid, AppError> {
        let (id,): (Uuid,) = bind_job(
            sqlx::query_as(
                r#"
                INSERT INTO scraped_jobs (
                    position, company, location, description, requirements, job_url, date,
                    ago_time, salary, company_logo, keyword, category, employment_type,
                    experience_level, is_remote, source, fingerprint
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                ON CONFLICT (job_url) DO UPDATE SET
                    position = EXCLUDED.position,
                    company = EXCLUDED.company,
                    location = EXCLUDED.location,
                    salary = EXCLUDED.salary,
                    company_logo = EXCLUDED.company_logo,
                    date = EXCLUDED.date,
                    ago_time = EXCLUDED.ago_time,
                    keyword = EXCLUDED.keyword,
                    source = EXCLUDED.source,
                    fingerprint = EXCLUDED.fingerprint,
                    updated_at = NOW()
                RETURNING id
                "#,
            ),
            job,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(id)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM scraped_jobs"#)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(count)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<StoredJob>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM scraped_jobs WHERE id = $1");
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// One page of jobs, newest posting date first.
    pub async fn list(&self, query: &JobQuery) -> Result<JobPage, AppError> {
        let keyword = query.keyword.as_deref().and_then(like_pattern);
        let location = query.location.as_deref().and_then(like_pattern);
        let company = query.company.as_deref().and_then(like_pattern);
        let per_page = query.per_page();

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM scraped_jobs {FILTERS}"))
                .bind(&keyword)
                .bind(&location)
                .bind(&company)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let sql = format!(
            "SELECT {COLUMNS} FROM scraped_jobs {FILTERS} ORDER BY date DESC, id LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(&keyword)
            .bind(&location)
            .bind(&company)
            .bind(i64::from(per_page))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(JobPage {
            jobs: rows.into_iter().map(Into::into).collect(),
            page: query.page.max(1),
            per_page,
            total,
        })
    }
}

/// Bind the 17 insert columns in declaration order.
fn bind_job<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    job: &'q NewJob,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    let canonical = &job.job;
    query
        .bind(&canonical.position)
        .bind(&canonical.company)
        .bind(&canonical.location)
        .bind(&canonical.description)
        .bind(&canonical.requirements)
        .bind(&canonical.job_url)
        .bind(canonical.date)
        .bind(&job.ago_time)
        .bind(&canonical.salary)
        .bind(&canonical.company_logo)
        .bind(&canonical.keyword)
        .bind(canonical.category.as_str())
        .bind(canonical.employment_type.as_str())
        .bind(canonical.experience_level.as_str())
        .bind(canonical.is_remote)
        .bind(&canonical.source)
        .bind(&job.fingerprint)
}

/// `%term%` with LIKE wildcards in the term escaped. Blank terms mean no filter.
fn like_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    position: String,
    company: String,
    location: String,
    description: Option<String>,
    requirements: Option<String>,
    job_url: String,
    date: DateTime<Utc>,
    ago_time: String,
    salary: String,
    company_logo: Option<String>,
    keyword: String,
    category: String,
    employment_type: String,
    experience_level: String,
    is_remote: bool,
    source: String,
    fingerprint: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<JobRow> for StoredJob {
    fn from(row: JobRow) -> Self {
        StoredJob {
            id: row.id,
            job: CanonicalJob {
                position: row.position,
                company: row.company,
                location: row.location,
                description: row.description,
                requirements: row.requirements,
                job_url: row.job_url,
                date: row.date,
                salary: row.salary,
                company_logo: row.company_logo,
                keyword: row.keyword,
                category: row.category.parse().unwrap_or_default(),
                employment_type: row.employment_type.parse().unwrap_or_default(),
                experience_level: row.experience_level.parse().unwrap_or_default(),
                is_remote: row.is_remote,
                source: row.source,
            },
            ago_time: row.ago_time,
            fingerprint: row.fingerprint,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// -- Trait implementation --

impl JobStore for JobRepository {
    async fn find_by_url(&self, job_url: &str) -> Result<Option<StoredJob>, AppError> {
        JobRepository::find_by_url(self, job_url).await
    }

    async fn insert(&self, job: &NewJob) -> Result<Option<Uuid>, AppError> {
        JobRepository::insert(self, job).await
    }

    async fn upsert(&self, job: &NewJob) -> Result<Uuid, AppError> {
        JobRepository::upsert(self, job).await
    }

    async fn count(&self) -> Result<i64, AppError> {
        JobRepository::count(self).await
    }
}
