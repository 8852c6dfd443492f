use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use jobfeed_client::{ReqwestFetcher, Source, SourceKind, refresh_sources, registry};
use jobfeed_core::fetch::{FetchClient, RetryPolicy};
use jobfeed_core::models::{JobPage, JobQuery, StoredJob};
use jobfeed_core::persist::{PersistMode, Persister};
use jobfeed_core::scrape::{DEFAULT_LIMIT, RunOptions, RunReport, ScrapeService, SourceStatus};
use jobfeed_core::traits::{JobStore, NullStore};
use jobfeed_db::{Database, DatabaseConfig, JobRepository};

#[derive(Parser)]
#[command(name = "jobfeed", version, about = "Multi-source job scraper and normalizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape job boards into the database
    Scrape {
        /// Maximum jobs processed per source
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Source to scrape (repeatable); defaults to every source
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Normalize and print, but do not save
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// How to treat jobs whose URL is already stored: skip or upsert
        #[arg(long, default_value_t = PersistMode::Skip)]
        mode: PersistMode,

        /// Print the run report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        http: HttpArgs,
    },

    /// Refresh jobs from company careers pages, then Tech in Asia (always upserts)
    ///
    /// Tech in Asia is asked for at most 20 postings.
    Refresh {
        /// Careers page URL (repeatable)
        #[arg(short, long = "company")]
        companies: Vec<String>,

        /// Maximum jobs processed per source
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Normalize and print, but do not save
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        http: HttpArgs,
    },

    /// List stored jobs, newest first
    Jobs {
        /// Keyword substring (case-insensitive)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Location substring (case-insensitive)
        #[arg(long)]
        location: Option<String>,

        /// Company substring (case-insensitive)
        #[arg(short, long)]
        company: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Jobs per page
        #[arg(long, default_value_t = JobQuery::DEFAULT_PER_PAGE)]
        per_page: u32,

        /// Print the page as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show one stored job
    Show {
        /// Job id
        id: Uuid,

        /// Print the job as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Outbound HTTP pacing, shared by the scraping commands.
#[derive(Args)]
struct HttpArgs {
    /// Per-request timeout in seconds
    #[arg(long, env = "JOBFEED_HTTP_TIMEOUT", default_value_t = 30)]
    http_timeout: u64,

    /// Attempts per request, including the first
    #[arg(long, env = "JOBFEED_RETRY_ATTEMPTS", default_value_t = 3)]
    retry_attempts: u32,

    /// Wait between failed attempts, in milliseconds
    #[arg(long, env = "JOBFEED_RETRY_DELAY_MS", default_value_t = 2000)]
    retry_delay_ms: u64,

    /// Pause after every successful request, in milliseconds
    #[arg(long, env = "JOBFEED_REQUEST_DELAY_MS", default_value_t = 1000)]
    request_delay_ms: u64,
}

impl HttpArgs {
    fn client(&self) -> Result<FetchClient<ReqwestFetcher>> {
        if self.retry_attempts == 0 {
            bail!("JOBFEED_RETRY_ATTEMPTS must be at least 1");
        }
        let timeout = Duration::from_secs(self.http_timeout);
        let policy = RetryPolicy {
            attempts: self.retry_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            request_delay: Duration::from_millis(self.request_delay_ms),
        };
        let fetcher =
            ReqwestFetcher::with_connect_timeout(timeout).context("Failed to create HTTP client")?;
        Ok(FetchClient::new(fetcher, policy).with_timeout(timeout))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobfeed=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            limit,
            sources,
            dry_run,
            mode,
            json,
            http,
        } => {
            let client = http.client()?;
            let options = RunOptions {
                limit,
                sources: (!sources.is_empty()).then_some(sources),
                dry_run,
            };
            let adapters = registry(&SourceKind::ALL, &client);
            let report = run(adapters, mode, &options).await?;
            print_report(&report, json)?;
        }
        Commands::Refresh {
            companies,
            limit,
            dry_run,
            json,
            http,
        } => {
            let client = http.client()?;
            if companies.is_empty() {
                tracing::warn!("No careers pages given; refreshing Tech in Asia only");
            }
            let adapters = refresh_sources(&client, companies);
            let options = RunOptions {
                limit,
                sources: None,
                dry_run,
            };
            let report = run(adapters, PersistMode::Upsert, &options).await?;
            print_report(&report, json)?;
        }
        Commands::Jobs {
            keyword,
            location,
            company,
            page,
            per_page,
            json,
        } => {
            let repo = connect_db().await?;
            let query = JobQuery {
                keyword,
                location,
                company,
                page,
                per_page,
            };
            let page = repo.list(&query).await.context("Failed to list jobs")?;
            print_page(&page, json)?;
        }
        Commands::Show { id, json } => {
            let repo = connect_db().await?;
            let job = repo
                .get(id)
                .await
                .context("Failed to load job")?
                .with_context(|| format!("No job with id {id}"))?;
            print_job(&job, json)?;
        }
    }

    Ok(())
}

/// Connect using `DATABASE_URL` and apply pending migrations.
async fn connect_db() -> Result<JobRepository> {
    let config = DatabaseConfig::from_env().context("Invalid database configuration")?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to apply migrations")?;
    Ok(db.job_repo())
}

/// Dry runs never touch the database.
async fn run(
    adapters: Vec<Source<ReqwestFetcher>>,
    mode: PersistMode,
    options: &RunOptions,
) -> Result<RunReport> {
    if options.dry_run {
        return Ok(run_with_store(adapters, NullStore, mode, options).await);
    }
    let repo = connect_db().await?;
    Ok(run_with_store(adapters, repo, mode, options).await)
}

async fn run_with_store<St: JobStore>(
    adapters: Vec<Source<ReqwestFetcher>>,
    store: St,
    mode: PersistMode,
    options: &RunOptions,
) -> RunReport {
    let service = ScrapeService::new(adapters, Persister::new(store, mode));
    service.run(options).await
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.dry_run {
        println!("DRY RUN: nothing was saved\n");
        for job in &report.preview {
            println!("  [DRY RUN] {} @ {}", job.position, job.company);
        }
        println!();
    }

    let stored = report
        .stored_total
        .map_or_else(|| "-".to_string(), |total| total.to_string());
    let metrics = [
        ("Total Scraped", report.totals.scraped.to_string()),
        ("Successfully Saved", report.totals.saved.to_string()),
        ("Duplicates Skipped", report.totals.duplicates.to_string()),
        ("Failed", report.totals.failed.to_string()),
        ("Total in Database", stored),
    ];
    println!("{:<20} {:>8}", "Metric", "Count");
    for (metric, count) in metrics {
        println!("{metric:<20} {count:>8}");
    }

    println!("\n{:<12} {:>12}  Status", "Source", "Jobs Fetched");
    for source in &report.sources {
        let status = match &source.status {
            SourceStatus::Completed => "ok".to_string(),
            SourceStatus::NotImplemented => "not implemented".to_string(),
            SourceStatus::Failed { error } => format!("failed: {error}"),
        };
        println!("{:<12} {:>12}  {}", source.name, source.fetched, status);
    }

    Ok(())
}

fn print_page(page: &JobPage, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }

    if page.jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }

    for stored in &page.jobs {
        let job = &stored.job;
        println!(
            "  {}  {} @ {} ({}) | {} | {}",
            stored.id, job.position, job.company, job.location, job.salary, stored.ago_time,
        );
    }
    println!(
        "\nPage {} of {} ({} jobs)",
        page.page,
        page.last_page(),
        page.total
    );

    Ok(())
}

fn print_job(stored: &StoredJob, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stored)?);
        return Ok(());
    }

    let job = &stored.job;
    println!("{} @ {}", job.position, job.company);
    println!("  Location:    {}{}", job.location, if job.is_remote { " (remote)" } else { "" });
    println!("  Salary:      {}", job.salary);
    println!("  Category:    {} / {}", job.category, job.keyword);
    println!("  Type:        {}, {}", job.employment_type, job.experience_level);
    println!(
        "  Posted:      {} ({})",
        job.date.format("%Y-%m-%d %H:%M UTC"),
        stored.ago_time
    );
    println!("  Source:      {}", job.source);
    println!("  URL:         {}", job.job_url);
    if let Some(description) = &job.description {
        println!("\n{description}");
    }
    if let Some(requirements) = &job.requirements {
        println!("\nRequirements:\n{requirements}");
    }

    Ok(())
}
