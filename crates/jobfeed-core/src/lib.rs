pub mod error;
pub mod fetch;
pub mod humanize;
pub mod models;
pub mod normalize;
pub mod persist;
pub mod scrape;
pub mod taxonomy;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::AppError;
pub use fetch::{FetchClient, FetchRequest, RetryPolicy};
pub use models::{
    CanonicalJob, JobPage, JobQuery, NewJob, RawJob, RawSalary, StoredJob, compute_hash,
};
pub use persist::{PersistMode, PersistOutcome, Persister};
pub use scrape::{RunOptions, RunReport, RunStats, ScrapeService, SourceReport, SourceStatus};
pub use taxonomy::{Category, EmploymentType, ExperienceLevel};
pub use traits::{Fetcher, JobSource, JobStore, NullStore};
