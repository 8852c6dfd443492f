use chrono::{Duration, TimeZone, Utc};
use jobfeed_core::models::{CanonicalJob, JobQuery, NewJob};
use jobfeed_core::taxonomy::{Category, EmploymentType, ExperienceLevel};
use jobfeed_db::{Database, JobRepository};

use crate::integration::common::setup_test_db;

fn job(url: &str, position: &str, company: &str, location: &str) -> NewJob {
    NewJob::new(
        CanonicalJob {
            position: position.into(),
            company: company.into(),
            location: location.into(),
            description: Some("Build services".into()),
            requirements: None,
            job_url: url.into(),
            date: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
            salary: "Not disclosed".into(),
            company_logo: None,
            keyword: "Tech".into(),
            category: Category::Technology,
            employment_type: EmploymentType::Contract,
            experience_level: ExperienceLevel::Senior,
            is_remote: true,
            source: "glints".into(),
        },
        "3 days ago".into(),
    )
}

#[tokio::test]
async fn insert_and_find_by_url() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let new_job = job("https://x.com/1", "Backend Engineer", "Acme", "Jakarta");
    let id = repo
        .insert(&new_job)
        .await
        .unwrap()
        .expect("first insert should create a row");

    let stored = repo
        .find_by_url("https://x.com/1")
        .await
        .unwrap()
        .expect("row should be found");

    assert_eq!(stored.id, id);
    assert_eq!(stored.job, new_job.job);
    assert_eq!(stored.ago_time, "3 days ago");
    assert_eq!(stored.fingerprint, new_job.fingerprint);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn second_insert_of_same_url_is_a_no_op() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let first = job("https://x.com/dup", "Backend Engineer", "Acme", "Jakarta");
    let second = job("https://x.com/dup", "Renamed", "Other", "Bandung");

    assert!(repo.insert(&first).await.unwrap().is_some());
    assert_eq!(repo.insert(&second).await.unwrap(), None);

    let stored = repo.find_by_url("https://x.com/dup").await.unwrap().unwrap();
    assert_eq!(stored.job.position, "Backend Engineer");
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn upsert_overwrites_mutable_fields_only() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let original = job("https://x.com/up", "Backend Engineer", "Acme", "Jakarta");
    let id = repo.upsert(&original).await.unwrap();

    let mut changed = job("https://x.com/up", "Staff Engineer", "Acme Group", "Bandung");
    changed.job.salary = "IDR 30,000,000 - 40,000,000".into();
    changed.job.description = Some("Different description".into());
    changed.job.date = original.job.date + Duration::days(2);
    changed.ago_time = "1 day ago".into();
    let again = repo.upsert(&changed).await.unwrap();

    assert_eq!(again, id);
    assert_eq!(repo.count().await.unwrap(), 1);

    let stored = repo.get(id).await.unwrap().unwrap();
    assert_eq!(stored.job.position, "Staff Engineer");
    assert_eq!(stored.job.company, "Acme Group");
    assert_eq!(stored.job.location, "Bandung");
    assert_eq!(stored.job.salary, "IDR 30,000,000 - 40,000,000");
    assert_eq!(stored.job.date, changed.job.date);
    assert_eq!(stored.ago_time, "1 day ago");
    // Not part of the refreshed field set.
    assert_eq!(stored.job.description.as_deref(), Some("Build services"));
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn list_filters_and_paginates_newest_first() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    for day in 0..25 {
        let mut new_job = job(
            &format!("https://x.com/list/{day}"),
            "Engineer",
            if day % 5 == 0 { "Kopi Nusantara" } else { "Acme" },
            "Jakarta",
        );
        new_job.job.date = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap() + Duration::days(day);
        repo.insert(&new_job).await.unwrap();
    }

    let first = repo.list(&JobQuery::default()).await.unwrap();
    assert_eq!(first.total, 25);
    assert_eq!(first.page, 1);
    assert_eq!(first.per_page, 20);
    assert_eq!(first.jobs.len(), 20);
    assert_eq!(first.last_page(), 2);
    assert_eq!(first.jobs[0].job.job_url, "https://x.com/list/24");

    let second = repo
        .list(&JobQuery {
            page: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second.jobs.len(), 5);
    assert_eq!(second.jobs[4].job.job_url, "https://x.com/list/0");

    let filtered = repo
        .list(&JobQuery {
            company: Some("nusantara".into()),
            location: Some("JAKARTA".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.total, 5);
    assert!(filtered.jobs.iter().all(|j| j.job.company == "Kopi Nusantara"));
}

#[tokio::test]
async fn get_unknown_id_is_none() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    assert!(repo.get(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn migrations_apply_over_existing_schema() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);

    db.migrate().await.unwrap();
    assert_eq!(db.job_repo().count().await.unwrap(), 0);
}
