//! Model tests against a live database.
//!
//! Set `DATABASE_URL` to run them; without it every test returns early.
//! Each test works in its own transaction on temporary tables, so nothing is
//! left behind.

use jobly::models::{
    Company, CompanyFilter, CompanyPatch, Job, JobFilter, JobPatch, NewCompany, NewJob,
};
use jobly::{JoblyError, JoblyResult};
use rust_decimal::Decimal;
use std::str::FromStr;

const SCHEMA: &str = r#"
CREATE TEMP TABLE companies (
    handle VARCHAR(25) PRIMARY KEY CHECK (handle = lower(handle)),
    name TEXT UNIQUE NOT NULL,
    num_employees INTEGER CHECK (num_employees >= 0),
    description TEXT NOT NULL,
    logo_url TEXT
) ON COMMIT DROP;

CREATE TEMP TABLE jobs (
    id SERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    salary INTEGER CHECK (salary >= 0),
    equity NUMERIC CHECK (equity <= 1.0),
    company_handle VARCHAR(25) NOT NULL REFERENCES companies ON DELETE CASCADE
) ON COMMIT DROP;

INSERT INTO companies (handle, name, num_employees, description, logo_url)
VALUES ('c1', 'C1', 1, 'Desc1', 'http://c1.img'),
       ('c2', 'C2', 2, 'Desc2', 'http://c2.img'),
       ('c3', 'C3', 3, 'Desc3', 'http://c3.img');

INSERT INTO jobs (title, salary, equity, company_handle)
VALUES ('j1', 100, 0.1, 'c1'),
       ('j2', 200, 0, 'c1'),
       ('j3', 300, NULL, 'c2');
"#;

async fn try_connect() -> Option<tokio_postgres::Client> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}

async fn seeded(client: &mut tokio_postgres::Client) -> tokio_postgres::Transaction<'_> {
    let tx = client.transaction().await.expect("begin");
    tx.batch_execute(SCHEMA).await.expect("schema");
    tx
}

fn handles(companies: &[Company]) -> Vec<&str> {
    companies.iter().map(|c| c.handle.as_str()).collect()
}

#[tokio::test]
async fn company_create_and_duplicate() -> JoblyResult<()> {
    let Some(mut client) = try_connect().await else {
        return Ok(());
    };
    let tx = seeded(&mut client).await;

    let new = NewCompany {
        handle: "new".into(),
        name: "New".into(),
        description: "New Description".into(),
        num_employees: Some(1),
        logo_url: Some("http://new.img".into()),
    };
    let company = Company::create(&tx, &new).await?;
    assert_eq!(company, new);

    let err = Company::create(&tx, &new).await.unwrap_err();
    assert!(matches!(err, JoblyError::BadRequest(ref m) if m == "Duplicate company: new"));
    Ok(())
}

#[tokio::test]
async fn company_find_all_filters() -> JoblyResult<()> {
    let Some(mut client) = try_connect().await else {
        return Ok(());
    };
    let tx = seeded(&mut client).await;

    let all = Company::find_all(&tx, &CompanyFilter::default()).await?;
    assert_eq!(handles(&all), vec!["c1", "c2", "c3"]);

    let range = CompanyFilter {
        min_employees: Some(2),
        max_employees: Some(3),
        ..Default::default()
    };
    assert_eq!(handles(&Company::find_all(&tx, &range).await?), vec!["c2", "c3"]);

    let name = CompanyFilter {
        name_like: Some("c1".into()),
        ..Default::default()
    };
    assert_eq!(handles(&Company::find_all(&tx, &name).await?), vec!["c1"]);

    let nothing = CompanyFilter {
        min_employees: Some(50),
        ..Default::default()
    };
    assert!(Company::find_all(&tx, &nothing).await?.is_empty());

    let inverted = CompanyFilter {
        min_employees: Some(3),
        max_employees: Some(1),
        ..Default::default()
    };
    let err = Company::find_all(&tx, &inverted).await.unwrap_err();
    assert!(matches!(err, JoblyError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn company_get_includes_jobs() -> JoblyResult<()> {
    let Some(mut client) = try_connect().await else {
        return Ok(());
    };
    let tx = seeded(&mut client).await;

    let detail = Company::get(&tx, "c1").await?;
    assert_eq!(detail.company.name, "C1");
    let titles: Vec<&str> = detail.jobs.iter().map(|j| j.title.as_str()).collect();
    assert_eq!(titles, vec!["j1", "j2"]);

    let lonely = Company::get(&tx, "c3").await?;
    assert!(lonely.jobs.is_empty());

    assert!(Company::get(&tx, "nope").await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn company_partial_update() -> JoblyResult<()> {
    let Some(mut client) = try_connect().await else {
        return Ok(());
    };
    let tx = seeded(&mut client).await;

    let patch = CompanyPatch {
        name: Some("New".into()),
        num_employees: Some(10),
        ..Default::default()
    };
    let company = Company::update(&tx, "c1", &patch).await?;
    assert_eq!(company.name, "New");
    assert_eq!(company.num_employees, Some(10));
    assert_eq!(company.description, "Desc1");
    assert_eq!(company.logo_url.as_deref(), Some("http://c1.img"));

    let err = Company::update(&tx, "nope", &patch).await.unwrap_err();
    assert!(err.is_not_found());

    let err = Company::update(&tx, "c1", &CompanyPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, JoblyError::NoUpdatableFields));
    Ok(())
}

#[tokio::test]
async fn company_remove_cascades() -> JoblyResult<()> {
    let Some(mut client) = try_connect().await else {
        return Ok(());
    };
    let tx = seeded(&mut client).await;

    Company::remove(&tx, "c1").await?;
    assert!(Company::get(&tx, "c1").await.unwrap_err().is_not_found());
    let jobs = Job::find_all(&tx, &JobFilter::default()).await?;
    assert!(jobs.iter().all(|j| j.company_handle != "c1"));

    assert!(Company::remove(&tx, "c1").await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn job_lifecycle() -> JoblyResult<()> {
    let Some(mut client) = try_connect().await else {
        return Ok(());
    };
    let tx = seeded(&mut client).await;

    let new = NewJob {
        title: "testJob".into(),
        salary: Some(200_000),
        equity: Some(Decimal::from_str("0.02").unwrap()),
        company_handle: "c1".into(),
    };
    let job = Job::create(&tx, &new).await?;
    assert_eq!(job.title, "testJob");
    assert_eq!(job.equity, new.equity);

    let err = Job::create(&tx, &new).await.unwrap_err();
    assert!(matches!(err, JoblyError::BadRequest(_)));

    assert_eq!(Job::get(&tx, job.id).await?, job);

    let patch = JobPatch {
        salary: Some(1),
        equity: Some(Decimal::from_str("0.5").unwrap()),
        ..Default::default()
    };
    let updated = Job::update(&tx, job.id, &patch).await?;
    assert_eq!(updated.salary, Some(1));
    assert_eq!(updated.equity, Some(Decimal::from_str("0.5").unwrap()));
    assert_eq!(updated.title, "testJob");

    Job::remove(&tx, job.id).await?;
    assert!(Job::get(&tx, job.id).await.unwrap_err().is_not_found());
    assert!(Job::update(&tx, job.id, &patch).await.unwrap_err().is_not_found());
    assert!(Job::remove(&tx, job.id).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn job_find_all_filters() -> JoblyResult<()> {
    let Some(mut client) = try_connect().await else {
        return Ok(());
    };
    let tx = seeded(&mut client).await;

    let titles = |jobs: Vec<Job>| jobs.into_iter().map(|j| j.title).collect::<Vec<_>>();

    let all = Job::find_all(&tx, &JobFilter::default()).await?;
    assert_eq!(titles(all), vec!["j1", "j2", "j3"]);

    let equity = JobFilter {
        has_equity: Some(true),
        ..Default::default()
    };
    assert_eq!(titles(Job::find_all(&tx, &equity).await?), vec!["j1"]);

    let salary = JobFilter {
        min_salary: Some(150),
        title: Some("J".into()),
        ..Default::default()
    };
    assert_eq!(titles(Job::find_all(&tx, &salary).await?), vec!["j2", "j3"]);
    Ok(())
}
