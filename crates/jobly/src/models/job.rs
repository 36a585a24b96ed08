//! Jobs.

use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::row::{FromRow, RowExt};
use crate::sql::{FieldSet, FilterSet, NameTable, SqlFragment, partial_update, where_clause};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Search filters. `title` is matched case-insensitively as a substring.
pub const FILTERS: NameTable = NameTable::new(&[
    ("title", "title ILIKE"),
    ("minSalary", "salary >="),
    ("hasEquity", "equity >"),
])
.with_fuzzy_key("title");

const RETURNING: &str = "id, title, salary, equity, company_handle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Partial update. The id and owning company never change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    /// `true` keeps only jobs with non-zero equity; `false` is no filter.
    pub has_equity: Option<bool>,
}

impl JobFilter {
    pub fn to_filter_set(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        filters
            .insert_opt("title", self.title.clone())
            .insert_opt("minSalary", self.min_salary);
        if self.has_equity == Some(true) {
            filters.insert("hasEquity", 0);
        }
        filters
    }
}

fn find_all_sql(filter: &SqlFragment) -> String {
    format!("SELECT {RETURNING} FROM jobs {} ORDER BY title, company_handle", filter.sql())
}

fn update_sql(set: &SqlFragment) -> String {
    format!(
        "UPDATE jobs SET {} WHERE id = {} RETURNING {RETURNING}",
        set.sql(),
        set.next_placeholder()
    )
}

impl Job {
    /// Insert a job.
    ///
    /// Fails with `BadRequest` if the company already lists the same title.
    pub async fn create(conn: &impl GenericClient, data: &NewJob) -> JoblyResult<Job> {
        let duplicate = conn
            .query_opt(
                "SELECT id FROM jobs WHERE title = $1 AND company_handle = $2",
                &[&data.title, &data.company_handle],
            )
            .await?;
        if duplicate.is_some() {
            return Err(JoblyError::bad_request(format!(
                "Duplicate job: {} at {}",
                data.title, data.company_handle
            )));
        }

        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) RETURNING {RETURNING}"
        );
        let row = conn
            .query_one(
                &sql,
                &[&data.title, &data.salary, &data.equity, &data.company_handle],
            )
            .await?;
        Job::from_row(&row)
    }

    /// All jobs matching `filter`, ordered by title then company.
    pub async fn find_all(conn: &impl GenericClient, filter: &JobFilter) -> JoblyResult<Vec<Job>> {
        let clause = where_clause(&filter.to_filter_set(), &FILTERS)?;

        let rows = conn.query(&find_all_sql(&clause), &clause.params_ref()).await?;
        rows.iter().map(Job::from_row).collect()
    }

    pub(crate) async fn find_by_company(
        conn: &impl GenericClient,
        handle: &str,
    ) -> JoblyResult<Vec<Job>> {
        let sql = format!("SELECT {RETURNING} FROM jobs WHERE company_handle = $1 ORDER BY id");
        let rows = conn.query(&sql, &[&handle]).await?;
        rows.iter().map(Job::from_row).collect()
    }

    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<Job> {
        let sql = format!("SELECT {RETURNING} FROM jobs WHERE id = $1");
        let row = conn
            .query_opt(&sql, &[&id])
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))?;
        Job::from_row(&row)
    }

    /// Apply a partial update.
    pub async fn update(conn: &impl GenericClient, id: i32, patch: &JobPatch) -> JoblyResult<Job> {
        let set = partial_update(&FieldSet::from_serialize(patch)?, &NameTable::EMPTY)?;

        let mut params: Vec<&(dyn ToSql + Sync)> = set.params_ref();
        params.push(&id);
        let row = conn
            .query_opt(&update_sql(&set), &params)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))?;
        Job::from_row(&row)
    }

    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        let deleted = conn.execute("DELETE FROM jobs WHERE id = $1", &[&id]).await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No job: {id}")));
        }
        Ok(())
    }
}
