//! Companies.

use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::models::job::Job;
use crate::row::{FromRow, RowExt};
use crate::sql::{FieldSet, FilterSet, NameTable, SqlFragment, partial_update, where_clause};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Request field names that differ from their column.
pub const COLUMNS: NameTable = NameTable::new(&[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
]);

/// Accepted search filters.
pub const FILTERS: NameTable = NameTable::new(&[
    ("minEmployees", "num_employees >="),
    ("maxEmployees", "num_employees <="),
    ("nameLike", "name ILIKE"),
]);

const RETURNING: &str = "handle, name, description, num_employees, logo_url";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A company together with its open jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

pub type NewCompany = Company;

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_employees: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Search filters from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_employees: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_employees: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_like: Option<String>,
}

impl CompanyFilter {
    /// Reject ranges the database would silently answer with nothing.
    pub fn validate(&self) -> JoblyResult<()> {
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees) {
            if min > max {
                return Err(JoblyError::bad_request(
                    "minEmployees cannot be larger than maxEmployees",
                ));
            }
        }
        Ok(())
    }

    /// Validate, then convert to a filter set in field order.
    pub fn to_filter_set(&self) -> JoblyResult<FilterSet> {
        self.validate()?;
        FilterSet::from_serialize(self)
    }
}

fn find_all_sql(filter: &SqlFragment) -> String {
    format!("SELECT {RETURNING} FROM companies {} ORDER BY name", filter.sql())
}

fn update_sql(set: &SqlFragment) -> String {
    format!(
        "UPDATE companies SET {} WHERE handle = {} RETURNING {RETURNING}",
        set.sql(),
        set.next_placeholder()
    )
}

impl Company {
    /// Insert a company.
    ///
    /// Fails with `BadRequest` if the handle is taken.
    pub async fn create(conn: &impl GenericClient, data: &NewCompany) -> JoblyResult<Company> {
        let duplicate = conn
            .query_opt("SELECT handle FROM companies WHERE handle = $1", &[&data.handle])
            .await?;
        if duplicate.is_some() {
            return Err(JoblyError::bad_request(format!(
                "Duplicate company: {}",
                data.handle
            )));
        }

        let sql = format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {RETURNING}"
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &data.handle,
                    &data.name,
                    &data.description,
                    &data.num_employees,
                    &data.logo_url,
                ],
            )
            .await?;
        Company::from_row(&row)
    }

    /// All companies matching `filter`, ordered by name.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: &CompanyFilter,
    ) -> JoblyResult<Vec<Company>> {
        let filters = filter.to_filter_set()?;
        let clause = where_clause(&filters, &FILTERS)?;

        let rows = conn.query(&find_all_sql(&clause), &clause.params_ref()).await?;
        rows.iter().map(Company::from_row).collect()
    }

    /// A company and its jobs.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let sql = format!("SELECT {RETURNING} FROM companies WHERE handle = $1");
        let row = conn
            .query_opt(&sql, &[&handle])
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;
        let company = Company::from_row(&row)?;
        let jobs = Job::find_by_company(conn, handle).await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update.
    ///
    /// Fails with `NoUpdatableFields` for an empty patch and `NotFound` for an
    /// unknown handle.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        patch: &CompanyPatch,
    ) -> JoblyResult<Company> {
        let set = partial_update(&FieldSet::from_serialize(patch)?, &COLUMNS)?;

        let mut params: Vec<&(dyn ToSql + Sync)> = set.params_ref();
        params.push(&handle);
        let row = conn
            .query_opt(&update_sql(&set), &params)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;
        Company::from_row(&row)
    }

    /// Delete a company (and, by cascade, its jobs).
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        let deleted = conn
            .execute("DELETE FROM companies WHERE handle = $1", &[&handle])
            .await?;
        if deleted == 0 {
            return Err(JoblyError::not_found(format!("No company: {handle}")));
        }
        Ok(())
    }
}
