//! Data access for companies and jobs.
//!
//! Each model owns its SQL and the [`NameTable`](crate::sql::NameTable)s that
//! translate request field names into columns and comparison expressions.

pub mod company;
pub mod job;

pub use company::{Company, CompanyDetail, CompanyFilter, CompanyPatch, NewCompany};
pub use job::{Job, JobFilter, JobPatch, NewJob};
