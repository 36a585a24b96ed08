//! # jobly
//!
//! Data access and authorization for a companies-and-jobs REST backend on
//! PostgreSQL.
//!
//! ## Features
//!
//! - **Partial updates**: turn an arbitrary subset of request fields into a
//!   parameterized `SET` list (`sql::partial_update`)
//! - **Dynamic filters**: turn search parameters into a parameterized `WHERE`
//!   clause (`sql::where_clause`)
//! - **Token auth**: soft bearer-token authentication plus composable gates
//!   (`auth`)
//! - **Transaction-friendly**: models accept any `GenericClient`
//!
//! ```ignore
//! use jobly::models::{Company, CompanyFilter};
//!
//! let ctx = jobly::auth::authenticate(&headers, &keys);
//! jobly::auth::ensure_admin(&ctx)?;
//!
//! let filter = CompanyFilter { name_like: Some("net".into()), ..Default::default() };
//! let companies = Company::find_all(&client, &filter).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod row;
pub mod sql;
pub mod value;

pub use auth::{Access, Claims, RequestContext, TokenKeys, authenticate};
pub use client::GenericClient;
pub use config::Config;
pub use error::{JoblyError, JoblyResult};
pub use row::{FromRow, RowExt};
pub use sql::{FieldSet, FilterSet, NameTable, SqlFragment, partial_update, where_clause};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_from, create_pool_with_config};
