//! Connection pool utilities

use crate::config::Config;
use crate::error::{JoblyError, JoblyResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Create a connection pool from a database URL.
///
/// ```ignore
/// let pool = jobly::create_pool("postgresql:///jobly")?;
/// let client = pool.get().await?;
/// ```
pub fn create_pool(database_url: &str) -> JoblyResult<Pool> {
    create_pool_with_config(database_url, 16)
}

/// Create a connection pool with a custom maximum size.
pub fn create_pool_with_config(database_url: &str, max_size: usize) -> JoblyResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| JoblyError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| JoblyError::Pool(e.to_string()))
}

/// Create a pool from application configuration.
pub fn create_pool_from(config: &Config) -> JoblyResult<Pool> {
    create_pool_with_config(&config.database_url, config.pool_size)
}
