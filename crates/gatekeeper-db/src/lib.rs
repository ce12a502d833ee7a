//! # Gatekeeper DB
//!
//! PostgreSQL connection pool and the Postgres-backed
//! [`IdentityStore`](gatekeeper_auth::IdentityStore).
//!
//! # Example
//!
//! ```ignore
//! use gatekeeper_db::{init_db_pool, PgIdentityStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = init_db_pool(&std::env::var("DATABASE_URL")?).await?;
//!     let identities = PgIdentityStore::new(pool);
//!     Ok(())
//! }
//! ```

pub mod identity;

pub use identity::PgIdentityStore;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

use tracing::info;

/// Connects a PostgreSQL pool to `database_url`.
///
/// # Errors
///
/// Returns the driver error if the URL is invalid or the server is unreachable.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("Database pool connected");

    Ok(pool)
}
