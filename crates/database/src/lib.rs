//! SQLite record store for parsed mobile-money transactions.
//!
//! This crate persists accepted [`extractor::ParsedTransaction`] records and
//! answers the listing, lookup and aggregate queries the dashboard and CLI
//! need, using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{transaction, Database, TransactionFilter};
//! use extractor::{BatchParser, Category, RawMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:momo_transactions.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Parse and store a batch
//!     let messages = vec![RawMessage::new(
//!         "You have received 5,000 RWF from John Doe (0788123456) at 2023-01-15 10:30:00",
//!     )];
//!     let batch = BatchParser::default().process(&messages)?;
//!     transaction::insert_transactions(db.pool(), &batch.accepted).await?;
//!
//!     // Query it back
//!     let filter = TransactionFilter::default().with_category(Category::Incoming);
//!     let rows = transaction::list_transactions(db.pool(), &filter).await?;
//!     println!("{} incoming transactions", rows.len());
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod transaction;

pub use error::{DatabaseError, Result};
pub use models::{StoredTransaction, Totals, TransactionFilter, TransactionType};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:momo_transactions.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Create the schema and seed the category reference table.
    ///
    /// Safe to call on every start; applied migrations are skipped.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
