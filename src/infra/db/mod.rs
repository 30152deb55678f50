//! Postgres-backed repository implementations.

mod clause;
mod songs;
mod util;

pub use clause::{Clause, ClauseKind, build_clause};
pub use util::map_sqlx_error;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{
    Postgres, Transaction,
    postgres::{PgPool, PgPoolOptions},
    query,
};
use tracing::{error, warn};

use crate::application::repos::RepoError;

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    operation_timeout: Duration,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Deadline applied to each repository call, transaction included.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Stop handing out connections and wait for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<T, RepoError> {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    target = "songbook::db",
                    op,
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "database operation timed out"
                );
                Err(RepoError::Timeout)
            }
        }
    }
}

/// Roll back `tx`. A failed rollback leaves the connection in an unknown state and is fatal.
async fn rollback_or_abort(tx: Transaction<'_, Postgres>, op: &'static str) {
    if let Err(err) = tx.rollback().await {
        error!(
            target = "songbook::db",
            op,
            error = %err,
            "transaction rollback failed"
        );
        panic!("rollback of `{op}` failed: {err}");
    }
}
