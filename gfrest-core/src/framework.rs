use sqlx::PgPool;

/// Runs entity queries against the connection pool.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
