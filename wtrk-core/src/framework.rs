use sqlx::PgPool;

/// Runs entity queries against the shared connection pool.
///
/// Each query is a plain struct with a `kanau::processor::Processor` impl
/// on this type, see `crate::entities`.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
