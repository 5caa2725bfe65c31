use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use wtrk_sdk::objects::TransactionResponse;

/// A transaction observed for a tracked wallet, as produced by the pipeline.
///
/// The natural key is `(wallet_address, transaction_hash)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionRecord {
    pub wallet_address: String,
    pub contract_address: String,
    pub transaction_hash: String,
}

/// A persisted row of `transaction_records`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredTransactionRecord {
    pub id: i64,
    pub wallet_address: String,
    pub contract_address: String,
    pub transaction_hash: String,
    pub created_at: time::PrimitiveDateTime,
}

impl From<StoredTransactionRecord> for TransactionResponse {
    fn from(value: StoredTransactionRecord) -> Self {
        TransactionResponse {
            id: value.id,
            wallet_address: value.wallet_address,
            contract_address: value.contract_address,
            transaction_hash: value.transaction_hash,
            created_at: value.created_at.assume_utc().unix_timestamp(),
        }
    }
}

#[derive(Debug, Clone)]
/// Insert a record with no existence check.
///
/// The table carries no unique constraint, so the same natural key can be
/// stored more than once. Returns the number of rows inserted.
pub struct InsertTransactionRecord {
    pub record: TransactionRecord,
}

impl Processor<InsertTransactionRecord> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertTransactionRecord")]
    async fn process(&self, insert: InsertTransactionRecord) -> Result<u64, sqlx::Error> {
        let TransactionRecord {
            wallet_address,
            contract_address,
            transaction_hash,
        } = insert.record;
        let result = sqlx::query(
            r#"
            INSERT INTO transaction_records (wallet_address, contract_address, transaction_hash)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(wallet_address)
        .bind(contract_address)
        .bind(transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Insert a record unless one with the same `(wallet_address, transaction_hash)`
/// already exists.
///
/// The check and the insert run as a single statement. Returns the number of
/// rows inserted, `0` meaning the record was already present.
pub struct InsertTransactionRecordIfAbsent {
    pub record: TransactionRecord,
}

impl Processor<InsertTransactionRecordIfAbsent> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertTransactionRecordIfAbsent")]
    async fn process(&self, insert: InsertTransactionRecordIfAbsent) -> Result<u64, sqlx::Error> {
        let TransactionRecord {
            wallet_address,
            contract_address,
            transaction_hash,
        } = insert.record;
        let result = sqlx::query(
            r#"
            INSERT INTO transaction_records (wallet_address, contract_address, transaction_hash)
            SELECT $1::text, $2::text, $3::text
            WHERE NOT EXISTS (
                SELECT 1 FROM transaction_records
                WHERE wallet_address = $1 AND transaction_hash = $3
            )
            "#,
        )
        .bind(wallet_address)
        .bind(contract_address)
        .bind(transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// All records carrying the given transaction hash, oldest first.
pub struct GetTransactionRecordsByHash {
    pub transaction_hash: String,
}

impl Processor<GetTransactionRecordsByHash> for DatabaseProcessor {
    type Output = Vec<StoredTransactionRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetTransactionRecordsByHash")]
    async fn process(
        &self,
        query: GetTransactionRecordsByHash,
    ) -> Result<Vec<StoredTransactionRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, StoredTransactionRecord>(
            r#"
            SELECT id, wallet_address, contract_address, transaction_hash, created_at
            FROM transaction_records
            WHERE transaction_hash = $1
            ORDER BY id ASC
            "#,
        )
        .bind(query.transaction_hash)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
