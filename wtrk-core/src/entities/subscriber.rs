use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use wtrk_sdk::objects::SubscriberResponse;

/// A wallet registered for notifications.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Subscriber {
    pub wallet_address: String,
    pub email: String,
}

impl From<Subscriber> for SubscriberResponse {
    fn from(value: Subscriber) -> Self {
        SubscriberResponse {
            wallet_address: value.wallet_address,
            email: value.email,
        }
    }
}

#[derive(Debug, Clone)]
/// Exact-match lookup of a subscriber by wallet address.
pub struct GetSubscriberByWallet {
    pub wallet_address: String,
}

impl Processor<GetSubscriberByWallet> for DatabaseProcessor {
    type Output = Option<Subscriber>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSubscriberByWallet")]
    async fn process(
        &self,
        query: GetSubscriberByWallet,
    ) -> Result<Option<Subscriber>, sqlx::Error> {
        let subscriber = sqlx::query_as::<_, Subscriber>(
            r#"
            SELECT wallet_address, email
            FROM subscribers
            WHERE wallet_address = $1
            "#,
        )
        .bind(query.wallet_address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscriber)
    }
}

#[derive(Debug, Clone)]
/// Register a subscriber.
///
/// Returns `false` when the wallet is already registered; the existing row
/// is left untouched.
pub struct InsertSubscriber {
    pub wallet_address: String,
    pub email: String,
}

impl Processor<InsertSubscriber> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertSubscriber")]
    async fn process(&self, insert: InsertSubscriber) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscribers (wallet_address, email)
            VALUES ($1, $2)
            ON CONFLICT (wallet_address) DO NOTHING
            "#,
        )
        .bind(insert.wallet_address)
        .bind(insert.email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
