pub mod subscriber;
pub mod transaction_record;

pub use subscriber::Subscriber;
pub use transaction_record::{StoredTransactionRecord, TransactionRecord};
