//! Stable transaction ordering for deterministic replay.

use crate::domain::Transaction;

/// Stable ordering key for transactions.
///
/// Ordering: status_updated -> transaction_id. The platform does not order
/// transactions that complete in the same millisecond, so the id breaks ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransactionOrderingKey {
    /// Completion time in milliseconds (primary sort).
    pub completed_ms: i64,
    /// Transaction id (secondary sort).
    pub transaction_id: String,
}

impl TransactionOrderingKey {
    pub fn from_transaction(tx: &Transaction) -> Self {
        TransactionOrderingKey {
            completed_ms: tx.status_updated.as_ms(),
            transaction_id: tx.transaction_id.clone(),
        }
    }
}

/// Sort transactions deterministically in completion order.
pub fn sort_transactions_deterministic(transactions: &mut [Transaction]) {
    transactions.sort_by_cached_key(TransactionOrderingKey::from_transaction);
}
