use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Direction, DirectionTag, LedgerEntry, ShopId, UserId};

pub type TransactionId = Uuid;

/// What happened at the shop counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Goods taken on credit; the customer now owes more.
    Borrow,
    /// Money handed over to settle credit.
    Payment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Borrow => "borrow",
            TransactionKind::Payment => "payment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "borrow" => Some(TransactionKind::Borrow),
            "payment" => Some(TransactionKind::Payment),
            _ => None,
        }
    }
}

impl DirectionTag for TransactionKind {
    fn direction(&self) -> Direction {
        match self {
            TransactionKind::Borrow => Direction::Increase,
            TransactionKind::Payment => Direction::Decrease,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A credit movement between a customer (`user_id`) and a shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    /// Always positive; the kind carries the sign.
    pub amount_cents: Cents,
    pub kind: TransactionKind,
    pub description: String,
    /// When it happened at the counter
    pub transaction_date: DateTime<Utc>,
    /// When it was written down
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: UserId,
        shop_id: ShopId,
        amount_cents: Cents,
        kind: TransactionKind,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            user_id,
            shop_id,
            amount_cents,
            kind,
            description: String::new(),
            transaction_date,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// View this row as an entry of `owner_id`'s ledger against `counterparty`.
    pub fn to_entry<K>(&self, owner_id: UserId, counterparty: K) -> LedgerEntry<K> {
        LedgerEntry {
            id: self.id,
            owner_id,
            counterparty,
            amount_cents: self.amount_cents,
            direction: self.kind.direction(),
            description: self.description.clone(),
            occurred_at: self.transaction_date,
            recorded_at: self.created_at,
        }
    }
}
