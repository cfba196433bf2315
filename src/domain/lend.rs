use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Direction, DirectionTag, LedgerEntry, Mobile, UserId};

pub type LendTransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LendKind {
    /// Money handed to the borrower.
    Lend,
    /// Money the borrower gave back.
    Repayment,
}

impl LendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LendKind::Lend => "lend",
            LendKind::Repayment => "repayment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lend" => Some(LendKind::Lend),
            "repayment" => Some(LendKind::Repayment),
            _ => None,
        }
    }
}

impl DirectionTag for LendKind {
    fn direction(&self) -> Direction {
        match self {
            LendKind::Lend => Direction::Increase,
            LendKind::Repayment => Direction::Decrease,
        }
    }
}

impl std::fmt::Display for LendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Person-to-person lending. The borrower does not need an account: they are
/// identified by the mobile number the lender typed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendTransaction {
    pub id: LendTransactionId,
    pub lender_id: UserId,
    pub borrower_name: String,
    pub borrower_mobile: Mobile,
    pub amount_cents: Cents,
    pub kind: LendKind,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl LendTransaction {
    pub fn new(
        lender_id: UserId,
        borrower_name: String,
        borrower_mobile: Mobile,
        amount_cents: Cents,
        kind: LendKind,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        assert!(amount_cents > 0, "Lend amount must be positive");
        Self {
            id: Uuid::new_v4(),
            lender_id,
            borrower_name,
            borrower_mobile,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lend_kind_parsing() {
        assert_eq!(LendKind::from_str("lend"), Some(LendKind::Lend));
        assert_eq!(LendKind::from_str("Repayment"), Some(LendKind::Repayment));
        assert_eq!(LendKind::from_str("borrow"), None);
    }

    #[test]
    fn test_lend_direction_mapping() {
        assert_eq!(LendKind::Lend.direction(), Direction::Increase);
        assert_eq!(LendKind::Repayment.direction(), Direction::Decrease);
    }

    #[test]
    fn test_to_entry_keyed_by_borrower() {
        let lender = Uuid::new_v4();
        let mobile = Mobile::parse("9000000001").unwrap();
        let lend = LendTransaction::new(
            lender,
            "Ravi".into(),
            mobile.clone(),
            10000,
            LendKind::Lend,
            Utc::now(),
        );

        let entry = lend.to_entry(lender, lend.borrower_mobile.clone());
        assert_eq!(entry.counterparty, mobile);
        assert_eq!(entry.owner_id, lender);
        assert_eq!(entry.direction, Direction::Increase);
    }
}
