use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AggregateSummary, Cents, CounterpartyBalance, LendTransaction, Mobile, MonthlyActivity, Shop,
    ShopId, Transaction, User, UserId,
};

/// A shop together with the balance of every entry recorded at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopWithBalance {
    #[serde(flatten)]
    pub shop: Shop,
    pub total_balance: Cents,
}

/// A transaction annotated with the name of the shop it happened at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithShop {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub shop_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopBalance {
    pub shop_id: ShopId,
    pub name: String,
    pub balance: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub total_balance: Cents,
    pub monthly_spending: Vec<MonthlyActivity>,
    pub top_shops: Vec<ShopBalance>,
}

/// Who owes the lender what, grouped by borrower mobile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowersReport {
    pub borrowers: Vec<CounterpartyBalance<Mobile>>,
    pub summary: AggregateSummary,
}

/// A lender as seen by a borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderBalance {
    pub lender_mobile: Option<Mobile>,
    #[serde(flatten)]
    pub balance: CounterpartyBalance<UserId>,
}

/// Everything lent to one mobile number, grouped by lender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowingReport {
    pub borrower_name: String,
    pub borrower_mobile: Mobile,
    pub lenders: Vec<LenderBalance>,
    pub summary: AggregateSummary,
}

/// A customer's balances at each of the looking-up owner's shops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerLookupReport {
    pub borrower: User,
    pub shop_balances: Vec<CounterpartyBalance<ShopId>>,
    pub summary: AggregateSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerBalance {
    pub customer_mobile: Option<Mobile>,
    #[serde(flatten)]
    pub balance: CounterpartyBalance<UserId>,
}

/// Customers of all shops owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomersReport {
    pub customers: Vec<CustomerBalance>,
    pub summary: AggregateSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub checked_at: DateTime<Utc>,
    pub users: i64,
    pub shops: i64,
    pub transactions: i64,
    pub lend_transactions: i64,
}

/// Everything one user owns, for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub user: User,
    pub shops: Vec<Shop>,
    pub transactions: Vec<Transaction>,
    pub lend_transactions: Vec<LendTransaction>,
}
