use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    LendKind, LendTransaction, Mobile, Shop, ShopId, Transaction, TransactionKind, User, UserId,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_LENDING};

const USER_COLUMNS: &str = "id, name, email, mobile, created_at";
const SHOP_COLUMNS: &str = "id, owner_id, name, description, mobile, address, created_at";
const TRANSACTION_COLUMNS: &str =
    "id, user_id, shop_id, amount_cents, kind, description, transaction_date, created_at";
const LEND_COLUMNS: &str = "id, lender_id, borrower_name, borrower_mobile, amount_cents, kind, description, transaction_date, created_at";

/// Row counts reported by the health check.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub users: i64,
    pub shops: i64,
    pub transactions: i64,
    pub lend_transactions: i64,
}

/// Repository for persisting and querying users, shops and both ledgers.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Every script is idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_LENDING)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close the pool, waiting for connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // User operations
    // ========================

    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, mobile, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.mobile.as_ref().map(Mobile::as_str))
        .bind(timestamp(&user.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;
        Ok(())
    }

    pub async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query("UPDATE users SET name = ?, email = ?, mobile = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.mobile.as_ref().map(Mobile::as_str))
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update user")?;
        Ok(())
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by email")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn get_user_by_mobile(&self, mobile: &Mobile) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE mobile = ?"))
            .bind(mobile.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by mobile")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Fetch several users at once, keyed by id. Unknown ids are skipped.
    pub async fn get_users(&self, ids: &[UserId]) -> Result<HashMap<UserId, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ({placeholders})");

        let mut sql_query = sqlx::query(&query);
        for id in ids {
            sql_query = sql_query.bind(id.to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch users")?;

        rows.iter()
            .map(|row| Self::row_to_user(row).map(|user| (user.id, user)))
            .collect()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let mobile_str: Option<String> = row.get("mobile");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            email: row.get("email"),
            mobile: mobile_str
                .map(|s| Mobile::parse(&s))
                .transpose()
                .context("Invalid stored mobile")?,
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Shop operations
    // ========================

    pub async fn save_shop(&self, shop: &Shop) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shops (id, owner_id, name, description, mobile, address, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(shop.id.to_string())
        .bind(shop.owner_id.to_string())
        .bind(&shop.name)
        .bind(&shop.description)
        .bind(shop.mobile.as_ref().map(Mobile::as_str))
        .bind(&shop.address)
        .bind(timestamp(&shop.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save shop")?;
        Ok(())
    }

    /// Update a shop's editable fields. Returns false if no shop owned by
    /// `shop.owner_id` has that id.
    pub async fn update_shop(&self, shop: &Shop) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE shops SET name = ?, description = ?, mobile = ?, address = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&shop.name)
        .bind(&shop.description)
        .bind(shop.mobile.as_ref().map(Mobile::as_str))
        .bind(&shop.address)
        .bind(shop.id.to_string())
        .bind(shop.owner_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update shop")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a shop together with its transactions.
    pub async fn delete_shop(&self, owner_id: UserId, shop_id: ShopId) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let deleted = sqlx::query("DELETE FROM shops WHERE id = ? AND owner_id = ?")
            .bind(shop_id.to_string())
            .bind(owner_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete shop")?
            .rows_affected();

        if deleted > 0 {
            sqlx::query("DELETE FROM transactions WHERE shop_id = ?")
                .bind(shop_id.to_string())
                .execute(&mut *tx)
                .await
                .context("Failed to delete shop transactions")?;
        }

        tx.commit().await.context("Failed to commit shop deletion")?;
        Ok(deleted > 0)
    }

    pub async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>> {
        let row = sqlx::query(&format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch shop")?;

        row.as_ref().map(Self::row_to_shop).transpose()
    }

    /// Fetch several shops at once, keyed by id. Unknown ids are skipped.
    pub async fn get_shops(&self, ids: &[ShopId]) -> Result<HashMap<ShopId, Shop>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id IN ({placeholders})");

        let mut sql_query = sqlx::query(&query);
        for id in ids {
            sql_query = sql_query.bind(id.to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch shops")?;

        rows.iter()
            .map(|row| Self::row_to_shop(row).map(|shop| (shop.id, shop)))
            .collect()
    }

    /// Shops owned by a user, newest first.
    pub async fn list_shops_for_owner(&self, owner_id: UserId) -> Result<Vec<Shop>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE owner_id = ? ORDER BY created_at DESC"
        ))
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list shops")?;

        rows.iter().map(Self::row_to_shop).collect()
    }

    fn row_to_shop(row: &sqlx::sqlite::SqliteRow) -> Result<Shop> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_id");
        let mobile_str: Option<String> = row.get("mobile");
        let created_at_str: String = row.get("created_at");

        Ok(Shop {
            id: Uuid::parse_str(&id_str).context("Invalid shop ID")?,
            owner_id: Uuid::parse_str(&owner_str).context("Invalid shop owner ID")?,
            name: row.get("name"),
            description: row.get("description"),
            mobile: mobile_str
                .map(|s| Mobile::parse(&s))
                .transpose()
                .context("Invalid stored shop mobile")?,
            address: row.get("address"),
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Shop transaction operations
    // ========================

    pub async fn save_transaction(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, shop_id, amount_cents, kind, description, transaction_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.user_id.to_string())
        .bind(transaction.shop_id.to_string())
        .bind(transaction.amount_cents)
        .bind(transaction.kind.as_str())
        .bind(&transaction.description)
        .bind(timestamp(&transaction.transaction_date))
        .bind(timestamp(&transaction.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;
        Ok(())
    }

    /// Transactions recorded by a customer, newest first.
    pub async fn list_transactions_for_user(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let mut query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = ? \
             ORDER BY transaction_date DESC, created_at DESC"
        );
        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Every transaction at any shop the user owns, whoever the customer is.
    pub async fn list_transactions_at_owned_shops(&self, owner_id: UserId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE shop_id IN (SELECT id FROM shops WHERE owner_id = ?) \
             ORDER BY transaction_date DESC, created_at DESC"
        ))
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions at owned shops")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Every transaction at one shop, whoever the customer is.
    pub async fn list_transactions_at_shop(&self, shop_id: ShopId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE shop_id = ? \
             ORDER BY transaction_date DESC, created_at DESC"
        ))
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list shop transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// One customer's transactions at the shops of `owner_id`.
    pub async fn list_customer_transactions_at_owned_shops(
        &self,
        owner_id: UserId,
        customer_id: UserId,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE user_id = ? AND shop_id IN (SELECT id FROM shops WHERE owner_id = ?) \
             ORDER BY transaction_date DESC, created_at DESC"
        ))
        .bind(customer_id.to_string())
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list customer transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// A customer's own transactions at one shop.
    pub async fn list_transactions_for_user_at_shop(
        &self,
        user_id: UserId,
        shop_id: ShopId,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = ? AND shop_id = ? \
             ORDER BY transaction_date DESC, created_at DESC"
        ))
        .bind(user_id.to_string())
        .bind(shop_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list shop transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let user_str: String = row.get("user_id");
        let shop_str: String = row.get("shop_id");
        let kind_str: String = row.get("kind");
        let date_str: String = row.get("transaction_date");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            user_id: Uuid::parse_str(&user_str).context("Invalid user ID")?,
            shop_id: Uuid::parse_str(&shop_str).context("Invalid shop ID")?,
            amount_cents: row.get("amount_cents"),
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            description: row.get("description"),
            transaction_date: parse_timestamp(&date_str)
                .context("Invalid transaction_date timestamp")?,
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Lending operations
    // ========================

    pub async fn save_lend_transaction(&self, lend: &LendTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO lend_transactions (id, lender_id, borrower_name, borrower_mobile, amount_cents, kind, description, transaction_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(lend.id.to_string())
        .bind(lend.lender_id.to_string())
        .bind(&lend.borrower_name)
        .bind(lend.borrower_mobile.as_str())
        .bind(lend.amount_cents)
        .bind(lend.kind.as_str())
        .bind(&lend.description)
        .bind(timestamp(&lend.transaction_date))
        .bind(timestamp(&lend.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save lend transaction")?;
        Ok(())
    }

    /// Lending recorded by a lender, newest first.
    pub async fn list_lend_transactions_for_lender(
        &self,
        lender_id: UserId,
        limit: Option<usize>,
    ) -> Result<Vec<LendTransaction>> {
        let mut query = format!(
            "SELECT {LEND_COLUMNS} FROM lend_transactions WHERE lender_id = ? \
             ORDER BY transaction_date DESC, created_at DESC"
        );
        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let rows = sqlx::query(&query)
            .bind(lender_id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list lend transactions")?;

        rows.iter().map(Self::row_to_lend).collect()
    }

    /// Everything anyone lent to a mobile number, newest first.
    pub async fn list_lend_transactions_for_borrower(
        &self,
        mobile: &Mobile,
    ) -> Result<Vec<LendTransaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEND_COLUMNS} FROM lend_transactions WHERE borrower_mobile = ? \
             ORDER BY transaction_date DESC, created_at DESC"
        ))
        .bind(mobile.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list lend transactions for borrower")?;

        debug!(mobile = %mobile, rows = rows.len(), "fetched borrower lending rows");
        rows.iter().map(Self::row_to_lend).collect()
    }

    fn row_to_lend(row: &sqlx::sqlite::SqliteRow) -> Result<LendTransaction> {
        let id_str: String = row.get("id");
        let lender_str: String = row.get("lender_id");
        let mobile_str: String = row.get("borrower_mobile");
        let kind_str: String = row.get("kind");
        let date_str: String = row.get("transaction_date");
        let created_at_str: String = row.get("created_at");

        Ok(LendTransaction {
            id: Uuid::parse_str(&id_str).context("Invalid lend transaction ID")?,
            lender_id: Uuid::parse_str(&lender_str).context("Invalid lender ID")?,
            borrower_name: row.get("borrower_name"),
            borrower_mobile: Mobile::parse(&mobile_str).context("Invalid borrower mobile")?,
            amount_cents: row.get("amount_cents"),
            kind: LendKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid lend kind: {}", kind_str))?,
            description: row.get("description"),
            transaction_date: parse_timestamp(&date_str)
                .context("Invalid transaction_date timestamp")?,
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Health
    // ========================

    pub async fn get_stats(&self) -> Result<StoreStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM shops) AS shops,
                (SELECT COUNT(*) FROM transactions) AS transactions,
                (SELECT COUNT(*) FROM lend_transactions) AS lend_transactions
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count rows")?;

        Ok(StoreStats {
            users: row.get("users"),
            shops: row.get("shops"),
            transactions: row.get("transactions"),
            lend_transactions: row.get("lend_transactions"),
        })
    }
}

/// Fixed-width UTC timestamps so that `ORDER BY` on the text column is
/// chronological.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
