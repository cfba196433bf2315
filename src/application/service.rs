use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    AggregateOptions, Cents, LendKind, LendTransaction, MAX_AMOUNT_CENTS, Mobile, ParseAmountError,
    Shop, ShopId,
    Transaction, TransactionKind, User, UserId, aggregate, aggregate_named, monthly_activity,
};
use crate::storage::Repository;

use super::{
    AnalyticsReport, AppError, BorrowersReport, BorrowingReport, CustomerBalance,
    CustomerLookupReport, CustomersReport, HealthReport, LenderBalance, ShopBalance,
    ShopWithBalance, TransactionWithShop,
};

/// Page size used when a listing does not ask for one.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Analytics look this far back for the monthly breakdown.
const ANALYTICS_WINDOW_DAYS: i64 = 183;

/// How many shops the analytics "top shops" list keeps.
const TOP_SHOPS: usize = 5;

/// Application service providing the ledger's use cases.
/// Every operation takes the acting user explicitly; authentication happens
/// in front of this layer.
pub struct CreditService {
    repo: Repository,
}

/// Editable shop fields.
pub struct ShopUpdate {
    pub name: String,
    pub description: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
}

/// Input for recording a lend or a repayment.
pub struct NewLend {
    pub borrower_name: String,
    pub borrower_mobile: String,
    pub amount_cents: Cents,
    pub kind: LendKind,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl CreditService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "database ready");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub async fn close(&self) {
        self.repo.close().await;
    }

    // ========================
    // User operations
    // ========================

    /// Register a new account. Email must be unused; so must the mobile
    /// number when one is given.
    pub async fn register_user(
        &self,
        name: String,
        email: String,
        mobile: Option<&str>,
    ) -> Result<User, AppError> {
        let (name, email) = required_identity(name, email)?;
        let mobile = parse_optional_mobile(mobile)?;

        if self.repo.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists(email));
        }
        if let Some(mobile) = &mobile {
            if self.repo.get_user_by_mobile(mobile).await?.is_some() {
                return Err(AppError::MobileAlreadyRegistered(mobile.to_string()));
            }
        }

        let mut user = User::new(name, email);
        if let Some(mobile) = mobile {
            user = user.with_mobile(mobile);
        }

        self.repo.save_user(&user).await?;
        info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    pub async fn get_user_by_mobile(&self, mobile: &str) -> Result<User, AppError> {
        let mobile = Mobile::parse(mobile)?;
        self.repo
            .get_user_by_mobile(&mobile)
            .await?
            .ok_or_else(|| AppError::UserNotFound(mobile.to_string()))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        self.repo
            .get_user_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))
    }

    /// Replace name, email and mobile. Passing no mobile clears it.
    pub async fn update_profile(
        &self,
        user: &User,
        name: String,
        email: String,
        mobile: Option<&str>,
    ) -> Result<User, AppError> {
        let (name, email) = required_identity(name, email)?;
        let mobile = parse_optional_mobile(mobile)?;

        if let Some(other) = self.repo.get_user_by_email(&email).await? {
            if other.id != user.id {
                return Err(AppError::UserAlreadyExists(email));
            }
        }
        if let Some(mobile) = &mobile {
            let taken = self.repo.get_user_by_mobile(mobile).await?;
            if taken.is_some_and(|other| other.id != user.id) {
                return Err(AppError::MobileAlreadyRegistered(mobile.to_string()));
            }
        }

        let updated = User {
            name,
            email,
            mobile,
            ..user.clone()
        };
        self.repo.update_user(&updated).await?;
        info!(user_id = %updated.id, "updated profile");
        Ok(updated)
    }

    // ========================
    // Shop operations
    // ========================

    pub async fn create_shop(
        &self,
        owner: &User,
        name: String,
        description: Option<String>,
    ) -> Result<Shop, AppError> {
        let name = required("Shop name", name)?;

        let mut shop = Shop::new(owner.id, name);
        if let Some(desc) = non_empty(description) {
            shop = shop.with_description(desc);
        }

        self.repo.save_shop(&shop).await?;
        info!(shop_id = %shop.id, owner_id = %owner.id, "created shop");
        Ok(shop)
    }

    /// Owned shops, newest first, each with the balance of every entry
    /// recorded against it.
    pub async fn list_shops(&self, owner: &User) -> Result<Vec<ShopWithBalance>, AppError> {
        let shops = self.repo.list_shops_for_owner(owner.id).await?;
        let entries = self
            .repo
            .list_transactions_at_owned_shops(owner.id)
            .await?
            .into_iter()
            .map(|tx| tx.to_entry(owner.id, tx.shop_id));

        let balances = aggregate(entries, &AggregateOptions::default());
        debug!(
            shops = shops.len(),
            with_activity = balances.summary.counterparty_count,
            "aggregated shop balances"
        );

        Ok(shops
            .into_iter()
            .map(|shop| {
                let total_balance = balances
                    .balance_for(&shop.id)
                    .map_or(0, |balance| balance.outstanding);
                ShopWithBalance {
                    shop,
                    total_balance,
                }
            })
            .collect())
    }

    pub async fn get_shop(&self, owner: &User, shop_id: ShopId) -> Result<ShopWithBalance, AppError> {
        let shop = self.owned_shop(owner, shop_id).await?;
        let entries = self
            .repo
            .list_transactions_at_shop(shop.id)
            .await?
            .into_iter()
            .map(|tx| tx.to_entry(owner.id, tx.shop_id));

        let aggregation = aggregate(entries, &AggregateOptions::default());

        Ok(ShopWithBalance {
            shop,
            total_balance: aggregation.summary.total_outstanding,
        })
    }

    pub async fn update_shop(
        &self,
        owner: &User,
        shop_id: ShopId,
        update: ShopUpdate,
    ) -> Result<Shop, AppError> {
        let name = required("Shop name", update.name)?;
        let mobile = parse_optional_mobile(update.mobile.as_deref())?;
        let shop = self.owned_shop(owner, shop_id).await?;

        let updated = Shop {
            name,
            description: non_empty(update.description),
            mobile,
            address: non_empty(update.address),
            ..shop
        };

        if !self.repo.update_shop(&updated).await? {
            return Err(AppError::ShopNotFound(shop_id.to_string()));
        }
        info!(shop_id = %shop_id, "updated shop");
        Ok(updated)
    }

    /// Delete a shop and every transaction recorded against it.
    pub async fn delete_shop(&self, owner: &User, shop_id: ShopId) -> Result<(), AppError> {
        if !self.repo.delete_shop(owner.id, shop_id).await? {
            return Err(AppError::ShopNotFound(shop_id.to_string()));
        }
        info!(shop_id = %shop_id, "deleted shop");
        Ok(())
    }

    /// The owner's own transactions at one of their shops, newest first.
    pub async fn shop_transactions(
        &self,
        owner: &User,
        shop_id: ShopId,
    ) -> Result<Vec<Transaction>, AppError> {
        let shop = self.owned_shop(owner, shop_id).await?;
        Ok(self
            .repo
            .list_transactions_for_user_at_shop(owner.id, shop.id)
            .await?)
    }

    /// All shops owned by the user, without balances.
    pub async fn list_owned_shops(&self, owner: &User) -> Result<Vec<Shop>, AppError> {
        Ok(self.repo.list_shops_for_owner(owner.id).await?)
    }

    async fn owned_shop(&self, owner: &User, shop_id: ShopId) -> Result<Shop, AppError> {
        match self.repo.get_shop(shop_id).await? {
            Some(shop) if shop.is_owned_by(owner.id) => Ok(shop),
            _ => Err(AppError::ShopNotFound(shop_id.to_string())),
        }
    }

    // ========================
    // Shop transaction operations
    // ========================

    /// Record a borrow or a payment at one of the user's shops.
    pub async fn record_transaction(
        &self,
        user: &User,
        shop_id: ShopId,
        amount_cents: Cents,
        kind: TransactionKind,
        description: Option<String>,
        date: Option<DateTime<Utc>>,
    ) -> Result<TransactionWithShop, AppError> {
        ensure_positive(amount_cents)?;
        let shop = self.owned_shop(user, shop_id).await?;

        let mut transaction = Transaction::new(
            user.id,
            shop.id,
            amount_cents,
            kind,
            date.unwrap_or_else(Utc::now),
        );
        if let Some(desc) = non_empty(description) {
            transaction = transaction.with_description(desc);
        }

        self.repo.save_transaction(&transaction).await?;
        info!(
            transaction_id = %transaction.id,
            shop_id = %shop.id,
            kind = %kind,
            amount_cents,
            "recorded transaction"
        );
        Ok(TransactionWithShop {
            transaction,
            shop_name: shop.name,
        })
    }

    /// The user's most recent transactions with shop names.
    pub async fn list_transactions(
        &self,
        user: &User,
        limit: Option<usize>,
    ) -> Result<Vec<TransactionWithShop>, AppError> {
        let transactions = self
            .repo
            .list_transactions_for_user(user.id, Some(limit.unwrap_or(DEFAULT_LIST_LIMIT)))
            .await?;
        self.with_shop_names(transactions).await
    }

    /// Every transaction the user recorded, for export.
    pub async fn list_all_transactions(
        &self,
        user: &User,
    ) -> Result<Vec<TransactionWithShop>, AppError> {
        let transactions = self.repo.list_transactions_for_user(user.id, None).await?;
        self.with_shop_names(transactions).await
    }

    async fn with_shop_names(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<TransactionWithShop>, AppError> {
        // payments marked by an owner sit at shops the customer does not own
        let mut shop_ids: Vec<ShopId> = transactions.iter().map(|tx| tx.shop_id).collect();
        shop_ids.sort();
        shop_ids.dedup();
        let shops = self.repo.get_shops(&shop_ids).await?;

        Ok(transactions
            .into_iter()
            .map(|transaction| TransactionWithShop {
                shop_name: shops
                    .get(&transaction.shop_id)
                    .map(|shop| shop.name.clone())
                    .unwrap_or_default(),
                transaction,
            })
            .collect())
    }

    /// A shop owner records a payment received from a customer.
    pub async fn mark_payment(
        &self,
        owner: &User,
        borrower_id: UserId,
        shop_id: ShopId,
        amount_cents: Cents,
        description: Option<String>,
    ) -> Result<Transaction, AppError> {
        ensure_positive(amount_cents)?;
        let shop = self.owned_shop(owner, shop_id).await?;
        let borrower = self.get_user(borrower_id).await?;

        let description = non_empty(description)
            .unwrap_or_else(|| format!("Payment received by {}", shop.name));
        let transaction = Transaction::new(
            borrower.id,
            shop.id,
            amount_cents,
            TransactionKind::Payment,
            Utc::now(),
        )
        .with_description(description);

        self.repo.save_transaction(&transaction).await?;
        info!(
            transaction_id = %transaction.id,
            borrower_id = %borrower.id,
            shop_id = %shop.id,
            amount_cents,
            "marked payment"
        );
        Ok(transaction)
    }

    // ========================
    // Analytics
    // ========================

    /// Total balance, six months of borrowed/paid totals and the shops with
    /// the most outstanding credit.
    pub async fn analytics(&self, user: &User, now: DateTime<Utc>) -> Result<AnalyticsReport, AppError> {
        let own_entries: Vec<_> = self
            .repo
            .list_transactions_for_user(user.id, None)
            .await?
            .iter()
            .map(|tx| tx.to_entry(user.id, tx.shop_id))
            .collect();

        let since = now - Duration::days(ANALYTICS_WINDOW_DAYS);
        let monthly_spending = monthly_activity(&own_entries, since);
        let total_balance = aggregate(own_entries, &AggregateOptions::default())
            .summary
            .total_outstanding;

        let shops: HashMap<ShopId, String> = self
            .repo
            .list_shops_for_owner(user.id)
            .await?
            .into_iter()
            .map(|shop| (shop.id, shop.name))
            .collect();
        let shop_entries = self
            .repo
            .list_transactions_at_owned_shops(user.id)
            .await?
            .into_iter()
            .map(|tx| tx.to_entry(user.id, tx.shop_id));

        let top = aggregate_named(
            shop_entries,
            &AggregateOptions::by_outstanding()
                .only_positive()
                .with_limit(TOP_SHOPS),
            |shop_id| shops.get(shop_id).cloned(),
        );

        Ok(AnalyticsReport {
            generated_at: now,
            total_balance,
            monthly_spending,
            top_shops: top
                .balances
                .into_iter()
                .map(|balance| ShopBalance {
                    shop_id: balance.counterparty,
                    name: balance.display_name,
                    balance: balance.outstanding,
                })
                .collect(),
        })
    }

    // ========================
    // Lending operations
    // ========================

    pub async fn record_lend(&self, lender: &User, lend: NewLend) -> Result<LendTransaction, AppError> {
        ensure_positive(lend.amount_cents)?;
        let borrower_name = required("Borrower name", lend.borrower_name)?;
        let borrower_mobile = Mobile::parse(&lend.borrower_mobile)?;

        let mut transaction = LendTransaction::new(
            lender.id,
            borrower_name,
            borrower_mobile,
            lend.amount_cents,
            lend.kind,
            lend.date.unwrap_or_else(Utc::now),
        );
        if let Some(desc) = non_empty(lend.description) {
            transaction = transaction.with_description(desc);
        }

        self.repo.save_lend_transaction(&transaction).await?;
        info!(
            lend_id = %transaction.id,
            kind = %transaction.kind,
            amount_cents = transaction.amount_cents,
            "recorded lending"
        );
        Ok(transaction)
    }

    pub async fn list_lend_transactions(
        &self,
        lender: &User,
        limit: Option<usize>,
    ) -> Result<Vec<LendTransaction>, AppError> {
        Ok(self
            .repo
            .list_lend_transactions_for_lender(lender.id, Some(limit.unwrap_or(DEFAULT_LIST_LIMIT)))
            .await?)
    }

    /// Every lend/repayment the user recorded, for export.
    pub async fn list_all_lend_transactions(
        &self,
        lender: &User,
    ) -> Result<Vec<LendTransaction>, AppError> {
        Ok(self
            .repo
            .list_lend_transactions_for_lender(lender.id, None)
            .await?)
    }

    /// People the user lent money to, highest outstanding first.
    pub async fn my_borrowers(&self, lender: &User) -> Result<BorrowersReport, AppError> {
        let rows = self
            .repo
            .list_lend_transactions_for_lender(lender.id, None)
            .await?;

        // rows are newest first, so the first name seen is the latest one typed
        let mut names: HashMap<Mobile, String> = HashMap::new();
        for row in &rows {
            names
                .entry(row.borrower_mobile.clone())
                .or_insert_with(|| row.borrower_name.clone());
        }

        let entries = rows
            .iter()
            .map(|row| row.to_entry(lender.id, row.borrower_mobile.clone()));
        let aggregation = aggregate_named(entries, &AggregateOptions::by_outstanding(), |mobile| {
            names.get(mobile).cloned()
        });

        Ok(BorrowersReport {
            borrowers: aggregation.balances,
            summary: aggregation.summary,
        })
    }

    /// What the user owes, grouped by lender, found through their mobile.
    pub async fn my_borrowing(&self, user: &User) -> Result<BorrowingReport, AppError> {
        let mobile = user
            .mobile
            .clone()
            .ok_or_else(|| AppError::MobileRequired(user.name.clone()))?;
        let rows = self.repo.list_lend_transactions_for_borrower(&mobile).await?;

        self.borrowing_report(user.id, user.name.clone(), mobile, rows)
            .await
    }

    /// Public lookup of everything lent to a mobile number.
    pub async fn borrower_details(&self, mobile: &str) -> Result<BorrowingReport, AppError> {
        let mobile = Mobile::parse(mobile)?;
        let rows = self.repo.list_lend_transactions_for_borrower(&mobile).await?;

        let Some(latest) = rows.first() else {
            warn!(mobile = %mobile, "no borrowing records");
            return Err(AppError::NoBorrowingRecords(mobile.to_string()));
        };
        let borrower_name = latest.borrower_name.clone();

        // A single viewer keeps the aggregation single-owner: the registered
        // borrower if there is one, otherwise an anonymous viewer.
        let viewer = self
            .repo
            .get_user_by_mobile(&mobile)
            .await?
            .map_or_else(Uuid::nil, |user| user.id);

        self.borrowing_report(viewer, borrower_name, mobile, rows)
            .await
    }

    async fn borrowing_report(
        &self,
        viewer: UserId,
        borrower_name: String,
        borrower_mobile: Mobile,
        rows: Vec<LendTransaction>,
    ) -> Result<BorrowingReport, AppError> {
        let mut lender_ids: Vec<UserId> = rows.iter().map(|row| row.lender_id).collect();
        lender_ids.sort();
        lender_ids.dedup();
        let lenders = self.repo.get_users(&lender_ids).await?;

        let entries = rows.iter().map(|row| row.to_entry(viewer, row.lender_id));
        let aggregation = aggregate_named(entries, &AggregateOptions::by_outstanding(), |id| {
            lenders.get(id).map(|lender| lender.name.clone())
        });

        Ok(BorrowingReport {
            borrower_name,
            borrower_mobile,
            lenders: aggregation
                .balances
                .into_iter()
                .map(|balance| LenderBalance {
                    lender_mobile: lenders
                        .get(&balance.counterparty)
                        .and_then(|lender| lender.mobile.clone()),
                    balance,
                })
                .collect(),
            summary: aggregation.summary,
        })
    }

    /// A shop owner looks up what a customer owes at each of their shops.
    pub async fn shop_borrower_lookup(
        &self,
        owner: &User,
        mobile: &str,
    ) -> Result<CustomerLookupReport, AppError> {
        let mobile = Mobile::parse(mobile)?;
        let borrower = self
            .repo
            .get_user_by_mobile(&mobile)
            .await?
            .ok_or_else(|| AppError::UserNotFound(mobile.to_string()))?;

        let shops: HashMap<ShopId, String> = self
            .repo
            .list_shops_for_owner(owner.id)
            .await?
            .into_iter()
            .map(|shop| (shop.id, shop.name))
            .collect();
        if shops.is_empty() {
            return Err(AppError::NoShops);
        }

        let rows = self
            .repo
            .list_customer_transactions_at_owned_shops(owner.id, borrower.id)
            .await?;
        debug!(
            owner_id = %owner.id,
            borrower_id = %borrower.id,
            rows = rows.len(),
            "looked up customer"
        );

        let entries = rows.iter().map(|tx| tx.to_entry(owner.id, tx.shop_id));
        let aggregation = aggregate_named(entries, &AggregateOptions::default(), |shop_id| {
            shops.get(shop_id).cloned()
        });

        Ok(CustomerLookupReport {
            borrower,
            shop_balances: aggregation.balances,
            summary: aggregation.summary,
        })
    }

    /// Customers of all the user's shops, highest outstanding first.
    pub async fn my_customers(&self, owner: &User) -> Result<CustomersReport, AppError> {
        if owner.mobile.is_none() {
            return Err(AppError::MobileRequired(owner.name.clone()));
        }
        let rows = self.repo.list_transactions_at_owned_shops(owner.id).await?;

        let mut customer_ids: Vec<UserId> = rows.iter().map(|tx| tx.user_id).collect();
        customer_ids.sort();
        customer_ids.dedup();
        let customers = self.repo.get_users(&customer_ids).await?;

        let entries = rows.iter().map(|tx| tx.to_entry(owner.id, tx.user_id));
        let aggregation = aggregate_named(entries, &AggregateOptions::by_outstanding(), |id| {
            customers.get(id).map(|customer| customer.name.clone())
        });

        Ok(CustomersReport {
            customers: aggregation
                .balances
                .into_iter()
                .map(|balance| CustomerBalance {
                    customer_mobile: customers
                        .get(&balance.counterparty)
                        .and_then(|customer| customer.mobile.clone()),
                    balance,
                })
                .collect(),
            summary: aggregation.summary,
        })
    }

    // ========================
    // Health
    // ========================

    pub async fn health(&self) -> Result<HealthReport, AppError> {
        let stats = self.repo.get_stats().await?;
        Ok(HealthReport {
            status: "healthy".to_string(),
            checked_at: Utc::now(),
            users: stats.users,
            shops: stats.shops,
            transactions: stats.transactions,
            lend_transactions: stats.lend_transactions,
        })
    }
}

fn ensure_positive(amount_cents: Cents) -> Result<(), AppError> {
    match amount_cents {
        a if a > MAX_AMOUNT_CENTS => Err(ParseAmountError::Overflow.into()),
        a if a > 0 => Ok(()),
        0 => Err(ParseAmountError::Zero.into()),
        _ => Err(ParseAmountError::Signed.into()),
    }
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn required_identity(name: String, email: String) -> Result<(String, String), AppError> {
    let name = required("Name", name)?;
    let email = required("Email", email)?;
    if !email.contains('@') {
        return Err(AppError::InvalidInput(format!("not an email address: {email}")));
    }
    Ok((name, email))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_optional_mobile(mobile: Option<&str>) -> Result<Option<Mobile>, AppError> {
    match mobile.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => Ok(Some(Mobile::parse(m)?)),
        None => Ok(None),
    }
}
