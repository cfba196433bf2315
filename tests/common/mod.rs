// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use creditkeep::application::{CreditService, NewLend};
use creditkeep::domain::{Cents, LendKind, Shop, TransactionKind, User};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(CreditService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = CreditService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Register a user whose email is derived from the name.
pub async fn register(service: &CreditService, name: &str, mobile: Option<&str>) -> Result<User> {
    let email = format!("{}@example.com", name.to_lowercase());
    Ok(service.register_user(name.into(), email, mobile).await?)
}

pub async fn shop(service: &CreditService, owner: &User, name: &str) -> Result<Shop> {
    Ok(service.create_shop(owner, name.into(), None).await?)
}

pub async fn borrow(
    service: &CreditService,
    user: &User,
    shop: &Shop,
    amount: Cents,
    date: &str,
) -> Result<()> {
    service
        .record_transaction(
            user,
            shop.id,
            amount,
            TransactionKind::Borrow,
            None,
            Some(parse_date(date)),
        )
        .await?;
    Ok(())
}

pub async fn pay(
    service: &CreditService,
    user: &User,
    shop: &Shop,
    amount: Cents,
    date: &str,
) -> Result<()> {
    service
        .record_transaction(
            user,
            shop.id,
            amount,
            TransactionKind::Payment,
            None,
            Some(parse_date(date)),
        )
        .await?;
    Ok(())
}

pub async fn lend(
    service: &CreditService,
    lender: &User,
    name: &str,
    mobile: &str,
    kind: LendKind,
    amount: Cents,
    date: &str,
) -> Result<()> {
    service
        .record_lend(
            lender,
            NewLend {
                borrower_name: name.into(),
                borrower_mobile: mobile.into(),
                amount_cents: amount,
                kind,
                description: None,
                date: Some(parse_date(date)),
            },
        )
        .await?;
    Ok(())
}
