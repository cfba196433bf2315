use anyhow::Result;
use creditkeep::application::{AppError, ShopUpdate};
use creditkeep::domain::{MAX_AMOUNT_CENTS, ParseAmountError, TransactionKind};

mod common;
use common::{borrow, pay, parse_date, register, shop, test_service};

#[tokio::test]
async fn test_shop_balances() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", Some("9876543210")).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;
    let dairy = shop(&service, &asha, "Dairy").await?;
    shop(&service, &asha, "Tailor").await?;

    borrow(&service, &asha, &kirana, 500_00, "2024-01-10").await?;
    pay(&service, &asha, &kirana, 200_00, "2024-01-20").await?;
    borrow(&service, &asha, &dairy, 75_50, "2024-01-12").await?;

    let shops = service.list_shops(&asha).await?;
    assert_eq!(shops.len(), 3);

    let balance_of = |name: &str| {
        shops
            .iter()
            .find(|s| s.shop.name == name)
            .map(|s| s.total_balance)
            .unwrap()
    };
    assert_eq!(balance_of("Kirana"), 300_00);
    assert_eq!(balance_of("Dairy"), 75_50);
    assert_eq!(balance_of("Tailor"), 0);

    let one = service.get_shop(&asha, kirana.id).await?;
    assert_eq!(one.shop.name, "Kirana");
    assert_eq!(one.total_balance, 300_00);

    Ok(())
}

#[tokio::test]
async fn test_shops_are_private_to_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    let ravi = register(&service, "Ravi", None).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;

    assert!(service.list_shops(&ravi).await?.is_empty());

    let result = service.get_shop(&ravi, kirana.id).await;
    assert!(matches!(result, Err(AppError::ShopNotFound(_))));

    let result = service
        .record_transaction(&ravi, kirana.id, 10_00, TransactionKind::Borrow, None, None)
        .await;
    assert!(matches!(result, Err(AppError::ShopNotFound(_))));

    let result = service.delete_shop(&ravi, kirana.id).await;
    assert!(matches!(result, Err(AppError::ShopNotFound(_))));
    assert_eq!(service.list_shops(&asha).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_update_shop() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;

    let updated = service
        .update_shop(
            &asha,
            kirana.id,
            ShopUpdate {
                name: "Sharma Kirana".into(),
                description: Some("Groceries on Main Road".into()),
                mobile: Some("9123456780".into()),
                address: Some("  ".into()),
            },
        )
        .await?;
    assert_eq!(updated.name, "Sharma Kirana");
    assert!(updated.address.is_none());

    let reloaded = service.get_shop(&asha, kirana.id).await?.shop;
    assert_eq!(reloaded.name, "Sharma Kirana");
    assert_eq!(reloaded.description.as_deref(), Some("Groceries on Main Road"));
    assert_eq!(reloaded.mobile.unwrap().as_str(), "9123456780");

    let bad = service
        .update_shop(
            &asha,
            kirana.id,
            ShopUpdate {
                name: "Kirana".into(),
                description: None,
                mobile: Some("91234".into()),
                address: None,
            },
        )
        .await;
    assert!(matches!(bad, Err(AppError::InvalidMobile(_))));

    let blank = service
        .update_shop(
            &asha,
            kirana.id,
            ShopUpdate {
                name: " ".into(),
                description: None,
                mobile: None,
                address: None,
            },
        )
        .await;
    assert!(matches!(blank, Err(AppError::InvalidInput(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_shop_removes_transactions() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;
    let dairy = shop(&service, &asha, "Dairy").await?;

    borrow(&service, &asha, &kirana, 100_00, "2024-02-01").await?;
    borrow(&service, &asha, &kirana, 50_00, "2024-02-02").await?;
    borrow(&service, &asha, &dairy, 20_00, "2024-02-03").await?;

    service.delete_shop(&asha, kirana.id).await?;

    let health = service.health().await?;
    assert_eq!(health.shops, 1);
    assert_eq!(health.transactions, 1);

    let remaining = service.list_transactions(&asha, None).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].shop_name, "Dairy");

    Ok(())
}

#[tokio::test]
async fn test_transactions_newest_first_with_shop_names() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;
    let dairy = shop(&service, &asha, "Dairy").await?;

    borrow(&service, &asha, &kirana, 10_00, "2024-03-01").await?;
    borrow(&service, &asha, &dairy, 20_00, "2024-03-03").await?;
    pay(&service, &asha, &kirana, 5_00, "2024-03-02").await?;

    let all = service.list_transactions(&asha, None).await?;
    let dates: Vec<_> = all
        .iter()
        .map(|row| row.transaction.transaction_date)
        .collect();
    assert_eq!(
        dates,
        vec![
            parse_date("2024-03-03"),
            parse_date("2024-03-02"),
            parse_date("2024-03-01")
        ]
    );
    assert_eq!(all[0].shop_name, "Dairy");

    let limited = service.list_transactions(&asha, Some(2)).await?;
    assert_eq!(limited.len(), 2);

    let at_kirana = service.shop_transactions(&asha, kirana.id).await?;
    assert_eq!(at_kirana.len(), 2);
    assert_eq!(at_kirana[0].kind, TransactionKind::Payment);

    Ok(())
}

#[tokio::test]
async fn test_record_transaction_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;

    let zero = service
        .record_transaction(&asha, kirana.id, 0, TransactionKind::Borrow, None, None)
        .await;
    assert!(matches!(
        zero,
        Err(AppError::InvalidAmount(ParseAmountError::Zero))
    ));

    let negative = service
        .record_transaction(&asha, kirana.id, -5_00, TransactionKind::Payment, None, None)
        .await;
    assert!(matches!(negative, Err(AppError::InvalidAmount(_))));

    let recorded = service
        .record_transaction(
            &asha,
            kirana.id,
            12_34,
            TransactionKind::Borrow,
            Some("  rice and dal ".into()),
            None,
        )
        .await?;
    assert_eq!(recorded.shop_name, "Kirana");
    assert_eq!(recorded.transaction.description, "rice and dal");

    Ok(())
}

#[tokio::test]
async fn test_mark_payment_for_customer() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = register(&service, "Owner", Some("9000000000")).await?;
    let customer = register(&service, "Meena", Some("9111111111")).await?;
    let kirana = shop(&service, &owner, "Kirana").await?;

    let tx = service
        .mark_payment(&owner, customer.id, kirana.id, 40_00, None)
        .await?;
    assert_eq!(tx.user_id, customer.id);
    assert_eq!(tx.kind, TransactionKind::Payment);
    assert_eq!(tx.description, "Payment received by Kirana");

    // The customer sees it in their own history
    let history = service.list_transactions(&customer, None).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].shop_name, "Kirana");

    // Only the owner can mark payments at the shop
    let result = service
        .mark_payment(&customer, customer.id, kirana.id, 40_00, None)
        .await;
    assert!(matches!(result, Err(AppError::ShopNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_get_shop_balance_counts_only_that_shop() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = register(&service, "Owner", Some("9000000000")).await?;
    let meena = register(&service, "Meena", Some("9111111111")).await?;
    let kirana = shop(&service, &owner, "Kirana").await?;
    let dairy = shop(&service, &owner, "Dairy").await?;

    borrow(&service, &owner, &kirana, 300_00, "2024-01-01").await?;
    borrow(&service, &owner, &dairy, 999_00, "2024-01-02").await?;
    service
        .mark_payment(&owner, meena.id, kirana.id, 50_00, None)
        .await?;

    let info = service.get_shop(&owner, kirana.id).await?;
    assert_eq!(info.total_balance, 250_00);

    let listed = service.list_shops(&owner).await?;
    let from_list = listed.iter().find(|s| s.shop.id == kirana.id).unwrap();
    assert_eq!(from_list.total_balance, info.total_balance);

    Ok(())
}

#[tokio::test]
async fn test_history_names_shops_owned_by_others() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = register(&service, "Owner", None).await?;
    let meena = register(&service, "Meena", None).await?;
    let kirana = shop(&service, &owner, "Kirana").await?;
    let tailor = shop(&service, &meena, "Tailor").await?;

    borrow(&service, &meena, &tailor, 80_00, "2024-01-01").await?;
    borrow(&service, &meena, &tailor, 20_00, "2024-01-02").await?;
    service
        .mark_payment(&owner, meena.id, kirana.id, 30_00, None)
        .await?;

    let history = service.list_transactions(&meena, None).await?;
    let mut names: Vec<_> = history.iter().map(|row| row.shop_name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Kirana", "Tailor", "Tailor"]);

    Ok(())
}

#[tokio::test]
async fn test_amount_above_limit_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;

    let result = service
        .record_transaction(
            &asha,
            kirana.id,
            MAX_AMOUNT_CENTS + 1,
            TransactionKind::Borrow,
            None,
            None,
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::InvalidAmount(ParseAmountError::Overflow))
    ));

    service
        .record_transaction(&asha, kirana.id, MAX_AMOUNT_CENTS, TransactionKind::Borrow, None, None)
        .await?;
    service
        .record_transaction(&asha, kirana.id, MAX_AMOUNT_CENTS, TransactionKind::Borrow, None, None)
        .await?;
    let info = service.get_shop(&asha, kirana.id).await?;
    assert_eq!(info.total_balance, 2 * MAX_AMOUNT_CENTS);

    Ok(())
}
