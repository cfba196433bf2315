use anyhow::Result;
use creditkeep::application::AppError;
use creditkeep::domain::MonthlyActivity;

mod common;
use common::{borrow, parse_date, pay, register, shop, test_service};

#[tokio::test]
async fn test_analytics_total_and_monthly() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    let kirana = shop(&service, &asha, "Kirana").await?;
    let dairy = shop(&service, &asha, "Dairy").await?;

    // before the six-month window: counted in the total only
    borrow(&service, &asha, &kirana, 100_00, "2023-11-01").await?;
    borrow(&service, &asha, &kirana, 500_00, "2024-01-10").await?;
    pay(&service, &asha, &kirana, 200_00, "2024-01-20").await?;
    borrow(&service, &asha, &dairy, 75_50, "2024-05-05").await?;

    let report = service.analytics(&asha, parse_date("2024-06-15")).await?;
    assert_eq!(report.total_balance, 475_50);
    assert_eq!(
        report.monthly_spending,
        vec![
            MonthlyActivity {
                month: "2024-05".into(),
                increase: 75_50,
                decrease: 0,
            },
            MonthlyActivity {
                month: "2024-01".into(),
                increase: 500_00,
                decrease: 200_00,
            },
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_analytics_top_shops() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;

    for (i, name) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
        let s = shop(&service, &asha, name).await?;
        borrow(&service, &asha, &s, (i as i64 + 1) * 100_00, "2024-04-01").await?;
    }
    let settled = shop(&service, &asha, "Settled").await?;
    borrow(&service, &asha, &settled, 900_00, "2024-04-01").await?;
    pay(&service, &asha, &settled, 900_00, "2024-04-02").await?;

    let report = service.analytics(&asha, parse_date("2024-06-15")).await?;
    let names: Vec<_> = report.top_shops.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["F", "E", "D", "C", "B"]);
    assert_eq!(report.top_shops[0].balance, 600_00);
    assert_eq!(report.total_balance, 2100_00);

    Ok(())
}

#[tokio::test]
async fn test_analytics_empty() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;

    let report = service.analytics(&asha, parse_date("2024-06-15")).await?;
    assert_eq!(report.total_balance, 0);
    assert!(report.monthly_spending.is_empty());
    assert!(report.top_shops.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_my_customers() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = register(&service, "Owner", Some("9000000000")).await?;
    let meena = register(&service, "Meena", Some("9111111111")).await?;
    let ravi = register(&service, "Ravi", None).await?;
    let kirana = shop(&service, &owner, "Kirana").await?;
    let dairy = shop(&service, &owner, "Dairy").await?;

    borrow(&service, &owner, &kirana, 300_00, "2024-01-01").await?;
    service
        .mark_payment(&owner, meena.id, kirana.id, 50_00, None)
        .await?;
    service
        .mark_payment(&owner, ravi.id, dairy.id, 20_00, None)
        .await?;

    let report = service.my_customers(&owner).await?;
    let names: Vec<_> = report
        .customers
        .iter()
        .map(|c| c.balance.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Owner", "Ravi", "Meena"]);

    assert_eq!(report.customers[2].balance.outstanding, -50_00);
    assert_eq!(
        report.customers[2].customer_mobile.as_ref().unwrap().as_str(),
        "9111111111"
    );
    // customers without a mobile stay separate rows
    assert!(report.customers[1].customer_mobile.is_none());

    assert_eq!(report.summary.counterparty_count, 3);
    assert_eq!(report.summary.total_outstanding, 230_00);

    Ok(())
}

#[tokio::test]
async fn test_my_customers_requires_owner_mobile() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = register(&service, "Owner", None).await?;
    shop(&service, &owner, "Kirana").await?;

    let result = service.my_customers(&owner).await;
    assert!(matches!(result, Err(AppError::MobileRequired(_))));

    Ok(())
}

#[tokio::test]
async fn test_shop_borrower_lookup() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = register(&service, "Owner", None).await?;
    let other = register(&service, "Other", None).await?;
    let meena = register(&service, "Meena", Some("9111111111")).await?;
    let kirana = shop(&service, &owner, "Kirana").await?;
    let dairy = shop(&service, &owner, "Dairy").await?;
    let elsewhere = shop(&service, &other, "Elsewhere").await?;

    service
        .mark_payment(&owner, meena.id, kirana.id, 50_00, None)
        .await?;
    service
        .mark_payment(&owner, meena.id, dairy.id, 10_00, None)
        .await?;
    service
        .mark_payment(&other, meena.id, elsewhere.id, 99_00, None)
        .await?;

    let report = service.shop_borrower_lookup(&owner, "9111111111").await?;
    assert_eq!(report.borrower.id, meena.id);
    assert_eq!(report.shop_balances.len(), 2);
    assert!(report.shop_balances.iter().all(|b| b.display_name != "Elsewhere"));
    assert_eq!(report.summary.total_decrease, 60_00);

    let no_shops = service
        .shop_borrower_lookup(&meena, "9111111111")
        .await;
    assert!(matches!(no_shops, Err(AppError::NoShops)));

    let unknown = service.shop_borrower_lookup(&owner, "9999999999").await;
    assert!(matches!(unknown, Err(AppError::UserNotFound(_))));

    Ok(())
}
