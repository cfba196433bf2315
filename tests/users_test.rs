use anyhow::Result;
use creditkeep::application::AppError;

mod common;
use common::{register, test_service};

#[tokio::test]
async fn test_register_and_find_by_mobile() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let asha = register(&service, "Asha", Some("9876543210")).await?;
    assert_eq!(asha.mobile.as_ref().unwrap().as_str(), "9876543210");

    let found = service.get_user_by_mobile("9876543210").await?;
    assert_eq!(found.id, asha.id);

    let by_email = service.get_user_by_email("asha@example.com").await?;
    assert_eq!(by_email.id, asha.id);

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicates() -> Result<()> {
    let (service, _temp) = test_service().await?;
    register(&service, "Asha", Some("9876543210")).await?;

    let same_email = service
        .register_user("Other".into(), "asha@example.com".into(), None)
        .await;
    assert!(matches!(same_email, Err(AppError::UserAlreadyExists(_))));

    let same_mobile = service
        .register_user("Ravi".into(), "ravi@example.com".into(), Some("9876543210"))
        .await;
    assert!(matches!(same_mobile, Err(AppError::MobileAlreadyRegistered(_))));

    Ok(())
}

#[tokio::test]
async fn test_register_validates_input() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let bad_mobile = service
        .register_user("Asha".into(), "asha@example.com".into(), Some("12345"))
        .await;
    assert!(matches!(bad_mobile, Err(AppError::InvalidMobile(_))));

    let no_name = service
        .register_user("  ".into(), "asha@example.com".into(), None)
        .await;
    assert!(matches!(no_name, Err(AppError::InvalidInput(_))));

    let bad_email = service
        .register_user("Asha".into(), "not-an-email".into(), None)
        .await;
    assert!(matches!(bad_email, Err(AppError::InvalidInput(_))));

    Ok(())
}

#[tokio::test]
async fn test_update_profile() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = register(&service, "Asha", None).await?;
    register(&service, "Ravi", Some("9000000001")).await?;

    let taken = service
        .update_profile(&asha, "Asha".into(), "asha@example.com".into(), Some("9000000001"))
        .await;
    assert!(matches!(taken, Err(AppError::MobileAlreadyRegistered(_))));

    let updated = service
        .update_profile(
            &asha,
            "Asha K".into(),
            "asha.k@example.com".into(),
            Some("9876543210"),
        )
        .await?;
    assert_eq!(updated.name, "Asha K");

    let reloaded = service.get_user(asha.id).await?;
    assert_eq!(reloaded.email, "asha.k@example.com");
    assert_eq!(reloaded.mobile.as_ref().unwrap().as_str(), "9876543210");

    // Keeping your own mobile is not a conflict
    service
        .update_profile(&reloaded, "Asha".into(), reloaded.email.clone(), Some("9876543210"))
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_unknown_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let missing = service.get_user_by_mobile("9999999999").await;
    assert!(matches!(missing, Err(AppError::UserNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_health_counts_rows() -> Result<()> {
    let (service, _temp) = test_service().await?;
    register(&service, "Asha", None).await?;

    let report = service.health().await?;
    assert_eq!(report.status, "healthy");
    assert_eq!(report.users, 1);
    assert_eq!(report.shops, 0);
    assert_eq!(report.transactions, 0);
    assert_eq!(report.lend_transactions, 0);

    Ok(())
}
