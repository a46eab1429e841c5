//! Account ledger and unit of work integration tests.

mod support;

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use common::AppError;
use domain::WalletDelta;
use ledger_service_lib::infra::UnitOfWork;
use ledger_service_lib::service::account_ledger::{self, AccountLedger};
use ledger_service_lib::service::CachedBalance;

#[tokio::test]
async fn test_created_account_starts_at_zero() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 5_000);
    let ledger = AccountLedger::new(uow.clone());

    let account = uow
        .transaction(|ctx| Box::pin(async move { account_ledger::create_account(&ctx).await }))
        .await
        .unwrap();
    ledger.track_created(&account);

    assert_eq!((account.balance, account.point), (0, 0));
    assert_eq!(
        ledger.cached(&account.id),
        Some(CachedBalance {
            balance: 0,
            point: 0
        })
    );

    let stored = ledger.find(account.id).await.unwrap();
    assert_eq!((stored.balance, stored.point), (0, 0));
}

#[tokio::test]
async fn test_apply_delta_updates_store_and_cache() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 5_000);
    let ledger = AccountLedger::new(uow.clone());
    let account = uow.accounts().create().await.unwrap();
    ledger.track_created(&account);

    ledger.apply_delta(account.id, WalletDelta::new(50, 5)).await.unwrap();
    let summary = ledger
        .apply_delta(account.id, WalletDelta::new(-20, 3))
        .await
        .unwrap();

    assert_eq!(summary.id, account.id);
    assert_eq!((summary.balance, summary.point), (30, 8));
    assert_eq!(
        ledger.cached(&account.id),
        Some(CachedBalance {
            balance: 30,
            point: 8
        })
    );
}

#[tokio::test]
async fn test_apply_delta_on_missing_account_propagates_not_found() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 5_000);
    let ledger = AccountLedger::new(uow);
    let missing = uuid::Uuid::new_v4();

    let result = ledger.apply_delta(missing, WalletDelta::new(10, 0)).await;

    assert_eq!(result, Err(AppError::NotFound));
    assert!(ledger.cached(&missing).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deltas_sum_regardless_of_order() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 10_000);
    let ledger = Arc::new(AccountLedger::new(uow.clone()));
    let account = uow.accounts().create().await.unwrap();
    ledger.track_created(&account);

    let deltas: Vec<WalletDelta> = (0..24)
        .map(|i| {
            let sign = if i % 3 == 0 { -1 } else { 1 };
            WalletDelta::new(sign * (i as i64 + 1) * 10, i as i64 % 4)
        })
        .collect();
    let expected: WalletDelta = deltas.iter().copied().sum();

    let tasks = deltas.into_iter().map(|delta| {
        let ledger = ledger.clone();
        let id = account.id;
        tokio::spawn(async move { ledger.apply_delta(id, delta).await })
    });
    for result in futures::future::join_all(tasks).await {
        assert_ok!(result.unwrap());
    }

    let stored = ledger.find(account.id).await.unwrap();
    assert_eq!((stored.balance, stored.point), (expected.money, expected.point));
    assert_eq!(
        ledger.cached(&account.id),
        Some(CachedBalance {
            balance: expected.money,
            point: expected.point
        })
    );
}

#[tokio::test]
async fn test_removed_account_rejects_everything() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 5_000);
    let ledger = AccountLedger::new(uow.clone());
    let account = uow.accounts().create().await.unwrap();
    ledger.track_created(&account);

    let id = account.id;
    uow.transaction(move |ctx| Box::pin(async move { account_ledger::remove_account(&ctx, id).await }))
        .await
        .unwrap();
    ledger.forget(&id);

    assert!(ledger.cached(&id).is_none());
    assert_eq!(ledger.find(id).await, Err(AppError::NotFound));
    assert_eq!(
        ledger.apply_delta(id, WalletDelta::new(1, 1)).await,
        Err(AppError::NotFound)
    );

    let again = uow
        .transaction(move |ctx| Box::pin(async move { account_ledger::remove_account(&ctx, id).await }))
        .await;
    assert_eq!(again, Err(AppError::NotFound));
}

#[tokio::test]
async fn test_failed_unit_of_work_rolls_back() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 5_000);

    let result: Result<(), AppError> = uow
        .transaction(|ctx| {
            Box::pin(async move {
                ctx.accounts().create().await?;
                Err::<(), _>(AppError::internal("forced failure after insert"))
            })
        })
        .await;

    assert_err!(result);
    assert!(uow.accounts().find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_timed_out_unit_of_work_rolls_back_and_releases_connection() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 50);

    let result: Result<(), AppError> = uow
        .transaction(|ctx| {
            Box::pin(async move {
                ctx.accounts().create().await?;
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, AppError>(())
            })
        })
        .await;

    assert!(matches!(result, Err(AppError::TransactionFailure(_))));

    // The pool holds a single connection, so this only succeeds if the
    // timed-out transaction gave it back.
    let accounts = uow.accounts().find_all().await.unwrap();
    assert!(accounts.is_empty());
    assert_ok!(uow.accounts().create().await);
}

#[tokio::test]
async fn test_unit_of_work_reads_its_own_writes() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 5_000);

    let (created, seen) = uow
        .transaction(|ctx| {
            Box::pin(async move {
                let created = account_ledger::create_account(&ctx).await?;
                let seen = ctx.accounts().find_by_id(created.id).await?;
                Ok::<_, AppError>((created, seen))
            })
        })
        .await
        .unwrap();

    let seen = seen.expect("row visible inside its own transaction");
    assert_eq!((seen.id, seen.balance, seen.point), (created.id, 0, 0));
}

#[tokio::test]
async fn test_store_delete_outside_unit_of_work() {
    let conn = support::connect().await;
    let uow = support::persistence(&conn, 5_000);
    let account = uow.accounts().create().await.unwrap();

    assert_ok!(uow.accounts().delete(account.id).await);

    assert_eq!(uow.accounts().find_by_id(account.id).await, Ok(None));
    assert_eq!(uow.accounts().delete(account.id).await, Err(AppError::NotFound));
}
