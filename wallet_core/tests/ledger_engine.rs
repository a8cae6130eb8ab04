use common::{AssetTypeId, Money, UserId};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use wallet_core::domain::entities::{LedgerSide, TransactionKind, TransactionStatus};
use wallet_core::engine::{LedgerEngine, OperationRequest};

/// Provisions one asset type and its system wallet, mirroring what `init_db`
/// does at install time. Returns the asset type's id.
async fn seed_asset_type(pool: &PgPool, code: &str) -> AssetTypeId {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO asset_types (name, code) VALUES ($1, $2) RETURNING id",
    )
    .bind(code)
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        INSERT INTO wallets (user_id, asset_type_id, balance, version, created_at, updated_at)
        VALUES ($1, $2, 1000000000.00, 0, now(), now())
        "#,
    )
    .bind(UserId::SYSTEM)
    .bind(id)
    .execute(pool)
    .await
    .unwrap();

    AssetTypeId(id)
}

fn top_up(user: UserId, asset: AssetTypeId, amount: &str, key: &str) -> OperationRequest {
    OperationRequest {
        from_user: UserId::SYSTEM,
        to_user: user,
        owner_user: user,
        asset_type_id: asset,
        amount: Money::parse(amount).unwrap(),
        kind: TransactionKind::TopUp,
        idempotency_key: key.to_string(),
        metadata: json!({}),
    }
}

fn spend(user: UserId, asset: AssetTypeId, amount: &str, key: &str) -> OperationRequest {
    OperationRequest {
        from_user: user,
        to_user: UserId::SYSTEM,
        owner_user: user,
        asset_type_id: asset,
        amount: Money::parse(amount).unwrap(),
        kind: TransactionKind::Spend,
        idempotency_key: key.to_string(),
        metadata: json!({}),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn top_up_credits_the_wallet_and_writes_a_double_entry_pair(pool: PgPool) {
    let asset = seed_asset_type(&pool, "GOLD").await;
    let user = UserId::new();
    let engine = LedgerEngine::new(pool.clone());

    let tx = engine
        .execute(top_up(user, asset, "50.00", "key-1"))
        .await
        .unwrap();

    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.amount, Money::parse("50.00").unwrap());

    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2")
            .bind(user)
            .bind(asset)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance, Decimal::new(5000, 2));

    let entries: Vec<(String, Decimal)> = sqlx::query_as(
        "SELECT side::text, amount FROM ledger_entries WHERE transaction_id = $1 ORDER BY side",
    )
    .bind(tx.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|(side, _)| side == "CREDIT"));
    assert!(entries.iter().any(|(side, _)| side == "DEBIT"));
}

#[sqlx::test(migrations = "./migrations")]
async fn repeated_idempotency_key_returns_the_same_transaction_without_reapplying(pool: PgPool) {
    let asset = seed_asset_type(&pool, "GOLD").await;
    let user = UserId::new();
    let engine = LedgerEngine::new(pool.clone());

    let first = engine
        .execute(top_up(user, asset, "20.00", "retry-key"))
        .await
        .unwrap();
    let second = engine
        .execute(top_up(user, asset, "20.00", "retry-key"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);

    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2")
            .bind(user)
            .bind(asset)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance, Decimal::new(2000, 2));
}

#[sqlx::test(migrations = "./migrations")]
async fn spend_exceeding_balance_is_rejected_and_nothing_is_persisted(pool: PgPool) {
    let asset = seed_asset_type(&pool, "GOLD").await;
    let user = UserId::new();
    let engine = LedgerEngine::new(pool.clone());

    engine
        .execute(top_up(user, asset, "10.00", "fund"))
        .await
        .unwrap();

    let result = engine
        .execute(spend(user, asset, "10.01", "overspend"))
        .await;

    assert!(matches!(
        result,
        Err(wallet_core::domain::error::CoreError::InsufficientFunds { .. })
    ));

    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2")
            .bind(user)
            .bind(asset)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance, Decimal::new(1000, 2), "a rejected spend must not move funds");

    let row_count: i64 = sqlx::query_scalar("SELECT count(*) FROM transactions WHERE idempotency_key = 'overspend'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn spending_exactly_the_full_balance_drains_it_to_zero(pool: PgPool) {
    let asset = seed_asset_type(&pool, "GOLD").await;
    let user = UserId::new();
    let engine = LedgerEngine::new(pool.clone());

    engine
        .execute(top_up(user, asset, "15.00", "fund"))
        .await
        .unwrap();
    engine
        .execute(spend(user, asset, "15.00", "drain"))
        .await
        .unwrap();

    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2")
            .bind(user)
            .bind(asset)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance, Decimal::ZERO);
}

#[sqlx::test(migrations = "./migrations")]
async fn a_reused_idempotency_key_returns_the_stored_transaction_verbatim(pool: PgPool) {
    let asset = seed_asset_type(&pool, "GOLD").await;
    let user = UserId::new();
    let engine = LedgerEngine::new(pool.clone());

    engine
        .execute(top_up(user, asset, "5.00", "dup-key"))
        .await
        .unwrap();

    // Same key, same shape: the gate finds the already-COMPLETED row and
    // returns it unchanged instead of re-running the transfer.
    let replay = engine
        .execute(top_up(user, asset, "5.00", "dup-key"))
        .await
        .unwrap();

    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2")
            .bind(user)
            .bind(asset)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(balance, Decimal::new(500, 2));
    assert_eq!(replay.amount, Money::parse("5.00").unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_spends_against_the_same_wallet_never_drive_the_balance_negative(pool: PgPool) {
    let asset = seed_asset_type(&pool, "GOLD").await;
    let user = UserId::new();
    let engine = LedgerEngine::new(pool.clone());

    engine
        .execute(top_up(user, asset, "10.00", "fund"))
        .await
        .unwrap();

    let engine_a = LedgerEngine::new(pool.clone());
    let engine_b = LedgerEngine::new(pool.clone());
    let req_a = spend(user, asset, "6.00", "spend-a");
    let req_b = spend(user, asset, "6.00", "spend-b");

    let (result_a, result_b) =
        tokio::join!(engine_a.execute(req_a), engine_b.execute(req_b));

    let successes = [&result_a, &result_b]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1, "only one of two overlapping spends can succeed");

    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2")
            .bind(user)
            .bind(asset)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(balance >= Decimal::ZERO);
    assert_eq!(balance, Decimal::new(400, 2));
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_retries_with_the_same_idempotency_key_apply_exactly_once(pool: PgPool) {
    let asset = seed_asset_type(&pool, "GOLD").await;
    let user = UserId::new();

    let engine_a = LedgerEngine::new(pool.clone());
    let engine_b = LedgerEngine::new(pool.clone());
    let req_a = top_up(user, asset, "30.00", "shared-key");
    let req_b = top_up(user, asset, "30.00", "shared-key");

    let (result_a, result_b) = tokio::join!(engine_a.execute(req_a), engine_b.execute(req_b));

    let transactions: Vec<_> = [result_a, result_b]
        .into_iter()
        .map(|r| r.expect("a racing retry must observe the other caller's committed result, not an error"))
        .collect();
    assert_eq!(
        transactions[0].id, transactions[1].id,
        "both callers must observe the same transaction, not two distinct ones"
    );

    let balance: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2")
            .bind(user)
            .bind(asset)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(
        balance,
        Decimal::new(3000, 2),
        "the amount must land exactly once, not twice"
    );

    let row_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM transactions WHERE idempotency_key = 'shared-key'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row_count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn balances_on_two_different_assets_never_interfere(pool: PgPool) {
    let gold = seed_asset_type(&pool, "GOLD").await;
    let diamond = seed_asset_type(&pool, "DIAMOND").await;
    let user = UserId::new();
    let engine = LedgerEngine::new(pool.clone());

    engine
        .execute(top_up(user, gold, "100.00", "gold-key"))
        .await
        .unwrap();

    let diamond_balance: Decimal = sqlx::query_scalar(
        "SELECT balance FROM wallets WHERE user_id = $1 AND asset_type_id = $2",
    )
    .bind(user)
    .bind(diamond)
    .fetch_optional(&pool)
    .await
    .unwrap()
    .unwrap_or(Decimal::ZERO);

    assert_eq!(diamond_balance, Decimal::ZERO);
}
