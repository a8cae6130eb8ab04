use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as PgTransaction};

use super::{idempotency, lock};
use crate::domain::entities::{
    LedgerSide, Transaction, TransactionKind, Wallet, MAX_IDEMPOTENCY_KEY_LEN,
};
use crate::domain::error::CoreError;
use crate::domain::types::{AssetTypeId, Money, TransactionId, UserId, WalletId};

/// A single value movement to be applied atomically: `amount` of
/// `asset_type_id` moves from `from_user`'s wallet to `to_user`'s wallet.
/// `owner_user` names which party the resulting [`Transaction`] row is
/// recorded against (spec §3: a TOP_UP/BONUS is recorded against the
/// receiving user, a SPEND against the spending user, never against the
/// system account).
pub struct OperationRequest {
    pub from_user: UserId,
    pub to_user: UserId,
    pub owner_user: UserId,
    pub asset_type_id: AssetTypeId,
    pub amount: Money,
    pub kind: TransactionKind,
    pub idempotency_key: String,
    pub metadata: serde_json::Value,
}

/// The Ledger Engine (spec §2, §4.3): the sole writer of `wallets`,
/// `transactions`, and `ledger_entries`. Every call to [`LedgerEngine::execute`]
/// runs the full 11-step procedure inside one store-level transaction, so a
/// caller either observes the complete effect of an operation or none of it.
pub struct LedgerEngine {
    pool: PgPool,
}

/// Boundary checks run before any store access (spec §4.3 steps 1-0, ahead of
/// the transaction being opened at all): a strictly positive amount, distinct
/// parties, and an idempotency key within the column's length limit.
fn validate_request(request: &OperationRequest) -> Result<(), CoreError> {
    if !request.amount.is_positive() {
        return Err(CoreError::invalid("amount must be strictly positive"));
    }
    if request.from_user == request.to_user {
        return Err(CoreError::internal(
            "source and destination users must differ",
        ));
    }
    if request.idempotency_key.is_empty()
        || request.idempotency_key.len() > MAX_IDEMPOTENCY_KEY_LEN
    {
        return Err(CoreError::invalid(
            "idempotency key must be between 1 and 255 characters",
        ));
    }
    Ok(())
}

impl LedgerEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs one value movement to completion, or returns the already-completed
    /// `Transaction` for a repeated idempotency key (spec laws L1, L2).
    #[tracing::instrument(
        name = "ledger_engine.execute",
        skip(self, request),
        fields(
            kind = ?request.kind,
            asset_type_id = request.asset_type_id.0,
            from_user = %request.from_user,
            to_user = %request.to_user,
        ),
    )]
    pub async fn execute(&self, request: OperationRequest) -> Result<Transaction, CoreError> {
        validate_request(&request)?;

        let mut tx = self.pool.begin().await.map_err(CoreError::from_sqlx)?;

        // Step 1-2: per-transaction guardrails (spec §5). SET LOCAL does not
        // accept bind parameters; both values are engine constants.
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *tx)
            .await
            .map_err(CoreError::from_sqlx)?;
        sqlx::query("SET LOCAL statement_timeout = '10s'")
            .execute(&mut *tx)
            .await
            .map_err(CoreError::from_sqlx)?;

        // Step 3: advisory lock keyed on the unordered party/asset tuple.
        let lock_key = lock::derive_key(&[
            &request.from_user.to_string(),
            &request.to_user.to_string(),
            &request.asset_type_id.to_string(),
        ]);
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(lock_key)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::from_sqlx)?;

        // Step 4: idempotency gate, decided under the held advisory lock.
        match idempotency::check(&mut tx, &request.idempotency_key).await {
            Ok(idempotency::Outcome::ReturnExisting(existing)) => {
                tx.commit().await.map_err(CoreError::from_sqlx)?;
                return Ok(existing);
            }
            Ok(idempotency::Outcome::Proceed) => {}
            Err(err) => {
                let _ = tx.rollback().await;
                return Err(err);
            }
        }

        match self.transfer(&mut tx, &request).await {
            Ok(transaction) => {
                tx.commit().await.map_err(CoreError::from_sqlx)?;
                Ok(transaction)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }

    /// Steps 5-10: auto-onboard, lock both wallets in ascending `user_id`
    /// order, check the balance invariant, and write the transaction and its
    /// paired ledger entries.
    async fn transfer(
        &self,
        tx: &mut PgTransaction<'_, Postgres>,
        request: &OperationRequest,
    ) -> Result<Transaction, CoreError> {
        let (first, second) = lock::ordered_user_ids(request.from_user, request.to_user);

        // Step 5: auto-onboard any wallet that does not exist yet. The unique
        // constraint on (user_id, asset_type_id) makes this race-safe even
        // without the advisory lock; we hold it anyway (spec §9).
        for user in [first, second] {
            sqlx::query(
                r#"
                INSERT INTO wallets (user_id, asset_type_id, balance, version, created_at, updated_at)
                VALUES ($1, $2, 0, 0, now(), now())
                ON CONFLICT (user_id, asset_type_id) DO NOTHING
                "#,
            )
            .bind(user)
            .bind(request.asset_type_id)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::from_sqlx)?;
        }

        // Step 6: row-lock both wallets, ascending user_id first.
        let mut locked: HashMap<UserId, Wallet> = HashMap::with_capacity(2);
        for user in [first, second] {
            let wallet = sqlx::query_as::<_, Wallet>(
                r#"
                SELECT id, user_id, asset_type_id, balance, version, created_at, updated_at
                FROM wallets
                WHERE user_id = $1 AND asset_type_id = $2
                FOR UPDATE
                "#,
            )
            .bind(user)
            .bind(request.asset_type_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(CoreError::from_sqlx)?;
            locked.insert(user, wallet);
        }

        let from_wallet = locked
            .get(&request.from_user)
            .cloned()
            .ok_or_else(|| CoreError::internal("source wallet missing after auto-onboard"))?;
        let to_wallet = locked
            .get(&request.to_user)
            .cloned()
            .ok_or_else(|| CoreError::internal("destination wallet missing after auto-onboard"))?;

        // Step 7: the never-negative-balance invariant (I4).
        let new_from_balance = from_wallet
            .balance
            .checked_sub(request.amount)
            .ok_or_else(|| CoreError::internal("balance underflow computing debit"))?;
        if new_from_balance.as_decimal() < Decimal::ZERO {
            return Err(CoreError::InsufficientFunds {
                wallet_id: from_wallet.id,
            });
        }
        let new_to_balance = to_wallet
            .balance
            .checked_add(request.amount)
            .ok_or_else(|| CoreError::internal("balance overflow computing credit"))?;

        // Step 8: insert the transaction row, client-generated id, PENDING.
        let transaction_id = TransactionId::new();
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions
                (id, idempotency_key, kind, user_id, asset_type_id, amount, status, metadata, created_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', $7, now(), NULL)
            RETURNING id, idempotency_key, kind, user_id, asset_type_id, amount, status, metadata, created_at, processed_at
            "#,
        )
        .bind(transaction_id)
        .bind(&request.idempotency_key)
        .bind(request.kind)
        .bind(request.owner_user)
        .bind(request.asset_type_id)
        .bind(request.amount)
        .bind(sqlx::types::Json(&request.metadata))
        .fetch_one(&mut *tx)
        .await
        .map_err(CoreError::from_sqlx)?;

        // Step 9: the debit side (wallet update + ledger entry).
        self.apply_side(
            tx,
            transaction.id,
            from_wallet.id,
            LedgerSide::Debit,
            request.amount,
            new_from_balance,
        )
        .await?;

        // Step 9 (continued): the credit side.
        self.apply_side(
            tx,
            transaction.id,
            to_wallet.id,
            LedgerSide::Credit,
            request.amount,
            new_to_balance,
        )
        .await?;

        // Step 10: transition the transaction to COMPLETED.
        let completed = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET status = 'COMPLETED', processed_at = now()
            WHERE id = $1
            RETURNING id, idempotency_key, kind, user_id, asset_type_id, amount, status, metadata, created_at, processed_at
            "#,
        )
        .bind(transaction.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(CoreError::from_sqlx)?;

        Ok(completed)
    }

    async fn apply_side(
        &self,
        tx: &mut PgTransaction<'_, Postgres>,
        transaction_id: TransactionId,
        wallet_id: WalletId,
        side: LedgerSide,
        amount: Money,
        balance_after: Money,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE wallets SET balance = $1, version = version + 1, updated_at = now() WHERE id = $2",
        )
        .bind(balance_after)
        .bind(wallet_id)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::from_sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (transaction_id, wallet_id, side, amount, balance_after, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            "#,
        )
        .bind(transaction_id)
        .bind(wallet_id)
        .bind(side)
        .bind(amount)
        .bind(balance_after)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::from_sqlx)?;

        Ok(())
    }
}
