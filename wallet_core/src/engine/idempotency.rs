use sqlx::{Postgres, Transaction as PgTransaction};

use crate::domain::entities::{Transaction, TransactionStatus};
use crate::domain::error::CoreError;

/// Outcome of the idempotency check (spec §4.2).
pub enum Outcome {
    /// No prior attempt with this key exists; the caller should proceed to
    /// the Ledger Engine's transfer steps.
    Proceed,
    /// A prior attempt already completed; return it unchanged. No wallet is
    /// touched, no ledger entry written.
    ReturnExisting(Transaction),
}

/// Looks up `idempotency_key` inside the caller's already-open store
/// transaction (the advisory lock from `LedgerEngine::execute` must already
/// be held). Runtime re-entry is still guarded by the `idempotency_key`
/// unique constraint even if two callers somehow both reach this point
/// concurrently (spec §4.2 "Uniqueness enforcement").
pub async fn check(
    tx: &mut PgTransaction<'_, Postgres>,
    idempotency_key: &str,
) -> Result<Outcome, CoreError> {
    let existing = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, idempotency_key, kind, user_id, asset_type_id, amount,
               status, metadata, created_at, processed_at
        FROM transactions
        WHERE idempotency_key = $1
        "#,
    )
    .bind(idempotency_key)
    .fetch_optional(&mut *tx)
    .await
    .map_err(CoreError::from_sqlx)?;

    match existing {
        None => Ok(Outcome::Proceed),
        Some(found) if found.status == TransactionStatus::Completed => {
            Ok(Outcome::ReturnExisting(found))
        }
        Some(found) => Err(CoreError::IdempotencyConflict(format!(
            "key {:?} already has status {:?}",
            found.idempotency_key, found.status
        ))),
    }
}
