use common::WalletId;
use thiserror::Error;

/// The error taxonomy of spec.md §7. Every failure mode a caller of the core
/// can observe maps to exactly one of these variants.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Amount not positive, unknown asset code, malformed identifier, or an
    /// idempotency key over the length limit. No store write occurs.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Source wallet balance < amount. The store transaction rolled back;
    /// nothing was persisted, and this failure is not itself recorded in the
    /// ledger.
    #[error("insufficient funds in wallet {wallet_id}")]
    InsufficientFunds { wallet_id: WalletId },

    /// The idempotency key is already present with a non-COMPLETED status,
    /// or the unique-constraint insert lost the race after the gate.
    /// Non-retryable for that key.
    #[error("idempotency conflict for key {0}")]
    IdempotencyConflict(String),

    /// Lock-acquisition timeout, statement timeout, connection loss, or a
    /// store-detected deadlock. Safe to retry with the same idempotency key.
    #[error("transient failure: {0}")]
    Transient(String),

    /// An invariant was violated at runtime (e.g. a wallet row missing
    /// immediately after an insert-if-absent). Fatal at the operation level.
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classifies a raw `sqlx::Error` the way spec.md §7 expects: timeouts
    /// and connection loss are transient and retryable, a unique-constraint
    /// violation on `idempotency_key` is an idempotency conflict, anything
    /// else is internal.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::IdempotencyConflict(db_err.message().to_string());
            }
            // 55P03 lock_not_available, 57014 query_canceled (statement_timeout),
            // 40P01 deadlock_detected: all transient by spec §7/§5.
            if let Some(code) = db_err.code() {
                if matches!(code.as_ref(), "55P03" | "57014" | "40P01") {
                    return Self::Transient(db_err.message().to_string());
                }
            }
        }
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => Self::Transient(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
