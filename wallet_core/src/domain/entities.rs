use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{AssetTypeId, LedgerEntryId, Money, TransactionId, UserId, WalletId};

/// Maximum length of a client-supplied idempotency key (spec: `≤255 chars`).
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// A fungible virtual unit (Gold, Diamonds, Loyalty Points). Immutable once
/// provisioned; never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssetType {
    pub id: AssetTypeId,
    pub name: String,
    pub code: String,
}

/// A (user, asset) balance record. Created lazily by the ledger engine on
/// first reference ("auto-onboarding", spec §9); balance and `version`
/// mutate only inside the engine's single store-level transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub asset_type_id: AssetTypeId,
    pub balance: Money,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    TopUp,
    Bonus,
    Spend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    /// Reserved for future out-of-band reconciliation tooling (spec §7, §9
    /// open question); the engine's success and failure paths never write
    /// this status themselves.
    Failed,
}

/// A single logical value-movement event, uniquely tagged by the caller's
/// idempotency key. Once written, only `status` and `processed_at` ever
/// change (spec invariant I7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: TransactionId,
    pub idempotency_key: String,
    pub kind: TransactionKind,
    pub user_id: UserId,
    pub asset_type_id: AssetTypeId,
    pub amount: Money,
    pub status: TransactionStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_side", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerSide {
    Debit,
    Credit,
}

/// One half of the double-entry bookkeeping pair for a [`Transaction`].
/// Created in pairs, never updated, never deleted (spec invariant I2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    pub side: LedgerSide,
    pub amount: Money,
    pub balance_after: Money,
    pub created_at: DateTime<Utc>,
}
