use async_trait::async_trait;
use common::{AssetTypeId, Money, UserId};

use super::entities::{AssetType, Transaction};
use super::error::CoreError;

/// Port for the Query Surface's asset lookup (spec §4.4 `getAssetType`).
/// The only port of the three below that is exercised purely through
/// `mockall` in unit tests: it has no transactional coupling to the ledger
/// engine, unlike balance and history reads which the engine's own
/// integration tests cover against a real store.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AssetTypeRepository: Send + Sync {
    /// Case-sensitive exact match against either the canonical name or the
    /// short code (spec §9 open question: "gold" and "GOLD" are distinct).
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<AssetType>, CoreError>;

    /// All provisioned asset types, used to warm the process-wide cache at
    /// startup (spec §9 "Global singletons").
    async fn list_all(&self) -> Result<Vec<AssetType>, CoreError>;
}

/// Port for `getBalance`. Reads are uncontended: no locks are acquired, and
/// a missing wallet row reads as a zero balance (spec §4.4).
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait WalletQueryRepository: Send + Sync {
    async fn get_balance(
        &self,
        user_id: UserId,
        asset_type_id: AssetTypeId,
    ) -> Result<Money, CoreError>;
}

/// A transaction row joined with its asset's short code, as returned by
/// `listTransactions` (spec §4.4, §6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransactionWithAsset {
    pub transaction: Transaction,
    pub asset_code: String,
}

/// Port for `listTransactions`.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TransactionQueryRepository: Send + Sync {
    async fn list_by_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionWithAsset>, CoreError>;
}
