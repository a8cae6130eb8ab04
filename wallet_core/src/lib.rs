pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod use_cases;

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;

use domain::entities::{AssetType, Transaction, TransactionKind};
use domain::error::CoreError;
use domain::repository::{
    AssetTypeRepository, TransactionQueryRepository, TransactionWithAsset, WalletQueryRepository,
};
use domain::types::{Money, UserId};
use engine::{LedgerEngine, OperationRequest};
use infrastructure::persistence::{
    PostgresAssetTypeRepository, PostgresTransactionRepository, PostgresWalletRepository,
};
use use_cases::{GetAssetTypeUseCase, GetBalanceUseCase, ListTransactionsUseCase};

/// The facade a caller builds once per process and shares behind an `Arc`.
/// Wires the Ledger Engine and the three Query Surface use cases to one
/// pool, and owns the in-process asset-type cache (spec §9 "Global
/// singletons"). This is the only public entry point of the crate: the
/// six operations below are exactly `topUp`, `grantBonus`, `spend`,
/// `getBalance`, `getAssetType`, `listTransactions`.
pub struct WalletCore {
    ledger: LedgerEngine,
    asset_types: Arc<dyn AssetTypeRepository>,
    get_asset_type_uc: GetAssetTypeUseCase,
    get_balance_uc: GetBalanceUseCase,
    list_transactions_uc: ListTransactionsUseCase,
    asset_cache: RwLock<HashMap<String, AssetType>>,
}

impl WalletCore {
    /// Builds the facade over an already-migrated pool and warms the asset
    /// cache. Call once at startup; `init_db` is responsible for migrations
    /// and seed data, not this constructor.
    pub async fn connect(pool: PgPool) -> Result<Self, CoreError> {
        let asset_types: Arc<dyn AssetTypeRepository> =
            Arc::new(PostgresAssetTypeRepository::new(pool.clone()));
        let wallets: Arc<dyn WalletQueryRepository> =
            Arc::new(PostgresWalletRepository::new(pool.clone()));
        let transactions: Arc<dyn TransactionQueryRepository> =
            Arc::new(PostgresTransactionRepository::new(pool.clone()));

        let core = Self {
            ledger: LedgerEngine::new(pool),
            get_asset_type_uc: GetAssetTypeUseCase::new(asset_types.clone()),
            get_balance_uc: GetBalanceUseCase::new(wallets),
            list_transactions_uc: ListTransactionsUseCase::new(transactions),
            asset_cache: RwLock::new(HashMap::new()),
            asset_types,
        };
        core.warm_asset_cache().await?;
        Ok(core)
    }

    /// Asset types are immutable once seeded, so every lookup after startup
    /// is served from the cache; a cache miss re-warms once before falling
    /// through to the use case's own not-found error, to tolerate an asset
    /// type provisioned after process start without a restart.
    async fn warm_asset_cache(&self) -> Result<(), CoreError> {
        let all = self.asset_types.list_all().await?;
        let mut cache = self.asset_cache.write().await;
        cache.clear();
        for asset_type in all {
            cache.insert(asset_type.code.clone(), asset_type);
        }
        Ok(())
    }

    async fn resolve_asset_type(&self, identifier: &str) -> Result<AssetType, CoreError> {
        if let Some(found) = self.asset_cache.read().await.get(identifier) {
            return Ok(found.clone());
        }
        self.warm_asset_cache().await?;
        if let Some(found) = self.asset_cache.read().await.get(identifier) {
            return Ok(found.clone());
        }
        self.get_asset_type_uc.execute(identifier).await
    }

    #[tracing::instrument(name = "WalletCore::top_up", skip(self, metadata))]
    pub async fn top_up(
        &self,
        user_id: UserId,
        asset_code: &str,
        amount: Money,
        idempotency_key: String,
        metadata: serde_json::Value,
    ) -> Result<Transaction, CoreError> {
        let asset_type = self.resolve_asset_type(asset_code).await?;
        self.ledger
            .execute(OperationRequest {
                from_user: UserId::SYSTEM,
                to_user: user_id,
                owner_user: user_id,
                asset_type_id: asset_type.id,
                amount,
                kind: TransactionKind::TopUp,
                idempotency_key,
                metadata,
            })
            .await
    }

    #[tracing::instrument(name = "WalletCore::grant_bonus", skip(self, metadata))]
    pub async fn grant_bonus(
        &self,
        user_id: UserId,
        asset_code: &str,
        amount: Money,
        idempotency_key: String,
        metadata: serde_json::Value,
    ) -> Result<Transaction, CoreError> {
        let asset_type = self.resolve_asset_type(asset_code).await?;
        self.ledger
            .execute(OperationRequest {
                from_user: UserId::SYSTEM,
                to_user: user_id,
                owner_user: user_id,
                asset_type_id: asset_type.id,
                amount,
                kind: TransactionKind::Bonus,
                idempotency_key,
                metadata,
            })
            .await
    }

    #[tracing::instrument(name = "WalletCore::spend", skip(self, metadata))]
    pub async fn spend(
        &self,
        user_id: UserId,
        asset_code: &str,
        amount: Money,
        idempotency_key: String,
        metadata: serde_json::Value,
    ) -> Result<Transaction, CoreError> {
        let asset_type = self.resolve_asset_type(asset_code).await?;
        self.ledger
            .execute(OperationRequest {
                from_user: user_id,
                to_user: UserId::SYSTEM,
                owner_user: user_id,
                asset_type_id: asset_type.id,
                amount,
                kind: TransactionKind::Spend,
                idempotency_key,
                metadata,
            })
            .await
    }

    pub async fn get_balance(
        &self,
        user_id: UserId,
        asset_code: &str,
    ) -> Result<Money, CoreError> {
        let asset_type = self.resolve_asset_type(asset_code).await?;
        self.get_balance_uc.execute(user_id, asset_type.id).await
    }

    pub async fn get_asset_type(&self, identifier: &str) -> Result<AssetType, CoreError> {
        self.resolve_asset_type(identifier).await
    }

    pub async fn list_transactions(
        &self,
        user_id: UserId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<TransactionWithAsset>, CoreError> {
        self.list_transactions_uc
            .execute(user_id, limit, offset)
            .await
    }
}
