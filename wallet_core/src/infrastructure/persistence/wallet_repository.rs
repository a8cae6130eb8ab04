use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::error::CoreError;
use crate::domain::repository::WalletQueryRepository;
use crate::domain::types::{AssetTypeId, Money, UserId};

/// Lado de lectura de `wallets`, usado por `getBalance`.
///
/// Todas las escrituras pasan por `LedgerEngine`; este repositorio nunca
/// abre una transacción ni toma locks, por lo que una lectura nunca se
/// bloquea detrás de una operación en curso salvo por el commit final.
pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletQueryRepository for PostgresWalletRepository {
    /// Una billetera inexistente se lee como saldo cero: el auto-onboarding
    /// solo ocurre dentro de `LedgerEngine::execute`, nunca en una lectura.
    async fn get_balance(
        &self,
        user_id: UserId,
        asset_type_id: AssetTypeId,
    ) -> Result<Money, CoreError> {
        let balance = sqlx::query_scalar::<_, Money>(
            r#"
            SELECT balance FROM wallets
            WHERE user_id = $1 AND asset_type_id = $2
            "#,
        )
        .bind(user_id)
        .bind(asset_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::from_sqlx)?;

        Ok(balance.unwrap_or(Money::ZERO))
    }
}
