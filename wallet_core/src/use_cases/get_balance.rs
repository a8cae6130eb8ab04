use std::sync::Arc;

use crate::domain::error::CoreError;
use crate::domain::repository::WalletQueryRepository;
use crate::domain::types::{AssetTypeId, Money, UserId};

/// Caso de uso para `getBalance`: consulta directa, sin locks, sin
/// participación del `LedgerEngine`.
#[derive(Clone)]
pub struct GetBalanceUseCase {
    wallets: Arc<dyn WalletQueryRepository>,
}

impl GetBalanceUseCase {
    pub fn new(wallets: Arc<dyn WalletQueryRepository>) -> Self {
        Self { wallets }
    }

    #[tracing::instrument(name = "GetBalanceUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        user_id: UserId,
        asset_type_id: AssetTypeId,
    ) -> Result<Money, CoreError> {
        self.wallets.get_balance(user_id, asset_type_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockWalletQueryRepository;

    #[tokio::test]
    async fn returns_zero_for_an_unknown_wallet() {
        let mut mock = MockWalletQueryRepository::new();
        mock.expect_get_balance()
            .times(1)
            .returning(|_, _| Ok(Money::ZERO));

        let use_case = GetBalanceUseCase::new(Arc::new(mock));
        let balance = use_case
            .execute(UserId::new(), AssetTypeId(1))
            .await
            .unwrap();

        assert_eq!(balance, Money::ZERO);
    }

    #[tokio::test]
    async fn propagates_repository_errors() {
        let mut mock = MockWalletQueryRepository::new();
        mock.expect_get_balance()
            .times(1)
            .returning(|_, _| Err(CoreError::Transient("connection reset".into())));

        let use_case = GetBalanceUseCase::new(Arc::new(mock));
        let result = use_case.execute(UserId::new(), AssetTypeId(1)).await;

        assert!(matches!(result, Err(CoreError::Transient(_))));
    }
}
