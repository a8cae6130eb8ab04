use std::sync::Arc;

use crate::domain::entities::AssetType;
use crate::domain::error::CoreError;
use crate::domain::repository::AssetTypeRepository;

/// Caso de uso para `getAssetType`.
#[derive(Clone)]
pub struct GetAssetTypeUseCase {
    asset_types: Arc<dyn AssetTypeRepository>,
}

impl GetAssetTypeUseCase {
    pub fn new(asset_types: Arc<dyn AssetTypeRepository>) -> Self {
        Self { asset_types }
    }

    /// `identifier` puede ser el nombre canónico o el código corto; ambos
    /// se resuelven con un único `OR` en el repositorio.
    #[tracing::instrument(name = "GetAssetTypeUseCase::execute", skip(self))]
    pub async fn execute(&self, identifier: &str) -> Result<AssetType, CoreError> {
        self.asset_types
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| CoreError::invalid(format!("unknown asset type {identifier:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockAssetTypeRepository;
    use crate::domain::types::AssetTypeId;

    #[tokio::test]
    async fn resolves_a_known_asset_type() {
        let mut mock = MockAssetTypeRepository::new();
        mock.expect_find_by_identifier()
            .withf(|id| id == "GOLD")
            .times(1)
            .returning(|_| {
                Ok(Some(AssetType {
                    id: AssetTypeId(1),
                    name: "Gold".into(),
                    code: "GOLD".into(),
                }))
            });

        let use_case = GetAssetTypeUseCase::new(Arc::new(mock));
        let asset_type = use_case.execute("GOLD").await.unwrap();

        assert_eq!(asset_type.code, "GOLD");
    }

    #[tokio::test]
    async fn unknown_identifier_is_an_invalid_argument() {
        let mut mock = MockAssetTypeRepository::new();
        mock.expect_find_by_identifier()
            .times(1)
            .returning(|_| Ok(None));

        let use_case = GetAssetTypeUseCase::new(Arc::new(mock));
        let result = use_case.execute("gold").await;

        assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    }
}
