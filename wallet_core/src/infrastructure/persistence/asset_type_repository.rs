use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::AssetType;
use crate::domain::error::CoreError;
use crate::domain::repository::AssetTypeRepository;

/// Repositorio de tipos de activo basado en PostgreSQL.
///
/// `asset_types` es provisionado una sola vez por `init_db` y nunca mutado en
/// caliente; este repositorio solo lee.
pub struct PostgresAssetTypeRepository {
    pool: PgPool,
}

impl PostgresAssetTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetTypeRepository for PostgresAssetTypeRepository {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<AssetType>, CoreError> {
        sqlx::query_as::<_, AssetType>(
            r#"
            SELECT id, name, code
            FROM asset_types
            WHERE name = $1 OR code = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::from_sqlx)
    }

    async fn list_all(&self) -> Result<Vec<AssetType>, CoreError> {
        sqlx::query_as::<_, AssetType>("SELECT id, name, code FROM asset_types ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::from_sqlx)
    }
}
