use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::Transaction;
use crate::domain::error::CoreError;
use crate::domain::repository::{TransactionQueryRepository, TransactionWithAsset};
use crate::domain::types::UserId;

/// Lado de lectura de `transactions`, usado por `listTransactions`.
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionQueryRepository for PostgresTransactionRepository {
    /// Orden `created_at DESC, id DESC` (más reciente primero); el índice
    /// `(user_id, created_at DESC)` de la migración cubre exactamente esta
    /// consulta paginada.
    async fn list_by_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionWithAsset>, CoreError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                t.id, t.idempotency_key, t.kind, t.user_id, t.asset_type_id,
                t.amount, t.status, t.metadata, t.created_at, t.processed_at,
                a.code AS asset_code
            FROM transactions t
            JOIN asset_types a ON a.id = t.asset_type_id
            WHERE t.user_id = $1
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::from_sqlx)?;

        Ok(rows.into_iter().map(TransactionWithAsset::from).collect())
    }
}

/// Fila intermedia del `JOIN` con `asset_types`; se aplana a
/// [`TransactionWithAsset`] fuera de la capa de persistencia.
#[derive(sqlx::FromRow)]
struct TransactionRow {
    #[sqlx(flatten)]
    transaction: Transaction,
    asset_code: String,
}

impl From<TransactionRow> for TransactionWithAsset {
    fn from(row: TransactionRow) -> Self {
        TransactionWithAsset {
            transaction: row.transaction,
            asset_code: row.asset_code,
        }
    }
}
