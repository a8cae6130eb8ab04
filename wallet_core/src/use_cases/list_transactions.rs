use std::sync::Arc;

use crate::domain::error::CoreError;
use crate::domain::repository::{TransactionQueryRepository, TransactionWithAsset};
use crate::domain::types::UserId;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Caso de uso para `listTransactions`.
#[derive(Clone)]
pub struct ListTransactionsUseCase {
    transactions: Arc<dyn TransactionQueryRepository>,
}

impl ListTransactionsUseCase {
    pub fn new(transactions: Arc<dyn TransactionQueryRepository>) -> Self {
        Self { transactions }
    }

    /// An absent `limit`/`offset` falls back to `DEFAULT_LIMIT`/`0`. A
    /// `limit` outside `(0, MAX_LIMIT]` or a negative `offset` is a caller
    /// error, not a presentation detail to paper over.
    #[tracing::instrument(name = "ListTransactionsUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        user_id: UserId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<TransactionWithAsset>, CoreError> {
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(l) if l > 0 && l <= MAX_LIMIT => l,
            Some(_) => {
                return Err(CoreError::invalid(format!(
                    "limit must be between 1 and {MAX_LIMIT}"
                )))
            }
        };
        let offset = match offset {
            None => 0,
            Some(o) if o >= 0 => o,
            Some(_) => return Err(CoreError::invalid("offset must not be negative")),
        };

        self.transactions.list_by_user(user_id, limit, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockTransactionQueryRepository;

    #[tokio::test]
    async fn falls_back_to_the_default_limit_and_offset_when_absent() {
        let mut mock = MockTransactionQueryRepository::new();
        mock.expect_list_by_user()
            .withf(|_, limit, offset| *limit == DEFAULT_LIMIT && *offset == 0)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let use_case = ListTransactionsUseCase::new(Arc::new(mock));
        use_case.execute(UserId::new(), None, None).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_a_non_positive_limit() {
        let mock = MockTransactionQueryRepository::new();
        let use_case = ListTransactionsUseCase::new(Arc::new(mock));

        let err = use_case
            .execute(UserId::new(), Some(0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn rejects_a_limit_over_the_maximum() {
        let mock = MockTransactionQueryRepository::new();
        let use_case = ListTransactionsUseCase::new(Arc::new(mock));

        let err = use_case
            .execute(UserId::new(), Some(MAX_LIMIT + 1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn rejects_a_negative_offset() {
        let mock = MockTransactionQueryRepository::new();
        let use_case = ListTransactionsUseCase::new(Arc::new(mock));

        let err = use_case
            .execute(UserId::new(), None, Some(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn passes_a_valid_limit_and_offset_through() {
        let mut mock = MockTransactionQueryRepository::new();
        mock.expect_list_by_user()
            .withf(|_, limit, offset| *limit == 10 && *offset == 30)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let use_case = ListTransactionsUseCase::new(Arc::new(mock));
        use_case
            .execute(UserId::new(), Some(10), Some(30))
            .await
            .unwrap();
    }
}
