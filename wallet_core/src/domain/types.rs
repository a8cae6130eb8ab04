//! Re-exports of the shared identifiers and money type under the domain
//! module, the way the teacher's `domain::types` grouped its newtypes.

pub use common::{AssetTypeId, LedgerEntryId, Money, TransactionId, UserId, WalletId};
