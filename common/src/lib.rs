//! Cross-cutting primitives shared by the wallet core engine and its HTTP
//! surface: the canonical money type and the newtype identifiers for every
//! entity in the data model.

pub mod ids;
pub mod money;

pub use ids::{AssetTypeId, LedgerEntryId, TransactionId, UserId, WalletId};
pub use money::{Money, MoneyError};
