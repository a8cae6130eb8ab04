pub mod idempotency;
pub mod ledger;
pub mod lock;

pub use ledger::{LedgerEngine, OperationRequest};
