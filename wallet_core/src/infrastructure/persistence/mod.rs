pub mod asset_type_repository;
pub mod transaction_repository;
pub mod wallet_repository;

pub use asset_type_repository::PostgresAssetTypeRepository;
pub use transaction_repository::PostgresTransactionRepository;
pub use wallet_repository::PostgresWalletRepository;
