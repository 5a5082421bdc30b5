// Backup ledger database

pub mod connection;
pub mod migrations;

pub use connection::DbConnection;
pub use migrations::MigrationManager;
