//! Database module providing organized access to all registry operations
//!
//! This module is organized into several sub-modules:
//! - `connection`: Database connection management and pool configuration
//! - `names`: Name history and pointer resolution
//! - `packages`: Package creation, rename, deletion and reads
//! - `versions`: Version publish/removal and latest-version maintenance
//! - `counters`: Download and stargazer counters
//! - `users`: User directory
//! - `stars`: Star edges between users and packages
//! - `service`: Main DatabaseService that provides a unified interface

pub mod connection;
pub mod counters;
pub mod names;
pub mod packages;
pub mod service;
pub mod stars;
pub mod users;
pub mod versions;

// Re-export the main types and service for easy access
pub use connection::{DbConnection, DbPool, MIGRATIONS};
pub use service::DatabaseService;

// Re-export operation structs for advanced usage
pub use counters::{Counter, CounterOperations, Delta};
pub use names::NameOperations;
pub use packages::PackageOperations;
pub use stars::StarOperations;
pub use users::UserOperations;
pub use versions::VersionOperations;
