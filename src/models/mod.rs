// Re-export all models from their respective modules
pub mod auth;
pub mod package;
pub mod pointer;
pub mod user;
pub mod vcs;
pub mod version;

// Re-export commonly used models
pub use auth::*;
pub use package::*;
pub use pointer::*;
pub use user::*;
pub use vcs::*;
pub use version::*;
