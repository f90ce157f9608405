pub mod vcs;

pub use vcs::{GitHubProvider, VcsProvider};
