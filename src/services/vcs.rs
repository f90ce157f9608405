use crate::error::{RegistryError, RegistryResult};
use crate::models::{GitHubRepo, GitHubUser, OwnershipRole, ProviderIdentity};
use log::{debug, warn};
use reqwest::StatusCode;

/// Version-control provider used to authenticate users and verify that they
/// control a repository before package data is mutated.
///
/// The registry engine never calls this; route handlers do, and only enter
/// the engine once a role has been granted.
#[rocket::async_trait]
pub trait VcsProvider: Send + Sync {
    /// Resolves an access token to the account that owns it
    async fn identify(&self, token: &str) -> RegistryResult<ProviderIdentity>;

    /// Role of the token's account on `owner/repo`
    async fn check_ownership(&self, token: &str, repo: &str) -> RegistryResult<OwnershipRole>;
}

/// GitHub REST implementation of [`VcsProvider`]
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubProvider {
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get(&self, token: &str, path: &str) -> RegistryResult<reqwest::Response> {
        let url = format!("{}{}", self.api_url, path);
        debug!("Provider request: GET {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, "hangar-registry")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(RegistryError::BadAuth(format!(
                    "Provider rejected the credential for {path}"
                )))
            }
            status => {
                warn!("Provider returned {status} for {path}");
                Err(RegistryError::ServerError(format!(
                    "Provider returned {status}"
                )))
            }
        }
    }
}

#[rocket::async_trait]
impl VcsProvider for GitHubProvider {
    async fn identify(&self, token: &str) -> RegistryResult<ProviderIdentity> {
        let user: GitHubUser = self.get(token, "/user").await?.json().await?;
        Ok(ProviderIdentity {
            node_id: user.node_id,
            username: user.login,
            avatar: user.avatar_url,
        })
    }

    async fn check_ownership(&self, token: &str, repo: &str) -> RegistryResult<OwnershipRole> {
        let details: GitHubRepo = self
            .get(token, &format!("/repos/{repo}"))
            .await?
            .json()
            .await?;

        details
            .permissions
            .unwrap_or_default()
            .role()
            .ok_or_else(|| {
                RegistryError::BadAuth(format!(
                    "No write access to repository '{}'",
                    details.full_name
                ))
            })
    }
}
